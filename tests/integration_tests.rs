use kunyu::config::RuntimeConfig;
use kunyu::interpreter::value::Value;
use kunyu::interpreter::Interpreter;
use kunyu::{run, Error};
use pretty_assertions::assert_eq;

// Runs a program the way the binary does and returns what it printed.
fn eval(source: &str) -> Result<String, Error> {
    let (result, out) = eval_with_output(source, RuntimeConfig::default());
    result.map(|()| out)
}

// Output is returned even when the program fails part-way.
fn eval_with_output(source: &str, config: RuntimeConfig) -> (Result<(), Error>, String) {
    let mut interpreter = Interpreter::new(Vec::new(), config);
    let result = run(source, &mut interpreter);
    let out = String::from_utf8(interpreter.finish()).unwrap();
    (result, out)
}

fn runtime_error(source: &str) -> String {
    match eval(source) {
        Err(Error::Runtime(e)) => e.message,
        other => panic!("Expected runtime error, got {:?}", other),
    }
}

#[test]
fn test_declare_and_print() {
    assert_eq!(eval("变量 x = 5; 输出 x + 1;").unwrap(), "6\n");
}

#[test]
fn test_chain_has_no_precedence() {
    assert_eq!(eval("输出 2 + 3 * 4;").unwrap(), "20\n");
    assert_eq!(eval("输出 2 + (3 * 4);").unwrap(), "14\n");
    assert_eq!(eval("输出 10 - 2 - 3;").unwrap(), "5\n");
}

#[test]
fn test_expression_statement_value_is_discarded() {
    assert_eq!(eval("2 + 3 * 4;").unwrap(), "");
}

#[test]
fn test_number_rendering() {
    let out = eval("输出 7 / 2;\n输出 10 / 5;\n输出 1 / 3;\n输出 0.1 + 0.2;").unwrap();
    assert_eq!(out, "3.5\n2\n0.333333\n0.3\n");
}

#[test]
fn test_strings_print_without_quotes() {
    assert_eq!(eval("输出 \"你好，世界\";").unwrap(), "你好，世界\n");
}

#[test]
fn test_string_concatenation() {
    let out = eval("变量 名 = \"坤舆\";\n输出 名 + \" v\" + 1 + \".\" + 5;\n输出 2.5 + \"米\";").unwrap();
    assert_eq!(out, "坤舆 v1.5\n2.5米\n");
}

#[test]
fn test_string_escapes_are_not_decoded() {
    assert_eq!(eval(r#"输出 "a\nb";"#).unwrap(), "a\\nb\n");
}

#[test]
fn test_comparisons_yield_numbers() {
    let out = eval("输出 1 < 2;\n输出 2 <= 1;\n输出 3 == 3;\n输出 3 != 3;").unwrap();
    assert_eq!(out, "1\n0\n1\n0\n");
}

#[test]
fn test_logical_operators_evaluate_both_sides() {
    let source = "\
变量 计数 = 0;
函数 增加() {
    计数 = 计数 + 1;
    返回 1;
}
输出 0 && 增加();
输出 1 || 增加();
输出 计数;
";
    assert_eq!(eval(source).unwrap(), "0\n1\n2\n");
}

#[test]
fn test_unary_operators() {
    assert_eq!(eval("输出 -3 + 1;\n输出 !0;\n输出 !\"文字\";").unwrap(), "-2\n1\n0\n");
    assert!(runtime_error("输出 -\"文字\";").starts_with("Type mismatch"));
}

#[test]
fn test_constant_cannot_be_modified() {
    assert_eq!(
        runtime_error("常量 x = 1; x = 2;"),
        "Cannot assign to constant 'x'"
    );
}

#[test]
fn test_assignment_to_undeclared_name() {
    assert_eq!(
        runtime_error("y = 2;"),
        "Cannot assign to undefined variable 'y'"
    );
}

#[test]
fn test_assignment_is_an_expression() {
    assert_eq!(eval("变量 a = 0;\n变量 b = 0;\n输出 a = b = 7;\n输出 a + b;").unwrap(), "7\n14\n");
}

#[test]
fn test_unmatched_brace_is_parse_error() {
    match eval("如果 (1) {\n    输出 1;\n") {
        Err(Error::Parse(e)) => {
            assert_eq!(e.message, "Unclosed block, expected '}'");
            assert_eq!(e.span.line, 3);
        }
        other => panic!("Expected parse error, got {:?}", other),
    }
}

#[test]
fn test_unknown_character_is_lexical_error() {
    match eval("输出 1;\n输出 2 @ 3;") {
        Err(e @ Error::Scan(_)) => {
            assert_eq!(e.stage(), "lexer");
            assert_eq!(e.span().line, 2);
            assert_eq!(e.span().col, 6);
        }
        other => panic!("Expected lexical error, got {:?}", other),
    }
}

#[test]
fn test_parse_error_means_nothing_runs() {
    let (result, out) = eval_with_output("输出 1;\n输出 2", RuntimeConfig::default());
    assert!(matches!(result, Err(Error::Parse(_))));
    assert_eq!(out, "");
}

#[test]
fn test_division_by_zero_stops_program() {
    let (result, out) = eval_with_output(
        "输出 \"之前\";\n输出 1 / 0;\n输出 \"之后\";",
        RuntimeConfig::default(),
    );
    match result {
        Err(Error::Runtime(e)) => {
            assert_eq!(e.message, "Division by zero");
            assert_eq!(e.span.line, 2);
        }
        other => panic!("Expected runtime error, got {:?}", other),
    }
    assert_eq!(out, "之前\n");
}

#[test]
fn test_modulo() {
    assert_eq!(eval("输出 7 % 3;\n输出 7.9 % 2;").unwrap(), "1\n1\n");
    assert_eq!(runtime_error("输出 5 % 0;"), "Modulo by zero");
}

#[test]
fn test_type_mismatch() {
    assert_eq!(
        runtime_error("输出 \"a\" - 1;"),
        "Type mismatch: cannot apply '-' to string and number"
    );
}

#[test]
fn test_undefined_variable() {
    assert_eq!(runtime_error("输出 不存在;"), "Undefined variable '不存在'");
}

#[test]
fn test_block_variable_is_gone_after_block() {
    let source = "如果 (1) {\n    变量 内部 = 1;\n}\n输出 内部;";
    assert_eq!(runtime_error(source), "Undefined variable '内部'");
}

#[test]
fn test_redeclaration_in_same_scope() {
    assert_eq!(
        runtime_error("变量 x = 1;\n变量 x = 2;"),
        "Variable 'x' is already defined in this scope"
    );
}

#[test]
fn test_shadowing_in_inner_block() {
    let source = "\
变量 x = 1;
如果 (1) {
    变量 x = 2;
    输出 x;
}
输出 x;
";
    assert_eq!(eval(source).unwrap(), "2\n1\n");
}

#[test]
fn test_assignment_reaches_outer_scope() {
    let source = "变量 x = 1;\n如果 (1) {\n    x = 5;\n}\n输出 x;";
    assert_eq!(eval(source).unwrap(), "5\n");
}

#[test]
fn test_if_else_chain() {
    let source = "\
函数 分类(n) {
    如果 (n < 0) {
        返回 \"负\";
    } 否则 如果 (n == 0) {
        返回 \"零\";
    } 否则 {
        返回 \"正\";
    }
}
输出 分类(-1);
输出 分类(0);
输出 分类(3);
";
    assert_eq!(eval(source).unwrap(), "负\n零\n正\n");
}

#[test]
fn test_truthiness_in_conditions() {
    let source = "\
如果 (\"\") { 输出 \"empty\"; } 否则 { 输出 \"falsy string\"; }
如果 (0.5) { 输出 \"nonzero\"; }
如果 (创建列表()) { 输出 \"list\"; }
";
    assert_eq!(eval(source).unwrap(), "falsy string\nnonzero\nlist\n");
}

#[test]
fn test_loop_runs_until_condition_falsy() {
    let source = "\
变量 i = 0;
变量 和 = 0;
循环 (i < 5) {
    i = i + 1;
    和 = 和 + i;
}
输出 和;
";
    assert_eq!(eval(source).unwrap(), "15\n");
}

#[test]
fn test_loop_never_entered() {
    assert_eq!(eval("循环 (0) { 输出 1; }\n输出 2;").unwrap(), "2\n");
}

#[test]
fn test_return_inside_loop_exits_early() {
    let source = "\
变量 检查次数 = 0;
函数 条件() {
    检查次数 = 检查次数 + 1;
    返回 1;
}
函数 第一个大于(限) {
    变量 i = 0;
    循环 (条件()) {
        如果 (i > 限) {
            返回 i;
        }
        i = i + 1;
    }
}
输出 第一个大于(3);
输出 检查次数;
";
    // the condition is not checked again once the body returns
    assert_eq!(eval(source).unwrap(), "4\n5\n");
}

#[test]
fn test_function_without_return_yields_null() {
    assert_eq!(eval("函数 空() {\n}\n输出 空();").unwrap(), "null\n");
}

#[test]
fn test_recursion() {
    let source = "\
函数 斐波那契(n) {
    如果 (n < 2) {
        返回 n;
    }
    返回 斐波那契(n - 1) + 斐波那契(n - 2);
}
输出 斐波那契(15);
";
    assert_eq!(eval(source).unwrap(), "610\n");
}

#[test]
fn test_functions_are_visible_before_declaration_runs_in_bodies() {
    let source = "\
函数 甲() {
    返回 乙() + 1;
}
函数 乙() {
    返回 41;
}
输出 甲();
";
    assert_eq!(eval(source).unwrap(), "42\n");
}

#[test]
fn test_arity_mismatch_names_function_and_counts() {
    let source = "函数 加(a, b) {\n    返回 a + b;\n}\n输出 加(1);";
    assert_eq!(
        runtime_error(source),
        "Function '加' expects 2 arguments but received 1"
    );
    assert_eq!(
        eval("函数 加(a, b) {\n    返回 a + b;\n}\n输出 加(1, 2);").unwrap(),
        "3\n"
    );
}

#[test]
fn test_function_redeclaration() {
    assert_eq!(
        runtime_error("函数 f() {\n}\n函数 f() {\n}"),
        "Function 'f' is already defined"
    );
}

#[test]
fn test_undefined_function() {
    assert_eq!(runtime_error("不存在();"), "Undefined function '不存在'");
}

#[test]
fn test_dynamic_scope_sees_callers_locals() {
    let source = "\
函数 看() {
    返回 秘密;
}
函数 调用者() {
    变量 秘密 = \"来自调用者\";
    返回 看();
}
输出 调用者();
";
    assert_eq!(eval(source).unwrap(), "来自调用者\n");
}

#[test]
fn test_arguments_are_evaluated_in_the_call_scope() {
    let source = "\
函数 第二个(a, b) {
    返回 b;
}
函数 读甲() {
    返回 a;
}
输出 第二个(1, a);
输出 第二个(5, 读甲());
";
    assert_eq!(eval(source).unwrap(), "1\n5\n");
}

#[test]
fn test_parameters_are_assignable() {
    let source = "函数 f(n) {\n    n = n * 2;\n    返回 n;\n}\n输出 f(21);";
    assert_eq!(eval(source).unwrap(), "42\n");
}

#[test]
fn test_top_level_return_stops_program() {
    assert_eq!(eval("输出 1;\n返回 0;\n输出 2;").unwrap(), "1\n");
}

#[test]
fn test_call_depth_limit() {
    let config = RuntimeConfig { max_call_depth: 32 };
    let (result, _) = eval_with_output("函数 无限(n) {\n    返回 无限(n + 1);\n}\n无限(0);", config);
    match result {
        Err(Error::Runtime(e)) => assert_eq!(
            e.message,
            "Stack overflow: maximum call depth of 32 exceeded"
        ),
        other => panic!("Expected stack overflow, got {:?}", other),
    }
}

#[test]
fn test_deep_recursion_through_blocks() {
    let deep = "\
函数 深(n) {
    循环 (1) {
        如果 (1) {
            如果 (n > 0) {
                返回 深(n - 1) + 1;
            }
        }
        返回 0;
    }
}
";
    assert_eq!(eval(&format!("{}输出 深(255);", deep)).unwrap(), "255\n");
    assert_eq!(
        runtime_error(&format!("{}输出 深(100000);", deep)),
        "Stack overflow: maximum call depth of 256 exceeded"
    );
}

#[test]
fn test_list_builtins() {
    let source = "\
变量 表 = 创建列表();
列表添加(表, \"一\");
列表添加(表, 2);
输出 列表长度(表);
输出 列表获取(表, 0);
输出 列表设置(表, 1, 3);
输出 列表设置(表, 9, 3);
输出 列表获取(表, 1);
";
    assert_eq!(eval(source).unwrap(), "2\n一\n1\n0\n3\n");
}

#[test]
fn test_list_set_needs_a_numeric_index() {
    let source = "\
变量 表 = 创建列表();
列表添加(表, 1);
列表设置(表, \"零\", 5);
";
    assert_eq!(runtime_error(source), "Builtin function '列表设置' failed");
}

#[test]
fn test_list_aliasing_is_shared() {
    let source = "\
变量 甲 = 创建列表();
变量 乙 = 甲;
列表添加(乙, 1);
输出 列表长度(甲);
";
    assert_eq!(eval(source).unwrap(), "1\n");
}

#[test]
fn test_dict_builtins() {
    let source = "\
变量 典 = 创建字典();
字典设置(典, \"名\", \"坤舆\");
字典设置(典, \"名\", \"新\");
字典设置(典, 1, \"数字键\");
字典设置(典, 1, \"再来\");
输出 字典大小(典);
输出 字典获取(典, \"名\");
";
    assert_eq!(eval(source).unwrap(), "3\n新\n");
}

#[test]
fn test_builtin_failures_are_uniform() {
    assert_eq!(
        runtime_error("变量 表 = 创建列表();\n列表获取(表, 0);"),
        "Builtin function '列表获取' failed"
    );
    assert_eq!(
        runtime_error("创建列表(1);"),
        "Builtin function '创建列表' failed"
    );
    assert_eq!(
        runtime_error("变量 典 = 创建字典();\n字典获取(典, 1);"),
        "Builtin function '字典获取' failed"
    );
}

#[test]
fn test_builtins_shadow_user_functions() {
    let source = "函数 列表长度(x) {\n    返回 99;\n}\n输出 列表长度(创建列表());";
    assert_eq!(eval(source).unwrap(), "0\n");
}

#[test]
fn test_containers_print_opaquely() {
    assert_eq!(eval("输出 创建列表();\n输出 创建字典();").unwrap(), "[对象]\n[对象]\n");
}

#[test]
fn test_list_element_outlives_callers_reference() {
    let mut interpreter = Interpreter::new(Vec::new(), RuntimeConfig::default());
    run(
        "变量 表 = 创建列表();\n如果 (1) {\n    变量 临时 = 创建列表();\n    列表添加(表, 临时);\n}",
        &mut interpreter,
    )
    .unwrap();

    let list = interpreter.global("表").unwrap();
    let element = list.list_get(&Value::Num(0.0)).unwrap();
    // the list's reference plus ours; the block's binding is gone
    assert_eq!(element.ref_count(), Some(2));
}

#[test]
fn test_state_persists_across_runs() {
    let mut interpreter = Interpreter::new(Vec::new(), RuntimeConfig::default());
    run("变量 x = 40;\n函数 加二(n) {\n    返回 n + 2;\n}", &mut interpreter).unwrap();
    run("输出 加二(x);", &mut interpreter).unwrap();
    assert!(run("1 / 0;", &mut interpreter).is_err());
    run("输出 x;", &mut interpreter).unwrap();
    assert_eq!(String::from_utf8(interpreter.finish()).unwrap(), "42\n40\n");
}

#[test]
fn test_comments_and_blank_lines() {
    let source = "# 开头注释\n\n变量 x = 1; # 行尾注释\n\n\n输出 x;\n# 结尾";
    assert_eq!(eval(source).unwrap(), "1\n");
}
