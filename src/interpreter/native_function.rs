use super::value::{NativeFunction, Value};
use std::rc::Rc;

/// The fixed builtin registry, resolved by name before any user function.
pub fn all_native_functions() -> Vec<(&'static str, Rc<NativeFunction>)> {
    vec![
        native("创建列表", 0, |_| Ok(Value::new_list())),
        native("列表添加", 2, |args| {
            args[0].list_append(args[1].clone())?;
            Ok(Value::Num(1.0))
        }),
        native("列表长度", 1, |args| Ok(Value::Num(args[0].list_len()? as f64))),
        native("列表获取", 2, |args| args[0].list_get(&args[1])),
        // a numeric index out of range yields 0 rather than failing the call
        native("列表设置", 3, |args| {
            let (Value::List(_), Value::Num(_)) = (&args[0], &args[1]) else {
                return Err(format!(
                    "expected a list and a number, got {} and {}",
                    args[0].type_name(),
                    args[1].type_name()
                ));
            };
            match args[0].list_set(&args[1], args[2].clone()) {
                Ok(()) => Ok(Value::Num(1.0)),
                Err(_) => Ok(Value::Num(0.0)),
            }
        }),
        native("创建字典", 0, |_| Ok(Value::new_dict())),
        native("字典设置", 3, |args| {
            args[0].dict_set(args[1].clone(), args[2].clone())?;
            Ok(Value::Num(1.0))
        }),
        native("字典获取", 2, |args| args[0].dict_get(&args[1])),
        native("字典大小", 1, |args| Ok(Value::Num(args[0].dict_len()? as f64))),
    ]
}

fn native(
    name: &'static str,
    arity: usize,
    func: fn(&[Value]) -> Result<Value, String>,
) -> (&'static str, Rc<NativeFunction>) {
    (
        name,
        Rc::new(NativeFunction {
            name: Rc::from(name),
            arity,
            func,
        }),
    )
}
