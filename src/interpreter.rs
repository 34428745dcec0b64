pub mod environment;
pub mod native_function;
mod stack;
pub mod value;

use crate::config::RuntimeConfig;
use crate::interpreter::environment::Environment;
use crate::interpreter::native_function::all_native_functions;
use crate::interpreter::stack::ensure_sufficient_stack;
use crate::interpreter::value::{NativeFunction, Value};
use crate::parser::ast::{Block, ElseBranch, Expr, ExprKind, IfStmt, Program, Stmt, StmtKind};
use crate::scanner::token::Operator;
use crate::span::Span;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

// Result of running a statement: either it finished normally, or a `返回` is unwinding
// towards the call that owns it.
#[derive(Debug, Clone)]
enum ControlFlow {
    Normal,
    Return(Value),
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} (line {}, column {})", span.line, span.col)]
pub struct RuntimeError {
    pub span: Span,
    pub message: String,
}

impl RuntimeError {
    fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }
}

/// A user function from the global function table.
#[derive(Debug)]
struct Function {
    params: Vec<String>,
    body: Rc<Block>,
}

/// Tree-walking evaluator.
///
/// Holds the scope chain, the flat function table and the builtin registry. Globals and
/// functions persist across [`Interpreter::evaluate`] calls, so a REPL can feed it one input
/// at a time. Everything printed goes to `out`.
pub struct Interpreter<W: Write> {
    // head of the scope chain; blocks and calls swap it and restore it on every exit
    env: Rc<Environment>,
    globals: Rc<Environment>,
    functions: HashMap<String, Rc<Function>>,
    builtins: HashMap<&'static str, Rc<NativeFunction>>,
    out: W,
    runtime_config: RuntimeConfig,
    call_depth: usize,
}

// Propagate a return, discard the value
macro_rules! prop {
    ($expr:expr) => {
        match $expr? {
            ControlFlow::Normal => {}
            other => return Ok(other),
        }
    };
}

impl<W: Write> Interpreter<W> {
    /// Sets up a fresh global scope and registers the builtins.
    pub fn new(out: W, runtime_config: RuntimeConfig) -> Self {
        let globals = Rc::new(Environment::new());
        let mut interpreter = Self {
            env: globals.clone(),
            globals,
            functions: HashMap::new(),
            builtins: HashMap::new(),
            out,
            runtime_config,
            call_depth: 0,
        };
        interpreter.define_native_functions();
        interpreter
    }

    fn define_native_functions(&mut self) {
        for (name, native_function) in all_native_functions() {
            self.builtins.insert(name, native_function);
        }
    }

    /// Releases the registry, the function table and every global, handing back the sink.
    pub fn finish(self) -> W {
        self.out
    }

    /// Current value of a global, mostly for hosts and tests.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    /// Runs every top-level statement in order. The first runtime error aborts the rest; a
    /// top-level `返回` ends the program without error.
    pub fn evaluate(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for stmt in &program.statements {
            if let ControlFlow::Return(_) = self.execute(stmt)? {
                debug!("top-level return, stopping");
                break;
            }
        }
        Ok(())
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<ControlFlow, RuntimeError> {
        ensure_sufficient_stack(|| self.execute_inner(stmt))
    }

    fn execute_inner(&mut self, stmt: &Stmt) -> Result<ControlFlow, RuntimeError> {
        match &stmt.kind {
            StmtKind::Expression(expr) => {
                self.evaluate_expression(expr)?;
                Ok(ControlFlow::Normal)
            }
            StmtKind::Print(expr) => {
                let value = self.evaluate_expression(expr)?;
                writeln!(self.out, "{}", value).map_err(|e| {
                    RuntimeError::new(stmt.span, format!("Failed to write output: {}", e))
                })?;
                Ok(ControlFlow::Normal)
            }
            StmtKind::VarDecl {
                name,
                initializer,
                is_constant,
            } => {
                let value = self.evaluate_expression(initializer)?;
                self.env
                    .define(name, value, *is_constant)
                    .map_err(|msg| RuntimeError::new(stmt.span, msg))?;
                Ok(ControlFlow::Normal)
            }
            StmtKind::Block(block) => self.execute_block(block),
            StmtKind::If(if_stmt) => self.execute_if(if_stmt),
            StmtKind::Loop { condition, body } => {
                while self.evaluate_expression(condition)?.is_truthy() {
                    prop!(self.execute_block(body));
                }
                Ok(ControlFlow::Normal)
            }
            StmtKind::Function { name, params, body } => {
                if self.functions.contains_key(name) {
                    return Err(RuntimeError::new(
                        stmt.span,
                        format!("Function '{}' is already defined", name),
                    ));
                }
                debug!(function = %name, arity = params.len(), "registered function");
                self.functions.insert(
                    name.clone(),
                    Rc::new(Function {
                        params: params.clone(),
                        body: Rc::clone(body),
                    }),
                );
                Ok(ControlFlow::Normal)
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.evaluate_expression(expr)?,
                    None => Value::Null,
                };
                Ok(ControlFlow::Return(value))
            }
        }
    }

    fn execute_if(&mut self, if_stmt: &IfStmt) -> Result<ControlFlow, RuntimeError> {
        if self.evaluate_expression(&if_stmt.condition)?.is_truthy() {
            return self.execute_block(&if_stmt.then_branch);
        }
        match &if_stmt.else_branch {
            Some(ElseBranch::If(next)) => self.execute_if(next),
            Some(ElseBranch::Block(block)) => self.execute_block(block),
            None => Ok(ControlFlow::Normal),
        }
    }

    fn execute_block(&mut self, block: &Block) -> Result<ControlFlow, RuntimeError> {
        let previous = self.env.clone();
        self.env = Rc::new(Environment::new_with_enclosing(previous.clone()));
        trace!(depth = self.env.depth(), "push scope");

        let result: Result<ControlFlow, RuntimeError> = (|| {
            for stmt in &block.statements {
                prop!(self.execute(stmt));
            }
            Ok(ControlFlow::Normal)
        })();

        trace!(depth = previous.depth(), "pop scope");
        self.env = previous;
        result
    }

    fn evaluate_expression(&mut self, expression: &Expr) -> Result<Value, RuntimeError> {
        ensure_sufficient_stack(|| self.evaluate_expression_inner(expression))
    }

    fn evaluate_expression_inner(&mut self, expression: &Expr) -> Result<Value, RuntimeError> {
        match &expression.kind {
            // primary
            ExprKind::Num(n) => Ok(Value::Num(*n)),
            ExprKind::Str(s) => Ok(Value::from(s.as_str())),
            ExprKind::Grouping(inner) => self.evaluate_expression(inner),
            ExprKind::Variable(name) => self.lookup_variable(name, expression.span),

            // assignment
            ExprKind::Assign { name, value } => {
                let value = self.evaluate_expression(value)?;
                self.env
                    .assign(name, value.clone())
                    .map_err(|msg| RuntimeError::new(expression.span, msg))?;
                Ok(value)
            }

            // unary
            ExprKind::Unary { operator, operand } => {
                let operand_value = self.evaluate_expression(operand)?;
                match (operator, operand_value) {
                    (Operator::Minus, Value::Num(n)) => Ok(Value::Num(-n)),
                    (Operator::Bang, v) => Ok(Value::Num(bool_num(!v.is_truthy()))),
                    (op, v) => Err(RuntimeError::new(
                        expression.span,
                        format!(
                            "Type mismatch: cannot apply '{}' to {}",
                            op.symbol(),
                            v.type_name()
                        ),
                    )),
                }
            }

            // binary: both sides always evaluated, left first
            ExprKind::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate_expression(left)?;
                let right = self.evaluate_expression(right)?;
                binary_op(*operator, &left, &right)
                    .map_err(|msg| RuntimeError::new(expression.span, msg))
            }

            ExprKind::Call { callee, arguments } => {
                self.call(callee, arguments, expression.span)
            }
        }
    }

    fn lookup_variable(&self, name: &str, span: Span) -> Result<Value, RuntimeError> {
        if let Some(value) = self.env.get(name) {
            return Ok(value);
        }
        // a bare builtin name is a function value
        if let Some(native) = self.builtins.get(name) {
            return Ok(Value::NativeFn(native.clone()));
        }
        Err(RuntimeError::new(span, format!("Undefined variable '{}'", name)))
    }

    fn evaluate_arguments(&mut self, arguments: &[Expr]) -> Result<Vec<Value>, RuntimeError> {
        arguments
            .iter()
            .map(|arg| self.evaluate_expression(arg))
            .collect()
    }

    fn call(&mut self, callee: &str, arguments: &[Expr], span: Span) -> Result<Value, RuntimeError> {
        if let Some(native) = self.builtins.get(callee).cloned() {
            let args = self.evaluate_arguments(arguments)?;
            return self.call_native(&native, &args, span);
        }

        let Some(function) = self.functions.get(callee).cloned() else {
            return Err(RuntimeError::new(
                span,
                format!("Undefined function '{}'", callee),
            ));
        };

        if arguments.len() != function.params.len() {
            return Err(RuntimeError::new(
                span,
                format!(
                    "Function '{}' expects {} arguments but received {}",
                    callee,
                    function.params.len(),
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= self.runtime_config.max_call_depth {
            return Err(RuntimeError::new(
                span,
                format!(
                    "Stack overflow: maximum call depth of {} exceeded",
                    self.runtime_config.max_call_depth
                ),
            ));
        }

        // parented on the caller's scope, not the declaration's; arguments are evaluated
        // inside it, so later arguments see the parameters bound before them
        debug!(function = %callee, depth = self.call_depth + 1, "call");
        let call_env = Rc::new(Environment::new_with_enclosing(self.env.clone()));
        let previous = std::mem::replace(&mut self.env, call_env);
        self.call_depth += 1;

        let result: Result<ControlFlow, RuntimeError> = (|| {
            for (param, argument) in function.params.iter().zip(arguments) {
                let value = self.evaluate_expression(argument)?;
                self.env
                    .define(param, value, false)
                    .map_err(|msg| RuntimeError::new(span, msg))?;
            }
            self.execute_block(&function.body)
        })();

        self.call_depth -= 1;
        self.env = previous;

        match result? {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Normal => Ok(Value::Null),
        }
    }

    fn call_native(
        &self,
        native: &NativeFunction,
        args: &[Value],
        span: Span,
    ) -> Result<Value, RuntimeError> {
        let failed = || {
            RuntimeError::new(span, format!("Builtin function '{}' failed", native.name))
        };

        if args.len() != native.arity {
            debug!(
                builtin = %native.name,
                expected = native.arity,
                received = args.len(),
                "builtin arity mismatch"
            );
            return Err(failed());
        }

        (native.func)(args).map_err(|reason| {
            debug!(builtin = %native.name, %reason, "builtin failed");
            failed()
        })
    }
}

fn bool_num(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Applies a binary operator. `+` with a string on either side concatenates the rendered
/// operands; every other combination needs two numbers.
pub fn binary_op(operator: Operator, left: &Value, right: &Value) -> Result<Value, String> {
    if operator == Operator::Plus
        && (matches!(left, Value::Str(_)) || matches!(right, Value::Str(_)))
    {
        return Ok(Value::from(format!("{}{}", left, right)));
    }

    let (Value::Num(a), Value::Num(b)) = (left, right) else {
        return Err(format!(
            "Type mismatch: cannot apply '{}' to {} and {}",
            operator.symbol(),
            left.type_name(),
            right.type_name()
        ));
    };
    let (a, b) = (*a, *b);

    let result = match operator {
        Operator::Plus => a + b,
        Operator::Minus => a - b,
        Operator::Star => a * b,
        Operator::Slash => {
            if b == 0.0 {
                return Err("Division by zero".to_string());
            }
            a / b
        }
        Operator::Percent => {
            let (x, y) = (a as i64, b as i64);
            if y == 0 {
                return Err("Modulo by zero".to_string());
            }
            x.wrapping_rem(y) as f64
        }
        Operator::Equal => bool_num(a == b),
        Operator::NotEqual => bool_num(a != b),
        Operator::Less => bool_num(a < b),
        Operator::LessEqual => bool_num(a <= b),
        Operator::Greater => bool_num(a > b),
        Operator::GreaterEqual => bool_num(a >= b),
        Operator::And => bool_num(left.is_truthy() && right.is_truthy()),
        Operator::Or => bool_num(left.is_truthy() || right.is_truthy()),
        op => return Err(format!("Unsupported operator '{}'", op.symbol())),
    };

    Ok(Value::Num(result))
}
