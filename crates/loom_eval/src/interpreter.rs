use std::cell::RefCell;
use std::rc::Rc;

use loom_object::{bang_value, builtins, values_equal, Environment, FunctionObj, HashObj, Value};
use loom_parser::{BlockStatement, Expr, ExprKind, Identifier, Program, Stmt, StmtKind};

/// Whatever a sub-evaluation produced, tagged with whether it should keep
/// bubbling past enclosing blocks (a `return`) or be consumed where it sits.
/// Mirrors `original_source/monkey/eval`'s `object.ReturnValue` wrapper
/// without needing a matching variant on the shared `Value` enum — the
/// wrapper lives only here, inside the tree-walker.
enum Signal {
    Value(Value),
    Return(Value),
}

/// Evaluates a sub-expression; if it produced a `return` or an error,
/// bubbles that straight out of the calling `eval_*` function (which must
/// itself return `Signal`). Otherwise yields the plain `Value`.
macro_rules! eval_or_return {
    ($self:ident, $expr:expr, $env:expr) => {
        match $self.eval_expr($expr, $env) {
            Signal::Return(v) => return Signal::Return(v),
            Signal::Value(v) => {
                if v.is_error() {
                    return Signal::Value(v);
                }
                v
            }
        }
    };
}

/// Tree-walking evaluator over the shared `loom_object::Value` model,
/// grounded on `original_source/monkey/eval`'s `Eval(node, env)` dispatch.
/// Kept deliberately separate from `loom_vm`: same language, same runtime
/// values, two independent execution strategies sharing nothing but the
/// `Value`/`Environment` types, the way the book keeps `eval/` and `vm/`
/// as siblings rather than layering one atop the other.
pub struct Interpreter {
    pub env: Rc<RefCell<Environment>>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Interpreter { env: Environment::new() }
    }

    /// Reuses an existing environment — the REPL's "`let`s from one line
    /// are visible on the next" behavior depends on feeding the same
    /// environment back into successive `Interpreter`s.
    pub fn with_env(env: Rc<RefCell<Environment>>) -> Self {
        Interpreter { env }
    }

    pub fn eval_program(&mut self, program: &Program) -> Value {
        let env = self.env.clone();
        let mut result = Value::Null;
        for stmt in &program.statements {
            match self.eval_statement(stmt, &env) {
                Signal::Return(v) => return v,
                Signal::Value(v) => {
                    if v.is_error() {
                        return v;
                    }
                    result = v;
                }
            }
        }
        result
    }

    fn eval_statement(&self, stmt: &Stmt, env: &Rc<RefCell<Environment>>) -> Signal {
        match &stmt.inner {
            StmtKind::Let { name, value } => {
                let val = eval_or_return!(self, value, env);
                env.borrow_mut().set(name.name.clone(), val);
                Signal::Value(Value::Null)
            }
            StmtKind::Return { value } => {
                let val = eval_or_return!(self, value, env);
                Signal::Return(val)
            }
            StmtKind::Expression { expression } => self.eval_expr(expression, env),
        }
    }

    fn eval_block(&self, block: &BlockStatement, env: &Rc<RefCell<Environment>>) -> Signal {
        let mut result = Signal::Value(Value::Null);
        for stmt in &block.statements {
            result = self.eval_statement(stmt, env);
            match &result {
                Signal::Return(_) => return result,
                Signal::Value(v) if v.is_error() => return result,
                _ => {}
            }
        }
        result
    }

    fn eval_expr(&self, expr: &Expr, env: &Rc<RefCell<Environment>>) -> Signal {
        match &expr.inner {
            ExprKind::IntegerLiteral(v) => Signal::Value(Value::Integer(*v)),
            ExprKind::Boolean(b) => Signal::Value(Value::Boolean(*b)),
            ExprKind::StringLiteral(s) => Signal::Value(Value::Str(Rc::new(s.clone()))),
            ExprKind::Identifier(name) => Signal::Value(self.eval_identifier(name, env)),
            ExprKind::Prefix { operator, right } => {
                let right_val = eval_or_return!(self, right, env);
                Signal::Value(self.eval_prefix(operator, right_val))
            }
            ExprKind::Infix { left, operator, right } => {
                let left_val = eval_or_return!(self, left, env);
                let right_val = eval_or_return!(self, right, env);
                Signal::Value(self.eval_infix(operator, left_val, right_val))
            }
            ExprKind::If { condition, consequence, alternative } => {
                let cond = eval_or_return!(self, condition, env);
                if cond.is_truthy() {
                    self.eval_block(consequence, env)
                } else if let Some(alt) = alternative {
                    self.eval_block(alt, env)
                } else {
                    Signal::Value(Value::Null)
                }
            }
            ExprKind::ArrayLiteral(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(eval_or_return!(self, item, env));
                }
                Signal::Value(Value::Array(Rc::new(RefCell::new(values))))
            }
            ExprKind::HashLiteral(pairs) => {
                let mut map = indexmap::IndexMap::new();
                for (k, v) in pairs {
                    let key = eval_or_return!(self, k, env);
                    let value = eval_or_return!(self, v, env);
                    let hash_key = match key.hash_key() {
                        Some(hk) => hk,
                        None => {
                            return Signal::Value(Value::new_error(format!(
                                "unusable as hash key: {}",
                                key.type_tag()
                            )))
                        }
                    };
                    map.insert(hash_key, (key, value));
                }
                Signal::Value(Value::Hash(Rc::new(HashObj { pairs: RefCell::new(map) })))
            }
            ExprKind::Index { left, index } => {
                let left_val = eval_or_return!(self, left, env);
                let index_val = eval_or_return!(self, index, env);
                Signal::Value(self.eval_index(left_val, index_val))
            }
            ExprKind::FunctionLiteral { parameters, body, name } => {
                // Self-naming lets a `let`-bound function literal recurse by
                // its own name, mirroring the compiler's `OpCurrentClosure`
                // path for the tree-walker: bind the function into a thin
                // child scope it captures, so looking itself up by name
                // inside its own body resolves back to the same closure.
                if let Some(fn_name) = name {
                    let scope = Environment::new_enclosed(env.clone());
                    let func = Rc::new(FunctionObj {
                        parameters: parameters.clone(),
                        body: body.clone(),
                        env: scope.clone(),
                    });
                    scope.borrow_mut().set(fn_name.clone(), Value::Function(func.clone()));
                    return Signal::Value(Value::Function(func));
                }
                Signal::Value(Value::Function(Rc::new(FunctionObj {
                    parameters: parameters.clone(),
                    body: body.clone(),
                    env: env.clone(),
                })))
            }
            ExprKind::MacroLiteral { .. } => {
                Signal::Value(Value::new_error("macro literal encountered outside macro expansion"))
            }
            ExprKind::Call { function, arguments } => {
                let callee = eval_or_return!(self, function, env);
                let mut args = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(eval_or_return!(self, arg, env));
                }
                Signal::Value(self.apply_function(callee, args))
            }
            ExprKind::Error => Signal::Value(Value::new_error("malformed expression")),
        }
    }

    fn eval_identifier(&self, name: &str, env: &Rc<RefCell<Environment>>) -> Value {
        if let Some(v) = env.borrow().get(name) {
            return v;
        }
        if let Some((_, builtin)) = builtins::lookup(name) {
            return Value::Builtin(builtin);
        }
        Value::new_error(format!("identifier not found: {}", name))
    }

    fn eval_prefix(&self, operator: &str, right: Value) -> Value {
        match operator {
            "!" => bang_value(&right),
            "-" => match right {
                Value::Integer(v) => Value::Integer(-v),
                other => Value::new_error(format!("unknown operator: -{}", other.type_tag())),
            },
            other => Value::new_error(format!("unknown operator: {}{}", other, right.type_tag())),
        }
    }

    fn eval_infix(&self, operator: &str, left: Value, right: Value) -> Value {
        match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => match operator {
                "+" => Value::Integer(l + r),
                "-" => Value::Integer(l - r),
                "*" => Value::Integer(l * r),
                "/" => {
                    if *r == 0 {
                        Value::new_error("division by zero")
                    } else {
                        Value::Integer(l / r)
                    }
                }
                "<" => Value::Boolean(l < r),
                ">" => Value::Boolean(l > r),
                "==" => Value::Boolean(l == r),
                "!=" => Value::Boolean(l != r),
                other => Value::new_error(format!("unknown operator: INTEGER {} INTEGER", other)),
            },
            (Value::Str(l), Value::Str(r)) => match operator {
                "+" => Value::Str(Rc::new(format!("{}{}", l, r))),
                "==" => Value::Boolean(l == r),
                "!=" => Value::Boolean(l != r),
                other => Value::new_error(format!("unknown operator: STRING {} STRING", other)),
            },
            _ => match operator {
                "==" => Value::Boolean(values_equal(&left, &right)),
                "!=" => Value::Boolean(!values_equal(&left, &right)),
                _ if left.type_tag() != right.type_tag() => Value::new_error(format!(
                    "type mismatch: {} {} {}",
                    left.type_tag(),
                    operator,
                    right.type_tag()
                )),
                _ => Value::new_error(format!(
                    "unknown operator: {} {} {}",
                    left.type_tag(),
                    operator,
                    right.type_tag()
                )),
            },
        }
    }

    fn eval_index(&self, left: Value, index: Value) -> Value {
        match (&left, &index) {
            (Value::Array(items), Value::Integer(i)) => {
                let items = items.borrow();
                let max = items.len() as i64 - 1;
                if *i < 0 || *i > max {
                    Value::Null
                } else {
                    items[*i as usize].clone()
                }
            }
            (Value::Hash(h), _) => match index.hash_key() {
                Some(key) => h.pairs.borrow().get(&key).map(|(_, v)| v.clone()).unwrap_or(Value::Null),
                None => Value::new_error(format!("unusable as hash key: {}", index.type_tag())),
            },
            _ => Value::new_error(format!("index operator not supported: {}", left.type_tag())),
        }
    }

    fn apply_function(&self, callee: Value, args: Vec<Value>) -> Value {
        match callee {
            Value::Function(func) => {
                if args.len() != func.parameters.len() {
                    return Value::new_error(format!(
                        "wrong number of arguments: want={}, got={}",
                        func.parameters.len(),
                        args.len()
                    ));
                }
                let extended = Environment::new_enclosed(func.env.clone());
                for (param, arg) in func.parameters.iter().zip(args) {
                    bind_param(&extended, param, arg);
                }
                match self.eval_block(&func.body, &extended) {
                    Signal::Return(v) | Signal::Value(v) => v,
                }
            }
            Value::Builtin(b) => (b.func)(&args),
            other => Value::new_error(format!("not a function: {}", other.type_tag())),
        }
    }
}

fn bind_param(env: &Rc<RefCell<Environment>>, param: &Identifier, arg: Value) {
    env.borrow_mut().set(param.name.clone(), arg);
}
