use loom_code::Instructions;
use loom_parser::{BlockStatement, Identifier};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::environment::Environment;
use crate::hashkey::HashKey;

/// The tagged runtime value shared by the tree-walking interpreter and the
/// virtual machine.
#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Null,
    Str(Rc<String>),
    Array(Rc<RefCell<Vec<Value>>>),
    Hash(Rc<HashObj>),
    /// Tree-walker closures: captures an `Rc<RefCell<Environment>>` the way
    /// `original_source/monkey/object`'s `Function` captures `*Environment`.
    Function(Rc<FunctionObj>),
    CompiledFunction(Rc<CompiledFunctionObj>),
    Closure(Rc<ClosureObj>),
    Builtin(Rc<BuiltinObj>),
    Error(Rc<String>),
}

pub struct HashObj {
    pub pairs: RefCell<indexmap::IndexMap<HashKey, (Value, Value)>>,
}

pub struct FunctionObj {
    pub parameters: Vec<Identifier>,
    pub body: BlockStatement,
    pub env: Rc<RefCell<Environment>>,
}

pub struct CompiledFunctionObj {
    pub instructions: Instructions,
    pub num_locals: usize,
    pub num_parameters: usize,
    pub num_free: usize,
}

pub struct ClosureObj {
    pub func: Rc<CompiledFunctionObj>,
    pub free: Vec<Value>,
}

pub struct BuiltinObj {
    pub name: &'static str,
    pub func: fn(&[Value]) -> Value,
}

impl Value {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION_OBJ",
            Value::Closure(_) => "CLOSURE",
            Value::Builtin(_) => "BUILTIN",
            Value::Error(_) => "ERROR",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Null => false,
            Value::Integer(n) => *n != 0,
            _ => true,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    pub fn new_error(msg: impl Into<String>) -> Value {
        Value::Error(Rc::new(msg.into()))
    }

    pub fn hash_key(&self) -> Option<HashKey> {
        HashKey::from_value(self)
    }

    pub fn inspect(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Null => write!(f, "null"),
            Value::Str(s) => write!(f, "{}", s),
            Value::Array(items) => {
                let parts: Vec<String> = items.borrow().iter().map(|v| v.inspect()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Hash(h) => {
                let parts: Vec<String> = h
                    .pairs
                    .borrow()
                    .values()
                    .map(|(k, v)| format!("{}: {}", k.inspect(), v.inspect()))
                    .collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Value::Function(func) => {
                let params: Vec<String> = func.parameters.iter().map(|p| p.name.clone()).collect();
                write!(f, "fn({}) {{\n{}\n}}", params.join(", "), fmt_body(&func.body))
            }
            Value::CompiledFunction(cf) => write!(f, "CompiledFunction[{:p}]", Rc::as_ptr(cf)),
            Value::Closure(c) => write!(f, "Closure[{:p}]", Rc::as_ptr(c)),
            Value::Builtin(b) => write!(f, "builtin function {}", b.name),
            Value::Error(msg) => write!(f, "ERROR: {}", msg),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.type_tag(), self)
    }
}

fn fmt_body(body: &BlockStatement) -> String {
    body.statements.iter().map(|s| s.inner.to_string()).collect::<Vec<_>>().join("\n")
}

/// Truth table for the `!` prefix operator, shared by the VM and the
/// tree-walking evaluator. Deliberately NOT the same as `is_truthy`:
/// `!5` is `false`, and so is `!0` — only `Boolean`/`Null` get special-cased,
/// every other value maps to `false`.
pub fn bang_value(value: &Value) -> Value {
    match value {
        Value::Boolean(true) => Value::Boolean(false),
        Value::Boolean(false) => Value::Boolean(true),
        Value::Null => Value::Boolean(true),
        _ => Value::Boolean(false),
    }
}

pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => x == y,
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Str(x), Value::Str(y)) => x == y,
        _ => false,
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other)
    }
}
