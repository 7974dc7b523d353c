pub mod builtins;
pub mod environment;
pub mod hashkey;
pub mod value;

pub use environment::Environment;
pub use hashkey::HashKey;
pub use value::{
    bang_value, values_equal, BuiltinObj, ClosureObj, CompiledFunctionObj, FunctionObj, HashObj,
    Value,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_truthiness() {
        assert!(!Value::Integer(0).is_truthy());
        assert!(Value::Integer(1).is_truthy());
        assert!(Value::Integer(-1).is_truthy());
        assert!(Value::Boolean(true).is_truthy());
        assert!(!Value::Boolean(false).is_truthy());
        assert!(!Value::Null.is_truthy());
    }

    #[test]
    fn t_hash_key_equality_by_value() {
        let a = Value::Str(std::rc::Rc::new("foo".to_string()));
        let b = Value::Str(std::rc::Rc::new("foo".to_string()));
        assert_eq!(a.hash_key().unwrap(), b.hash_key().unwrap());
    }

    #[test]
    fn t_hash_key_unhashable_values() {
        let arr = Value::Array(std::rc::Rc::new(std::cell::RefCell::new(vec![])));
        assert!(arr.hash_key().is_none());
    }

    #[test]
    fn t_values_equal() {
        assert!(values_equal(&Value::Integer(5), &Value::Integer(5)));
        assert!(!values_equal(&Value::Integer(5), &Value::Integer(6)));
    }

    #[test]
    fn t_inspect_array() {
        let arr = Value::Array(std::rc::Rc::new(std::cell::RefCell::new(vec![
            Value::Integer(1),
            Value::Integer(2),
        ])));
        assert_eq!(arr.inspect(), "[1, 2]");
    }
}
