use crate::value::Value;
use std::hash::{Hash, Hasher};

/// A hashable projection of a `Value`, used as the key type for
/// `Value::Hash`. Only `Integer`/`Boolean`/`Str` are hashable — anything
/// else (`Array`, `Hash`, functions, ...) has no stable identity to key
/// on, matching `original_source/monkey/object`'s `Hashable` interface,
/// which only `Integer`, `Boolean`, and `String` implement.
///
/// String equality is by value, not by `Rc` pointer identity, so two
/// distinct `Rc<String>`s with the same contents collide and compare
/// equal as hash keys.
#[derive(Clone, Debug)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    Str(String),
}

impl HashKey {
    pub fn from_value(value: &Value) -> Option<HashKey> {
        match value {
            Value::Integer(v) => Some(HashKey::Integer(*v)),
            Value::Boolean(v) => Some(HashKey::Boolean(*v)),
            Value::Str(s) => Some(HashKey::Str(s.as_str().to_string())),
            _ => None,
        }
    }

    pub fn inspect(&self) -> String {
        match self {
            HashKey::Integer(v) => v.to_string(),
            HashKey::Boolean(v) => v.to_string(),
            HashKey::Str(s) => s.clone(),
        }
    }
}

impl PartialEq for HashKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HashKey::Integer(a), HashKey::Integer(b)) => a == b,
            (HashKey::Boolean(a), HashKey::Boolean(b)) => a == b,
            (HashKey::Str(a), HashKey::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for HashKey {}

impl Hash for HashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            HashKey::Integer(v) => {
                0u8.hash(state);
                v.hash(state);
            }
            HashKey::Boolean(v) => {
                1u8.hash(state);
                v.hash(state);
            }
            HashKey::Str(s) => {
                2u8.hash(state);
                s.hash(state);
            }
        }
    }
}
