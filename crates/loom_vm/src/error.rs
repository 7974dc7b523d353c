use std::fmt;

/// Runtime errors the VM's dispatch loop can raise. A flat enum with
/// `Display` for human-readable messages; nothing wraps these further so
/// no `source()` chaining is needed.
#[derive(Debug, Clone, PartialEq)]
pub enum VmError {
    StackOverflow,
    TypeError(String),
    UnknownOperator(String),
    NotCallable(String),
    ArityMismatch { expected: usize, got: usize },
    DivisionByZero,
    Generic(String),
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VmError::StackOverflow => write!(f, "[RuntimeError] stack overflow"),
            VmError::TypeError(m) => write!(f, "[RuntimeError] {}", m),
            VmError::UnknownOperator(m) => write!(f, "[RuntimeError] {}", m),
            VmError::NotCallable(t) => write!(f, "[RuntimeError] calling non-function and non-built-in: {}", t),
            VmError::ArityMismatch { expected, got } => write!(
                f,
                "[RuntimeError] wrong number of arguments: want={}, got={}",
                expected, got
            ),
            VmError::DivisionByZero => write!(f, "[RuntimeError] division by zero"),
            VmError::Generic(m) => write!(f, "[RuntimeError] {}", m),
        }
    }
}

impl std::error::Error for VmError {}

pub type VmResult<T = ()> = Result<T, VmError>;
