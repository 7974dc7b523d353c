use std::fmt;

/// Wraps the lex/parse failures `eval_source` can hit before an `Interpreter`
/// ever sees an AST. Runtime failures don't appear here — they surface as
/// `Value::Error` values, the way `original_source/monkey/eval`'s `Eval`
/// returns an `*object.Error` rather than a Go `error`.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    Lex(Vec<loom_lexer::LexError>),
    Parse(Vec<loom_parser::ParseError>),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvalError::Lex(errs) => {
                for e in errs {
                    writeln!(f, "{}", e)?;
                }
                Ok(())
            }
            EvalError::Parse(errs) => {
                for e in errs {
                    writeln!(f, "{}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for EvalError {}

pub type EvalResult<T> = Result<T, EvalError>;
