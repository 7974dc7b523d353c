pub mod error;
pub mod interpreter;
pub mod macro_expansion;

pub use error::{EvalError, EvalResult};
pub use interpreter::Interpreter;
pub use loom_object::Value;

/// Parses, expands macros, and evaluates in one call — the tree-walking
/// equivalent of `loom_vm::run_source` used by `loom`'s `--engine eval` path.
pub fn eval_source(source: &str) -> EvalResult<Value> {
    let (mut program, lex_errors, parse_errors) = loom_parser::parse(source);
    if !lex_errors.is_empty() {
        return Err(EvalError::Lex(lex_errors));
    }
    if !parse_errors.is_empty() {
        return Err(EvalError::Parse(parse_errors));
    }
    let macros = macro_expansion::define_macros(&mut program);
    let program = macro_expansion::expand_macros(program, &macros);
    let mut interp = Interpreter::new();
    Ok(interp.eval_program(&program))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_eval_source_runs_end_to_end() {
        match eval_source("let x = 2 + 3; x * x;") {
            Ok(Value::Integer(25)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn t_eval_source_reports_parse_errors() {
        assert!(eval_source("let = 5;").is_err());
    }

    #[test]
    fn t_eval_source_expands_macros_before_running() {
        let src = r#"
            let unless = macro(condition, consequence, alternative) {
                quote(if (!(unquote(condition))) {
                    unquote(consequence);
                } else {
                    unquote(alternative);
                });
            };
            unless(10 > 5, 100, 200);
        "#;
        match eval_source(src) {
            Ok(Value::Integer(200)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
