use std::fmt;

use loom_compiler::{CompileError, Compiler};
use loom_object::Value;

use crate::error::VmError;
use crate::vm::Vm;

/// Wraps every failure `run_source` can hit on the way from raw text to a
/// popped value. Mirrors `loom_eval::EvalError`'s shape, extended with the
/// two extra horizons compiling to bytecode adds: compile-time, then
/// runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    Lex(Vec<loom_lexer::LexError>),
    Parse(Vec<loom_parser::ParseError>),
    Compile(CompileError),
    Runtime(VmError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Lex(errs) => {
                for e in errs {
                    writeln!(f, "{}", e)?;
                }
                Ok(())
            }
            RunError::Parse(errs) => {
                for e in errs {
                    writeln!(f, "{}", e)?;
                }
                Ok(())
            }
            RunError::Compile(e) => write!(f, "{}", e),
            RunError::Runtime(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for RunError {}

pub type RunResult<T> = Result<T, RunError>;

/// Parses, compiles, and runs one program end to end, the VM counterpart of
/// `loom_eval::eval_source` used by `loom`'s `--engine vm` path (the
/// default) and by `loom_bench`.
pub fn run_source(source: &str) -> RunResult<Value> {
    let (program, lex_errors, parse_errors) = loom_parser::parse(source);
    if !lex_errors.is_empty() {
        return Err(RunError::Lex(lex_errors));
    }
    if !parse_errors.is_empty() {
        return Err(RunError::Parse(parse_errors));
    }

    let mut compiler = Compiler::new();
    compiler.compile_program(&program).map_err(RunError::Compile)?;
    let bytecode = compiler.bytecode();

    let mut vm = Vm::new(bytecode);
    vm.run().map_err(RunError::Runtime)?;
    Ok(vm.last_popped_stack_element())
}
