use std::io::{self, BufRead, Write};

use loom_compiler::{Compiler, SymbolTable};
use loom_object::{Environment, Value};
use loom_vm::Vm;

const PROMPT: &str = "monkey > ";

const MONKEY_FACE: &str = r#"            __,__
   .--.  .-"     "-.  .--.
  / .. \/  .-. .-.  \/ .. \
 | |  '|  /   Y   \  |'  | |
 | \   \  \ 0 | 0 /  /   / |
  \ '- ,\.-"""""""-./, -' /
   ''-' /_   ^ ^   _\ '-''
       |  \._   _./  |
       \   \ '~' /   /
        '._ '-=-' _.'
           '-----'
"#;

/// Which back-end the REPL feeds each line to. The VM path is the default —
/// it's the one where compiler/symbol-table/globals state threads across
/// iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    Vm,
    Eval,
}

/// Runs the interactive loop against `in_`/`out`, grounded on
/// `original_source/monkey/repl/repl.go`'s `Start(in, out)` — generalized
/// here to dispatch across both back-ends and to thread compiler/VM state
/// (or the tree-walker's shared environment) across lines instead of
/// discarding it after printing the parsed program back, the way the
/// pre-compiler book chapter's REPL does.
pub fn start(engine: Engine, in_: impl BufRead, mut out: impl Write) {
    let mut lines = in_.lines();

    match engine {
        Engine::Vm => run_vm_repl(&mut lines, &mut out),
        Engine::Eval => run_eval_repl(&mut lines, &mut out),
    }
}

fn run_vm_repl(lines: &mut impl Iterator<Item = io::Result<String>>, out: &mut impl Write) {
    let mut symbol_table = SymbolTable::new();
    for (idx, (name, _)) in loom_object::builtins::BUILTINS.iter().enumerate() {
        symbol_table.define_builtin(idx, name);
    }
    let mut constants: Vec<Value> = Vec::new();
    let mut globals: Vec<Value> = vec![Value::Null; loom_vm::GLOBALS_SIZE];

    loop {
        let _ = write!(out, "{}", PROMPT);
        let _ = out.flush();

        let line = match lines.next() {
            Some(Ok(l)) => l,
            Some(Err(e)) => {
                let _ = writeln!(out, "error reading input: {}", e);
                return;
            }
            None => return,
        };

        let (program, lex_errors, parse_errors) = loom_parser::parse(&line);
        if !lex_errors.is_empty() || !parse_errors.is_empty() {
            print_parser_errors(out, &lex_errors, &parse_errors);
            continue;
        }

        let mut compiler = Compiler::new_with_state(symbol_table, constants);
        if let Err(e) = compiler.compile_program(&program) {
            let _ = writeln!(out, "compilation failed:\n\t{}", e);
            // Recover the state from just before this failed line so the
            // next one can still see every binding that compiled cleanly.
            let (restored_symbols, restored_constants) = compiler.into_state();
            symbol_table = restored_symbols;
            constants = restored_constants;
            continue;
        }
        let (bytecode, new_symbol_table) = compiler.finish();
        symbol_table = new_symbol_table;
        constants = bytecode.constants.clone();

        let mut vm = Vm::new_with_state(bytecode, globals);
        if let Err(e) = vm.run() {
            let _ = writeln!(out, "executing bytecode failed:\n\t{}", e);
            globals = vm.into_globals();
            continue;
        }
        let result = vm.last_popped_stack_element();
        globals = vm.into_globals();
        let _ = writeln!(out, "{}", result.inspect());
    }
}

fn run_eval_repl(lines: &mut impl Iterator<Item = io::Result<String>>, out: &mut impl Write) {
    let env = Environment::new();

    loop {
        let _ = write!(out, "{}", PROMPT);
        let _ = out.flush();

        let line = match lines.next() {
            Some(Ok(l)) => l,
            Some(Err(e)) => {
                let _ = writeln!(out, "error reading input: {}", e);
                return;
            }
            None => return,
        };

        let (mut program, lex_errors, parse_errors) = loom_parser::parse(&line);
        if !lex_errors.is_empty() || !parse_errors.is_empty() {
            print_parser_errors(out, &lex_errors, &parse_errors);
            continue;
        }

        let macros = loom_eval::macro_expansion::define_macros(&mut program);
        let program = loom_eval::macro_expansion::expand_macros(program, &macros);

        let mut interp = loom_eval::Interpreter::with_env(env.clone());
        let result = interp.eval_program(&program);
        let _ = writeln!(out, "{}", result.inspect());
    }
}

fn print_parser_errors(
    out: &mut impl Write,
    lex_errors: &[loom_lexer::LexError],
    parse_errors: &[loom_parser::ParseError],
) {
    let _ = write!(out, "{}", MONKEY_FACE);
    let _ = writeln!(out, "Whoops! We ran into some business here:");
    for e in lex_errors {
        let _ = writeln!(out, "\t{}", e);
    }
    for e in parse_errors {
        let _ = writeln!(out, "\t{}", e);
    }
}
