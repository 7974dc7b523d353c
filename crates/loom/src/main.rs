use std::env;
use std::fs;
use std::io;
use std::process;

use loom_repl::Engine;

fn main() {
    let args: Vec<String> = env::args().skip(1).collect();
    let (engine, path) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(msg) => {
            eprintln!("loom: {}", msg);
            process::exit(1);
        }
    };

    match path {
        None => loom_repl::start(engine, io::stdin().lock(), io::stdout()),
        Some(path) => run_file(engine, &path),
    }
}

/// Hand-parsed flags (`std::env::args()`, no `clap`). `--engine` picks
/// the back-end; the flag name and its two values mirror the `-engine`
/// flag of the reference fibonacci benchmark this project ports.
fn parse_args(args: &[String]) -> Result<(Engine, Option<String>), String> {
    let mut engine = Engine::Vm;
    let mut path = None;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--engine" => {
                let value = args.get(i + 1).ok_or_else(|| "--engine requires a value: vm or eval".to_string())?;
                engine = match value.as_str() {
                    "vm" => Engine::Vm,
                    "eval" => Engine::Eval,
                    other => return Err(format!("unknown engine '{}': want vm or eval", other)),
                };
                i += 2;
            }
            other if path.is_none() => {
                path = Some(other.to_string());
                i += 1;
            }
            other => return Err(format!("unexpected argument: {}", other)),
        }
    }
    Ok((engine, path))
}

/// Reads and runs one file. The only failure that earns a non-zero exit
/// code is being unable to read the file at all — parse, compile, and
/// runtime errors print a message and the process still exits 0 (builtin
/// `exit`/`quit` is the one path that chooses its own code).
fn run_file(engine: Engine, path: &str) {
    let source = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("loom: cannot read '{}': {}", path, e);
            process::exit(1);
        }
    };

    match engine {
        Engine::Vm => {
            if let Err(e) = loom_vm::run_source(&source) {
                eprintln!("{}", e);
            }
        }
        Engine::Eval => match loom_eval::eval_source(&source) {
            Ok(value) if value.is_error() => eprintln!("{}", value.inspect()),
            Ok(_) => {}
            Err(e) => eprintln!("{}", e),
        },
    }
}
