use std::io;

use loom_repl::Engine;

/// Standalone REPL binary, in case something wants to run the REPL directly
/// rather than through `loom`'s zero-arg dispatch. Accepts the same
/// `--engine vm|eval` flag as `loom` for consistency.
fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let engine = match args.as_slice() {
        [] => Engine::Vm,
        [flag, value] if flag == "--engine" => match value.as_str() {
            "vm" => Engine::Vm,
            "eval" => Engine::Eval,
            other => {
                eprintln!("loom_repl: unknown engine '{}': want vm or eval", other);
                std::process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage: loom_repl [--engine vm|eval]");
            std::process::exit(1);
        }
    };

    loom_repl::start(engine, io::stdin().lock(), io::stdout());
}
