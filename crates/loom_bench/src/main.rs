use std::time::Instant;

/// Recursive fibonacci(35) run through both back-ends, timed with `Instant`.
/// Same `-engine` flag and program as the reference Go benchmark this is
/// ported from, hand-parsed via `std::env::args()` with no `clap`.
const INPUT: &str = "
let fibonacci = fn(x) {
    if (x == 0) {
        return 0;
    }
    if (x == 1) {
        return 1;
    }
    return fibonacci(x - 1) + fibonacci(x - 2);
};
fibonacci(35);
";

fn main() {
    let engine = std::env::args().nth(1).unwrap_or_else(|| "vm".to_string());
    let engine = engine.strip_prefix("--engine=").unwrap_or(&engine);

    let (result, duration) = match engine {
        "vm" => {
            let start = Instant::now();
            let result = loom_vm::run_source(INPUT).unwrap_or_else(|e| {
                eprintln!("vm error: {}", e);
                std::process::exit(1);
            });
            (result, start.elapsed())
        }
        "eval" => {
            let start = Instant::now();
            let result = loom_eval::eval_source(INPUT).unwrap_or_else(|e| {
                eprintln!("eval error: {}", e);
                std::process::exit(1);
            });
            (result, start.elapsed())
        }
        other => {
            eprintln!("loom_bench: unknown engine '{}': want vm or eval", other);
            std::process::exit(1);
        }
    };

    println!("engine: {}, result: {}, duration: {:?}", engine, result.inspect(), duration);
}
