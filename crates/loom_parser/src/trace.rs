use std::cell::Cell;

/// Enter/exit tracing for the Pratt parser, off by default. Mirrors the
/// book's `trace`/`untrace` debug helpers but as a value the parser owns
/// instead of package-level mutable state.
pub struct Tracer {
    enabled: bool,
    depth: Cell<usize>,
}

impl Tracer {
    pub fn new(enabled: bool) -> Self {
        Tracer { enabled, depth: Cell::new(0) }
    }

    pub fn enter(&self, what: &str) {
        if !self.enabled {
            return;
        }
        let d = self.depth.get();
        eprintln!("{}BEGIN {}", "\t".repeat(d), what);
        self.depth.set(d + 1);
    }

    pub fn exit(&self, what: &str) {
        if !self.enabled {
            return;
        }
        let d = self.depth.get().saturating_sub(1);
        self.depth.set(d);
        eprintln!("{}END {}", "\t".repeat(d), what);
    }
}
