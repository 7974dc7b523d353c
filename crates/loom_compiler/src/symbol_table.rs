use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    Builtin,
    Free,
    Function,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub scope: SymbolScope,
    pub index: usize,
}

/// One lexical scope. Scopes nest via `outer`, which this compiler owns
/// as a `Box` rather than sharing through `Rc<RefCell<_>>` — only one
/// scope is ever live at a time during compilation (`enter_scope`/
/// `leave_scope` push and pop it like a stack), so plain ownership
/// suffices.
pub struct SymbolTable {
    outer: Option<Box<SymbolTable>>,
    store: FxHashMap<String, Symbol>,
    pub free_symbols: Vec<Symbol>,
    num_definitions: usize,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            outer: None,
            store: FxHashMap::default(),
            free_symbols: Vec::new(),
            num_definitions: 0,
        }
    }

    pub fn new_enclosed(outer: SymbolTable) -> Self {
        SymbolTable {
            outer: Some(Box::new(outer)),
            store: FxHashMap::default(),
            free_symbols: Vec::new(),
            num_definitions: 0,
        }
    }

    /// Pops back to the enclosing scope, discarding this one. Call only
    /// after pulling out whatever `free_symbols` the compiler needs to
    /// emit `OpGetFree`/`OpGetLocal` captures for.
    pub fn leave(self) -> SymbolTable {
        *self.outer.expect("leave() called on the outermost symbol table")
    }

    pub fn num_definitions(&self) -> usize {
        self.num_definitions
    }

    pub fn define(&mut self, name: &str) -> Symbol {
        let scope = if self.outer.is_none() { SymbolScope::Global } else { SymbolScope::Local };
        let symbol = Symbol { name: name.to_string(), scope, index: self.num_definitions };
        self.store.insert(name.to_string(), symbol.clone());
        self.num_definitions += 1;
        symbol
    }

    pub fn define_builtin(&mut self, index: usize, name: &str) -> Symbol {
        let symbol = Symbol { name: name.to_string(), scope: SymbolScope::Builtin, index };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    /// Binds a function's own name inside its body, enabling anonymous
    /// self-recursion (`OpCurrentClosure` at the VM side).
    pub fn define_function_name(&mut self, name: &str) -> Symbol {
        let symbol = Symbol { name: name.to_string(), scope: SymbolScope::Function, index: 0 };
        self.store.insert(name.to_string(), symbol.clone());
        symbol
    }

    fn define_free(&mut self, original: Symbol) -> Symbol {
        self.free_symbols.push(original.clone());
        let symbol = Symbol {
            name: original.name,
            scope: SymbolScope::Free,
            index: self.free_symbols.len() - 1,
        };
        self.store.insert(symbol.name.clone(), symbol.clone());
        symbol
    }

    /// Resolves `name`, walking outward through enclosing scopes. A name
    /// found in an outer *function* scope (not Global/Builtin, which are
    /// reachable from anywhere) is lazily promoted to a Free variable in
    /// every scope between its definition and this call, side-effecting
    /// `free_symbols` along the way so the compiler can emit the capture
    /// chain.
    pub fn resolve(&mut self, name: &str) -> Option<Symbol> {
        if let Some(symbol) = self.store.get(name) {
            return Some(symbol.clone());
        }

        let outer = self.outer.as_mut()?;
        let symbol = outer.resolve(name)?;

        if symbol.scope == SymbolScope::Global || symbol.scope == SymbolScope::Builtin {
            return Some(symbol);
        }

        Some(self.define_free(symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_define() {
        let mut global = SymbolTable::new();
        let a = global.define("a");
        assert_eq!(a, Symbol { name: "a".into(), scope: SymbolScope::Global, index: 0 });
        let b = global.define("b");
        assert_eq!(b, Symbol { name: "b".into(), scope: SymbolScope::Global, index: 1 });
    }

    #[test]
    fn t_resolve_global() {
        let mut global = SymbolTable::new();
        global.define("a");
        global.define("b");
        assert_eq!(global.resolve("a").unwrap().scope, SymbolScope::Global);
        assert_eq!(global.resolve("b").unwrap().index, 1);
    }

    #[test]
    fn t_resolve_local() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut local = SymbolTable::new_enclosed(global);
        local.define("b");
        assert_eq!(local.resolve("a").unwrap().scope, SymbolScope::Global);
        assert_eq!(local.resolve("b").unwrap().scope, SymbolScope::Local);
    }

    #[test]
    fn t_resolve_nested_local() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut first = SymbolTable::new_enclosed(global);
        first.define("b");
        let mut second = SymbolTable::new_enclosed(first);
        second.define("c");

        assert_eq!(second.resolve("a").unwrap().scope, SymbolScope::Global);
        assert_eq!(second.resolve("b").unwrap().scope, SymbolScope::Free);
        assert_eq!(second.resolve("c").unwrap().scope, SymbolScope::Local);
    }

    #[test]
    fn t_resolve_builtins() {
        let mut global = SymbolTable::new();
        global.define_builtin(0, "len");
        let mut local = SymbolTable::new_enclosed(global);
        let mut deeper = SymbolTable::new_enclosed(SymbolTable::new());
        assert_eq!(local.resolve("len").unwrap().scope, SymbolScope::Builtin);
        deeper.define_builtin(0, "len");
        assert_eq!(deeper.resolve("len").unwrap().scope, SymbolScope::Builtin);
    }

    #[test]
    fn t_free_variables_recorded_on_resolve() {
        let mut global = SymbolTable::new();
        global.define("a");
        let mut first = SymbolTable::new_enclosed(global);
        first.define("b");
        let mut second = SymbolTable::new_enclosed(first);
        second.define("c");

        let resolved_b = second.resolve("b").unwrap();
        assert_eq!(resolved_b.scope, SymbolScope::Free);
        assert_eq!(resolved_b.index, 0);
        assert_eq!(second.free_symbols.len(), 1);
        assert_eq!(second.free_symbols[0].name, "b");
    }

    #[test]
    fn t_define_and_resolve_function_name() {
        let mut global = SymbolTable::new();
        global.define_function_name("fib");
        let sym = global.resolve("fib").unwrap();
        assert_eq!(sym.scope, SymbolScope::Function);
    }

    #[test]
    fn t_shadowing_function_name() {
        let mut global = SymbolTable::new();
        global.define_function_name("fib");
        global.define("fib");
        let sym = global.resolve("fib").unwrap();
        assert_eq!(sym.scope, SymbolScope::Global);
    }
}
