use crate::error::{CompileError, CompileResult};
use crate::symbol_table::{SymbolScope, SymbolTable};
use loom_code::{make, Instructions, Op};
use loom_object::{builtins, CompiledFunctionObj, Value};
use loom_parser::{BlockStatement, Expr, ExprKind, Program, Stmt, StmtKind};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, Default)]
struct EmittedInstruction {
    opcode: Option<Op>,
    position: usize,
}

struct CompilationScope {
    instructions: Instructions,
    last_instruction: EmittedInstruction,
    previous_instruction: EmittedInstruction,
}

impl CompilationScope {
    fn new() -> Self {
        CompilationScope {
            instructions: Instructions::new(),
            last_instruction: EmittedInstruction::default(),
            previous_instruction: EmittedInstruction::default(),
        }
    }
}

pub struct Bytecode {
    pub instructions: Instructions,
    pub constants: Vec<Value>,
}

pub struct Compiler {
    constants: Vec<Value>,
    symbol_table: SymbolTable,
    scopes: Vec<CompilationScope>,
}

impl Compiler {
    pub fn new() -> Self {
        let mut symbol_table = SymbolTable::new();
        for (idx, (name, _)) in builtins::BUILTINS.iter().enumerate() {
            symbol_table.define_builtin(idx, name);
        }
        Compiler { constants: Vec::new(), symbol_table, scopes: vec![CompilationScope::new()] }
    }

    /// Threads the globals/constants of a prior compilation through a new
    /// one, so a REPL can keep accumulating bindings across lines.
    pub fn new_with_state(symbol_table: SymbolTable, constants: Vec<Value>) -> Self {
        Compiler { constants, symbol_table, scopes: vec![CompilationScope::new()] }
    }

    pub fn into_state(self) -> (SymbolTable, Vec<Value>) {
        (self.symbol_table, self.constants)
    }

    /// Combines `bytecode()` and `into_state()` for callers (the REPL) that
    /// need both the finished instruction stream and the symbol table to
    /// thread into the next line's `Compiler::new_with_state`.
    pub fn finish(mut self) -> (Bytecode, SymbolTable) {
        let instructions = self.scopes.pop().unwrap().instructions;
        let bytecode = Bytecode { instructions, constants: self.constants };
        (bytecode, self.symbol_table)
    }

    pub fn compile_program(&mut self, program: &Program) -> CompileResult<()> {
        for stmt in &program.statements {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    pub fn bytecode(self) -> Bytecode {
        Bytecode { instructions: self.current_instructions_owned(), constants: self.constants }
    }

    fn current_instructions_owned(mut self) -> Instructions {
        self.scopes.pop().unwrap().instructions
    }

    fn current_scope(&mut self) -> &mut CompilationScope {
        self.scopes.last_mut().unwrap()
    }

    fn compile_statement(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match &stmt.inner {
            StmtKind::Let { name, value } => {
                self.compile_expression(value)?;
                let symbol = self.symbol_table.define(&name.name);
                match symbol.scope {
                    SymbolScope::Global => self.emit(Op::SetGlobal, &[symbol.index]),
                    _ => self.emit(Op::SetLocal, &[symbol.index]),
                };
            }
            StmtKind::Return { value } => {
                self.compile_expression(value)?;
                self.emit(Op::ReturnValue, &[]);
            }
            StmtKind::Expression { expression } => {
                self.compile_expression(expression)?;
                self.emit(Op::Pop, &[]);
            }
        }
        Ok(())
    }

    fn compile_block(&mut self, block: &BlockStatement) -> CompileResult<()> {
        for stmt in &block.statements {
            self.compile_statement(stmt)?;
        }
        Ok(())
    }

    fn compile_expression(&mut self, expr: &Expr) -> CompileResult<()> {
        match &expr.inner {
            ExprKind::IntegerLiteral(v) => {
                let idx = self.add_constant(Value::Integer(*v));
                self.emit(Op::Constant, &[idx]);
            }
            ExprKind::Boolean(true) => {
                self.emit(Op::True, &[]);
            }
            ExprKind::Boolean(false) => {
                self.emit(Op::False, &[]);
            }
            ExprKind::StringLiteral(s) => {
                let idx = self.add_constant(Value::Str(Rc::new(s.clone())));
                self.emit(Op::Constant, &[idx]);
            }
            ExprKind::Identifier(name) => {
                let symbol = self
                    .symbol_table
                    .resolve(name)
                    .ok_or_else(|| CompileError::UndefinedVariable(name.clone()))?;
                self.load_symbol(&symbol);
            }
            ExprKind::Prefix { operator, right } => {
                self.compile_expression(right)?;
                match operator.as_str() {
                    "!" => self.emit(Op::Bang, &[]),
                    "-" => self.emit(Op::Minus, &[]),
                    other => return Err(CompileError::UnknownOperator(other.to_string())),
                };
            }
            ExprKind::Infix { left, operator, right } => {
                if operator == "<" {
                    self.compile_expression(right)?;
                    self.compile_expression(left)?;
                    self.emit(Op::GreaterThan, &[]);
                    return Ok(());
                }
                self.compile_expression(left)?;
                self.compile_expression(right)?;
                match operator.as_str() {
                    "+" => self.emit(Op::Add, &[]),
                    "-" => self.emit(Op::Sub, &[]),
                    "*" => self.emit(Op::Mul, &[]),
                    "/" => self.emit(Op::Div, &[]),
                    ">" => self.emit(Op::GreaterThan, &[]),
                    "==" => self.emit(Op::Equal, &[]),
                    "!=" => self.emit(Op::NotEqual, &[]),
                    other => return Err(CompileError::UnknownOperator(other.to_string())),
                };
            }
            ExprKind::If { condition, consequence, alternative } => {
                self.compile_expression(condition)?;
                let jump_not_truthy_pos = self.emit(Op::JumpNotTruthy, &[9999]);

                self.compile_block(consequence)?;
                if self.last_instruction_is(Op::Pop) {
                    self.remove_last_instruction();
                }

                let jump_pos = self.emit(Op::Jump, &[9999]);
                let after_consequence_pos = self.current_scope().instructions.len();
                self.change_operand(jump_not_truthy_pos, after_consequence_pos);

                match alternative {
                    None => {
                        self.emit(Op::Null, &[]);
                    }
                    Some(alt) => {
                        self.compile_block(alt)?;
                        if self.last_instruction_is(Op::Pop) {
                            self.remove_last_instruction();
                        }
                    }
                }

                let after_alternative_pos = self.current_scope().instructions.len();
                self.change_operand(jump_pos, after_alternative_pos);
            }
            ExprKind::ArrayLiteral(items) => {
                for item in items {
                    self.compile_expression(item)?;
                }
                self.emit(Op::Array, &[items.len()]);
            }
            ExprKind::HashLiteral(pairs) => {
                let mut sorted: Vec<&(Expr, Expr)> = pairs.iter().collect();
                sorted.sort_by_key(|(k, _)| k.inner.to_string());
                for (key, value) in &sorted {
                    self.compile_expression(key)?;
                    self.compile_expression(value)?;
                }
                self.emit(Op::Hash, &[pairs.len() * 2]);
            }
            ExprKind::Index { left, index } => {
                self.compile_expression(left)?;
                self.compile_expression(index)?;
                self.emit(Op::Index, &[]);
            }
            ExprKind::FunctionLiteral { parameters, body, name } => {
                self.enter_scope();

                if let Some(fn_name) = name {
                    self.symbol_table.define_function_name(fn_name);
                }

                for param in parameters {
                    self.symbol_table.define(&param.name);
                }

                self.compile_block(body)?;

                if self.last_instruction_is(Op::Pop) {
                    self.replace_last_pop_with_return();
                }
                if !self.last_instruction_is(Op::ReturnValue) {
                    self.emit(Op::Return, &[]);
                }

                let free_symbols = self.symbol_table.free_symbols.clone();
                let num_locals = self.symbol_table.num_definitions();
                let instructions = self.leave_scope();

                for sym in &free_symbols {
                    self.load_symbol(sym);
                }

                let compiled = Value::CompiledFunction(Rc::new(CompiledFunctionObj {
                    instructions,
                    num_locals,
                    num_parameters: parameters.len(),
                    num_free: free_symbols.len(),
                }));
                let const_idx = self.add_constant(compiled);
                self.emit(Op::Closure, &[const_idx, free_symbols.len()]);
            }
            ExprKind::MacroLiteral { .. } => {
                // Macros are expanded by loom_eval's macro_expansion pass
                // before compilation ever sees a program; one should never
                // reach the compiler.
            }
            ExprKind::Call { function, arguments } => {
                self.compile_expression(function)?;
                for arg in arguments {
                    self.compile_expression(arg)?;
                }
                self.emit(Op::Call, &[arguments.len()]);
            }
            ExprKind::Error => {}
        }
        Ok(())
    }

    fn load_symbol(&mut self, symbol: &crate::symbol_table::Symbol) {
        match symbol.scope {
            SymbolScope::Global => self.emit(Op::GetGlobal, &[symbol.index]),
            SymbolScope::Local => self.emit(Op::GetLocal, &[symbol.index]),
            SymbolScope::Builtin => self.emit(Op::GetBuiltin, &[symbol.index]),
            SymbolScope::Free => self.emit(Op::GetFree, &[symbol.index]),
            SymbolScope::Function => self.emit(Op::CurrentClosure, &[]),
        };
    }

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::new());
        let outer = std::mem::replace(&mut self.symbol_table, SymbolTable::new());
        self.symbol_table = SymbolTable::new_enclosed(outer);
    }

    fn leave_scope(&mut self) -> Instructions {
        let scope = self.scopes.pop().unwrap();
        let outer = std::mem::replace(&mut self.symbol_table, SymbolTable::new());
        self.symbol_table = outer.leave();
        scope.instructions
    }

    fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value);
        self.constants.len() - 1
    }

    fn emit(&mut self, op: Op, operands: &[usize]) -> usize {
        let instruction = make(op, operands);
        let pos = self.add_instruction(&instruction);
        self.set_last_instruction(op, pos);
        pos
    }

    fn add_instruction(&mut self, ins: &[u8]) -> usize {
        let scope = self.current_scope();
        let pos = scope.instructions.len();
        scope.instructions.extend(ins);
        pos
    }

    fn set_last_instruction(&mut self, op: Op, pos: usize) {
        let scope = self.current_scope();
        scope.previous_instruction = scope.last_instruction;
        scope.last_instruction = EmittedInstruction { opcode: Some(op), position: pos };
    }

    fn last_instruction_is(&mut self, op: Op) -> bool {
        if self.current_scope().instructions.is_empty() {
            return false;
        }
        self.current_scope().last_instruction.opcode == Some(op)
    }

    fn remove_last_instruction(&mut self) {
        let scope = self.current_scope();
        let last_pos = scope.last_instruction.position;
        scope.instructions.0.truncate(last_pos);
        scope.last_instruction = scope.previous_instruction;
    }

    fn replace_instruction(&mut self, pos: usize, new_instruction: &[u8]) {
        let scope = self.current_scope();
        for (i, byte) in new_instruction.iter().enumerate() {
            scope.instructions.0[pos + i] = *byte;
        }
    }

    fn replace_last_pop_with_return(&mut self) {
        let last_pos = self.current_scope().last_instruction.position;
        let new_instruction = make(Op::ReturnValue, &[]);
        self.replace_instruction(last_pos, &new_instruction);
        self.current_scope().last_instruction.opcode = Some(Op::ReturnValue);
    }

    fn change_operand(&mut self, op_pos: usize, operand: usize) {
        let op = Op::from_byte(self.current_scope().instructions[op_pos]).unwrap();
        let new_instruction = make(op, &[operand]);
        self.replace_instruction(op_pos, &new_instruction);
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Compiler::new()
    }
}
