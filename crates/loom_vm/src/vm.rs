use crate::error::{VmError, VmResult};
use crate::frame::Frame;
use loom_code::{read_u16, read_u8, Op};
use loom_compiler::Bytecode;
use loom_object::{builtins, values_equal, BuiltinObj, ClosureObj, CompiledFunctionObj, HashObj, Value};
use std::cell::RefCell;
use std::rc::Rc;

pub const STACK_SIZE: usize = 2048;
pub const GLOBALS_SIZE: usize = 65535;
pub const MAX_FRAMES: usize = 512;

/// The stack VM. Owns its operand stack, globals array, and frame stack;
/// nothing here is shared with any other `Vm` instance. Grounded on
/// `original_source/monkey/vm/vm.go`'s `VM` struct, generalized with
/// closures/frames-over-frames per spec's `OpClosure`/`OpGetFree`/
/// `OpCurrentClosure`, which that Go snapshot predates.
pub struct Vm {
    constants: Vec<Value>,
    stack: Vec<Value>,
    sp: usize,
    globals: Vec<Value>,
    frames: Vec<Frame>,
}

impl Vm {
    pub fn new(bytecode: Bytecode) -> Self {
        let main_fn = Rc::new(CompiledFunctionObj {
            instructions: bytecode.instructions,
            num_locals: 0,
            num_parameters: 0,
            num_free: 0,
        });
        let main_closure = Rc::new(ClosureObj { func: main_fn, free: Vec::new() });
        let main_frame = Frame::new(main_closure, 0);

        let mut frames = Vec::with_capacity(MAX_FRAMES);
        frames.push(main_frame);

        Vm {
            constants: bytecode.constants,
            stack: vec![Value::Null; STACK_SIZE],
            sp: 0,
            globals: vec![Value::Null; GLOBALS_SIZE],
            frames,
        }
    }

    /// Threads a prior run's globals through a fresh VM, so a REPL can
    /// keep accumulating top-level `let` bindings across iterations.
    /// Grounded on `original_source/monkey/vm/vm.go`'s `NewWithState`.
    pub fn new_with_state(bytecode: Bytecode, globals: Vec<Value>) -> Self {
        let mut vm = Vm::new(bytecode);
        vm.globals = globals;
        vm
    }

    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    pub fn last_popped_stack_element(&self) -> Value {
        self.stack[self.sp].clone()
    }

    pub fn run(&mut self) -> VmResult<()> {
        loop {
            let closure = self.frames.last().unwrap().closure.clone();
            let ins_len = closure.func.instructions.len();
            let mut ip = self.frames.last().unwrap().ip;

            if (ip + 1) as usize >= ins_len {
                break;
            }
            ip += 1;

            let ins = &closure.func.instructions;
            let op_byte = ins[ip as usize];
            let op = Op::from_byte(op_byte)
                .ok_or_else(|| VmError::Generic(format!("unknown opcode byte {}", op_byte)))?;
            self.frames.last_mut().unwrap().ip = ip;
            let operand_start = ip as usize + 1;

            match op {
                Op::Constant => {
                    let idx = read_u16(&ins[operand_start..]) as usize;
                    self.frames.last_mut().unwrap().ip += 2;
                    let val = self.constants[idx].clone();
                    self.push(val)?;
                }
                Op::True => self.push(Value::Boolean(true))?,
                Op::False => self.push(Value::Boolean(false))?,
                Op::Null => self.push(Value::Null)?,
                Op::Pop => {
                    self.pop();
                }
                Op::Add | Op::Sub | Op::Mul | Op::Div => self.execute_binary_operation(op)?,
                Op::Equal | Op::NotEqual | Op::GreaterThan => self.execute_comparison(op)?,
                Op::Bang => self.execute_bang()?,
                Op::Minus => self.execute_minus()?,
                Op::JumpNotTruthy => {
                    let pos = read_u16(&ins[operand_start..]) as i64;
                    self.frames.last_mut().unwrap().ip += 2;
                    let condition = self.pop();
                    if !condition.is_truthy() {
                        self.frames.last_mut().unwrap().ip = pos - 1;
                    }
                }
                Op::Jump => {
                    let pos = read_u16(&ins[operand_start..]) as i64;
                    self.frames.last_mut().unwrap().ip = pos - 1;
                }
                Op::SetGlobal => {
                    let idx = read_u16(&ins[operand_start..]) as usize;
                    self.frames.last_mut().unwrap().ip += 2;
                    let val = self.pop();
                    self.globals[idx] = val;
                }
                Op::GetGlobal => {
                    let idx = read_u16(&ins[operand_start..]) as usize;
                    self.frames.last_mut().unwrap().ip += 2;
                    self.push(self.globals[idx].clone())?;
                }
                Op::SetLocal => {
                    let idx = read_u8(&ins[operand_start..]) as usize;
                    self.frames.last_mut().unwrap().ip += 1;
                    let base = self.frames.last().unwrap().base_pointer;
                    let val = self.pop();
                    self.stack[base + idx] = val;
                }
                Op::GetLocal => {
                    let idx = read_u8(&ins[operand_start..]) as usize;
                    self.frames.last_mut().unwrap().ip += 1;
                    let base = self.frames.last().unwrap().base_pointer;
                    self.push(self.stack[base + idx].clone())?;
                }
                Op::GetBuiltin => {
                    let idx = read_u8(&ins[operand_start..]) as usize;
                    self.frames.last_mut().unwrap().ip += 1;
                    let (name, func) = builtins::BUILTINS
                        .get(idx)
                        .ok_or_else(|| VmError::Generic(format!("unknown builtin index {}", idx)))?;
                    self.push(Value::Builtin(Rc::new(BuiltinObj { name, func: *func })))?;
                }
                Op::GetFree => {
                    let idx = read_u8(&ins[operand_start..]) as usize;
                    self.frames.last_mut().unwrap().ip += 1;
                    let val = self.frames.last().unwrap().closure.free[idx].clone();
                    self.push(val)?;
                }
                Op::CurrentClosure => {
                    let cl = self.frames.last().unwrap().closure.clone();
                    self.push(Value::Closure(cl))?;
                }
                Op::Array => {
                    let n = read_u16(&ins[operand_start..]) as usize;
                    self.frames.last_mut().unwrap().ip += 2;
                    let start = self.sp - n;
                    let elems = self.stack[start..self.sp].to_vec();
                    self.sp = start;
                    self.push(Value::Array(Rc::new(RefCell::new(elems))))?;
                }
                Op::Hash => {
                    let n = read_u16(&ins[operand_start..]) as usize;
                    self.frames.last_mut().unwrap().ip += 2;
                    let start = self.sp - n;
                    let mut pairs = indexmap::IndexMap::new();
                    let mut i = start;
                    while i < self.sp {
                        let key = self.stack[i].clone();
                        let value = self.stack[i + 1].clone();
                        let hash_key = key
                            .hash_key()
                            .ok_or_else(|| VmError::TypeError(format!("unusable as hash key: {}", key.type_tag())))?;
                        pairs.insert(hash_key, (key, value));
                        i += 2;
                    }
                    self.sp = start;
                    self.push(Value::Hash(Rc::new(HashObj { pairs: RefCell::new(pairs) })))?;
                }
                Op::Index => {
                    let index = self.pop();
                    let left = self.pop();
                    self.execute_index_expression(left, index)?;
                }
                Op::Call => {
                    let nargs = read_u8(&ins[operand_start..]) as usize;
                    self.frames.last_mut().unwrap().ip += 1;
                    self.execute_call(nargs)?;
                }
                Op::ReturnValue => {
                    let return_value = self.pop();
                    let frame = self.frames.pop().unwrap();
                    self.sp = frame.base_pointer - 1;
                    self.push(return_value)?;
                }
                Op::Return => {
                    let frame = self.frames.pop().unwrap();
                    self.sp = frame.base_pointer - 1;
                    self.push(Value::Null)?;
                }
                Op::Closure => {
                    let const_idx = read_u16(&ins[operand_start..]) as usize;
                    let nfree = read_u8(&ins[operand_start + 2..]) as usize;
                    self.frames.last_mut().unwrap().ip += 3;
                    self.push_closure(const_idx, nfree)?;
                }
            }
        }
        Ok(())
    }

    fn push(&mut self, value: Value) -> VmResult<()> {
        if self.sp >= STACK_SIZE {
            return Err(VmError::StackOverflow);
        }
        self.stack[self.sp] = value;
        self.sp += 1;
        Ok(())
    }

    fn pop(&mut self) -> Value {
        let value = self.stack[self.sp - 1].clone();
        self.sp -= 1;
        value
    }

    fn push_closure(&mut self, const_idx: usize, nfree: usize) -> VmResult<()> {
        let function = match &self.constants[const_idx] {
            Value::CompiledFunction(f) => f.clone(),
            other => return Err(VmError::Generic(format!("not a function: {}", other.type_tag()))),
        };
        let start = self.sp - nfree;
        let free = self.stack[start..self.sp].to_vec();
        self.sp = start;
        self.push(Value::Closure(Rc::new(ClosureObj { func: function, free })))
    }

    fn execute_binary_operation(&mut self, op: Op) -> VmResult<()> {
        let right = self.pop();
        let left = self.pop();
        match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => {
                let result = match op {
                    Op::Add => l.checked_add(*r).ok_or_else(|| VmError::Generic("integer overflow".into()))?,
                    Op::Sub => l.checked_sub(*r).ok_or_else(|| VmError::Generic("integer overflow".into()))?,
                    Op::Mul => l.checked_mul(*r).ok_or_else(|| VmError::Generic("integer overflow".into()))?,
                    Op::Div => {
                        if *r == 0 {
                            return Err(VmError::DivisionByZero);
                        }
                        l / r
                    }
                    _ => unreachable!("execute_binary_operation only dispatched for arithmetic ops"),
                };
                self.push(Value::Integer(result))
            }
            (Value::Str(l), Value::Str(r)) => {
                if op != Op::Add {
                    return Err(VmError::UnknownOperator(format!("unknown string operator: {:?}", op)));
                }
                self.push(Value::Str(Rc::new(format!("{}{}", l, r))))
            }
            _ => Err(VmError::TypeError(format!(
                "unsupported types for binary operation: {} {}",
                left.type_tag(),
                right.type_tag()
            ))),
        }
    }

    fn execute_comparison(&mut self, op: Op) -> VmResult<()> {
        let right = self.pop();
        let left = self.pop();

        if let (Value::Integer(l), Value::Integer(r)) = (&left, &right) {
            let result = match op {
                Op::Equal => l == r,
                Op::NotEqual => l != r,
                Op::GreaterThan => l > r,
                _ => unreachable!("execute_comparison only dispatched for comparison ops"),
            };
            return self.push(Value::Boolean(result));
        }

        match op {
            Op::Equal => self.push(Value::Boolean(values_equal(&left, &right))),
            Op::NotEqual => self.push(Value::Boolean(!values_equal(&left, &right))),
            _ => Err(VmError::UnknownOperator(format!(
                "unknown operator: {:?} ({} {})",
                op,
                left.type_tag(),
                right.type_tag()
            ))),
        }
    }

    fn execute_bang(&mut self) -> VmResult<()> {
        let operand = self.pop();
        let result = match operand {
            Value::Boolean(true) => Value::Boolean(false),
            Value::Boolean(false) => Value::Boolean(true),
            Value::Null => Value::Boolean(true),
            _ => Value::Boolean(false),
        };
        self.push(result)
    }

    fn execute_minus(&mut self) -> VmResult<()> {
        let operand = self.pop();
        match operand {
            Value::Integer(v) => self.push(Value::Integer(-v)),
            other => Err(VmError::TypeError(format!("unsupported type for negation: {}", other.type_tag()))),
        }
    }

    fn execute_index_expression(&mut self, left: Value, index: Value) -> VmResult<()> {
        match (&left, &index) {
            (Value::Array(items), Value::Integer(i)) => {
                let items = items.borrow();
                let max = items.len() as i64 - 1;
                if *i < 0 || *i > max {
                    self.push(Value::Null)
                } else {
                    self.push(items[*i as usize].clone())
                }
            }
            (Value::Hash(hash), _) => {
                let key = index
                    .hash_key()
                    .ok_or_else(|| VmError::TypeError(format!("unusable as hash key: {}", index.type_tag())))?;
                let found = hash.pairs.borrow().get(&key).map(|(_, v)| v.clone());
                self.push(found.unwrap_or(Value::Null))
            }
            _ => Err(VmError::TypeError(format!("index operator not supported: {}", left.type_tag()))),
        }
    }

    fn execute_call(&mut self, nargs: usize) -> VmResult<()> {
        let callee = self.stack[self.sp - 1 - nargs].clone();
        match callee {
            Value::Closure(closure) => self.call_closure(closure, nargs),
            Value::Builtin(builtin) => self.call_builtin(builtin, nargs),
            other => Err(VmError::NotCallable(other.type_tag().to_string())),
        }
    }

    fn call_closure(&mut self, closure: Rc<ClosureObj>, nargs: usize) -> VmResult<()> {
        if nargs != closure.func.num_parameters {
            return Err(VmError::ArityMismatch { expected: closure.func.num_parameters, got: nargs });
        }
        if self.frames.len() >= MAX_FRAMES {
            return Err(VmError::StackOverflow);
        }
        let base_pointer = self.sp - nargs;
        let num_locals = closure.func.num_locals;
        self.frames.push(Frame::new(closure, base_pointer));
        self.sp = base_pointer + num_locals;
        Ok(())
    }

    fn call_builtin(&mut self, builtin: Rc<BuiltinObj>, nargs: usize) -> VmResult<()> {
        let args = self.stack[self.sp - nargs..self.sp].to_vec();
        let result = (builtin.func)(&args);
        self.sp -= nargs + 1;
        self.push(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_compiler::Compiler;

    fn run_vm(src: &str) -> Value {
        let (program, lex_errors, parse_errors) = loom_parser::parse(src);
        assert!(lex_errors.is_empty(), "lex errors: {:?}", lex_errors);
        assert!(parse_errors.is_empty(), "parse errors: {:?}", parse_errors);

        let mut compiler = Compiler::new();
        compiler.compile_program(&program).expect("compile error");
        let bytecode = compiler.bytecode();

        let mut vm = Vm::new(bytecode);
        vm.run().expect("vm error");
        vm.last_popped_stack_element()
    }

    fn run_vm_err(src: &str) -> VmError {
        let (program, _, _) = loom_parser::parse(src);
        let mut compiler = Compiler::new();
        compiler.compile_program(&program).expect("compile error");
        let bytecode = compiler.bytecode();
        let mut vm = Vm::new(bytecode);
        vm.run().expect_err("expected a runtime error")
    }

    fn assert_int(src: &str, want: i64) {
        assert!(matches!(run_vm(src), Value::Integer(n) if n == want), "source: {}", src);
    }

    #[test]
    fn t_integer_arithmetic() {
        assert_int("1", 1);
        assert_int("2", 2);
        assert_int("1 + 2", 3);
        assert_int("1 - 2", -1);
        assert_int("1 * 2", 2);
        assert_int("4 / 2", 2);
        assert_int("50 / 2 * 2 + 10 - 5", 55);
        assert_int("5 * (2 + 10)", 60);
        assert_int("-5", -5);
        assert_int("-10 + 5", -5);
    }

    #[test]
    fn t_boolean_expressions() {
        assert_eq!(run_vm("true"), Value::Boolean(true));
        assert_eq!(run_vm("1 < 2"), Value::Boolean(true));
        assert_eq!(run_vm("1 > 2"), Value::Boolean(false));
        assert_eq!(run_vm("1 == 1"), Value::Boolean(true));
        assert_eq!(run_vm("1 != 1"), Value::Boolean(false));
        assert_eq!(run_vm("true == true"), Value::Boolean(true));
        assert_eq!(run_vm("(1 < 2) == true"), Value::Boolean(true));
        assert_eq!(run_vm("!true"), Value::Boolean(false));
        assert_eq!(run_vm("!!true"), Value::Boolean(true));
        assert_eq!(run_vm("!5"), Value::Boolean(false));
        assert_eq!(run_vm("!0"), Value::Boolean(true));
    }

    #[test]
    fn t_integer_zero_is_falsy_in_if() {
        assert_int("if (0) { 10 } else { 20 }", 20);
        assert_int("if (1) { 10 } else { 20 }", 10);
    }

    #[test]
    fn t_conditionals() {
        assert_int("if (true) { 10 }", 10);
        assert_int("if (true) { 10 } else { 20 }", 10);
        assert_int("if (false) { 10 } else { 20 }", 20);
        assert_int("if (1 < 2) { 10 } else { 20 }", 10);
        assert_eq!(run_vm("if (1 > 2) { 10 }"), Value::Null);
        assert_eq!(run_vm("if (false) { 10 }"), Value::Null);
    }

    #[test]
    fn t_global_let_statements() {
        assert_int("let one = 1; one", 1);
        assert_int("let one = 1; let two = 2; one + two", 3);
        assert_int("let one = 1; let two = one + one; one + two", 3);
    }

    #[test]
    fn t_string_expressions() {
        assert_eq!(run_vm(r#""monkey""#), Value::Str(Rc::new("monkey".to_string())));
        assert_eq!(run_vm(r#""mon" + "key""#), Value::Str(Rc::new("monkey".to_string())));
    }

    #[test]
    fn t_array_literals() {
        let val = run_vm("[1, 2, 3]");
        match val {
            Value::Array(items) => {
                let items = items.borrow();
                assert_eq!(items.len(), 3);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn t_hash_literal_and_lookup() {
        assert_int(r#"let h = {"one": 1, "two": 2}; h["one"] + h["two"]"#, 3);
    }

    #[test]
    fn t_index_out_of_bounds_is_null() {
        assert_eq!(run_vm("[1, 2, 3][5]"), Value::Null);
        assert_eq!(run_vm("[1, 2, 3][-1]"), Value::Null);
        assert_eq!(run_vm(r#"{"a": 1}["b"]"#), Value::Null);
    }

    #[test]
    fn t_calling_functions_without_arguments() {
        assert_int("let fivePlusTen = fn() { 5 + 10; }; fivePlusTen();", 15);
        assert_int("let one = fn() { 1; }; let two = fn() { 2; }; one() + two()", 3);
    }

    #[test]
    fn t_functions_with_return_statement() {
        assert_int("let earlyExit = fn() { return 99; 100; }; earlyExit();", 99);
    }

    #[test]
    fn t_functions_without_return_value() {
        assert_eq!(run_vm("let noReturn = fn() { }; noReturn();"), Value::Null);
    }

    #[test]
    fn t_first_class_functions() {
        assert_int(
            "let returnsOne = fn() { 1; }; let returnsOneReturner = fn() { returnsOne; }; returnsOneReturner()();",
            1,
        );
    }

    #[test]
    fn t_calling_functions_with_bindings() {
        assert_int("let one = fn() { let one = 1; one }; one();", 1);
        assert_int("let oneAndTwo = fn() { let one = 1; let two = 2; one + two; }; oneAndTwo();", 3);
    }

    #[test]
    fn t_calling_functions_with_arguments_and_bindings() {
        let src = "let identity = fn(a) { a; }; identity(4);";
        assert_int(src, 4);
        let src = "let sum = fn(a, b) { let c = a + b; c; }; sum(1, 2);";
        assert_int(src, 3);
    }

    #[test]
    fn t_calling_functions_with_wrong_arguments_is_an_error() {
        let err = run_vm_err("fn() { 1; }(1);");
        assert!(matches!(err, VmError::ArityMismatch { expected: 0, got: 1 }));
    }

    #[test]
    fn t_first_class_closures() {
        let src = "let newClosure = fn(a) { fn() { a; }; }; let closure = newClosure(99); closure();";
        assert_int(src, 99);
    }

    #[test]
    fn t_closures_capturing_closures() {
        let src = "let newAdder = fn(a, b) { fn(c) { a + b + c }; }; let adder = newAdder(1, 2); adder(8);";
        assert_int(src, 11);
    }

    #[test]
    fn t_closure_capture_chain() {
        let src =
            "let make = fn(a, b) { fn(c) { fn(d) { a + b + c + d } } }; make(1, 2)(3)(4)";
        assert_int(src, 10);
    }

    #[test]
    fn t_recursive_functions() {
        let src = "let countDown = fn(x) { if (x == 0) { return 0; } else { countDown(x - 1); } }; countDown(1);";
        assert_int(src, 0);
    }

    #[test]
    fn t_recursive_fibonacci() {
        let src = "let fib = fn(x) { if (x < 2) { x } else { fib(x - 1) + fib(x - 2) } }; fib(15);";
        assert_int(src, 610);
    }

    #[test]
    fn t_anonymous_self_recursion_via_current_closure() {
        let src = "let wrapper = fn() { let countDown = fn(x) { if (x == 0) { return 0; } else { countDown(x - 1); } }; countDown(5); }; wrapper();";
        assert_int(src, 0);
    }

    #[test]
    fn t_builtin_functions() {
        assert_int("len(\"\")", 0);
        assert_int("len(\"four\")", 4);
        assert_int("len([1, 2, 3])", 3);
        assert_eq!(run_vm("head([1, 2, 3])"), Value::Integer(1));
        assert_eq!(run_vm("back([1, 2, 3])"), Value::Integer(3));
        assert_eq!(run_vm("head([])"), Value::Null);
        match run_vm("tail([1, 2, 3])") {
            Value::Array(items) => assert_eq!(items.borrow().len(), 2),
            other => panic!("expected array, got {:?}", other),
        }
        match run_vm("push([1, 2], 3)") {
            Value::Array(items) => assert_eq!(items.borrow().len(), 3),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn t_builtin_error_propagates_as_value_not_abort() {
        assert!(run_vm("len(1)").is_error());
    }

    #[test]
    fn t_map_over_array_via_recursion() {
        let src = r#"
            let map = fn(arr, f) {
                let iter = fn(arr, acc) {
                    if (len(arr) == 0) {
                        acc
                    } else {
                        iter(tail(arr), push(acc, f(head(arr))));
                    }
                };
                iter(arr, []);
            };
            let a = [1, 2, 3, 4];
            let double = fn(x) { x * 2 };
            map(a, double);
        "#;
        match run_vm(src) {
            Value::Array(items) => {
                let items = items.borrow();
                let ints: Vec<i64> = items
                    .iter()
                    .map(|v| match v {
                        Value::Integer(n) => *n,
                        other => panic!("expected integer, got {:?}", other),
                    })
                    .collect();
                assert_eq!(ints, vec![2, 4, 6, 8]);
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn t_runtime_type_errors() {
        assert!(matches!(run_vm_err("5 + true;"), VmError::TypeError(_)));
        assert!(matches!(run_vm_err("-true"), VmError::TypeError(_)));
        assert!(matches!(run_vm_err("true + false;"), VmError::TypeError(_)));
        assert!(matches!(run_vm_err("1(1);"), VmError::NotCallable(_)));
    }
}
