use loom_code::Instructions;
use loom_object::ClosureObj;
use std::rc::Rc;

/// One call activation: the closure being executed, its instruction
/// pointer, and the stack index its locals/parameters begin at. `ip`
/// starts at -1 so the VM's "advance, then decode" dispatch loop lands
/// on byte 0 for the first fetch.
pub struct Frame {
    pub closure: Rc<ClosureObj>,
    pub ip: i64,
    pub base_pointer: usize,
}

impl Frame {
    pub fn new(closure: Rc<ClosureObj>, base_pointer: usize) -> Self {
        Frame { closure, ip: -1, base_pointer }
    }

    pub fn instructions(&self) -> &Instructions {
        &self.closure.func.instructions
    }
}
