pub mod instructions;
pub mod opcode;

pub use instructions::{make, read_operands, read_u16, read_u8, Instructions};
pub use opcode::{lookup, Definition, Op};
