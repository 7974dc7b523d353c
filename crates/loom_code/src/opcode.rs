/// A single bytecode operation. Encoded as one byte on the wire; operand
/// widths are fixed per opcode (see `Definition::operand_widths`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    Constant = 0,
    Add,
    Pop,
    Sub,
    Mul,
    Div,
    True,
    False,
    Equal,
    NotEqual,
    GreaterThan,
    Minus,
    Bang,
    JumpNotTruthy,
    Jump,
    Null,
    GetGlobal,
    SetGlobal,
    Array,
    Hash,
    Index,
    Call,
    ReturnValue,
    Return,
    GetLocal,
    SetLocal,
    GetBuiltin,
    Closure,
    GetFree,
    CurrentClosure,
}

impl Op {
    pub fn from_byte(byte: u8) -> Option<Op> {
        Some(match byte {
            0 => Op::Constant,
            1 => Op::Add,
            2 => Op::Pop,
            3 => Op::Sub,
            4 => Op::Mul,
            5 => Op::Div,
            6 => Op::True,
            7 => Op::False,
            8 => Op::Equal,
            9 => Op::NotEqual,
            10 => Op::GreaterThan,
            11 => Op::Minus,
            12 => Op::Bang,
            13 => Op::JumpNotTruthy,
            14 => Op::Jump,
            15 => Op::Null,
            16 => Op::GetGlobal,
            17 => Op::SetGlobal,
            18 => Op::Array,
            19 => Op::Hash,
            20 => Op::Index,
            21 => Op::Call,
            22 => Op::ReturnValue,
            23 => Op::Return,
            24 => Op::GetLocal,
            25 => Op::SetLocal,
            26 => Op::GetBuiltin,
            27 => Op::Closure,
            28 => Op::GetFree,
            29 => Op::CurrentClosure,
            _ => return None,
        })
    }

    pub fn definition(self) -> Definition {
        match self {
            Op::Constant => Definition::new("OpConstant", &[2]),
            Op::Add => Definition::new("OpAdd", &[]),
            Op::Pop => Definition::new("OpPop", &[]),
            Op::Sub => Definition::new("OpSub", &[]),
            Op::Mul => Definition::new("OpMul", &[]),
            Op::Div => Definition::new("OpDiv", &[]),
            Op::True => Definition::new("OpTrue", &[]),
            Op::False => Definition::new("OpFalse", &[]),
            Op::Equal => Definition::new("OpEqual", &[]),
            Op::NotEqual => Definition::new("OpNotEqual", &[]),
            Op::GreaterThan => Definition::new("OpGreaterThan", &[]),
            Op::Minus => Definition::new("OpMinus", &[]),
            Op::Bang => Definition::new("OpBang", &[]),
            Op::JumpNotTruthy => Definition::new("OpJumpNotTruthy", &[2]),
            Op::Jump => Definition::new("OpJump", &[2]),
            Op::Null => Definition::new("OpNull", &[]),
            Op::GetGlobal => Definition::new("OpGetGlobal", &[2]),
            Op::SetGlobal => Definition::new("OpSetGlobal", &[2]),
            Op::Array => Definition::new("OpArray", &[2]),
            Op::Hash => Definition::new("OpHash", &[2]),
            Op::Index => Definition::new("OpIndex", &[]),
            Op::Call => Definition::new("OpCall", &[1]),
            Op::ReturnValue => Definition::new("OpReturnValue", &[]),
            Op::Return => Definition::new("OpReturn", &[]),
            Op::GetLocal => Definition::new("OpGetLocal", &[1]),
            Op::SetLocal => Definition::new("OpSetLocal", &[1]),
            Op::GetBuiltin => Definition::new("OpGetBuiltin", &[1]),
            Op::Closure => Definition::new("OpClosure", &[2, 1]),
            Op::GetFree => Definition::new("OpGetFree", &[1]),
            Op::CurrentClosure => Definition::new("OpCurrentClosure", &[]),
        }
    }
}

/// Name + operand widths (in bytes) for one opcode. Widths of 1 mean a `u8`
/// operand, 2 means a big-endian `u16` operand.
#[derive(Debug, Clone, Copy)]
pub struct Definition {
    pub name: &'static str,
    pub operand_widths: &'static [u8],
}

impl Definition {
    const fn new(name: &'static str, operand_widths: &'static [u8]) -> Self {
        Definition { name, operand_widths }
    }
}

pub fn lookup(byte: u8) -> Option<Definition> {
    Op::from_byte(byte).map(Op::definition)
}
