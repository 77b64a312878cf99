//! Reference arithmetic for the functional units.
//!
//! Everything here is a pure function of its operands with RV32 machine
//! semantics. Arithmetic wraps and shift amounts are taken mod 32.

use std::fmt;

/// A test case that knows its own expected result.
pub trait GoldenCase: Clone + fmt::Debug + fmt::Display {
    fn expected(&self) -> u32;
}

/// Operations of the single-cycle ALU, with their `func` encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AluOp {
    Nop = 0,
    Add = 1,
    Sub = 2,
    And = 3,
    Or = 4,
    Xor = 5,
    Sll = 6,
    Srl = 7,
    Sra = 8,
    Slt = 9,
    Sltu = 10,
    Sh1add = 11,
    Sh2add = 12,
    Sh3add = 13,
}

impl AluOp {
    pub const ALL: [AluOp; 14] = [
        AluOp::Nop,
        AluOp::Add,
        AluOp::Sub,
        AluOp::And,
        AluOp::Or,
        AluOp::Xor,
        AluOp::Sll,
        AluOp::Srl,
        AluOp::Sra,
        AluOp::Slt,
        AluOp::Sltu,
        AluOp::Sh1add,
        AluOp::Sh2add,
        AluOp::Sh3add,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            AluOp::Nop => "NOP",
            AluOp::Add => "ADD",
            AluOp::Sub => "SUB",
            AluOp::And => "AND",
            AluOp::Or => "OR",
            AluOp::Xor => "XOR",
            AluOp::Sll => "SLL",
            AluOp::Srl => "SRL",
            AluOp::Sra => "SRA",
            AluOp::Slt => "SLT",
            AluOp::Sltu => "SLTU",
            AluOp::Sh1add => "SH1ADD",
            AluOp::Sh2add => "SH2ADD",
            AluOp::Sh3add => "SH3ADD",
        }
    }
}

pub fn alu(op: AluOp, a: u32, b: u32) -> u32 {
    let shamt = b & 31;
    match op {
        AluOp::Nop => 0,
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::And => a & b,
        AluOp::Or => a | b,
        AluOp::Xor => a ^ b,
        AluOp::Sll => a << shamt,
        AluOp::Srl => a >> shamt,
        AluOp::Sra => ((a as i32) >> shamt) as u32,
        AluOp::Slt => u32::from((a as i32) < (b as i32)),
        AluOp::Sltu => u32::from(a < b),
        AluOp::Sh1add => (a << 1).wrapping_add(b),
        AluOp::Sh2add => (a << 2).wrapping_add(b),
        AluOp::Sh3add => (a << 3).wrapping_add(b),
    }
}

/// Operations of the iterative adder/comparator. Encodings follow the
/// branch `funct3` field, with ADD/SUB slotted into the unused `01x` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AdderOp {
    Eq = 0b000,
    Ne = 0b001,
    Add = 0b010,
    Sub = 0b011,
    Lt = 0b100,
    Ge = 0b101,
    Ltu = 0b110,
    Geu = 0b111,
}

impl AdderOp {
    pub const ALL: [AdderOp; 8] = [
        AdderOp::Add,
        AdderOp::Sub,
        AdderOp::Eq,
        AdderOp::Ne,
        AdderOp::Lt,
        AdderOp::Ge,
        AdderOp::Ltu,
        AdderOp::Geu,
    ];

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            AdderOp::Eq => "EQ",
            AdderOp::Ne => "NE",
            AdderOp::Add => "ADD",
            AdderOp::Sub => "SUB",
            AdderOp::Lt => "LT",
            AdderOp::Ge => "GE",
            AdderOp::Ltu => "LTU",
            AdderOp::Geu => "GEU",
        }
    }
}

pub fn adder(op: AdderOp, a: u32, b: u32) -> u32 {
    match op {
        AdderOp::Add => a.wrapping_add(b),
        AdderOp::Sub => a.wrapping_sub(b),
        AdderOp::Eq => u32::from(a == b),
        AdderOp::Ne => u32::from(a != b),
        AdderOp::Lt => u32::from((a as i32) < (b as i32)),
        AdderOp::Ge => u32::from((a as i32) >= (b as i32)),
        AdderOp::Ltu => u32::from(a < b),
        AdderOp::Geu => u32::from(a >= b),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShiftMode {
    Left,
    RightLogical,
    RightArithmetic,
}

impl ShiftMode {
    pub const ALL: [ShiftMode; 3] = [
        ShiftMode::Left,
        ShiftMode::RightArithmetic,
        ShiftMode::RightLogical,
    ];

    pub const fn right_shift(self) -> bool {
        !matches!(self, ShiftMode::Left)
    }

    pub const fn arith_shift(self) -> bool {
        matches!(self, ShiftMode::RightArithmetic)
    }

    pub const fn name(self) -> &'static str {
        match self {
            ShiftMode::Left => "SLL",
            ShiftMode::RightLogical => "SRL",
            ShiftMode::RightArithmetic => "SRA",
        }
    }
}

pub fn shift(mode: ShiftMode, value: u32, amount: u32) -> u32 {
    let amount = amount & 31;
    match mode {
        ShiftMode::Left => value << amount,
        ShiftMode::RightLogical => value >> amount,
        ShiftMode::RightArithmetic => ((value as i32) >> amount) as u32,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AluCase {
    pub op: AluOp,
    pub a: u32,
    pub b: u32,
}

impl GoldenCase for AluCase {
    fn expected(&self) -> u32 {
        alu(self.op, self.a, self.b)
    }
}

impl fmt::Display for AluCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 0x{:08x}, 0x{:08x}", self.op.name(), self.a, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdderCase {
    pub op: AdderOp,
    pub a: u32,
    pub b: u32,
}

impl GoldenCase for AdderCase {
    fn expected(&self) -> u32 {
        adder(self.op, self.a, self.b)
    }
}

impl fmt::Display for AdderCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 0x{:08x}, 0x{:08x}", self.op.name(), self.a, self.b)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftCase {
    pub mode: ShiftMode,
    pub value: u32,
    pub amount: u32,
}

impl GoldenCase for ShiftCase {
    fn expected(&self) -> u32 {
        shift(self.mode, self.value, self.amount)
    }
}

impl fmt::Display for ShiftCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} 0x{:08x} by {}",
            self.mode.name(),
            self.value,
            self.amount
        )
    }
}
