//! Small RV32I encoder for boot vectors and hand-written test images.

use crate::regfile::Reg;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Load = 0b000_0011,
    MiscMem = 0b000_1111,
    OpImm = 0b001_0011,
    Auipc = 0b001_0111,
    Store = 0b010_0011,
    Op = 0b011_0011,
    Lui = 0b011_0111,
    Branch = 0b110_0011,
    Jalr = 0b110_0111,
    Jal = 0b110_1111,
    System = 0b111_0011,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    R,
    I,
    S,
    B,
    U,
    J,
}

impl Opcode {
    fn format(self) -> Format {
        match self {
            Opcode::Op => Format::R,
            Opcode::Load | Opcode::MiscMem | Opcode::OpImm | Opcode::Jalr | Opcode::System => {
                Format::I
            }
            Opcode::Store => Format::S,
            Opcode::Branch => Format::B,
            Opcode::Lui | Opcode::Auipc => Format::U,
            Opcode::Jal => Format::J,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Instr {
    opcode: Opcode,
    rd: Reg,
    rs1: Reg,
    rs2: Reg,
    funct3: u8,
    funct7: u8,
    imm: i32,
}

impl Instr {
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            rd: Reg::Zero,
            rs1: Reg::Zero,
            rs2: Reg::Zero,
            funct3: 0,
            funct7: 0,
            imm: 0,
        }
    }

    pub fn rd(mut self, reg: Reg) -> Self {
        self.rd = reg;
        self
    }

    pub fn rs1(mut self, reg: Reg) -> Self {
        self.rs1 = reg;
        self
    }

    pub fn rs2(mut self, reg: Reg) -> Self {
        self.rs2 = reg;
        self
    }

    pub fn funct3(mut self, funct3: u8) -> Self {
        assert!(funct3 < 8, "funct3 must fit in 3 bits");
        self.funct3 = funct3;
        self
    }

    pub fn funct7(mut self, funct7: u8) -> Self {
        assert!(funct7 < 128, "funct7 must fit in 7 bits");
        self.funct7 = funct7;
        self
    }

    /// Immediate in the units of the format: a byte offset for I/S/B/J,
    /// the upper 20 bits for U.
    pub fn imm(mut self, imm: i32) -> Self {
        self.imm = imm;
        self
    }

    pub fn assemble(&self) -> u32 {
        let rd = u32::from(self.rd.index()) << 7;
        let rs1 = u32::from(self.rs1.index()) << 15;
        let rs2 = u32::from(self.rs2.index()) << 20;
        let funct3 = u32::from(self.funct3) << 12;
        let opcode = self.opcode as u32;
        let imm = self.imm as u32;

        match self.opcode.format() {
            Format::R => (u32::from(self.funct7) << 25) | rs2 | rs1 | funct3 | rd | opcode,
            Format::I => {
                assert!(
                    (-2048..2048).contains(&self.imm),
                    "I-type immediate must fit in 12 signed bits"
                );
                ((imm & 0xfff) << 20) | rs1 | funct3 | rd | opcode
            }
            Format::S => {
                assert!(
                    (-2048..2048).contains(&self.imm),
                    "S-type immediate must fit in 12 signed bits"
                );
                (((imm >> 5) & 0x7f) << 25) | rs2 | rs1 | funct3 | ((imm & 0x1f) << 7) | opcode
            }
            Format::B => {
                assert!(
                    (-4096..4096).contains(&self.imm) && self.imm % 2 == 0,
                    "branch offset must be even and fit in 13 signed bits"
                );
                (((imm >> 12) & 1) << 31)
                    | (((imm >> 5) & 0x3f) << 25)
                    | rs2
                    | rs1
                    | funct3
                    | (((imm >> 1) & 0xf) << 8)
                    | (((imm >> 11) & 1) << 7)
                    | opcode
            }
            Format::U => {
                assert!(
                    (0..(1 << 20)).contains(&self.imm),
                    "U-type immediate must fit in 20 bits"
                );
                (imm << 12) | rd | opcode
            }
            Format::J => {
                assert!(
                    (-(1 << 20)..(1 << 20)).contains(&self.imm) && self.imm % 2 == 0,
                    "jump offset must be even and fit in 21 signed bits"
                );
                (((imm >> 20) & 1) << 31)
                    | (((imm >> 1) & 0x3ff) << 21)
                    | (((imm >> 11) & 1) << 20)
                    | (((imm >> 12) & 0xff) << 12)
                    | rd
                    | opcode
            }
        }
    }
}

// Convenience constructor, reads like the mnemonic tables.
pub fn instr(opcode: Opcode) -> Instr {
    Instr::new(opcode)
}

/// `jal rd, offset` with range checks reported instead of asserted.
pub fn jal_checked(rd: Reg, offset: i64) -> Result<u32, &'static str> {
    if offset & 1 != 0 {
        return Err("jump offset is not 2-byte aligned");
    }
    if !(-(1 << 20)..(1 << 20)).contains(&offset) {
        return Err("jump offset does not fit in 21 signed bits");
    }
    Ok(instr(Opcode::Jal).rd(rd).imm(offset as i32).assemble())
}

pub fn lui(rd: Reg, upper: i32) -> u32 {
    instr(Opcode::Lui).rd(rd).imm(upper).assemble()
}

pub fn auipc(rd: Reg, upper: i32) -> u32 {
    instr(Opcode::Auipc).rd(rd).imm(upper).assemble()
}

pub fn addi(rd: Reg, rs1: Reg, imm: i32) -> u32 {
    instr(Opcode::OpImm).rd(rd).rs1(rs1).imm(imm).assemble()
}

pub fn li(rd: Reg, imm: i32) -> u32 {
    addi(rd, Reg::Zero, imm)
}

pub fn add(rd: Reg, rs1: Reg, rs2: Reg) -> u32 {
    instr(Opcode::Op).rd(rd).rs1(rs1).rs2(rs2).assemble()
}

pub fn sub(rd: Reg, rs1: Reg, rs2: Reg) -> u32 {
    instr(Opcode::Op)
        .rd(rd)
        .rs1(rs1)
        .rs2(rs2)
        .funct7(0b010_0000)
        .assemble()
}

pub fn slli(rd: Reg, rs1: Reg, shamt: u8) -> u32 {
    assert!(shamt < 32, "shift amount must fit in 5 bits");
    instr(Opcode::OpImm)
        .rd(rd)
        .rs1(rs1)
        .funct3(0b001)
        .imm(i32::from(shamt))
        .assemble()
}

pub fn srai(rd: Reg, rs1: Reg, shamt: u8) -> u32 {
    assert!(shamt < 32, "shift amount must fit in 5 bits");
    instr(Opcode::OpImm)
        .rd(rd)
        .rs1(rs1)
        .funct3(0b101)
        .imm(0x400 | i32::from(shamt))
        .assemble()
}

fn load(funct3: u8, rd: Reg, rs1: Reg, offset: i32) -> u32 {
    instr(Opcode::Load)
        .rd(rd)
        .rs1(rs1)
        .funct3(funct3)
        .imm(offset)
        .assemble()
}

pub fn lb(rd: Reg, rs1: Reg, offset: i32) -> u32 {
    load(0b000, rd, rs1, offset)
}

pub fn lh(rd: Reg, rs1: Reg, offset: i32) -> u32 {
    load(0b001, rd, rs1, offset)
}

pub fn lw(rd: Reg, rs1: Reg, offset: i32) -> u32 {
    load(0b010, rd, rs1, offset)
}

pub fn lbu(rd: Reg, rs1: Reg, offset: i32) -> u32 {
    load(0b100, rd, rs1, offset)
}

pub fn lhu(rd: Reg, rs1: Reg, offset: i32) -> u32 {
    load(0b101, rd, rs1, offset)
}

fn store(funct3: u8, rs2: Reg, rs1: Reg, offset: i32) -> u32 {
    instr(Opcode::Store)
        .rs1(rs1)
        .rs2(rs2)
        .funct3(funct3)
        .imm(offset)
        .assemble()
}

pub fn sb(rs2: Reg, rs1: Reg, offset: i32) -> u32 {
    store(0b000, rs2, rs1, offset)
}

pub fn sh(rs2: Reg, rs1: Reg, offset: i32) -> u32 {
    store(0b001, rs2, rs1, offset)
}

pub fn sw(rs2: Reg, rs1: Reg, offset: i32) -> u32 {
    store(0b010, rs2, rs1, offset)
}

pub fn beq(rs1: Reg, rs2: Reg, offset: i32) -> u32 {
    instr(Opcode::Branch).rs1(rs1).rs2(rs2).imm(offset).assemble()
}

pub fn bne(rs1: Reg, rs2: Reg, offset: i32) -> u32 {
    instr(Opcode::Branch)
        .rs1(rs1)
        .rs2(rs2)
        .funct3(0b001)
        .imm(offset)
        .assemble()
}

pub fn jal(rd: Reg, offset: i32) -> u32 {
    instr(Opcode::Jal).rd(rd).imm(offset).assemble()
}

pub fn jalr(rd: Reg, rs1: Reg, offset: i32) -> u32 {
    instr(Opcode::Jalr).rd(rd).rs1(rs1).imm(offset).assemble()
}

pub fn ecall() -> u32 {
    instr(Opcode::System).assemble()
}

pub fn ebreak() -> u32 {
    instr(Opcode::System).imm(1).assemble()
}

/// `csrrs rd, csr, zero`, i.e. `csrr`.
pub fn csrr(rd: Reg, csr: u16) -> u32 {
    assert!(csr < 0x1000, "CSR number must fit in 12 bits");
    // CSR numbers are unsigned; go through the raw field instead of imm().
    (u32::from(csr) << 20) | (0b010 << 12) | (u32::from(rd.index()) << 7) | Opcode::System as u32
}

pub fn fence() -> u32 {
    instr(Opcode::MiscMem).imm(0x0ff).assemble()
}

/// Lays instruction words out little-endian, ready for an address space.
pub fn program(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|word| word.to_le_bytes()).collect()
}
