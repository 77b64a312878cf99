//! Observation of the model's integer register file.

/// RV32 integer registers by ABI name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Reg {
    Zero = 0,
    Ra,
    Sp,
    Gp,
    Tp,
    T0,
    T1,
    T2,
    S0,
    S1,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
    A7,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    S8,
    S9,
    S10,
    S11,
    T3,
    T4,
    T5,
    T6,
}

pub const REG_COUNT: usize = 32;

impl Reg {
    pub const fn index(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        const NAMES: [&str; REG_COUNT] = [
            "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "s0", "s1", "a0", "a1", "a2",
            "a3", "a4", "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9",
            "s10", "s11", "t3", "t4", "t5", "t6",
        ];
        NAMES[self as usize]
    }
}

/// Read access to a register file owned by someone else (usually the model).
///
/// Reads may need to poke a probe port and settle the model, hence `&mut`.
pub trait RegisterFileView {
    /// Raw read of register `index` (0..32).
    fn read_raw(&mut self, index: u8) -> u32;

    /// `zero` always reads 0, whatever the backing storage holds.
    fn read(&mut self, reg: Reg) -> u32 {
        match reg {
            Reg::Zero => 0,
            reg => self.read_raw(reg.index()),
        }
    }
}

/// A plain register array, used as a snapshot or by software models.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterFile {
    regs: [u32; REG_COUNT],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes to `zero` are dropped.
    pub fn write(&mut self, index: u8, value: u32) {
        let index = usize::from(index) % REG_COUNT;
        if index != 0 {
            self.regs[index] = value;
        }
    }

    pub fn set(&mut self, reg: Reg, value: u32) {
        self.write(reg.index(), value);
    }

    pub fn get(&self, index: u8) -> u32 {
        self.regs[usize::from(index) % REG_COUNT]
    }
}

impl RegisterFileView for RegisterFile {
    fn read_raw(&mut self, index: u8) -> u32 {
        self.get(index)
    }
}
