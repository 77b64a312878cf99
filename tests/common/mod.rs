//! Cycle-level Rust models of the designs in `rtl/`.
//!
//! They follow the same port timing as the Verilated models: inputs are
//! plain fields, state changes only when `evaluate` sees a rising clock.
#![allow(dead_code)]

use rv_cosim::golden::{AdderCase, AluCase, ShiftCase};
use rv_cosim::model::{
    ClockedModel, CombinationalUnit, CoreModel, Evaluate, HandshakeUnit, MemRequest,
};
use rv_cosim::regfile::{RegisterFile, RegisterFileView};

fn sign_extend(value: u32, bits: u32) -> u32 {
    let shift = 32 - bits;
    (((value << shift) as i32) >> shift) as u32
}

/// Two-state FETCH/EXEC RV32I core, the same machine as `rtl/rvcore.sv`.
#[derive(Default)]
pub struct BehaviouralCore {
    pub clk: bool,
    pub rst: bool,
    pub memread_data: u32,
    last_clk: bool,
    pc: u32,
    inst: u32,
    executing: bool,
    regs: RegisterFile,
}

const OP_LOAD: u32 = 0b000_0011;
const OP_IMM: u32 = 0b001_0011;
const OP_AUIPC: u32 = 0b001_0111;
const OP_STORE: u32 = 0b010_0011;
const OP_REG: u32 = 0b011_0011;
const OP_LUI: u32 = 0b011_0111;
const OP_BRANCH: u32 = 0b110_0011;
const OP_JALR: u32 = 0b110_0111;
const OP_JAL: u32 = 0b110_1111;

impl BehaviouralCore {
    pub fn new() -> Self {
        Self::default()
    }

    fn opcode(&self) -> u32 {
        self.inst & 0x7f
    }

    fn rd(&self) -> u8 {
        ((self.inst >> 7) & 0x1f) as u8
    }

    fn funct3(&self) -> u32 {
        (self.inst >> 12) & 0x7
    }

    fn rs1_val(&self) -> u32 {
        self.regs.get(((self.inst >> 15) & 0x1f) as u8)
    }

    fn rs2_val(&self) -> u32 {
        self.regs.get(((self.inst >> 20) & 0x1f) as u8)
    }

    fn imm_i(&self) -> u32 {
        sign_extend(self.inst >> 20, 12)
    }

    fn imm_s(&self) -> u32 {
        sign_extend(((self.inst >> 25) << 5) | ((self.inst >> 7) & 0x1f), 12)
    }

    fn imm_b(&self) -> u32 {
        let i = self.inst;
        let raw = (((i >> 31) & 1) << 12)
            | (((i >> 7) & 1) << 11)
            | (((i >> 25) & 0x3f) << 5)
            | (((i >> 8) & 0xf) << 1);
        sign_extend(raw, 13)
    }

    fn imm_u(&self) -> u32 {
        self.inst & 0xffff_f000
    }

    fn imm_j(&self) -> u32 {
        let i = self.inst;
        let raw = (((i >> 31) & 1) << 20)
            | (((i >> 12) & 0xff) << 12)
            | (((i >> 20) & 1) << 11)
            | (((i >> 21) & 0x3ff) << 1);
        sign_extend(raw, 21)
    }

    fn known(&self) -> bool {
        matches!(
            self.opcode(),
            OP_LOAD | OP_IMM | OP_AUIPC | OP_STORE | OP_REG | OP_LUI | OP_BRANCH | OP_JALR | OP_JAL
        )
    }

    fn alu_out(&self) -> u32 {
        let a = self.rs1_val();
        let reg_form = self.opcode() == OP_REG;
        let b = if reg_form { self.rs2_val() } else { self.imm_i() };
        let alt = (self.inst >> 30) & 1 == 1;
        let shamt = b & 31;
        match self.funct3() {
            0 if reg_form && alt => a.wrapping_sub(b),
            0 => a.wrapping_add(b),
            1 => a << shamt,
            2 => u32::from((a as i32) < (b as i32)),
            3 => u32::from(a < b),
            4 => a ^ b,
            5 if alt => ((a as i32) >> shamt) as u32,
            5 => a >> shamt,
            6 => a | b,
            _ => a & b,
        }
    }

    fn taken(&self) -> bool {
        let (a, b) = (self.rs1_val(), self.rs2_val());
        match self.funct3() {
            0 => a == b,
            1 => a != b,
            4 => (a as i32) < (b as i32),
            5 => (a as i32) >= (b as i32),
            6 => a < b,
            7 => a >= b,
            _ => false,
        }
    }

    fn next_pc(&self) -> u32 {
        match self.opcode() {
            OP_JAL => self.pc.wrapping_add(self.imm_j()),
            OP_JALR => self.rs1_val().wrapping_add(self.imm_i()) & !1,
            OP_BRANCH if self.taken() => self.pc.wrapping_add(self.imm_b()),
            _ => self.pc.wrapping_add(4),
        }
    }

    fn rd_val(&self) -> Option<u32> {
        match self.opcode() {
            OP_LOAD => Some(self.memread_data),
            OP_IMM | OP_REG => Some(self.alu_out()),
            OP_LUI => Some(self.imm_u()),
            OP_AUIPC => Some(self.pc.wrapping_add(self.imm_u())),
            OP_JAL | OP_JALR => Some(self.pc.wrapping_add(4)),
            _ => None,
        }
    }

    fn posedge(&mut self) {
        if self.rst {
            self.pc = self.memread_data;
            self.inst = 0;
            self.executing = false;
        } else if !self.executing {
            self.inst = self.memread_data;
            self.executing = true;
        } else {
            if let Some(value) = self.rd_val() {
                self.regs.write(self.rd(), value);
            }
            self.pc = self.next_pc();
            self.executing = false;
        }
    }
}

impl Evaluate for BehaviouralCore {
    fn evaluate(&mut self) {
        if self.clk && !self.last_clk {
            self.posedge();
        }
        self.last_clk = self.clk;
    }
}

impl ClockedModel for BehaviouralCore {
    fn set_clock(&mut self, high: bool) {
        self.clk = high;
    }

    fn set_reset(&mut self, asserted: bool) {
        self.rst = asserted;
    }
}

impl RegisterFileView for BehaviouralCore {
    fn read_raw(&mut self, index: u8) -> u32 {
        self.regs.get(index)
    }
}

impl CoreModel for BehaviouralCore {
    fn mem_request(&self) -> MemRequest {
        if !self.executing {
            return MemRequest {
                address: self.pc,
                size_code: 0b010,
                read: true,
                write: false,
                write_data: 0,
            };
        }
        let store = self.opcode() == OP_STORE;
        let offset = if store { self.imm_s() } else { self.imm_i() };
        MemRequest {
            address: self.rs1_val().wrapping_add(offset),
            size_code: self.funct3() as u8,
            read: self.opcode() == OP_LOAD,
            write: store,
            write_data: self.rs2_val(),
        }
    }

    fn set_read_data(&mut self, word: u32) {
        self.memread_data = word;
    }

    fn trap(&self) -> bool {
        self.executing && !self.known()
    }

    fn instruction_boundary(&self) -> bool {
        !self.executing
    }

    fn program_counter(&self) -> u32 {
        self.pc
    }

    fn instruction(&self) -> u32 {
        self.inst
    }
}

/// The single-cycle ALU of `rtl/alu.sv`, with an optional injected fault.
#[derive(Default)]
pub struct BehaviouralAlu {
    pub func: u8,
    pub src_a: u32,
    pub src_b: u32,
    pub out: u32,
    /// Computes SLT as an unsigned compare.
    pub broken_slt: bool,
}

impl Evaluate for BehaviouralAlu {
    fn evaluate(&mut self) {
        let (a, b) = (self.src_a, self.src_b);
        let shamt = b & 31;
        let fill = if a & 0x8000_0000 != 0 && shamt != 0 {
            !(u32::MAX >> shamt)
        } else {
            0
        };
        let signed_lt = if (a ^ b) & 0x8000_0000 != 0 && !self.broken_slt {
            a >> 31
        } else {
            u32::from(a < b)
        };
        self.out = match self.func {
            1 => a.wrapping_add(b),
            2 => a.wrapping_add(!b).wrapping_add(1),
            3 => a & b,
            4 => a | b,
            5 => a ^ b,
            6 => a << shamt,
            7 => a >> shamt,
            8 => (a >> shamt) | fill,
            9 => signed_lt,
            10 => u32::from(a < b),
            11 => (a << 1).wrapping_add(b),
            12 => (a << 2).wrapping_add(b),
            13 => (a << 3).wrapping_add(b),
            _ => 0,
        };
    }
}

impl CombinationalUnit for BehaviouralAlu {
    type Case = AluCase;

    fn apply(&mut self, case: &AluCase) {
        self.func = case.op.code();
        self.src_a = case.a;
        self.src_b = case.b;
    }

    fn output(&self) -> u32 {
        self.out
    }
}

const ADD_OP: u8 = 0b010;
const SUB_OP: u8 = 0b011;
const CHUNKS: [(u32, u32); 3] = [(0x0000_07ff, 0), (0x003f_f800, 11), (0xffc0_0000, 22)];

/// The three-stage adder/comparator of `rtl/adder3.sv`.
#[derive(Default)]
pub struct BehaviouralAdder3 {
    pub clk: bool,
    pub rst: bool,
    pub start: bool,
    pub op: u8,
    pub src_a: u32,
    pub src_b: u32,
    last_clk: bool,
    stage: usize,
    carry: bool,
    op_q: u8,
    b_q: u32,
}

struct AdderSettle {
    out: u32,
    done: bool,
    cout: bool,
}

impl BehaviouralAdder3 {
    fn settle(&self) -> AdderSettle {
        let stage = if self.start { 0 } else { self.stage };
        let op = if self.start { self.op } else { self.op_q };
        let b = if self.start { self.src_b } else { self.b_q };
        let subtract = op != ADD_OP;
        let b_e = if subtract { !b } else { b };
        let cin = if stage == 0 { subtract } else { self.carry };

        let (mask, low) = CHUNKS[stage.min(2)];
        let partial = u64::from(self.src_a & mask) + u64::from(b_e & mask) + (u64::from(cin) << low);
        let cout = partial & !u64::from(mask) != 0;
        let sum = (self.src_a & !mask) | (partial as u32 & mask);

        let eq = sum == 0;
        let lt = if (self.src_a ^ b) >> 31 != 0 {
            self.src_a >> 31 == 1
        } else {
            sum >> 31 == 1
        };
        let flag = match op {
            0b000 => eq,
            0b001 => !eq,
            0b100 => lt,
            0b101 => !lt,
            0b110 => !cout,
            _ => cout,
        };

        let done = !self.start && self.stage == 2;
        let out = if done && op != ADD_OP && op != SUB_OP {
            u32::from(flag)
        } else {
            sum
        };
        AdderSettle { out, done, cout }
    }

    fn posedge(&mut self) {
        let cout = self.settle().cout;
        if self.rst {
            self.stage = 0;
            self.carry = false;
            self.op_q = ADD_OP;
            self.b_q = 0;
        } else if self.start {
            self.stage = 1;
            self.carry = cout;
            self.op_q = self.op;
            self.b_q = self.src_b;
        } else if self.stage == 1 {
            self.stage = 2;
            self.carry = cout;
        }
    }
}

impl Evaluate for BehaviouralAdder3 {
    fn evaluate(&mut self) {
        if self.clk && !self.last_clk {
            self.posedge();
        }
        self.last_clk = self.clk;
    }
}

impl ClockedModel for BehaviouralAdder3 {
    fn set_clock(&mut self, high: bool) {
        self.clk = high;
    }

    fn set_reset(&mut self, asserted: bool) {
        self.rst = asserted;
    }
}

impl HandshakeUnit for BehaviouralAdder3 {
    type Case = AdderCase;
    type Feedback = u32;

    fn issue(&mut self, case: &AdderCase) {
        self.op = case.op.code();
        self.src_a = case.a;
        self.src_b = case.b;
    }

    fn set_start(&mut self, start: bool) {
        self.start = start;
    }

    fn done(&self) -> bool {
        self.settle().done
    }

    fn feedback(&self) -> u32 {
        self.settle().out
    }

    fn apply_feedback(&mut self, sum: u32) {
        self.src_a = sum;
    }

    fn output(&self) -> u32 {
        self.settle().out
    }
}

/// The iterative shifter of `rtl/shifter3.sv`.
#[derive(Default)]
pub struct BehaviouralShifter3 {
    pub clk: bool,
    pub rst: bool,
    pub start: bool,
    pub val_i: u32,
    pub sham_i: u8,
    pub right_shift: bool,
    pub arith_shift: bool,
    pub busy: bool,
    last_clk: bool,
    /// Holds `done` low forever.
    pub stuck: bool,
}

impl BehaviouralShifter3 {
    /// A shifter that never raises `done`.
    pub fn stuck() -> Self {
        Self {
            stuck: true,
            ..Self::default()
        }
    }

    fn step(&self) -> u8 {
        self.sham_i.min(7)
    }

    fn val_o(&self) -> u32 {
        let step = u32::from(self.step());
        match (self.right_shift, self.arith_shift) {
            (false, _) => self.val_i << step,
            (true, true) => ((self.val_i as i32) >> step) as u32,
            (true, false) => self.val_i >> step,
        }
    }

    fn done_now(&self) -> bool {
        !self.stuck && self.sham_i <= 7
    }
}

impl Evaluate for BehaviouralShifter3 {
    fn evaluate(&mut self) {
        if self.clk && !self.last_clk {
            if self.rst {
                self.busy = false;
            } else if self.start {
                self.busy = !self.done_now();
            } else if self.done_now() {
                self.busy = false;
            }
        }
        self.last_clk = self.clk;
    }
}

impl ClockedModel for BehaviouralShifter3 {
    fn set_clock(&mut self, high: bool) {
        self.clk = high;
    }

    fn set_reset(&mut self, asserted: bool) {
        self.rst = asserted;
    }
}

impl HandshakeUnit for BehaviouralShifter3 {
    type Case = ShiftCase;
    type Feedback = (u32, u8);

    fn issue(&mut self, case: &ShiftCase) {
        self.val_i = case.value;
        self.sham_i = (case.amount & 31) as u8;
        self.right_shift = case.mode.right_shift();
        self.arith_shift = case.mode.arith_shift();
    }

    fn set_start(&mut self, start: bool) {
        self.start = start;
    }

    fn done(&self) -> bool {
        self.done_now()
    }

    fn feedback(&self) -> (u32, u8) {
        (self.val_o(), self.sham_i - self.step())
    }

    fn apply_feedback(&mut self, (value, amount): (u32, u8)) {
        self.val_i = value;
        self.sham_i = amount;
    }

    fn output(&self) -> u32 {
        self.val_o()
    }
}
