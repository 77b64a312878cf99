//! Verilated models and their harness trait impls.
//!
//! Each `#[verilog]` struct is generated by marlin from the matching file in
//! `rtl/`; single-bit ports come through as `u8`, so every flag crossing the
//! boundary is converted here.

use camino::Utf8Path;
use eyre::Result;
use marlin::{
    verilator::{VerilatorRuntime, VerilatorRuntimeOptions},
    verilog::prelude::*,
};

use crate::golden::{AdderCase, AluCase, ShiftCase};
use crate::model::{
    ClockedModel, CombinationalUnit, CoreModel, Evaluate, HandshakeUnit, MemRequest,
};
use crate::regfile::RegisterFileView;

#[verilog(src = "rtl/rvcore.sv", name = "rvcore")]
pub struct RvCore;

#[verilog(src = "rtl/alu.sv", name = "alu")]
pub struct Alu;

#[verilog(src = "rtl/adder3.sv", name = "adder3")]
pub struct Adder3;

#[verilog(src = "rtl/shifter3.sv", name = "shifter3")]
pub struct Shifter3;

pub fn create_runtime() -> Result<VerilatorRuntime> {
    let include_paths = [Utf8Path::new("rtl")];
    let src_files = [
        Utf8Path::new("rtl/rvcore.sv"),
        Utf8Path::new("rtl/alu.sv"),
        Utf8Path::new("rtl/adder3.sv"),
        Utf8Path::new("rtl/shifter3.sv"),
    ];

    VerilatorRuntime::new(
        Utf8Path::new("artifacts"),
        &src_files,
        &include_paths,
        [],
        VerilatorRuntimeOptions::default_logging(),
    )
    .map_err(|e| eyre::eyre!("Failed to create runtime: {}", e))
}

fn bit(value: bool) -> u8 {
    u8::from(value)
}

impl<'ctx> Evaluate for RvCore<'ctx> {
    fn evaluate(&mut self) {
        self.eval();
    }
}

impl<'ctx> ClockedModel for RvCore<'ctx> {
    fn set_clock(&mut self, high: bool) {
        self.clk = bit(high);
    }

    fn set_reset(&mut self, asserted: bool) {
        self.rst = bit(asserted);
    }
}

impl<'ctx> RegisterFileView for RvCore<'ctx> {
    // Only the probe inputs change, so settling again leaves the core's
    // state untouched.
    fn read_raw(&mut self, index: u8) -> u32 {
        self.probe_reg = index & 0x1f;
        self.eval();
        self.probe_data
    }
}

impl<'ctx> CoreModel for RvCore<'ctx> {
    fn mem_request(&self) -> MemRequest {
        MemRequest {
            address: self.mem_addr,
            size_code: self.mem_size,
            read: self.mem_read != 0,
            write: self.mem_write != 0,
            write_data: self.memwrite_data,
        }
    }

    fn set_read_data(&mut self, word: u32) {
        self.memread_data = word;
    }

    fn trap(&self) -> bool {
        self.trap != 0
    }

    fn instruction_boundary(&self) -> bool {
        self.new_instr != 0
    }

    fn program_counter(&self) -> u32 {
        self.pc_o
    }

    fn instruction(&self) -> u32 {
        self.inst_o
    }
}

impl<'ctx> Evaluate for Alu<'ctx> {
    fn evaluate(&mut self) {
        self.eval();
    }
}

impl<'ctx> CombinationalUnit for Alu<'ctx> {
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

impl<'ctx> Evaluate for Adder3<'ctx> {
    fn evaluate(&mut self) {
        self.eval();
    }
}

impl<'ctx> ClockedModel for Adder3<'ctx> {
    fn set_clock(&mut self, high: bool) {
        self.clk = bit(high);
    }

    fn set_reset(&mut self, asserted: bool) {
        self.rst = bit(asserted);
    }
}

impl<'ctx> HandshakeUnit for Adder3<'ctx> {
    type Case = AdderCase;
    /// Running sum, fed back into `src_a`.
    type Feedback = u32;

    fn issue(&mut self, case: &AdderCase) {
        self.op = case.op.code();
        self.src_a = case.a;
        self.src_b = case.b;
    }

    fn set_start(&mut self, start: bool) {
        self.start = bit(start);
    }

    fn done(&self) -> bool {
        self.done != 0
    }

    fn feedback(&self) -> u32 {
        self.out
    }

    fn apply_feedback(&mut self, sum: u32) {
        self.src_a = sum;
    }

    fn output(&self) -> u32 {
        self.out
    }
}

impl<'ctx> Evaluate for Shifter3<'ctx> {
    fn evaluate(&mut self) {
        self.eval();
    }
}

impl<'ctx> ClockedModel for Shifter3<'ctx> {
    fn set_clock(&mut self, high: bool) {
        self.clk = bit(high);
    }

    fn set_reset(&mut self, asserted: bool) {
        self.rst = bit(asserted);
    }
}

impl<'ctx> HandshakeUnit for Shifter3<'ctx> {
    type Case = ShiftCase;
    /// Partial value and remaining shift amount.
    type Feedback = (u32, u8);

    fn issue(&mut self, case: &ShiftCase) {
        self.val_i = case.value;
        self.sham_i = (case.amount & 31) as u8;
        self.right_shift = bit(case.mode.right_shift());
        self.arith_shift = bit(case.mode.arith_shift());
    }

    fn set_start(&mut self, start: bool) {
        self.start = bit(start);
    }

    fn done(&self) -> bool {
        self.done != 0
    }

    fn feedback(&self) -> (u32, u8) {
        (self.val_o, self.sham_o)
    }

    fn apply_feedback(&mut self, (value, amount): (u32, u8)) {
        self.val_i = value;
        self.sham_i = amount;
    }

    fn output(&self) -> u32 {
        self.val_o
    }
}
