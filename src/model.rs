//! Signal-level view of the hardware under test.
//!
//! The harness never looks inside a model. It writes inputs, calls
//! [`Evaluate::evaluate`], and only then reads outputs. State is expected to
//! change on a rising clock edge and nowhere else.

use crate::golden::GoldenCase;
use crate::regfile::RegisterFileView;

/// Recompute all outputs from the current inputs and internal state.
pub trait Evaluate {
    fn evaluate(&mut self);
}

pub trait ClockedModel: Evaluate {
    fn set_clock(&mut self, high: bool);
    fn set_reset(&mut self, asserted: bool);
}

/// Load/store request lines sampled from a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemRequest {
    pub address: u32,
    /// Raw size code, see [`crate::memory::MemSize`].
    pub size_code: u8,
    pub read: bool,
    pub write: bool,
    pub write_data: u32,
}

/// A processor core driven by [`crate::driver::ClockedDriver`].
pub trait CoreModel: ClockedModel + RegisterFileView {
    fn mem_request(&self) -> MemRequest;
    fn set_read_data(&mut self, word: u32);
    /// The retiring instruction needs the emulator.
    fn trap(&self) -> bool;
    /// Asserted when the core is at the start of a new instruction.
    fn instruction_boundary(&self) -> bool;
    /// Program counter as the model stores it; see [`crate::driver::PcConvention`].
    fn program_counter(&self) -> u32;
    fn instruction(&self) -> u32;
}

/// A multi-cycle unit speaking the start/done protocol.
///
/// Between cycles the unit's own outputs are fed back as its next inputs;
/// `Feedback` is whatever has to be carried across the rising edge.
pub trait HandshakeUnit: ClockedModel {
    type Case: GoldenCase;
    type Feedback: Copy;

    /// Drive operands and modifier flags for `case`.
    fn issue(&mut self, case: &Self::Case);
    fn set_start(&mut self, start: bool);
    fn done(&self) -> bool;
    fn feedback(&self) -> Self::Feedback;
    fn apply_feedback(&mut self, feedback: Self::Feedback);
    fn output(&self) -> u32;
}

/// A purely combinational unit.
pub trait CombinationalUnit: Evaluate {
    type Case: GoldenCase;

    fn apply(&mut self, case: &Self::Case);
    fn output(&self) -> u32;
}
