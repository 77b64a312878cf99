//! Fault taxonomy shared by everything below the binary.
//!
//! Everything here is returned by value. Only [`crate::driver::ClockedDriver`]
//! turns one of these into a terminal run state.

use thiserror::Error;

use crate::syscall::TrapKind;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    /// An access of `width` bytes at `address` left `[base, base + size)`.
    #[error("address 0x{address:08x} (width {width}) is outside memory at 0x{base:08x} of {size} bytes")]
    OutOfRange {
        address: u32,
        width: usize,
        base: u32,
        size: usize,
    },

    /// The model drove a memory size code that is not B/H/W/BU/HU.
    #[error("invalid memory size code 0b{code:03b}")]
    InvalidSizeCode { code: u8 },

    #[error("unhandled trap at pc 0x{pc:08x}, instruction 0x{instruction:08x}: {kind}")]
    UnhandledTrap {
        pc: u32,
        instruction: u32,
        kind: TrapKind,
    },

    #[error("simulation timed out after {half_cycles} half-cycles")]
    Timeout { half_cycles: u64 },

    #[error("start address 0x{address:08x} cannot be used as a boot vector: {reason}")]
    InvalidStartAddress { address: u32, reason: &'static str },

    #[error("syscall stream error: {0}")]
    Io(#[from] std::io::Error),
}

impl SimError {
    /// Memory faults are the ones raised by address translation, as opposed to traps.
    pub fn is_memory_fault(&self) -> bool {
        matches!(
            self,
            SimError::OutOfRange { .. } | SimError::InvalidSizeCode { .. }
        )
    }
}
