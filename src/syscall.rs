//! Emulation of the handful of system calls test programs make.
//!
//! When the model raises its trap line, the retiring instruction is
//! classified through [`SystemOp::classify`]. Only `ecall` dispatches a
//! syscall; CSR accesses and fences are accepted as no-ops and everything
//! else ends the run.

use std::fmt;
use std::io::{self, Read, Write};

use log::{debug, info, warn};

use crate::error::{Result, SimError};
use crate::memory::AddressSpace;
use crate::regfile::{Reg, RegisterFileView};

pub const SYS_READ: u32 = 63;
pub const SYS_WRITE: u32 = 64;
pub const SYS_EXIT: u32 = 93;

const OPCODE_MASK: u32 = 0x7f;
const OPCODE_SYSTEM: u32 = 0b111_0011;
const OPCODE_MISC_MEM: u32 = 0b000_1111;
const INST_ECALL: u32 = 0x0000_0073;
const INST_EBREAK: u32 = 0x0010_0073;

/// What a trapping instruction means to the emulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemOp {
    Ecall,
    Ebreak,
    Csr,
    Fence,
    Unknown,
}

impl SystemOp {
    pub fn classify(instruction: u32) -> Self {
        let funct3 = (instruction >> 12) & 0b111;
        match (instruction & OPCODE_MASK, funct3) {
            (OPCODE_SYSTEM, 0b000) => match instruction {
                INST_ECALL => SystemOp::Ecall,
                INST_EBREAK => SystemOp::Ebreak,
                _ => SystemOp::Unknown,
            },
            // funct3 100 is reserved in the SYSTEM space
            (OPCODE_SYSTEM, 0b100) => SystemOp::Unknown,
            (OPCODE_SYSTEM, _) => SystemOp::Csr,
            (OPCODE_MISC_MEM, _) => SystemOp::Fence,
            _ => SystemOp::Unknown,
        }
    }
}

/// Why a trap could not be serviced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapKind {
    UnknownSyscall(u32),
    Breakpoint,
    UnknownInstruction,
}

impl fmt::Display for TrapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrapKind::UnknownSyscall(number) => write!(f, "unhandled syscall #{number}"),
            TrapKind::Breakpoint => f.write_str("breakpoint"),
            TrapKind::UnknownInstruction => f.write_str("unrecognized system instruction"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    Read,
    Write,
    Exit,
}

impl Syscall {
    pub fn from_number(number: u32) -> Option<Self> {
        match number {
            SYS_READ => Some(Syscall::Read),
            SYS_WRITE => Some(Syscall::Write),
            SYS_EXIT => Some(Syscall::Exit),
            _ => None,
        }
    }
}

/// Which registers carry the syscall number, its arguments and the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyscallAbi {
    pub number: Reg,
    pub args: [Reg; 3],
    pub exit_code: Reg,
}

impl Default for SyscallAbi {
    fn default() -> Self {
        Self {
            number: Reg::A7,
            args: [Reg::A0, Reg::A1, Reg::A2],
            exit_code: Reg::A0,
        }
    }
}

impl SyscallAbi {
    /// Embedded cores without a7 pass the number in a5.
    pub fn rv32e() -> Self {
        Self {
            number: Reg::A5,
            ..Self::default()
        }
    }
}

/// How `read` requests are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Accept the call and leave memory alone.
    #[default]
    Ignore,
    /// Pull bytes from the emulator's source into memory.
    Forward,
}

/// A syscall as observed on one trap; never outlives the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyscallRequest {
    pub number: u32,
    pub args: [u32; 3],
}

impl SyscallRequest {
    pub fn capture<V: RegisterFileView + ?Sized>(abi: &SyscallAbi, regs: &mut V) -> Self {
        Self {
            number: regs.read(abi.number),
            args: abi.args.map(|reg| regs.read(reg)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallOutcome {
    /// Keep clocking.
    Resume,
    /// The program asked to stop with this code.
    Exit(u32),
}

/// Services traps against an [`AddressSpace`] and a pair of byte streams.
#[derive(Debug)]
pub struct SyscallEmulator<W, R = io::Empty> {
    abi: SyscallAbi,
    read_policy: ReadPolicy,
    sink: W,
    source: R,
}

impl<W: Write> SyscallEmulator<W> {
    pub fn new(abi: SyscallAbi, sink: W) -> Self {
        Self {
            abi,
            read_policy: ReadPolicy::Ignore,
            sink,
            source: io::empty(),
        }
    }
}

impl<W: Write, R: Read> SyscallEmulator<W, R> {
    /// Replaces the byte source and turns on `read` forwarding.
    pub fn with_source<S: Read>(self, source: S) -> SyscallEmulator<W, S> {
        SyscallEmulator {
            abi: self.abi,
            read_policy: ReadPolicy::Forward,
            sink: self.sink,
            source,
        }
    }

    pub fn with_read_policy(mut self, policy: ReadPolicy) -> Self {
        self.read_policy = policy;
        self
    }

    pub fn abi(&self) -> &SyscallAbi {
        &self.abi
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn into_sink(self) -> W {
        self.sink
    }

    /// Handles one trap raised while `instruction` at `pc` was retiring.
    pub fn service<V: RegisterFileView + ?Sized>(
        &mut self,
        pc: u32,
        instruction: u32,
        regs: &mut V,
        memory: &mut AddressSpace,
    ) -> Result<SyscallOutcome> {
        let unhandled = |kind| SimError::UnhandledTrap {
            pc,
            instruction,
            kind,
        };

        match SystemOp::classify(instruction) {
            SystemOp::Ecall => {}
            SystemOp::Csr | SystemOp::Fence => {
                debug!("ignoring system instruction 0x{instruction:08x} at pc 0x{pc:08x}");
                return Ok(SyscallOutcome::Resume);
            }
            SystemOp::Ebreak => return Err(unhandled(TrapKind::Breakpoint)),
            SystemOp::Unknown => return Err(unhandled(TrapKind::UnknownInstruction)),
        }

        let request = SyscallRequest::capture(&self.abi, regs);
        let [arg0, arg1, arg2] = request.args;
        match Syscall::from_number(request.number) {
            Some(Syscall::Exit) => {
                let code = regs.read(self.abi.exit_code);
                info!("exit({code}) at pc 0x{pc:08x}");
                Ok(SyscallOutcome::Exit(code))
            }
            Some(Syscall::Write) => {
                debug!("_write({arg0}, 0x{arg1:08x}, {arg2}) at pc 0x{pc:08x}");
                // Zero bytes touch no memory, wherever the buffer points.
                if arg2 == 0 {
                    return Ok(SyscallOutcome::Resume);
                }
                let bytes = memory.read_bytes(arg1, arg2 as usize)?;
                self.sink.write_all(bytes)?;
                self.sink.flush()?;
                Ok(SyscallOutcome::Resume)
            }
            Some(Syscall::Read) => {
                debug!("_read({arg0}, 0x{arg1:08x}, {arg2}) at pc 0x{pc:08x}");
                if self.read_policy == ReadPolicy::Forward && arg2 != 0 {
                    self.forward_read(arg1, arg2 as usize, memory)?;
                }
                Ok(SyscallOutcome::Resume)
            }
            None => {
                warn!("unhandled syscall #{} at pc 0x{pc:08x}", request.number);
                Err(unhandled(TrapKind::UnknownSyscall(request.number)))
            }
        }
    }

    /// Checks the whole destination first so a bad buffer never consumes input.
    fn forward_read(&mut self, address: u32, len: usize, memory: &mut AddressSpace) -> Result<()> {
        memory.read_bytes(address, len)?;
        let mut buf = Vec::with_capacity(len);
        (&mut self.source).take(len as u64).read_to_end(&mut buf)?;
        memory.write_bytes(address, &buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regfile::RegisterFile;

    fn regs(number: u32, args: [u32; 3]) -> RegisterFile {
        let mut rf = RegisterFile::new();
        rf.set(Reg::A7, number);
        rf.set(Reg::A0, args[0]);
        rf.set(Reg::A1, args[1]);
        rf.set(Reg::A2, args[2]);
        rf
    }

    #[test]
    fn test_classify_table() {
        assert_eq!(SystemOp::classify(0x0000_0073), SystemOp::Ecall);
        assert_eq!(SystemOp::classify(0x0010_0073), SystemOp::Ebreak);
        // csrrs a0, cycle, zero
        assert_eq!(SystemOp::classify(0xc000_2573), SystemOp::Csr);
        // csrrw zero, mscratch, a0
        assert_eq!(SystemOp::classify(0x3405_1073), SystemOp::Csr);
        assert_eq!(SystemOp::classify(0x0ff0_000f), SystemOp::Fence);
        // mret lives in funct3 000 but is not ecall/ebreak
        assert_eq!(SystemOp::classify(0x3020_0073), SystemOp::Unknown);
        assert_eq!(SystemOp::classify(0x0000_4073), SystemOp::Unknown);
        // addi a0, a0, 1
        assert_eq!(SystemOp::classify(0x0015_0513), SystemOp::Unknown);
    }

    #[test]
    fn test_exit_reports_code() {
        let mut emu = SyscallEmulator::new(SyscallAbi::default(), Vec::new());
        let mut mem = AddressSpace::new(16, 0);
        let mut rf = regs(SYS_EXIT, [5, 0, 0]);
        let outcome = emu.service(0x40, INST_ECALL, &mut rf, &mut mem).unwrap();
        assert_eq!(outcome, SyscallOutcome::Exit(5));
        assert!(emu.sink().is_empty());
    }

    #[test]
    fn test_write_forwards_bytes_and_leaves_memory() {
        let mut mem = AddressSpace::with_image(b"....Hello World!", 0, 0);
        let before = mem.clone();
        let mut emu = SyscallEmulator::new(SyscallAbi::default(), Vec::new());
        let mut rf = regs(SYS_WRITE, [1, 4, 12]);
        let outcome = emu.service(0, INST_ECALL, &mut rf, &mut mem).unwrap();
        assert_eq!(outcome, SyscallOutcome::Resume);
        assert_eq!(emu.into_sink(), b"Hello World!");
        assert_eq!(mem, before);
    }

    #[test]
    fn test_write_out_of_range_is_a_fault() {
        let mut mem = AddressSpace::new(8, 0);
        let mut emu = SyscallEmulator::new(SyscallAbi::default(), Vec::new());
        let mut rf = regs(SYS_WRITE, [1, 4, 8]);
        let err = emu.service(0, INST_ECALL, &mut rf, &mut mem).unwrap_err();
        assert!(err.is_memory_fault());
        assert!(emu.sink().is_empty());
    }

    #[test]
    fn test_zero_length_transfers_skip_the_buffer() {
        let mut mem = AddressSpace::new(48, 0);
        let mut emu =
            SyscallEmulator::new(SyscallAbi::default(), Vec::new()).with_source(&b"abc"[..]);

        let mut rf = regs(SYS_WRITE, [1, 0x7f0, 0]);
        let outcome = emu.service(0, INST_ECALL, &mut rf, &mut mem).unwrap();
        assert_eq!(outcome, SyscallOutcome::Resume);
        assert!(emu.sink().is_empty());

        let mut rf = regs(SYS_READ, [0, 0xffff_fff0, 0]);
        let outcome = emu.service(0, INST_ECALL, &mut rf, &mut mem).unwrap();
        assert_eq!(outcome, SyscallOutcome::Resume);
        assert!(mem.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_ignored_by_default() {
        let mut mem = AddressSpace::new(8, 0);
        let mut emu = SyscallEmulator::new(SyscallAbi::default(), Vec::new());
        let mut rf = regs(SYS_READ, [0, 0, 4]);
        let outcome = emu.service(0, INST_ECALL, &mut rf, &mut mem).unwrap();
        assert_eq!(outcome, SyscallOutcome::Resume);
        assert!(mem.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_read_forwarding_fills_memory() {
        let mut mem = AddressSpace::new(8, 0x100);
        let mut emu =
            SyscallEmulator::new(SyscallAbi::default(), Vec::new()).with_source(&b"abcdef"[..]);
        let mut rf = regs(SYS_READ, [0, 0x102, 4]);
        emu.service(0, INST_ECALL, &mut rf, &mut mem).unwrap();
        assert_eq!(mem.as_bytes(), b"\0\0abcd\0\0");

        // Destination past the end: nothing consumed, nothing written.
        let mut rf = regs(SYS_READ, [0, 0x106, 4]);
        assert!(emu.service(0, INST_ECALL, &mut rf, &mut mem).is_err());
        assert_eq!(mem.as_bytes(), b"\0\0abcd\0\0");
    }

    #[test]
    fn test_unknown_syscall_and_traps() {
        let mut mem = AddressSpace::new(8, 0);
        let mut emu = SyscallEmulator::new(SyscallAbi::default(), Vec::new());

        let mut rf = regs(57, [0, 0, 0]);
        let err = emu.service(0x10, INST_ECALL, &mut rf, &mut mem).unwrap_err();
        assert!(matches!(
            err,
            SimError::UnhandledTrap {
                pc: 0x10,
                kind: TrapKind::UnknownSyscall(57),
                ..
            }
        ));

        let err = emu.service(0x14, INST_EBREAK, &mut rf, &mut mem).unwrap_err();
        assert!(matches!(
            err,
            SimError::UnhandledTrap {
                kind: TrapKind::Breakpoint,
                ..
            }
        ));

        let outcome = emu.service(0x18, 0xc000_2573, &mut rf, &mut mem).unwrap();
        assert_eq!(outcome, SyscallOutcome::Resume);
    }

    #[test]
    fn test_rv32e_abi_uses_a5() {
        let mut mem = AddressSpace::new(8, 0);
        let mut emu = SyscallEmulator::new(SyscallAbi::rv32e(), Vec::new());
        let mut rf = RegisterFile::new();
        rf.set(Reg::A5, SYS_EXIT);
        rf.set(Reg::A0, 3);
        let outcome = emu.service(0, INST_ECALL, &mut rf, &mut mem).unwrap();
        assert_eq!(outcome, SyscallOutcome::Exit(3));
    }
}
