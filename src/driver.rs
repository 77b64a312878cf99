//! Cycle-by-cycle driver for a core model.
//!
//! The driver owns the model, its memory and the syscall emulator for the
//! whole run. Each [`ClockedDriver::step`] services whatever the model asked
//! for on the previous settle, then clocks it through one full cycle:
//!
//! ```text
//! Reset -> Running -> Terminated(Exit | Fault | Timeout)
//! ```
//!
//! `Terminated` is absorbing: once there, the model is never touched again.

use std::io::{self, Read, Write};

use log::{debug, error, info, trace};

use crate::assembler::jal_checked;
use crate::error::{Result, SimError};
use crate::memory::{AddressSpace, MemSize};
use crate::model::CoreModel;
use crate::regfile::Reg;
use crate::syscall::{SyscallEmulator, SyscallOutcome};

/// Exit code reported for faults and timeouts.
///
/// This is the host's `EXIT_FAILURE`, so it coincides with a program that
/// calls `exit(1)`. [`RunSummary::reason`] tells the two apart.
pub const FAILURE_CODE: i32 = 1;

pub const DEFAULT_RESET_CYCLES: u32 = 2;
pub const DEFAULT_MAX_HALF_CYCLES: u64 = 10_000_000;

/// What the core sees on its read-data bus while reset is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BootVector {
    /// The start address itself; the core loads it into its PC.
    #[default]
    Address,
    /// A `jal zero, start` the core executes as its first instruction.
    JumpInstruction,
}

/// How the model's program counter maps to a byte address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PcConvention {
    /// The counter is already a byte address.
    #[default]
    Byte,
    /// The counter indexes words and must be shifted left by two.
    Word,
}

impl PcConvention {
    pub fn to_byte_address(self, raw: u32) -> u32 {
        match self {
            PcConvention::Byte => raw,
            PcConvention::Word => raw << 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Full clock cycles with reset asserted.
    pub reset_cycles: u32,
    /// The run times out once the half-cycle counter exceeds this.
    pub max_half_cycles: u64,
    pub start_address: u32,
    pub boot_vector: BootVector,
    pub pc_convention: PcConvention,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            reset_cycles: DEFAULT_RESET_CYCLES,
            max_half_cycles: DEFAULT_MAX_HALF_CYCLES,
            start_address: 0,
            boot_vector: BootVector::default(),
            pc_convention: PcConvention::default(),
        }
    }
}

impl DriverConfig {
    fn boot_word(&self) -> Result<u32> {
        match self.boot_vector {
            BootVector::Address => Ok(self.start_address),
            BootVector::JumpInstruction => jal_checked(Reg::Zero, i64::from(self.start_address))
                .map_err(|reason| SimError::InvalidStartAddress {
                    address: self.start_address,
                    reason,
                }),
        }
    }
}

/// How a run ended.
#[derive(Debug)]
pub enum Termination {
    /// The program called exit with this code.
    Exit(u32),
    /// Memory fault or unhandled trap.
    Fault(SimError),
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    NormalExit,
    MemoryFault,
    UnhandledTrap,
    Timeout,
    /// The host side failed, e.g. the output sink refused a WRITE.
    HostError,
}

impl Termination {
    pub fn reason(&self) -> TerminationReason {
        match self {
            Termination::Exit(_) => TerminationReason::NormalExit,
            Termination::Fault(err) => match err {
                SimError::OutOfRange { .. } | SimError::InvalidSizeCode { .. } => {
                    TerminationReason::MemoryFault
                }
                SimError::UnhandledTrap { .. } => TerminationReason::UnhandledTrap,
                SimError::Timeout { .. } => TerminationReason::Timeout,
                SimError::Io(_) | SimError::InvalidStartAddress { .. } => {
                    TerminationReason::HostError
                }
            },
            Termination::Timeout => TerminationReason::Timeout,
        }
    }

    pub fn result_code(&self) -> i32 {
        match self {
            Termination::Exit(code) => *code as i32,
            Termination::Fault(_) | Termination::Timeout => FAILURE_CODE,
        }
    }
}

#[derive(Debug)]
pub enum DriverState {
    Reset,
    Running,
    Terminated(Termination),
}

/// Counters and outcome of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub reason: TerminationReason,
    pub result_code: i32,
    pub half_cycles: u64,
    pub instructions: u64,
}

impl RunSummary {
    pub fn cycles(&self) -> u64 {
        self.half_cycles / 2
    }
}

pub struct ClockedDriver<M, W, R = io::Empty> {
    model: M,
    memory: AddressSpace,
    syscalls: SyscallEmulator<W, R>,
    config: DriverConfig,
    boot_word: u32,
    state: DriverState,
    half_cycles: u64,
    instructions: u64,
}

impl<M: CoreModel, W: Write, R: Read> ClockedDriver<M, W, R> {
    /// Fails only when the configured boot vector cannot be encoded.
    pub fn new(
        model: M,
        memory: AddressSpace,
        syscalls: SyscallEmulator<W, R>,
        config: DriverConfig,
    ) -> Result<Self> {
        let boot_word = config.boot_word()?;
        Ok(Self {
            model,
            memory,
            syscalls,
            config,
            boot_word,
            state: DriverState::Reset,
            half_cycles: 0,
            instructions: 0,
        })
    }

    pub fn state(&self) -> &DriverState {
        &self.state
    }

    pub fn termination(&self) -> Option<&Termination> {
        match &self.state {
            DriverState::Terminated(termination) => Some(termination),
            _ => None,
        }
    }

    pub fn memory(&self) -> &AddressSpace {
        &self.memory
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn syscalls(&self) -> &SyscallEmulator<W, R> {
        &self.syscalls
    }

    pub fn half_cycles(&self) -> u64 {
        self.half_cycles
    }

    pub fn instructions(&self) -> u64 {
        self.instructions
    }

    /// Byte address of the instruction the model is working on.
    pub fn pc(&self) -> u32 {
        self.config
            .pc_convention
            .to_byte_address(self.model.program_counter())
    }

    pub fn into_parts(self) -> (M, AddressSpace, SyscallEmulator<W, R>) {
        (self.model, self.memory, self.syscalls)
    }

    /// Runs until the state machine terminates.
    pub fn run(&mut self) -> RunSummary {
        loop {
            self.step();
            if let Some(termination) = self.termination() {
                let summary = RunSummary {
                    reason: termination.reason(),
                    result_code: termination.result_code(),
                    half_cycles: self.half_cycles,
                    instructions: self.instructions,
                };
                info!(
                    "Completed {} instructions, {} cycles ({:?})",
                    summary.instructions,
                    summary.cycles(),
                    summary.reason
                );
                return summary;
            }
        }
    }

    /// Advances the state machine by one transition.
    pub fn step(&mut self) -> &DriverState {
        match self.state {
            DriverState::Reset => {
                self.reset();
                self.state = DriverState::Running;
            }
            DriverState::Running => {
                if let Some(termination) = self.cycle() {
                    match &termination {
                        Termination::Exit(code) => info!("EXIT STATUS: {code}"),
                        Termination::Fault(err) => error!("pc: 0x{:08x} -- {err}", self.pc()),
                        Termination::Timeout => error!(
                            "{}",
                            SimError::Timeout {
                                half_cycles: self.half_cycles
                            }
                        ),
                    }
                    self.state = DriverState::Terminated(termination);
                }
            }
            DriverState::Terminated(_) => {}
        }
        &self.state
    }

    fn edge(&mut self, high: bool) {
        self.model.set_clock(high);
        self.model.evaluate();
        self.half_cycles += 1;
        trace!("half-cycle {} clk={}", self.half_cycles, u8::from(high));
    }

    fn reset(&mut self) {
        debug!(
            "holding reset for {} cycles, boot word 0x{:08x}",
            self.config.reset_cycles, self.boot_word
        );
        self.model.set_reset(true);
        self.model.set_read_data(self.boot_word);
        for _ in 0..self.config.reset_cycles {
            self.edge(false);
            self.edge(true);
        }
        self.model.set_reset(false);
        self.edge(false);
    }

    /// One Running iteration; `Some` when the run has to stop.
    fn cycle(&mut self) -> Option<Termination> {
        if let Err(err) = self.service_memory() {
            return Some(Termination::Fault(err));
        }

        if self.model.trap() {
            let pc = self.pc();
            let instruction = self.model.instruction();
            match self
                .syscalls
                .service(pc, instruction, &mut self.model, &mut self.memory)
            {
                Ok(SyscallOutcome::Resume) => {}
                Ok(SyscallOutcome::Exit(code)) => return Some(Termination::Exit(code)),
                Err(err) => return Some(Termination::Fault(err)),
            }
        }

        self.edge(false);
        self.edge(true);

        if self.model.instruction_boundary() {
            self.instructions += 1;
        }

        if self.half_cycles > self.config.max_half_cycles {
            return Some(Termination::Timeout);
        }
        None
    }

    fn service_memory(&mut self) -> Result<()> {
        let request = self.model.mem_request();
        if !request.read && !request.write {
            return Ok(());
        }
        let size = MemSize::from_code(request.size_code)?;

        if request.read {
            let word = self.memory.load_sized(request.address, size)?;
            debug!(
                "LOAD pc: {:08x} addr: {:08x} size: {} val: {word:08x}",
                self.pc(),
                request.address,
                size.width().bytes()
            );
            self.model.set_read_data(word);
        }
        if request.write {
            self.memory
                .store_sized(request.address, size, request.write_data)?;
            debug!(
                "STORE pc: {:08x} addr: {:08x} size: {} val: {:08x}",
                self.pc(),
                request.address,
                size.width().bytes(),
                request.write_data
            );
        }
        Ok(())
    }
}
