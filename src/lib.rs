pub mod assembler;
pub mod driver;
pub mod error;
pub mod golden;
pub mod memory;
pub mod model;
pub mod oracle;
pub mod regfile;
pub mod simulator;
pub mod sweep;
pub mod syscall;

pub use driver::{
    BootVector, ClockedDriver, DriverConfig, DriverState, PcConvention, RunSummary, Termination,
    TerminationReason,
};
pub use error::{Result, SimError};
pub use golden::{AdderCase, AdderOp, AluCase, AluOp, GoldenCase, ShiftCase, ShiftMode};
pub use memory::{AccessWidth, AddressSpace, MemSize};
pub use model::{ClockedModel, CombinationalUnit, CoreModel, Evaluate, HandshakeUnit, MemRequest};
pub use oracle::{CaseOutcome, CombinationalOracle, HandshakeOracle, HandshakePhase, OracleReport};
pub use regfile::{Reg, RegisterFile, RegisterFileView};
pub use simulator::{create_runtime, Adder3, Alu, RvCore, Shifter3};
pub use sweep::SweepConfig;
pub use syscall::{ReadPolicy, SyscallAbi, SyscallEmulator, SyscallOutcome};
