use std::io::{self, Read};

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand, ValueEnum};
use eyre::{eyre, Result, WrapErr};
use log::{debug, info};

use rv_cosim::driver::DEFAULT_MAX_HALF_CYCLES;
use rv_cosim::memory::DEFAULT_STACK_BYTES;
use rv_cosim::sweep::{self, DEFAULT_ITERATIONS, DEFAULT_SEED};
use rv_cosim::{
    create_runtime, Adder3, AddressSpace, Alu, ClockedDriver, CombinationalOracle, DriverConfig,
    HandshakeOracle, RvCore, Shifter3, SweepConfig, SyscallAbi, SyscallEmulator,
    TerminationReason,
};

#[derive(Parser, Debug)]
#[command(
    name = "rv-cosim",
    version,
    about = "Co-simulate Verilated RISC-V hardware against golden models"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a flat binary image on the core until it exits.
    Run {
        /// Raw little-endian program image.
        image: Utf8PathBuf,

        /// Address of the first image byte.
        #[arg(long, default_value = "0", value_parser = parse_u32)]
        base: u32,

        /// Entry point; defaults to the base address.
        #[arg(long, value_parser = parse_u32)]
        start: Option<u32>,

        /// Zeroed bytes reserved after the image for the stack.
        #[arg(long, default_value_t = DEFAULT_STACK_BYTES)]
        stack: usize,

        /// Take the syscall number from a5 instead of a7.
        #[arg(long)]
        rv32e: bool,

        /// Forward read(2) syscalls to standard input.
        #[arg(long)]
        stdin: bool,

        /// Give up after this many half-cycles.
        #[arg(long, default_value_t = DEFAULT_MAX_HALF_CYCLES)]
        max_half_cycles: u64,
    },

    /// Sweep a functional unit against its reference function.
    Check {
        #[arg(value_enum)]
        unit: UnitKind,

        /// Random cases to run after the exhaustive matrix.
        #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
        iters: usize,

        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum UnitKind {
    Alu,
    Adder,
    Shifter,
}

fn parse_u32(s: &str) -> std::result::Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address {s:?}: {e}"))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Run {
            image,
            base,
            start,
            stack,
            rv32e,
            stdin,
            max_half_cycles,
        } => {
            let bytes =
                std::fs::read(&image).wrap_err_with(|| format!("Failed to read {image}"))?;
            info!("loaded {} bytes from {image} at 0x{base:08x}", bytes.len());

            let memory = AddressSpace::with_image(&bytes, stack, base);
            let abi = if rv32e {
                SyscallAbi::rv32e()
            } else {
                SyscallAbi::default()
            };
            let config = DriverConfig {
                start_address: start.unwrap_or(base),
                max_half_cycles,
                ..DriverConfig::default()
            };
            let syscalls = SyscallEmulator::new(abi, io::stdout());
            if stdin {
                run_program(memory, syscalls.with_source(io::stdin()), config)?
            } else {
                run_program(memory, syscalls, config)?
            }
        }
        Commands::Check { unit, iters, seed } => {
            let config = SweepConfig {
                seed,
                iterations: iters,
                ..SweepConfig::default()
            };
            check_unit(unit, &config)?
        }
    };

    std::process::exit(code);
}

fn run_program<R: Read>(
    memory: AddressSpace,
    syscalls: SyscallEmulator<io::Stdout, R>,
    config: DriverConfig,
) -> Result<i32> {
    let runtime = create_runtime()?;
    let core = runtime
        .create_model_simple::<RvCore>()
        .map_err(|e| eyre!("Failed to create core model: {:?}", e))?;

    let mut driver = ClockedDriver::new(core, memory, syscalls, config)?;
    let summary = driver.run();
    if summary.reason != TerminationReason::NormalExit {
        debug!("memory at termination:\n{}", driver.memory().hexdump());
    }
    Ok(summary.result_code)
}

fn check_unit(unit: UnitKind, config: &SweepConfig) -> Result<i32> {
    let runtime = create_runtime()?;

    let (cases, failures) = match unit {
        UnitKind::Alu => {
            let alu = runtime
                .create_model_simple::<Alu>()
                .map_err(|e| eyre!("Failed to create ALU model: {:?}", e))?;
            let mut oracle = CombinationalOracle::new(alu);
            let report = oracle.sweep(sweep::alu_matrix().chain(sweep::random_alu_cases(config)));
            (report.cases, report.failures())
        }
        UnitKind::Adder => {
            let adder = runtime
                .create_model_simple::<Adder3>()
                .map_err(|e| eyre!("Failed to create adder model: {:?}", e))?;
            let mut oracle = HandshakeOracle::new(adder, config.max_cycles_per_case);
            let report =
                oracle.sweep(sweep::adder_matrix().chain(sweep::random_adder_cases(config)));
            (report.cases, report.failures())
        }
        UnitKind::Shifter => {
            let shifter = runtime
                .create_model_simple::<Shifter3>()
                .map_err(|e| eyre!("Failed to create shifter model: {:?}", e))?;
            let mut oracle = HandshakeOracle::new(shifter, config.max_cycles_per_case);
            let report =
                oracle.sweep(sweep::shifter_matrix().chain(sweep::random_shift_cases(config)));
            (report.cases, report.failures())
        }
    };

    if failures == 0 {
        println!("All {cases} tests passed!");
        Ok(0)
    } else {
        println!("{failures} of {cases} tests failed");
        Ok(1)
    }
}
