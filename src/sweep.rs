//! Test matrices for the oracles.
//!
//! Exhaustive sweeps take the cross product of a fixed operand catalogue with
//! every operation. Random sweeps draw from a seeded [`StdRng`], so the same
//! seed always yields the same cases.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::golden::{AdderCase, AdderOp, AluCase, AluOp, ShiftCase, ShiftMode};

pub const DEFAULT_SEED: u64 = 0;
pub const DEFAULT_ITERATIONS: usize = 100;
pub const DEFAULT_MAX_CYCLES_PER_CASE: u64 = 100_000;

/// Boundary values, repeating nibble patterns and a few arbitrary words.
pub const ADDER_INPUTS: [u32; 39] = [
    0x00000000, 0x00000001, 0x80000000, 0x7FFFFFFF, 0xFFFFFFFF, 0xDEADBEEF, 0xABCDEF01, 0x12345678,
    0x87654321, 0x11111111, 0x22222222, 0x33333333, 0x44444444, 0x55555555, 0x66666666, 0x77777777,
    0x88888888, 0x99999999, 0xAAAAAAAA, 0xBBBBBBBB, 0xCCCCCCCC, 0xDDDDDDDD, 0xEEEEEEEE, 0xFFFFFFFF,
    0x10101010, 0x20202020, 0x30303030, 0x40404040, 0x50505050, 0x60606060, 0x70707070, 0x80808080,
    0x90909090, 0xA0A0A0A0, 0xB0B0B0B0, 0xC0C0C0C0, 0xD0D0D0D0, 0xE0E0E0E0, 0xF0F0F0F0,
];

/// Zero, small magnitudes of both signs around powers of two, then a few
/// patterned words. Negative values are written in two's complement.
pub const SHIFTER_INPUTS: [u32; 49] = [
    0x00000000, 0x00000001, 0xFFFFFFFF, 0x00000002, 0xFFFFFFFE, 0x00000003, 0xFFFFFFFD, 0x00000007,
    0xFFFFFFF9, 0x00000008, 0xFFFFFFF8, 0x00000009, 0xFFFFFFF7, 0x0000000F, 0xFFFFFFF1, 0x00000010,
    0xFFFFFFF0, 0x0000007F, 0xFFFFFF81, 0x00000080, 0xFFFFFF80, 0x00000081, 0xFFFFFF7F, 0x000000FF,
    0xFFFFFF01, 0x00000100, 0xFFFFFF00, 0x00000101, 0xFFFFFEFF, 0x000001FF, 0xFFFFFE01, 0x00000200,
    0xFFFFFE00, 0x00000201, 0xFFFFFDFF, 0x000003FF, 0xFFFFFC01, 0x00000400, 0xFFFFFC00, 0x00000401,
    0xFFFFFBFF, 0xDEADBEEF, 0xABCDEF01, 0x12345678, 0x87654321, 0x11111111, 0x22222222, 0x33333333,
    0xFFFFFFFF,
];

pub const SHIFT_AMOUNTS: [u32; 11] = [0, 1, 2, 3, 7, 8, 9, 15, 16, 30, 31];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    pub seed: u64,
    /// Number of cases in a random sweep.
    pub iterations: usize,
    /// Handshake cases that take longer than this are reported as timeouts.
    pub max_cycles_per_case: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            iterations: DEFAULT_ITERATIONS,
            max_cycles_per_case: DEFAULT_MAX_CYCLES_PER_CASE,
        }
    }
}

/// Every ALU operation over every pair of [`ADDER_INPUTS`].
pub fn alu_matrix() -> impl Iterator<Item = AluCase> {
    ADDER_INPUTS.into_iter().flat_map(|a| {
        ADDER_INPUTS
            .into_iter()
            .flat_map(move |b| AluOp::ALL.into_iter().map(move |op| AluCase { op, a, b }))
    })
}

pub fn adder_matrix() -> impl Iterator<Item = AdderCase> {
    ADDER_INPUTS.into_iter().flat_map(|a| {
        ADDER_INPUTS
            .into_iter()
            .flat_map(move |b| AdderOp::ALL.into_iter().map(move |op| AdderCase { op, a, b }))
    })
}

pub fn shifter_matrix() -> impl Iterator<Item = ShiftCase> {
    SHIFTER_INPUTS.into_iter().flat_map(|value| {
        SHIFT_AMOUNTS.into_iter().flat_map(move |amount| {
            ShiftMode::ALL.into_iter().map(move |mode| ShiftCase {
                mode,
                value,
                amount,
            })
        })
    })
}

pub fn random_alu_cases(config: &SweepConfig) -> impl Iterator<Item = AluCase> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..config.iterations).map(move |_| AluCase {
        op: AluOp::ALL[rng.gen_range(0..AluOp::ALL.len())],
        a: rng.gen(),
        b: rng.gen(),
    })
}

pub fn random_adder_cases(config: &SweepConfig) -> impl Iterator<Item = AdderCase> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..config.iterations).map(move |_| AdderCase {
        op: AdderOp::ALL[rng.gen_range(0..AdderOp::ALL.len())],
        a: rng.gen(),
        b: rng.gen(),
    })
}

pub fn random_shift_cases(config: &SweepConfig) -> impl Iterator<Item = ShiftCase> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    (0..config.iterations).map(move |_| ShiftCase {
        mode: ShiftMode::ALL[rng.gen_range(0..ShiftMode::ALL.len())],
        value: rng.gen(),
        amount: rng.gen_range(0..32),
    })
}
