//! Golden-model checking for functional units.
//!
//! A [`CombinationalOracle`] applies a case and evaluates once. A
//! [`HandshakeOracle`] pulses `start`, then clocks the unit and feeds its own
//! outputs back until it raises `done`:
//!
//! ```text
//! Idle -> Issued -> Busy* -> Done
//! ```
//!
//! Mismatches and per-case timeouts are collected in an [`OracleReport`]
//! rather than returned as errors, so a sweep always runs to the end.

use std::fmt;

use log::{debug, info, warn};

use crate::driver::DEFAULT_RESET_CYCLES;
use crate::golden::GoldenCase;
use crate::model::{CombinationalUnit, HandshakeUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseOutcome {
    Pass,
    Mismatch { expected: u32, actual: u32 },
    /// `done` never rose within the per-case ceiling.
    Timeout { cycles: u64 },
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        matches!(self, CaseOutcome::Pass)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch<C> {
    pub case: C,
    pub expected: u32,
    pub actual: u32,
}

impl<C: fmt::Display> fmt::Display for Mismatch<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: expected 0x{:08x}, got 0x{:08x}",
            self.case, self.expected, self.actual
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseTimeout<C> {
    pub case: C,
    pub cycles: u64,
}

impl<C: fmt::Display> fmt::Display for CaseTimeout<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: no result after {} cycles", self.case, self.cycles)
    }
}

/// Accumulated results of a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleReport<C> {
    pub cases: usize,
    pub mismatches: Vec<Mismatch<C>>,
    pub timeouts: Vec<CaseTimeout<C>>,
}

impl<C> Default for OracleReport<C> {
    fn default() -> Self {
        Self {
            cases: 0,
            mismatches: Vec::new(),
            timeouts: Vec::new(),
        }
    }
}

impl<C: GoldenCase> OracleReport<C> {
    pub fn record(&mut self, case: C, outcome: CaseOutcome) {
        self.cases += 1;
        match outcome {
            CaseOutcome::Pass => {}
            CaseOutcome::Mismatch { expected, actual } => {
                let mismatch = Mismatch {
                    case,
                    expected,
                    actual,
                };
                warn!("mismatch: {mismatch}");
                self.mismatches.push(mismatch);
            }
            CaseOutcome::Timeout { cycles } => {
                let timeout = CaseTimeout { case, cycles };
                warn!("timeout: {timeout}");
                self.timeouts.push(timeout);
            }
        }
    }

    pub fn failures(&self) -> usize {
        self.mismatches.len() + self.timeouts.len()
    }

    /// True only if every case in the sweep matched.
    pub fn passed(&self) -> bool {
        self.failures() == 0
    }
}

impl<C> fmt::Display for OracleReport<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cases, {} mismatches, {} timeouts",
            self.cases,
            self.mismatches.len(),
            self.timeouts.len()
        )
    }
}

fn compare<C: GoldenCase>(case: &C, actual: u32) -> CaseOutcome {
    let expected = case.expected();
    if actual == expected {
        debug!("{case} = 0x{actual:08x}");
        CaseOutcome::Pass
    } else {
        CaseOutcome::Mismatch { expected, actual }
    }
}

pub struct CombinationalOracle<U> {
    unit: U,
}

impl<U: CombinationalUnit> CombinationalOracle<U> {
    pub fn new(unit: U) -> Self {
        Self { unit }
    }

    pub fn unit(&self) -> &U {
        &self.unit
    }

    pub fn into_inner(self) -> U {
        self.unit
    }

    pub fn check(&mut self, case: &U::Case) -> CaseOutcome {
        self.unit.apply(case);
        self.unit.evaluate();
        compare(case, self.unit.output())
    }

    pub fn sweep<I>(&mut self, cases: I) -> OracleReport<U::Case>
    where
        I: IntoIterator<Item = U::Case>,
    {
        let mut report = OracleReport::default();
        for case in cases {
            let outcome = self.check(&case);
            report.record(case, outcome);
        }
        info!("combinational sweep: {report}");
        report
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakePhase {
    Idle,
    Issued,
    Busy,
    Done,
}

pub struct HandshakeOracle<U> {
    unit: U,
    max_cycles: u64,
    phase: HandshakePhase,
    last_cycles: u64,
}

impl<U: HandshakeUnit> HandshakeOracle<U> {
    /// Wraps `unit` and puts it through reset.
    pub fn new(unit: U, max_cycles: u64) -> Self {
        let mut oracle = Self {
            unit,
            max_cycles,
            phase: HandshakePhase::Idle,
            last_cycles: 0,
        };
        oracle.reset();
        oracle
    }

    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    pub fn unit(&self) -> &U {
        &self.unit
    }

    pub fn into_inner(self) -> U {
        self.unit
    }

    /// Clock cycles the most recent case took to raise `done`.
    pub fn last_cycles(&self) -> u64 {
        self.last_cycles
    }

    fn clock(&mut self, high: bool) {
        self.unit.set_clock(high);
        self.unit.evaluate();
    }

    pub fn reset(&mut self) {
        self.unit.set_start(false);
        self.unit.set_reset(true);
        for _ in 0..DEFAULT_RESET_CYCLES {
            self.clock(false);
            self.clock(true);
        }
        self.unit.set_reset(false);
        self.clock(false);
        self.phase = HandshakePhase::Idle;
    }

    pub fn run_case(&mut self, case: &U::Case) -> CaseOutcome {
        self.unit.issue(case);
        self.unit.set_start(true);
        self.clock(false);
        self.phase = HandshakePhase::Issued;

        let mut cycles = 0;
        while !self.unit.done() {
            if cycles >= self.max_cycles {
                self.last_cycles = cycles;
                // Leave the unit in a known state for the next case.
                self.reset();
                return CaseOutcome::Timeout { cycles };
            }
            let feedback = self.unit.feedback();
            self.clock(true);
            self.unit.set_start(false);
            self.unit.apply_feedback(feedback);
            self.clock(false);
            self.phase = HandshakePhase::Busy;
            cycles += 1;
        }

        self.phase = HandshakePhase::Done;
        self.last_cycles = cycles;
        let actual = self.unit.output();
        self.unit.set_start(false);
        self.clock(true);
        compare(case, actual)
    }

    pub fn sweep<I>(&mut self, cases: I) -> OracleReport<U::Case>
    where
        I: IntoIterator<Item = U::Case>,
    {
        let mut report = OracleReport::default();
        for case in cases {
            let outcome = self.run_case(&case);
            report.record(case, outcome);
        }
        info!("handshake sweep: {report}");
        report
    }
}
