//! Run-mode dispatch.
//!
//! A run measures the selected families one after another, and within a family one
//! operation after another. Reports are emitted between measurements, never during one.
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::measure::{Engine, Measurement};
use crate::ops::{measure_operation, Family, Platform};
use crate::report::Reporter;
use crate::timer::Clock;
use crate::BenchError;

/// Which families to run: `0` all of them, `1..=4` one of them, anything else none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mode(pub i32);

impl Mode {
    pub fn families(&self) -> &'static [Family] {
        match self.0 {
            0 => &Family::ALL,
            1 => &[Family::Cpuid],
            2 => &[Family::Msr],
            3 => &[Family::Hypercall],
            4 => &[Family::Pio],
            _ => &[],
        }
    }

    /// Number of measurements a run in this mode produces.
    pub fn operation_count(&self) -> usize {
        self.families()
            .iter()
            .map(|family| family.operations().len())
            .sum()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Measure every operation selected by `mode` on `platform`.
///
/// Each measurement is handed to `reporter` as soon as it completes and is also
/// returned. An unrecognized mode measures and reports nothing. `reporter` is
/// finished on every successful return.
pub fn run<P: Platform>(
    mode: Mode,
    platform: &P,
    clock: &dyn Clock,
    reporter: &mut dyn Reporter,
) -> Result<Vec<Measurement>, BenchError> {
    let families = mode.families();
    if families.is_empty() {
        warn!("mode {} selects no operations", mode);
        reporter.finish()?;
        return Ok(vec![]);
    }

    let engine = Engine::new(clock);
    let mut measurements = Vec::with_capacity(mode.operation_count());
    for &family in families {
        info!("Benchmarking {}", family);
        reporter.family(family)?;
        for op in family.operations() {
            let m = measure_operation(&engine, platform, op);
            reporter.report(&m)?;
            measurements.push(m);
        }
    }
    reporter.finish()?;
    Ok(measurements)
}
