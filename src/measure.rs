//! The measurement protocol shared by every operation.
//!
//! One measurement is: `WARMUP_COUNT` discarded invocations, then `BENCH_COUNT`
//! invocations bracketed by the [`Clock`]. Nothing but the operation runs between
//! the brackets: no logging, no allocation, no reporting.
//!
//! Averages are raw floor divisions of the totals. The loop increment and the
//! inlined call are part of every iteration and are not subtracted.
use crate::ops::OperationId;
use crate::timer::{Clock, Mark};
use crate::util::{BENCH_COUNT, WARMUP_COUNT};

/// The readings of one timed phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    pub op: OperationId,
    pub warmup: u64,
    pub iterations: u64,
    pub start: Mark,
    pub end: Mark,
}

impl Measurement {
    /// Cycles elapsed over the timed phase. Wraps instead of underflowing.
    pub fn total_cycles(&self) -> u64 {
        self.end.cycles.wrapping_sub(self.start.cycles)
    }

    pub fn avg_cycles(&self) -> u64 {
        self.total_cycles() / self.iterations
    }

    /// Nanoseconds elapsed over the timed phase.
    pub fn total_ns(&self) -> i64 {
        self.end.ns.wrapping_sub(self.start.ns)
    }

    pub fn avg_ns(&self) -> i64 {
        self.total_ns() / self.iterations as i64
    }
}

pub struct Engine<'a> {
    clock: &'a dyn Clock,
}

impl<'a> Engine<'a> {
    pub fn new(clock: &'a dyn Clock) -> Self {
        Engine { clock }
    }

    /// Run the warmup and the timed phase of `work` and return the bracket readings.
    ///
    /// `work` is monomorphized into both loops, so it must be a straight-line
    /// closure around the measured instruction.
    pub fn measure<F: FnMut()>(&self, op: OperationId, mut work: F) -> Measurement {
        for _ in 0..WARMUP_COUNT {
            work();
        }

        let start = self.clock.start();
        for _ in 0..BENCH_COUNT {
            work();
        }
        let end = self.clock.end();

        Measurement {
            op,
            warmup: WARMUP_COUNT,
            iterations: BENCH_COUNT,
            start,
            end,
        }
    }
}
