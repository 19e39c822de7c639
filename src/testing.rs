//! Deterministic stand-ins for the hardware clock and the privileged operations.
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::measure::Measurement;
use crate::ops::{Family, Platform};
use crate::report::Reporter;
use crate::BenchError;

/// Advances the cycle counter by `cycle_step` and the wall clock by `ns_step`
/// on every read of the respective clock.
pub struct FixedStepClock {
    cycles: Cell<u64>,
    ns: Cell<i64>,
    cycle_step: u64,
    ns_step: i64,
}

impl FixedStepClock {
    pub fn new(cycle_step: u64, ns_step: i64) -> Self {
        Self {
            cycles: Cell::new(0),
            ns: Cell::new(0),
            cycle_step,
            ns_step,
        }
    }
}

impl crate::timer::Clock for FixedStepClock {
    fn cycles_start(&self) -> u64 {
        self.cycles.set(self.cycles.get() + self.cycle_step);
        self.cycles.get()
    }

    fn cycles_end(&self) -> u64 {
        self.cycles_start()
    }

    fn monotonic_ns(&self) -> i64 {
        self.ns.set(self.ns.get() + self.ns_step);
        self.ns.get()
    }
}

/// Reports a shared tick counter as both cycles and nanoseconds. Reads do not
/// advance it; the work being measured does.
#[derive(Default)]
pub struct TickClock {
    ticks: Rc<Cell<u64>>,
}

impl TickClock {
    pub fn ticks(&self) -> Rc<Cell<u64>> {
        self.ticks.clone()
    }
}

impl crate::timer::Clock for TickClock {
    fn cycles_start(&self) -> u64 {
        self.ticks.get()
    }

    fn cycles_end(&self) -> u64 {
        self.ticks.get()
    }

    fn monotonic_ns(&self) -> i64 {
        self.ticks.get() as i64
    }
}

/// Counts calls per family and charges `cost` ticks to the shared counter per call.
pub struct RecordingPlatform {
    ticks: Rc<Cell<u64>>,
    cost: u64,
    calls: [Cell<u64>; 4],
    ports: RefCell<Vec<u16>>,
}

impl RecordingPlatform {
    pub fn new(ticks: Rc<Cell<u64>>, cost: u64) -> Self {
        Self {
            ticks,
            cost,
            calls: Default::default(),
            ports: RefCell::new(vec![]),
        }
    }

    pub fn calls(&self, family: Family) -> u64 {
        self.calls[family as usize].get()
    }

    pub fn total_calls(&self) -> u64 {
        self.calls.iter().map(Cell::get).sum()
    }

    /// Distinct ports read, in first-read order.
    pub fn ports(&self) -> Vec<u16> {
        self.ports.borrow().clone()
    }

    fn charge(&self, family: Family) {
        let c = &self.calls[family as usize];
        c.set(c.get() + 1);
        self.ticks.set(self.ticks.get() + self.cost);
    }
}

impl Platform for RecordingPlatform {
    fn cpuid(&self, leaf: u32, subleaf: u32) -> [u32; 4] {
        self.charge(Family::Cpuid);
        [leaf, 0, subleaf, 0]
    }

    fn rdmsr(&self, msr: u32) -> u64 {
        self.charge(Family::Msr);
        msr as u64
    }

    fn hypercall(&self, _nr: u32) -> u64 {
        self.charge(Family::Hypercall);
        // -KVM_ENOSYS
        (-1000i64) as u64
    }

    fn inb(&self, port: u16) -> u8 {
        self.charge(Family::Pio);
        let mut ports = self.ports.borrow_mut();
        if ports.last() != Some(&port) {
            ports.push(port);
        }
        0xff
    }
}

/// Keeps every reported measurement and the family headers in arrival order.
#[derive(Default)]
pub struct CollectingReporter {
    pub families: Vec<Family>,
    pub measurements: Vec<Measurement>,
    pub finished: bool,
}

impl Reporter for CollectingReporter {
    fn family(&mut self, family: Family) -> Result<(), BenchError> {
        self.families.push(family);
        Ok(())
    }

    fn report(&mut self, m: &Measurement) -> Result<(), BenchError> {
        self.measurements.push(*m);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), BenchError> {
        self.finished = true;
        Ok(())
    }
}
