use serde::{Deserialize, Serialize};
#[cfg(target_arch = "x86_64")]
use core::arch::x86_64;

#[cfg(target_arch = "x86_64")]
use crate::ops::raw::cpuid;
use crate::util::NS_PER_SEC;
use crate::BenchError;

/// A pair of readings taken at one edge of a timed region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    /// cycle counter
    pub cycles: u64,
    /// monotonic wall clock in nanoseconds
    pub ns: i64,
}

/// The source of both clocks used to bracket a timed phase.
///
/// `cycles_start` must not be reordered past the instructions that follow it and
/// `cycles_end` must not be reordered before the instructions that precede it.
/// Neither may fail.
pub trait Clock {
    fn cycles_start(&self) -> u64;
    fn cycles_end(&self) -> u64;
    fn monotonic_ns(&self) -> i64;

    /// Open a timed region. The wall clock is read outside the cycle counter bracket.
    #[inline(always)]
    fn start(&self) -> Mark {
        let ns = self.monotonic_ns();
        let cycles = self.cycles_start();
        Mark { cycles, ns }
    }

    /// Close a timed region opened with [`Clock::start`].
    #[inline(always)]
    fn end(&self) -> Mark {
        let cycles = self.cycles_end();
        let ns = self.monotonic_ns();
        Mark { cycles, ns }
    }
}

/// Construct the hardware clock for this machine.
///
/// Fails if the target has no time-stamp counter. Warns if the counter is not invariant.
pub fn construct_clock() -> Result<Box<dyn Clock>, BenchError> {
    #[cfg(target_arch = "x86_64")]
    let clock: Option<Box<dyn Clock>> = TscClock::is_supported().then(|| {
        if !TscClock::is_invariant() {
            warn!("TSC is not invariant, cycle counts depend on the current frequency");
        }
        Box::new(TscClock {}) as Box<dyn Clock>
    });
    #[cfg(not(target_arch = "x86_64"))]
    let clock: Option<Box<dyn Clock>> = None;
    clock.ok_or(BenchError::UnsupportedArch)
}

/// Serialized TSC reads paired with `CLOCK_MONOTONIC`.
#[cfg(target_arch = "x86_64")]
pub struct TscClock {}

#[cfg(target_arch = "x86_64")]
impl TscClock {
    /// CPUID.01H:EDX.TSC[bit 4]
    pub fn is_supported() -> bool {
        cpuid(0x1, 0).edx & (1 << 4) != 0
    }

    /// CPUID.80000007H:EDX[bit 8]. An invariant TSC ticks at a constant rate across
    /// P-, C- and T-states, so cycle figures stay comparable to the nanosecond figures.
    pub fn is_invariant() -> bool {
        if cpuid(0x8000_0000, 0).eax < 0x8000_0007 {
            return false;
        }
        cpuid(0x8000_0007, 0).edx & (1 << 8) != 0
    }
}

#[cfg(target_arch = "x86_64")]
impl Clock for TscClock {
    #[inline(always)]
    fn cycles_start(&self) -> u64 {
        unsafe {
            x86_64::_mm_mfence();
            x86_64::_mm_lfence();
            let tsc = x86_64::_rdtsc();
            x86_64::_mm_lfence(); // keep the measured code behind the read
            tsc
        }
    }

    #[inline(always)]
    fn cycles_end(&self) -> u64 {
        unsafe {
            let mut aux = 0;
            // rdtscp waits for all preceding instructions to retire
            let tsc = x86_64::__rdtscp(&mut aux);
            x86_64::_mm_lfence();
            tsc
        }
    }

    #[inline(always)]
    fn monotonic_ns(&self) -> i64 {
        let mut ts = libc::timespec {
            tv_sec: 0,
            tv_nsec: 0,
        };
        // CLOCK_MONOTONIC with a valid pointer cannot fail
        unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) };
        ts.tv_sec as i64 * NS_PER_SEC + ts.tv_nsec as i64
    }
}
