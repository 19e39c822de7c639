//! The platform that executes the real instructions.
use std::marker::PhantomData;

use super::raw;
use super::{preflight, Host, HypercallKind, Platform, Vendor};
use crate::harness::{self, Mode};
use crate::measure::Measurement;
use crate::report::Reporter;
use crate::timer::Clock;
use crate::BenchError;

/// A hypercall instruction, resolved at compile time for the platform type.
pub trait HypercallInsn {
    const KIND: HypercallKind;

    /// # Safety
    /// See [`raw::vmcall`] and [`raw::vmmcall`].
    unsafe fn call(nr: u32) -> u64;
}

pub struct Vmcall;
pub struct Vmmcall;

impl HypercallInsn for Vmcall {
    const KIND: HypercallKind = HypercallKind::Vmcall;

    #[inline(always)]
    unsafe fn call(nr: u32) -> u64 {
        raw::vmcall(nr)
    }
}

impl HypercallInsn for Vmmcall {
    const KIND: HypercallKind = HypercallKind::Vmmcall;

    #[inline(always)]
    unsafe fn call(nr: u32) -> u64 {
        raw::vmmcall(nr)
    }
}

/// Executes `cpuid`, `rdmsr`, `H` and `inb` on the current CPU.
pub struct NativePlatform<H: HypercallInsn> {
    _insn: PhantomData<H>,
}

impl<H: HypercallInsn> NativePlatform<H> {
    /// # Safety
    /// The caller guarantees, for every operation it will invoke:
    /// - `rdmsr`: execution at CPL 0 and that the measured MSRs exist.
    /// - `inb`: CPL 0 or an IOPL/permission bitmap granting the measured ports.
    /// - hypercall: a hypervisor is present and `H` matches the CPU vendor.
    ///
    /// [`super::preflight`] checks privilege and the presence of a hypervisor.
    pub unsafe fn new() -> Self {
        NativePlatform { _insn: PhantomData }
    }

    pub fn hypercall_kind(&self) -> HypercallKind {
        H::KIND
    }
}

impl<H: HypercallInsn> Platform for NativePlatform<H> {
    #[inline(always)]
    fn cpuid(&self, leaf: u32, subleaf: u32) -> [u32; 4] {
        let r = raw::cpuid(leaf, subleaf);
        [r.eax, r.ebx, r.ecx, r.edx]
    }

    #[inline(always)]
    fn rdmsr(&self, msr: u32) -> u64 {
        unsafe { raw::rdmsr(msr) }
    }

    #[inline(always)]
    fn hypercall(&self, nr: u32) -> u64 {
        unsafe { H::call(nr) }
    }

    #[inline(always)]
    fn inb(&self, port: u16) -> u8 {
        unsafe { raw::inb(port) }
    }
}

/// What a native run measured and on which CPU.
#[derive(Debug)]
pub struct NativeRun {
    pub vendor: Vendor,
    pub hypercall: HypercallKind,
    pub measurements: Vec<Measurement>,
}

/// Run `mode` on this CPU with the hypercall instruction of the detected vendor.
///
/// Every selected family passes the preflight before the first measurement.
///
/// # Safety
/// Same contract as [`NativePlatform::new`] for the families selected by `mode`,
/// minus what the preflight checks. What remains is that the measured MSRs and
/// ports exist.
pub unsafe fn run_native(
    mode: Mode,
    clock: &dyn Clock,
    reporter: &mut dyn Reporter,
) -> Result<NativeRun, BenchError> {
    let vendor = Vendor::detect();
    let hypercall = vendor.hypercall_kind();
    let host = Host::current();
    debug!(
        "vendor {:?}, hypercall instruction {}, CPL {}, hypervisor {}",
        vendor,
        hypercall,
        host.privilege.cpl(),
        host.hypervisor
    );
    preflight(host, mode.families())?;

    let measurements = match hypercall {
        HypercallKind::Vmcall => {
            harness::run(mode, &NativePlatform::<Vmcall>::new(), clock, reporter)?
        }
        HypercallKind::Vmmcall => {
            harness::run(mode, &NativePlatform::<Vmmcall>::new(), clock, reporter)?
        }
    };
    Ok(NativeRun {
        vendor,
        hypercall,
        measurements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::Family;
    use crate::testing::CollectingReporter;
    use crate::timer::construct_clock;

    #[test]
    #[ignore = "60M cpuid executions take minutes inside a VM"]
    fn test_native_cpuid_family() -> anyhow::Result<()> {
        let clock = construct_clock()?;
        let mut reporter = CollectingReporter::default();
        let run = unsafe { run_native(Mode(1), clock.as_ref(), &mut reporter)? };
        assert_eq!(run.measurements.len(), Family::Cpuid.operations().len());
        assert!(run.measurements.iter().all(|m| m.avg_cycles() > 0));
        Ok(())
    }

    #[test]
    fn test_native_msr_family_fails_preflight_in_user_mode() -> anyhow::Result<()> {
        let clock = construct_clock()?;
        let mut reporter = CollectingReporter::default();
        let res = unsafe { run_native(Mode(2), clock.as_ref(), &mut reporter) };
        assert!(matches!(res, Err(BenchError::InsufficientPrivilege { .. })));
        assert!(reporter.measurements.is_empty());
        Ok(())
    }

    #[test]
    fn test_native_hypercall_family_requires_hypervisor() -> anyhow::Result<()> {
        if Host::current().hypervisor {
            // a guest would run 10M hypercalls here
            return Ok(());
        }
        let clock = construct_clock()?;
        let mut reporter = CollectingReporter::default();
        let res = unsafe { run_native(Mode(3), clock.as_ref(), &mut reporter) };
        assert!(matches!(
            res,
            Err(BenchError::NoHypervisor {
                family: Family::Hypercall
            })
        ));
        assert!(reporter.families.is_empty());
        Ok(())
    }

    #[test]
    fn test_platform_reports_selected_instruction() {
        let platform = unsafe { NativePlatform::<Vmmcall>::new() };
        assert_eq!(platform.hypercall_kind(), HypercallKind::Vmmcall);
    }
}
