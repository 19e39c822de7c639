//! The instructions being measured.
//!
//! This is the only place in the crate that executes privileged instructions. Every
//! wrapper is `#[inline(always)]` so it lands directly in the timed loop.
use core::arch::asm;
use core::arch::x86_64::{CpuidResult, __cpuid_count};

/// `cpuid` with `leaf` in EAX and `subleaf` in ECX.
///
/// Unprivileged and always present on x86_64. Under SEV-SNP and TDX some leaves
/// are intercepted and handled by the #VC/#VE handler.
#[inline(always)]
#[allow(unused_unsafe)]
pub fn cpuid(leaf: u32, subleaf: u32) -> CpuidResult {
    unsafe { __cpuid_count(leaf, subleaf) }
}

/// `rdmsr`, EDX:EAX assembled into one value.
///
/// # Safety
/// Must run at CPL 0 and `msr` must exist on this CPU, otherwise the CPU raises #GP.
#[inline(always)]
pub unsafe fn rdmsr(msr: u32) -> u64 {
    x86::msr::rdmsr(msr)
}

/// `inb` from `port`.
///
/// # Safety
/// Requires CPL 0 or an I/O privilege level that permits port access. Reading a
/// device register can have device side effects; the ports measured here are
/// read-only status/data registers of legacy devices.
#[inline(always)]
pub unsafe fn inb(port: u16) -> u8 {
    x86::io::inb(port)
}

/// Intel `vmcall` with `nr` in RAX. Returns RAX as written by the hypervisor.
///
/// # Safety
/// Raises #UD when no hypervisor handles the exit (bare metal).
#[inline(always)]
pub unsafe fn vmcall(nr: u32) -> u64 {
    let ret: u64;
    asm!("vmcall", inlateout("rax") nr as u64 => ret, options(nostack));
    ret
}

/// AMD `vmmcall` with `nr` in RAX. Returns RAX as written by the hypervisor.
///
/// # Safety
/// Raises #UD when no hypervisor handles the exit (bare metal).
#[inline(always)]
pub unsafe fn vmmcall(nr: u32) -> u64 {
    let ret: u64;
    asm!("vmmcall", inlateout("rax") nr as u64 => ret, options(nostack));
    ret
}
