//! The `ops` module holds the catalog of measured operations.
//!
//! Four families are measured, always in this order:
//! - `Cpuid`: `cpuid` with a leaf/sub-leaf pair.
//! - `Msr`: `rdmsr` of a model-specific register.
//! - `Hypercall`: `vmcall` (Intel) or `vmmcall` (AMD) with a call number.
//! - `Pio`: single-byte `inb` from a legacy I/O port.
//!
//! Each family has a fixed parameter set. The parameters were picked because the
//! access traps to the hypervisor, the TDX module or the #VC handler on at least one
//! platform.
//!
//! # Traits
//!
//! - `Platform`: the four operations. `NativePlatform` executes the real instructions;
//!   the harness is generic over `Platform` so the operation is inlined into the timed loop.
//!
//! # Submodules
//!
//! - `privilege`: CPL and hypervisor detection, and the per-family preflight.
//! - `vendor`: CPU vendor detection and the hypercall instruction choice.
//! - `native` and `raw` (x86_64 only): the instruction wrappers.
use std::fmt;
use std::hint::black_box;

use serde::{Deserialize, Serialize};

use crate::measure::{Engine, Measurement};

#[cfg(target_arch = "x86_64")]
pub mod native;
pub mod privilege;
#[cfg(target_arch = "x86_64")]
pub mod raw;
pub mod vendor;

pub use self::privilege::{preflight, Host, Privilege};
pub use self::vendor::{HypercallKind, Vendor};

/// Leaf/sub-leaf pairs for `cpuid`.
pub const CPUID_LEAVES: [(u32, u32); 6] = [
    (0x0, 0),  // vendor
    (0x1, 0),  // features (VMGEXIT on SNP)
    (0x2, 0),  // cache/TLB (#VE on TDX)
    (0xb, 0),  // extended topology (#VE on TDX, VMGEXIT on SNP)
    (0x15, 0), // TSC/crystal ratio
    (0x16, 0), // processor frequency (#VE on TDX)
];

pub const IA32_APIC_BASE: u32 = 0x1b;
pub const IA32_PERF_STATUS: u32 = 0x198;
pub const IA32_FS_BASE: u32 = 0xC000_0100;

pub const MSRS: [u32; 3] = [IA32_APIC_BASE, IA32_PERF_STATUS, IA32_FS_BASE];

/// KVM_HC_FEATURES. Deprecated, KVM answers -KVM_ENOSYS (-1000).
pub const KVM_HC_FEATURES: u32 = 2;

pub const HYPERCALLS: [u32; 1] = [KVM_HC_FEATURES];

pub const PIT_CH0: u16 = 0x40;
pub const CMOS_INDEX: u16 = 0x70;
pub const PIC2_COMMAND: u16 = 0xA0;

pub const PORTS: [u16; 3] = [PIT_CH0, CMOS_INDEX, PIC2_COMMAND];

/// The privileged operations that can be measured.
///
/// Implementations must be straight-line: no allocation, no logging and no
/// branching beyond the instruction itself.
pub trait Platform {
    fn cpuid(&self, leaf: u32, subleaf: u32) -> [u32; 4];
    fn rdmsr(&self, msr: u32) -> u64;
    /// Returns the hypervisor's answer in RAX. Not validated.
    fn hypercall(&self, nr: u32) -> u64;
    fn inb(&self, port: u16) -> u8;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Family {
    Cpuid,
    Msr,
    Hypercall,
    Pio,
}

impl Family {
    pub const ALL: [Family; 4] = [Family::Cpuid, Family::Msr, Family::Hypercall, Family::Pio];

    pub fn name(&self) -> &'static str {
        match self {
            Family::Cpuid => "cpuid",
            Family::Msr => "msr",
            Family::Hypercall => "hypercall",
            Family::Pio => "pio",
        }
    }

    /// The standard parameter set of this family, in measurement order.
    pub fn operations(&self) -> Vec<OperationId> {
        match self {
            Family::Cpuid => CPUID_LEAVES
                .iter()
                .map(|&(leaf, subleaf)| OperationId::Cpuid { leaf, subleaf })
                .collect(),
            Family::Msr => MSRS.iter().map(|&addr| OperationId::Msr { addr }).collect(),
            Family::Hypercall => HYPERCALLS
                .iter()
                .map(|&nr| OperationId::Hypercall { nr })
                .collect(),
            Family::Pio => PORTS.iter().map(|&port| OperationId::Pio { port }).collect(),
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One operation with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationId {
    Cpuid { leaf: u32, subleaf: u32 },
    Msr { addr: u32 },
    Hypercall { nr: u32 },
    Pio { port: u16 },
}

impl OperationId {
    pub fn family(&self) -> Family {
        match self {
            OperationId::Cpuid { .. } => Family::Cpuid,
            OperationId::Msr { .. } => Family::Msr,
            OperationId::Hypercall { .. } => Family::Hypercall,
            OperationId::Pio { .. } => Family::Pio,
        }
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            OperationId::Cpuid { leaf, subleaf } => {
                write!(f, "cpuid (rax={:#x}, rcx={:#x})", leaf, subleaf)
            }
            OperationId::Msr { addr } => write!(f, "msr ({:#x})", addr),
            OperationId::Hypercall { nr } => write!(f, "hypercall (nr={})", nr),
            OperationId::Pio { port } => write!(f, "pio (port={:#x})", port),
        }
    }
}

/// Measure `op` on `platform`.
///
/// The match happens once, outside the loops; each arm hands the engine a closure
/// that is nothing but the operation.
pub fn measure_operation<P: Platform>(
    engine: &Engine,
    platform: &P,
    op: OperationId,
) -> Measurement {
    match op {
        OperationId::Cpuid { leaf, subleaf } => engine.measure(op, || {
            black_box(platform.cpuid(leaf, subleaf));
        }),
        OperationId::Msr { addr } => engine.measure(op, || {
            black_box(platform.rdmsr(addr));
        }),
        OperationId::Hypercall { nr } => engine.measure(op, || {
            black_box(platform.hypercall(nr));
        }),
        OperationId::Pio { port } => engine.measure(op, || {
            black_box(platform.inb(port));
        }),
    }
}
