//! # vmexit-bench
//!
//! Measures how many cycles and nanoseconds privileged x86 operations cost when
//! they are executed in a tight loop: `cpuid`, `rdmsr`, `vmcall`/`vmmcall` and `inb`.
//! Inside a VM or a confidential guest (SEV-SNP, TDX) these operations exit to the
//! hypervisor or raise #VE/#VC, so the averages expose the trap overhead of the
//! platform compared to bare metal.
//!
//! The crate is split the same way a run flows:
//! - `timer`: the `Clock` seam and the serialized TSC + monotonic clock pair.
//! - `measure`: the warmup/timed/average protocol for one operation.
//! - `ops`: the catalog of operation families, the `Platform` seam and the raw instructions.
//! - `harness`: run-mode dispatch over the families.
//! - `report`: text, JSON and CSV reporters and the run file.
pub mod config;
pub mod error;
pub mod harness;
pub mod measure;
pub mod ops;
pub mod report;
pub mod timer;
pub mod util;

#[cfg(test)]
mod testing;

#[macro_use]
extern crate log;

pub use error::BenchError;
