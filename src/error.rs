use thiserror::Error;

use crate::ops::Family;

/// Errors raised around a run. None of them can occur inside a timed phase.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("the cycle counter is only supported on x86_64")]
    UnsupportedArch,
    #[error("{family} requires CPL 0, running at CPL {cpl}")]
    InsufficientPrivilege { family: Family, cpl: u8 },
    #[error("{family} requires a hypervisor, none is present")]
    NoHypervisor { family: Family },
    #[error("failed to obtain port I/O permission: {0}")]
    PortAccess(std::io::Error),
    #[error("Error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
