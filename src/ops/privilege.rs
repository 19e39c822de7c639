use super::Family;
use crate::BenchError;

/// The privilege level the harness executes at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Privilege {
    cpl: u8,
}

impl Privilege {
    /// Read the CPL from the low two bits of CS.
    #[cfg(target_arch = "x86_64")]
    pub fn current() -> Self {
        let cs: u16;
        unsafe {
            core::arch::asm!("mov {0:x}, cs", out(reg) cs, options(nomem, nostack, preserves_flags));
        }
        Privilege {
            cpl: (cs & 0b11) as u8,
        }
    }

    pub fn from_cpl(cpl: u8) -> Self {
        Privilege { cpl: cpl & 0b11 }
    }

    pub fn cpl(&self) -> u8 {
        self.cpl
    }

    pub fn is_kernel(&self) -> bool {
        self.cpl == 0
    }
}

/// What the preflight knows about the machine the harness runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Host {
    pub privilege: Privilege,
    /// CPUID.01H:ECX[bit 31], set by hypervisors for their guests.
    pub hypervisor: bool,
}

impl Host {
    #[cfg(target_arch = "x86_64")]
    pub fn current() -> Self {
        Host {
            privilege: Privilege::current(),
            hypervisor: super::raw::cpuid(0x1, 0).ecx & (1 << 31) != 0,
        }
    }

    pub fn new(privilege: Privilege, hypervisor: bool) -> Self {
        Host {
            privilege,
            hypervisor,
        }
    }
}

/// What a family needs before its operations can be invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    None,
    Kernel,
    PortIo,
    Hypervisor,
}

impl Family {
    /// `cpuid` is unprivileged. A hypercall from CPL > 0 still exits to the
    /// hypervisor, which answers with an error code; that exit is what is measured.
    /// On bare metal `vmcall`/`vmmcall` raise #UD.
    pub fn requirement(&self) -> Requirement {
        match self {
            Family::Cpuid => Requirement::None,
            Family::Msr => Requirement::Kernel,
            Family::Hypercall => Requirement::Hypervisor,
            Family::Pio => Requirement::PortIo,
        }
    }
}

/// Check every selected family before anything is measured, so a run either
/// executes all of `families` or none of them.
///
/// Outside ring 0, port access is obtained by raising the I/O privilege level.
/// That happens only after every other requirement has passed.
pub fn preflight(host: Host, families: &[Family]) -> Result<(), BenchError> {
    let privilege = host.privilege;
    for &family in families {
        match family.requirement() {
            Requirement::Hypervisor if !host.hypervisor => {
                return Err(BenchError::NoHypervisor { family });
            }
            Requirement::None | Requirement::Hypervisor | Requirement::PortIo => {}
            Requirement::Kernel if !privilege.is_kernel() => {
                return Err(BenchError::InsufficientPrivilege {
                    family,
                    cpl: privilege.cpl(),
                });
            }
            Requirement::Kernel => {}
        }
    }
    let needs_port_io = families
        .iter()
        .any(|family| family.requirement() == Requirement::PortIo);
    if needs_port_io && !privilege.is_kernel() {
        acquire_port_io()?;
    }
    Ok(())
}

#[cfg(all(target_os = "linux", target_arch = "x86_64"))]
fn acquire_port_io() -> Result<(), BenchError> {
    // IOPL 3 grants access to all 65536 ports; needs CAP_SYS_RAWIO
    if unsafe { libc::iopl(3) } != 0 {
        return Err(BenchError::PortAccess(std::io::Error::last_os_error()));
    }
    debug!("raised I/O privilege level to 3");
    Ok(())
}

#[cfg(not(all(target_os = "linux", target_arch = "x86_64")))]
fn acquire_port_io() -> Result<(), BenchError> {
    Err(BenchError::PortAccess(std::io::Error::from(
        std::io::ErrorKind::Unsupported,
    )))
}
