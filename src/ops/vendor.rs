use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Vendor {
    Intel,
    Amd,
    Hygon,
    Other,
}

impl Vendor {
    /// Map the 12 byte CPUID.0 vendor string.
    pub fn from_vendor_string(vendor: &str) -> Self {
        match vendor {
            "GenuineIntel" => Vendor::Intel,
            "AuthenticAMD" => Vendor::Amd,
            "HygonGenuine" => Vendor::Hygon,
            _ => Vendor::Other,
        }
    }

    #[cfg(target_arch = "x86_64")]
    pub fn detect() -> Self {
        x86::cpuid::CpuId::new()
            .get_vendor_info()
            .map(|info| Vendor::from_vendor_string(info.as_str()))
            .unwrap_or(Vendor::Other)
    }

    /// AMD and Hygon implement `vmmcall`; everything else is assumed to be VMX.
    pub fn hypercall_kind(&self) -> HypercallKind {
        match self {
            Vendor::Amd | Vendor::Hygon => HypercallKind::Vmmcall,
            Vendor::Intel | Vendor::Other => HypercallKind::Vmcall,
        }
    }
}

/// The hypercall instruction available on this CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HypercallKind {
    Vmcall,
    Vmmcall,
}

impl fmt::Display for HypercallKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            HypercallKind::Vmcall => write!(f, "vmcall"),
            HypercallKind::Vmmcall => write!(f, "vmmcall"),
        }
    }
}

#[test]
fn test_vendor_selects_hypercall() {
    assert_eq!(
        Vendor::from_vendor_string("GenuineIntel").hypercall_kind(),
        HypercallKind::Vmcall
    );
    assert_eq!(
        Vendor::from_vendor_string("AuthenticAMD").hypercall_kind(),
        HypercallKind::Vmmcall
    );
    assert_eq!(
        Vendor::from_vendor_string("HygonGenuine").hypercall_kind(),
        HypercallKind::Vmmcall
    );
    assert_eq!(Vendor::from_vendor_string("KVMKVMKVM"), Vendor::Other);
    assert_eq!(Vendor::Other.hypercall_kind(), HypercallKind::Vmcall);
}
