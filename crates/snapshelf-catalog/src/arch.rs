use crate::CatalogError;
use std::fmt;
use std::fs;
use std::path::Path;

/// Architectures the offline catalog has folders for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Amd64,
}

impl Arch {
    /// Map a machine name (as reported by `uname -m`) to a catalog folder.
    ///
    /// Only 64-bit x86 is supported; everything else is rejected so callers
    /// can tell the user instead of showing an empty list.
    pub fn from_machine(machine: &str) -> Result<Self, CatalogError> {
        match machine {
            "x86_64" => Ok(Self::Amd64),
            other => Err(CatalogError::UnsupportedArchitecture(other.to_owned())),
        }
    }

    /// Architecture of the machine the program runs on.
    pub fn host() -> Result<Self, CatalogError> {
        Self::from_machine(&host_machine())
    }

    pub fn folder(self) -> &'static str {
        match self {
            Self::Amd64 => "amd64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder())
    }
}

const KERNEL_ARCH_FILE: &str = "/proc/sys/kernel/arch";

/// The running kernel's machine name (`uname -m`), falling back to the
/// architecture the binary was built for.
pub fn host_machine() -> String {
    machine_from(Path::new(KERNEL_ARCH_FILE))
}

fn machine_from(arch_file: &Path) -> String {
    fs::read_to_string(arch_file)
        .ok()
        .map(|m| m.trim().to_owned())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| std::env::consts::ARCH.to_owned())
}
