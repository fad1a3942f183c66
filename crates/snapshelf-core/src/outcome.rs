use serde::{Serialize, Serializer};
use std::fmt;

/// Result of one install, update, or refresh request.
///
/// A flat classification with stable numeric codes; batch passes add the
/// codes of their failures into the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallOutcome {
    Success,
    /// The archive or its embedded manifest could not be read.
    ArchiveUnreadable,
    /// Neither pkexec nor sudo started this process.
    NoPrivilegeContext,
    MissingArchiveOrSignature,
    AcknowledgeFailed,
    InstallFailed,
    RefreshFailed,
    /// A base or provider package is not in the catalog.
    DependencyMissing,
    CyclicDependency,
}

impl InstallOutcome {
    pub fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::ArchiveUnreadable => 1,
            Self::NoPrivilegeContext => 2,
            Self::MissingArchiveOrSignature => 10,
            Self::AcknowledgeFailed => 11,
            Self::InstallFailed => 12,
            Self::RefreshFailed => 13,
            Self::DependencyMissing => 14,
            Self::CyclicDependency => 15,
        }
    }

    #[inline]
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ArchiveUnreadable => "package archive unreadable",
            Self::NoPrivilegeContext => "not started through pkexec or sudo",
            Self::MissingArchiveOrSignature => "archive or signature file missing",
            Self::AcknowledgeFailed => "signature acknowledgment failed",
            Self::InstallFailed => "install failed",
            Self::RefreshFailed => "refresh failed",
            Self::DependencyMissing => "dependency missing from offline folder",
            Self::CyclicDependency => "cyclic dependency",
        }
    }
}

impl fmt::Display for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.describe(), self.code())
    }
}

impl Serialize for InstallOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}
