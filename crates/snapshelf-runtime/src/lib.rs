//! Host-facing collaborators for snapshelf.
//!
//! This crate implements everything that leaves the process: reading the
//! manifest out of a package archive with `unsquashfs` (`ArchiveReader`),
//! running the privileged `snap` tool (`SnapTool`), querying the snapd REST
//! API over its Unix socket (`SnapDaemon`), elevation detection, store
//! reachability, prerequisite checks, and the configuration file. Each seam
//! is a trait with an in-memory implementation in [`mock`].

pub mod archive;
pub mod config;
pub mod daemon;
pub mod elevation;
pub mod mock;
pub mod prereq;
pub mod probe;
pub mod tool;

pub use archive::{ArchiveReader, UnsquashfsReader};
pub use config::ShelfConfig;
pub use daemon::{SnapDaemon, SnapdClient};
pub use elevation::{invoking_user, passwd_entry, Elevation, InvokingUser};
pub use prereq::{check_offline_prereqs, check_online_prereqs, format_missing, MissingPrereq};
pub use probe::store_reachable;
pub use tool::{SnapCommand, SnapOp, SnapTool, ToolStatus};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot read package archive {}: {reason}", path.display())]
    ArchiveUnreadable { path: PathBuf, reason: String },
    #[error("failed to run {program}: {reason}")]
    ExecFailed { program: String, reason: String },
    #[error("snapd request {path} failed: {reason}")]
    Daemon { path: String, reason: String },
    #[error("invalid config {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

impl RuntimeError {
    pub(crate) fn unreadable(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Self::ArchiveUnreadable {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}
