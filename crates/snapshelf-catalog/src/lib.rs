//! Offline package folders: layout, scanning, and reconciliation for snapshelf.
//!
//! This crate provides the catalog layer: `CatalogLayout` for the plain and
//! offline-mirror folder conventions, `scan` for enumerating archive/signature
//! pairs across architecture folders, `Catalog` for name lookup, the
//! `updatable`/`installable` reconcilers, and offline-mirror discovery.

pub mod arch;
pub mod catalog;
pub mod discover;
pub mod layout;
pub mod reconcile;
pub mod scan;

pub use arch::{host_machine, Arch};
pub use catalog::Catalog;
pub use discover::{discover_offline_root, SearchRoots};
pub use layout::{is_offline_mirror, CatalogLayout, LayoutKind, OFFLINE_ROOT_SENTINEL};
pub use reconcile::{installable, updatable, updatable_best};
pub use scan::{scan, scan_folder};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} architecture not yet supported for offline updates")]
    UnsupportedArchitecture(String),
    #[error("offline folder not found: {}", .0.display())]
    RootNotFound(PathBuf),
}
