//! Orchestration layer for snapshelf.
//!
//! This crate ties the catalog and the host collaborators together into the
//! `Engine`: the privileged install primitive for a single archive, the
//! dependency-closure installer that brings in bases and providers first,
//! and the offline and online batch update passes. It also arranges wayward
//! archives in an offline mirror and handles Ctrl-C between batch items.

pub mod arrange;
pub mod concurrency;
pub mod engine;
pub mod outcome;

pub use arrange::{arrange_wayward, ArrangeReport};
pub use concurrency::{install_signal_handler, shutdown_requested};
pub use engine::{BatchReport, Engine, PackageResult};
pub use outcome::InstallOutcome;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("catalog error: {0}")]
    Catalog(#[from] snapshelf_catalog::CatalogError),
    #[error("runtime error: {0}")]
    Runtime(#[from] snapshelf_runtime::RuntimeError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{} is not an offline mirror root", .0.display())]
    NotMirror(PathBuf),
}
