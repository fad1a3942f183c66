//! Package manifest parsing and catalog value types for snapshelf.
//!
//! This crate defines the schema layer: the `<name>_<revision>` archive naming
//! convention (`CatalogEntry`), numeric `Revision`s, `Confinement` modes, and
//! structured parsing of the manifest embedded in every package archive
//! (`PackageManifest`), plus the daemon's view of an installed package
//! (`InstalledPackage`).

pub mod entry;
pub mod installed;
pub mod manifest;
pub mod types;

pub use entry::{
    archive_path_for, parse_file_stem, signature_path_for, CatalogEntry, ARCHIVE_EXT,
    SIGNATURE_EXT,
};
pub use installed::InstalledPackage;
pub use manifest::{
    parse_manifest_str, ManifestError, PackageKind, PackageManifest, ARCH_ALL, DEFAULT_BASE,
    MANIFEST_PATH,
};
pub use types::{Confinement, PackageName, Revision};
