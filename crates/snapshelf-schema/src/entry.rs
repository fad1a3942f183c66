use crate::types::{PackageName, Revision};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File extension of a package archive.
pub const ARCHIVE_EXT: &str = "snap";
/// File extension of the companion signature (assertion) file.
pub const SIGNATURE_EXT: &str = "assert";

/// An archive/signature pair found in an offline folder.
///
/// Entries are only built by the catalog scanner after both files were seen,
/// and are discarded whenever the catalog is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: PackageName,
    pub revision: Revision,
    pub archive_path: PathBuf,
    pub signature_path: PathBuf,
}

impl CatalogEntry {
    /// Build an entry from an archive path named `<name>_<revision>.snap`.
    ///
    /// The signature path is derived from the archive path; existence of
    /// either file is not checked here.
    pub fn from_archive_path(archive_path: impl Into<PathBuf>) -> Option<Self> {
        let archive_path = archive_path.into();
        let (name, revision) = parse_file_stem(archive_path.file_stem()?.to_str()?)?;
        let signature_path = signature_path_for(&archive_path);
        Some(Self {
            name,
            revision,
            archive_path,
            signature_path,
        })
    }

    /// Both halves of the pair are present on disk.
    pub fn is_complete(&self) -> bool {
        self.archive_path.is_file() && self.signature_path.is_file()
    }
}

/// Split `<name>_<revision>` into its parts.
///
/// The revision is everything after the last underscore and must be an
/// unsigned integer. Package names never contain underscores, but splitting
/// from the right keeps odd names from shifting the revision.
pub fn parse_file_stem(stem: &str) -> Option<(PackageName, Revision)> {
    let (name, revision) = stem.rsplit_once('_')?;
    if name.is_empty() {
        return None;
    }
    let revision = revision.parse::<Revision>().ok()?;
    Some((PackageName::new(name), revision))
}

pub fn signature_path_for(archive_path: &Path) -> PathBuf {
    archive_path.with_extension(SIGNATURE_EXT)
}

pub fn archive_path_for(signature_path: &Path) -> PathBuf {
    signature_path.with_extension(ARCHIVE_EXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_and_revision() {
        let (name, rev) = parse_file_stem("atom_248").unwrap();
        assert_eq!(name, "atom");
        assert_eq!(rev, Revision::new(248));

        let (name, rev) = parse_file_stem("gnome-3-28-1804_161").unwrap();
        assert_eq!(name, "gnome-3-28-1804");
        assert_eq!(rev.get(), 161);
    }

    #[test]
    fn rejects_malformed_stems() {
        assert!(parse_file_stem("atom").is_none());
        assert!(parse_file_stem("_12").is_none());
        assert!(parse_file_stem("atom_x1").is_none());
        assert!(parse_file_stem("atom_").is_none());
    }

    #[test]
    fn signature_path_is_suffix_substitution() {
        let archive = Path::new("/cache/amd64/atom_248.snap");
        assert_eq!(
            signature_path_for(archive),
            PathBuf::from("/cache/amd64/atom_248.assert")
        );
        assert_eq!(archive_path_for(&signature_path_for(archive)), archive);
    }

    #[test]
    fn entry_from_archive_path() {
        let entry = CatalogEntry::from_archive_path("/cache/all/core18_1705.snap").unwrap();
        assert_eq!(entry.name, "core18");
        assert_eq!(entry.revision, Revision::new(1705));
        assert_eq!(
            entry.signature_path,
            PathBuf::from("/cache/all/core18_1705.assert")
        );
        assert!(!entry.is_complete());
    }

    #[test]
    fn entry_from_unparseable_path_is_none() {
        assert!(CatalogEntry::from_archive_path("/cache/readme.snap").is_none());
    }
}
