use crate::scan::scan;
use crate::CatalogError;
use snapshelf_schema::{CatalogEntry, PackageName};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Snapshot of the archives available in one offline folder.
///
/// Rebuilt from scratch whenever a different folder is chosen; entries keep
/// the scanner's folder-priority order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    root: PathBuf,
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn scan(root: impl AsRef<Path>, machine: &str) -> Result<Self, CatalogError> {
        let root = root.as_ref();
        let entries = scan(root, machine)?;
        Ok(Self {
            root: root.to_path_buf(),
            entries,
        })
    }

    pub fn from_entries(root: impl Into<PathBuf>, entries: Vec<CatalogEntry>) -> Self {
        Self {
            root: root.into(),
            entries,
        }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Best archive for `name`: the highest revision, and among equal
    /// revisions the one from the highest-priority folder.
    pub fn lookup(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| e.name == name)
            .fold(None, |best: Option<&CatalogEntry>, e| match best {
                Some(b) if b.revision >= e.revision => Some(b),
                _ => Some(e),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// One entry per name, chosen as in [`lookup`](Self::lookup), keyed by name.
    pub fn best_per_name(&self) -> BTreeMap<PackageName, &CatalogEntry> {
        best_per_name(&self.entries)
    }
}

pub(crate) fn best_per_name(entries: &[CatalogEntry]) -> BTreeMap<PackageName, &CatalogEntry> {
    let mut best: BTreeMap<PackageName, &CatalogEntry> = BTreeMap::new();
    for entry in entries {
        match best.get(entry.name.as_str()) {
            Some(current) if current.revision >= entry.revision => {}
            _ => {
                best.insert(entry.name.clone(), entry);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshelf_schema::Revision;

    fn entry(dir: &str, name: &str, rev: u64) -> CatalogEntry {
        CatalogEntry::from_archive_path(format!("/cache/{dir}/{name}_{rev}.snap")).unwrap()
    }

    #[test]
    fn lookup_prefers_highest_revision_numerically() {
        let catalog = Catalog::from_entries(
            "/cache",
            vec![entry("amd64", "x", 9), entry("amd64", "x", 10)],
        );
        assert_eq!(catalog.lookup("x").unwrap().revision, Revision::new(10));
    }

    #[test]
    fn lookup_tie_goes_to_first_folder() {
        let catalog = Catalog::from_entries(
            "/cache",
            vec![entry(".", "core", 5), entry("amd64", "core", 5)],
        );
        assert_eq!(
            catalog.lookup("core").unwrap().archive_path,
            PathBuf::from("/cache/./core_5.snap")
        );
    }

    #[test]
    fn lookup_missing_name() {
        let catalog = Catalog::from_entries("/cache", vec![entry("amd64", "atom", 248)]);
        assert!(catalog.lookup("kiwi").is_none());
        assert!(!catalog.contains("kiwi"));
        assert!(catalog.contains("atom"));
    }

    #[test]
    fn best_per_name_collapses_duplicates() {
        let catalog = Catalog::from_entries(
            "/cache",
            vec![
                entry("all", "b", 3),
                entry("amd64", "a", 1),
                entry("amd64", "b", 12),
                entry("amd64", "b", 4),
            ],
        );
        let best = catalog.best_per_name();
        assert_eq!(best.len(), 2);
        assert_eq!(best["a"].revision.get(), 1);
        assert_eq!(best["b"].revision.get(), 12);
    }
}
