//! Cross-reference the offline catalog against the installed-package list.
//!
//! Both views are pure functions of their inputs and are recomputed whenever
//! either input changes. Results are sorted by name for stable display.

use crate::catalog::best_per_name;
use snapshelf_schema::{CatalogEntry, InstalledPackage, PackageName, Revision};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Catalog entries newer than the installed revision of the same package.
///
/// Every qualifying entry is returned, so a package present in several
/// folders at newer revisions appears more than once: by name, then highest
/// revision first, then folder priority. Installed packages with a
/// non-numeric (sideloaded) revision are never considered updatable.
pub fn updatable(catalog: &[CatalogEntry], installed: &[InstalledPackage]) -> Vec<CatalogEntry> {
    let installed_revisions: BTreeMap<&str, Option<Revision>> = installed
        .iter()
        .map(|pkg| (pkg.name.as_str(), pkg.numeric_revision()))
        .collect();

    let mut result: Vec<CatalogEntry> = catalog
        .iter()
        .filter(|entry| match installed_revisions.get(entry.name.as_str()) {
            Some(Some(current)) => entry.revision > *current,
            Some(None) => {
                debug!("{} has a local revision; not offering an update", entry.name);
                false
            }
            None => false,
        })
        .cloned()
        .collect();

    // Stable sort keeps folder priority among equal (name, revision) pairs.
    result.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| Reverse(a.revision).cmp(&Reverse(b.revision)))
    });
    result
}

/// Best updatable entry per package name.
pub fn updatable_best(
    catalog: &[CatalogEntry],
    installed: &[InstalledPackage],
) -> Vec<CatalogEntry> {
    let all = updatable(catalog, installed);
    best_per_name(&all).into_values().cloned().collect()
}

/// Catalog packages that are not installed at all, one entry per name.
///
/// The catalog is first collapsed to the highest revision per name (equal
/// revisions keep the entry from the earliest folder), then installed names
/// are removed.
pub fn installable(catalog: &[CatalogEntry], installed: &[InstalledPackage]) -> Vec<CatalogEntry> {
    let installed_names: BTreeSet<&PackageName> = installed.iter().map(|pkg| &pkg.name).collect();

    best_per_name(catalog)
        .into_iter()
        .filter(|(name, _)| !installed_names.contains(name))
        .map(|(_, entry)| entry.clone())
        .collect()
}
