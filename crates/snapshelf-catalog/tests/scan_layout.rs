//! Catalog scanning against real directory trees.

use snapshelf_catalog::{installable, updatable, Catalog, CatalogError};
use snapshelf_schema::InstalledPackage;
use std::fs;
use std::path::Path;

fn pair(dir: &Path, stem: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(format!("{stem}.snap")), b"hsqs").unwrap();
    fs::write(dir.join(format!("{stem}.assert")), b"type: snap-revision").unwrap();
}

#[test]
fn single_archive_in_arch_folder() {
    let dir = tempfile::tempdir().unwrap();
    let amd64 = dir.path().join("amd64");
    pair(&amd64, "atom_248");

    let catalog = Catalog::scan(dir.path(), "x86_64").unwrap();
    assert_eq!(catalog.len(), 1);
    let atom = &catalog.entries()[0];
    assert_eq!(atom.name, "atom");
    assert_eq!(atom.revision.get(), 248);
    assert_eq!(atom.archive_path, amd64.join("atom_248.snap"));
    assert_eq!(atom.signature_path, amd64.join("atom_248.assert"));

    assert_eq!(
        catalog.lookup("atom").map(|e| e.archive_path.clone()),
        Some(amd64.join("atom_248.snap"))
    );
    assert!(catalog.lookup("kiwi").is_none());
}

#[test]
fn every_entry_has_a_signature_and_every_pair_is_listed() {
    let dir = tempfile::tempdir().unwrap();
    pair(dir.path(), "core_9");
    pair(&dir.path().join("all"), "gtk-common-themes_1506");
    pair(&dir.path().join("amd64"), "snap-store_209");
    fs::write(dir.path().join("amd64").join("unsigned_4.snap"), b"").unwrap();
    fs::create_dir_all(dir.path().join("arm64")).unwrap();
    pair(&dir.path().join("arm64"), "foreign_1");

    let catalog = Catalog::scan(dir.path(), "x86_64").unwrap();
    for entry in catalog.entries() {
        assert!(entry.signature_path.is_file());
        assert!(entry.archive_path.is_file());
    }
    let names: Vec<&str> = catalog.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["core", "gtk-common-themes", "snap-store"]);
}

#[test]
fn offline_mirror_layout_is_nested() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("wasta-offline");
    let snaps = root.join("local-cache").join("snaps");
    pair(&snaps.join("amd64"), "atom_248");
    // Archives directly under the mirror root are not part of the catalog.
    pair(&root, "stray_1");

    let catalog = Catalog::scan(&root, "x86_64").unwrap();
    assert_eq!(catalog.len(), 1);
    assert_eq!(
        catalog.entries()[0].archive_path,
        snaps.join("amd64").join("atom_248.snap")
    );
}

#[test]
fn duplicates_across_folders_are_kept_by_scan_and_collapsed_by_reconciler() {
    let dir = tempfile::tempdir().unwrap();
    pair(dir.path(), "x_9");
    pair(&dir.path().join("amd64"), "x_10");

    let catalog = Catalog::scan(dir.path(), "x86_64").unwrap();
    assert_eq!(catalog.len(), 2);

    let fresh = installable(catalog.entries(), &[]);
    assert_eq!(fresh.len(), 1);
    assert_eq!(fresh[0].revision.get(), 10);

    let installed = vec![InstalledPackage::new("x", 9)];
    let newer = updatable(catalog.entries(), &installed);
    assert_eq!(newer.len(), 1);
    assert_eq!(
        newer[0].archive_path,
        dir.path().join("amd64").join("x_10.snap")
    );
    assert!(installable(catalog.entries(), &installed).is_empty());
}

#[test]
fn empty_folder_scans_to_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = Catalog::scan(dir.path(), "x86_64").unwrap();
    assert!(catalog.is_empty());
}

#[test]
fn unsupported_architecture_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    pair(&dir.path().join("arm64"), "atom_248");
    let err = Catalog::scan(dir.path(), "aarch64").unwrap_err();
    assert!(matches!(err, CatalogError::UnsupportedArchitecture(ref m) if m == "aarch64"));
    assert!(err.to_string().contains("not yet supported"));
}
