//! Sort archives dropped directly into an offline mirror's package folder
//! into the architecture folders the scanner searches.

use crate::CoreError;
use serde::Serialize;
use snapshelf_catalog::{scan_folder, CatalogLayout, LayoutKind};
use snapshelf_runtime::{ArchiveReader, InvokingUser};
use snapshelf_schema::CatalogEntry;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Archives moved, and the folders created for them.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArrangeReport {
    pub moved: Vec<(PathBuf, Vec<String>)>,
    pub created_dirs: Vec<PathBuf>,
    /// Archives whose manifest could not be read; left in place.
    pub skipped: Vec<PathBuf>,
    /// Archives that could not be placed; the pair stays in the package folder.
    pub failed: Vec<PathBuf>,
}

/// Move every archive/signature pair lying directly in the mirror's package
/// folder into one subfolder per architecture its manifest lists.
///
/// A pair listing several architectures is copied into all but the last
/// folder and moved into the last. Folders created here are handed to
/// `owner` when one is given. A pair that cannot be placed is reported in
/// [`ArrangeReport::failed`] and the pass goes on with the next one.
pub fn arrange_wayward(
    root: &Path,
    reader: &dyn ArchiveReader,
    owner: Option<&InvokingUser>,
) -> Result<ArrangeReport, CoreError> {
    let layout = CatalogLayout::new(root);
    if layout.kind() != LayoutKind::OfflineMirror {
        return Err(CoreError::NotMirror(root.to_path_buf()));
    }
    let snaps_dir = layout.snaps_dir();

    let mut report = ArrangeReport::default();
    for entry in scan_folder(&snaps_dir) {
        let manifest = match reader.read_manifest(&entry.archive_path) {
            Ok(m) => m,
            Err(e) => {
                warn!("leaving {} in place: {e}", entry.archive_path.display());
                report.skipped.push(entry.archive_path);
                continue;
            }
        };

        match place_pair(&layout, &entry, &manifest.architectures, owner, &mut report) {
            Ok(()) => {
                info!(
                    "moved {} into {:?}",
                    entry.archive_path.display(),
                    manifest.architectures
                );
                report
                    .moved
                    .push((entry.archive_path, manifest.architectures));
            }
            Err(e) => {
                warn!("cannot arrange {}: {e}", entry.archive_path.display());
                report.failed.push(entry.archive_path);
            }
        }
    }
    Ok(report)
}

fn place_pair(
    layout: &CatalogLayout,
    entry: &CatalogEntry,
    architectures: &[String],
    owner: Option<&InvokingUser>,
    report: &mut ArrangeReport,
) -> Result<(), CoreError> {
    let Some((last, rest)) = architectures.split_last() else {
        return Ok(());
    };
    for arch in rest {
        let dir = ensure_arch_dir(layout, arch, owner, report)?;
        copy_pair(entry, &dir)?;
    }
    let dir = ensure_arch_dir(layout, last, owner, report)?;
    move_pair(entry, &dir)
}

fn ensure_arch_dir(
    layout: &CatalogLayout,
    arch: &str,
    owner: Option<&InvokingUser>,
    report: &mut ArrangeReport,
) -> Result<PathBuf, CoreError> {
    let dir = layout.arch_dir(arch);
    if !dir.is_dir() {
        fs::create_dir_all(&dir)?;
        if let Some(user) = owner {
            user.chown(&dir)?;
        }
        report.created_dirs.push(dir.clone());
    }
    Ok(dir)
}

fn file_in(dir: &Path, path: &Path) -> PathBuf {
    match path.file_name() {
        Some(name) => dir.join(name),
        None => dir.to_path_buf(),
    }
}

/// A copied archive without its signature is removed again.
fn copy_pair(entry: &CatalogEntry, dir: &Path) -> Result<(), CoreError> {
    let archive = file_in(dir, &entry.archive_path);
    fs::copy(&entry.archive_path, &archive)?;
    if let Err(e) = fs::copy(&entry.signature_path, file_in(dir, &entry.signature_path)) {
        let _ = fs::remove_file(&archive);
        return Err(e.into());
    }
    Ok(())
}

/// Rename when possible; across filesystems fall back to copy and remove.
fn move_file(from: &Path, to: &Path) -> Result<(), CoreError> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

/// The archive goes back where it was when its signature cannot follow.
fn move_pair(entry: &CatalogEntry, dir: &Path) -> Result<(), CoreError> {
    let archive = file_in(dir, &entry.archive_path);
    move_file(&entry.archive_path, &archive)?;
    if let Err(e) = move_file(&entry.signature_path, &file_in(dir, &entry.signature_path)) {
        if let Err(back) = move_file(&archive, &entry.archive_path) {
            warn!(
                "{} is separated from {}: {back}",
                archive.display(),
                entry.signature_path.display()
            );
        }
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshelf_catalog::Catalog;
    use snapshelf_runtime::mock::MockArchiveReader;
    use snapshelf_schema::{parse_manifest_str, PackageName, Revision};

    fn touch_pair(dir: &Path, stem: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(format!("{stem}.assert")), b"assert").unwrap();
        let archive = dir.join(format!("{stem}.snap"));
        fs::write(&archive, b"snap").unwrap();
        archive
    }

    fn register(reader: &MockArchiveReader, archive: &Path, name: &str, rev: u64, yaml: &str) {
        let manifest =
            parse_manifest_str(yaml, PackageName::new(name), Revision::new(rev)).unwrap();
        reader.insert(archive, manifest);
    }

    #[test]
    fn pairs_move_into_listed_architectures() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("wasta-offline");
        let snaps = root.join("local-cache").join("snaps");

        let reader = MockArchiveReader::new();
        let atom = touch_pair(&snaps, "atom_248");
        register(&reader, &atom, "atom", 248, "name: atom\narchitectures:\n  - amd64\n");
        let themes = touch_pair(&snaps, "gtk-common-themes_1506");
        register(&reader, &themes, "gtk-common-themes", 1506, "name: gtk-common-themes\n");
        let multi = touch_pair(&snaps, "hello_42");
        register(
            &reader,
            &multi,
            "hello",
            42,
            "name: hello\narchitectures: [amd64, arm64]\n",
        );

        let report = arrange_wayward(&root, &reader, None).unwrap();
        assert_eq!(report.moved.len(), 3);
        assert!(report.skipped.is_empty());

        assert!(snaps.join("amd64/atom_248.snap").is_file());
        assert!(snaps.join("amd64/atom_248.assert").is_file());
        assert!(!atom.exists());
        assert!(snaps.join("all/gtk-common-themes_1506.snap").is_file());
        assert!(snaps.join("amd64/hello_42.snap").is_file());
        assert!(snaps.join("arm64/hello_42.snap").is_file());
        assert!(snaps.join("arm64/hello_42.assert").is_file());
        assert!(!multi.exists());
        assert_eq!(report.created_dirs.len(), 3);
    }

    #[test]
    fn unreadable_archives_stay_put() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("wasta-offline");
        let snaps = root.join("local-cache").join("snaps");
        let archive = touch_pair(&snaps, "broken_1");

        let report = arrange_wayward(&root, &MockArchiveReader::new(), None).unwrap();
        assert_eq!(report.skipped, vec![archive.clone()]);
        assert!(archive.is_file());
    }

    #[test]
    fn blocked_pair_does_not_stop_the_rest() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("wasta-offline");
        let snaps = root.join("local-cache").join("snaps");
        fs::create_dir_all(&snaps).unwrap();
        fs::write(snaps.join("blocked"), b"not a folder").unwrap();

        let reader = MockArchiveReader::new();
        let aaa = touch_pair(&snaps, "aaa_1");
        register(&reader, &aaa, "aaa", 1, "name: aaa\narchitectures: [blocked]\n");
        let zzz = touch_pair(&snaps, "zzz_1");
        register(&reader, &zzz, "zzz", 1, "name: zzz\narchitectures: [amd64]\n");

        let report = arrange_wayward(&root, &reader, None).unwrap();
        assert_eq!(report.failed, vec![aaa.clone()]);
        assert_eq!(report.moved.len(), 1);
        assert!(aaa.is_file());
        assert!(snaps.join("aaa_1.assert").is_file());
        assert!(snaps.join("amd64/zzz_1.snap").is_file());
        assert!(!zzz.exists());
    }

    #[test]
    fn failed_move_keeps_pair_together() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("wasta-offline");
        let snaps = root.join("local-cache").join("snaps");

        let reader = MockArchiveReader::new();
        let atom = touch_pair(&snaps, "atom_248");
        register(&reader, &atom, "atom", 248, "name: atom\narchitectures: [amd64]\n");
        let in_the_way = snaps.join("amd64").join("atom_248.assert");
        fs::create_dir_all(&in_the_way).unwrap();
        fs::write(in_the_way.join("keep"), b"x").unwrap();
        assert!(Catalog::scan(&root, "x86_64").unwrap().lookup("atom").is_some());

        let report = arrange_wayward(&root, &reader, None).unwrap();
        assert_eq!(report.failed, vec![atom.clone()]);
        assert!(atom.is_file());
        assert!(!snaps.join("amd64/atom_248.snap").exists());

        let catalog = Catalog::scan(&root, "x86_64").unwrap();
        let entry = catalog.lookup("atom").unwrap();
        assert_eq!(entry.archive_path, atom);
    }

    #[test]
    fn created_folders_go_to_owner() {
        use std::os::unix::fs::MetadataExt;

        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("wasta-offline");
        let snaps = root.join("local-cache").join("snaps");
        let reader = MockArchiveReader::new();
        let atom = touch_pair(&snaps, "atom_248");
        register(&reader, &atom, "atom", 248, "name: atom\narchitectures: [amd64]\n");

        let meta = fs::metadata(&snaps).unwrap();
        let owner = InvokingUser {
            uid: meta.uid(),
            gid: meta.gid(),
            name: "owner".to_owned(),
        };
        let report = arrange_wayward(&root, &reader, Some(&owner)).unwrap();
        assert_eq!(report.created_dirs, vec![snaps.join("amd64")]);
        let created = fs::metadata(snaps.join("amd64")).unwrap();
        assert_eq!((created.uid(), created.gid()), (owner.uid, owner.gid));
    }

    #[test]
    fn plain_folder_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let err = arrange_wayward(tmp.path(), &MockArchiveReader::new(), None).unwrap_err();
        assert!(matches!(err, CoreError::NotMirror(_)));
    }
}
