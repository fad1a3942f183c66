use crate::arch::Arch;
use crate::layout::CatalogLayout;
use crate::CatalogError;
use snapshelf_schema::{archive_path_for, parse_file_stem, CatalogEntry, SIGNATURE_EXT};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Enumerate every complete archive/signature pair under `root`.
///
/// Candidate folders are visited in priority order and their results are
/// concatenated; the same package appearing in several folders is reported
/// once per folder.
pub fn scan(root: &Path, machine: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let arch = Arch::from_machine(machine)?;
    if !root.is_dir() {
        return Err(CatalogError::RootNotFound(root.to_path_buf()));
    }
    let layout = CatalogLayout::new(root);
    debug!(
        "scanning {} ({:?} layout, {arch})",
        root.display(),
        layout.kind()
    );

    let mut entries = Vec::new();
    for dir in layout.candidate_dirs(arch) {
        if dir.is_dir() {
            entries.extend(scan_folder(&dir));
        }
    }
    Ok(entries)
}

/// Pairs found directly in `dir`, ordered by file name.
///
/// Signature files are canonical: each `<name>_<rev>.assert` needs a sibling
/// `<name>_<rev>.snap`, otherwise it is skipped.
pub fn scan_folder(dir: &Path) -> Vec<CatalogEntry> {
    let read = match fs::read_dir(dir) {
        Ok(read) => read,
        Err(e) => {
            warn!("cannot read {}: {e}", dir.display());
            return Vec::new();
        }
    };

    let mut signatures: Vec<PathBuf> = read
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == SIGNATURE_EXT) && path.is_file()
        })
        .collect();
    signatures.sort();

    signatures
        .into_iter()
        .filter_map(pair_from_signature)
        .collect()
}

fn pair_from_signature(signature_path: PathBuf) -> Option<CatalogEntry> {
    let Some((name, revision)) = signature_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(parse_file_stem)
    else {
        debug!("ignoring unrecognized file {}", signature_path.display());
        return None;
    };

    let archive_path = archive_path_for(&signature_path);
    if !archive_path.is_file() {
        debug!(
            "skipping {}: no matching {}",
            signature_path.display(),
            archive_path.display()
        );
        return None;
    }

    Some(CatalogEntry {
        name,
        revision,
        archive_path,
        signature_path,
    })
}
