use crate::RuntimeError;
use snapshelf_schema::{parse_file_stem, parse_manifest_str, PackageManifest, MANIFEST_PATH};
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Reads the embedded manifest of a package archive.
pub trait ArchiveReader: Send + Sync {
    fn read_manifest(&self, archive_path: &Path) -> Result<PackageManifest, RuntimeError>;
}

/// Extracts `meta/snap.yaml` with `unsquashfs` into a private temporary
/// directory, removed on every exit path. Safe to call concurrently.
#[derive(Debug, Clone)]
pub struct UnsquashfsReader {
    binary: String,
}

impl Default for UnsquashfsReader {
    fn default() -> Self {
        Self::new("unsquashfs")
    }
}

impl UnsquashfsReader {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn extract_manifest(&self, archive_path: &Path) -> Result<String, RuntimeError> {
        let dest = tempfile::Builder::new().prefix("snapshelf-").tempdir()?;

        let output = Command::new(&self.binary)
            .arg("-n")
            .arg("-force")
            .arg("-dest")
            .arg(dest.path())
            .arg(archive_path)
            .arg(format!("/{MANIFEST_PATH}"))
            .output()
            .map_err(|e| RuntimeError::ExecFailed {
                program: self.binary.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(RuntimeError::unreadable(
                archive_path,
                format!(
                    "{} exited with {}: {}",
                    self.binary,
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        fs::read_to_string(dest.path().join(MANIFEST_PATH))
            .map_err(|_| RuntimeError::unreadable(archive_path, format!("no {MANIFEST_PATH}")))
    }
}

impl ArchiveReader for UnsquashfsReader {
    fn read_manifest(&self, archive_path: &Path) -> Result<PackageManifest, RuntimeError> {
        if !archive_path.is_file() {
            return Err(RuntimeError::unreadable(archive_path, "file not found"));
        }
        let (name, revision) = archive_path
            .file_stem()
            .and_then(|s| s.to_str())
            .and_then(parse_file_stem)
            .ok_or_else(|| {
                RuntimeError::unreadable(archive_path, "file name is not <name>_<revision>.snap")
            })?;

        let text = self.extract_manifest(archive_path)?;
        let manifest = parse_manifest_str(&text, name, revision)
            .map_err(|e| RuntimeError::unreadable(archive_path, e.to_string()))?;
        debug!("manifest of {}: {manifest:?}", archive_path.display());
        Ok(manifest)
    }
}
