//! In-memory stand-ins for the daemon, the snap tool, and the archive reader.

use crate::archive::ArchiveReader;
use crate::daemon::SnapDaemon;
use crate::elevation::Elevation;
use crate::tool::{SnapOp, SnapTool, ToolStatus};
use crate::RuntimeError;
use snapshelf_schema::{parse_file_stem, InstalledPackage, PackageManifest, PackageName};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

fn stem_name(path: &Path) -> Option<(PackageName, String)> {
    let (name, revision) = parse_file_stem(path.file_stem()?.to_str()?)?;
    Some((name, revision.to_string()))
}

pub struct MockDaemon {
    installed: Mutex<BTreeMap<PackageName, InstalledPackage>>,
    remote_updates: Mutex<BTreeMap<PackageName, u64>>,
    version: String,
    queries: AtomicUsize,
}

impl Default for MockDaemon {
    fn default() -> Self {
        Self {
            installed: Mutex::new(BTreeMap::new()),
            remote_updates: Mutex::new(BTreeMap::new()),
            version: "2.45.1-mock".to_owned(),
            queries: AtomicUsize::new(0),
        }
    }
}

impl MockDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `(name, revision)` pairs already installed.
    pub fn with_installed<'a>(packages: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let daemon = Self::default();
        for (name, revision) in packages {
            daemon.mark_installed(name, revision);
        }
        daemon
    }

    pub fn mark_installed(&self, name: &str, revision: &str) {
        lock(&self.installed).insert(
            PackageName::new(name),
            InstalledPackage::new(name, revision),
        );
    }

    pub fn installed_revision(&self, name: &str) -> Option<String> {
        lock(&self.installed).get(name).map(|p| p.revision.clone())
    }

    pub fn set_remote_updates<'a>(&self, updates: impl IntoIterator<Item = (&'a str, u64)>) {
        *lock(&self.remote_updates) = updates
            .into_iter()
            .map(|(name, size)| (PackageName::new(name), size))
            .collect();
    }

    fn clear_remote_update(&self, name: &str) {
        lock(&self.remote_updates).remove(name);
    }

    /// Number of queries answered so far.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.queries.fetch_add(1, Ordering::SeqCst);
    }
}

impl SnapDaemon for MockDaemon {
    fn list_installed(&self) -> Result<Vec<InstalledPackage>, RuntimeError> {
        self.count();
        Ok(lock(&self.installed).values().cloned().collect())
    }

    fn is_installed(&self, name: &str) -> Result<bool, RuntimeError> {
        self.count();
        Ok(lock(&self.installed).contains_key(name))
    }

    fn list_remote_updates(&self) -> Result<BTreeMap<PackageName, u64>, RuntimeError> {
        self.count();
        Ok(lock(&self.remote_updates).clone())
    }

    fn version(&self) -> Result<String, RuntimeError> {
        self.count();
        Ok(self.version.clone())
    }
}

/// Records every invocation. Successful installs and refreshes are reflected
/// in the linked daemon, if any.
#[derive(Default)]
pub struct MockSnapTool {
    calls: Mutex<Vec<(Elevation, SnapOp)>>,
    fail_ack: Mutex<BTreeSet<String>>,
    fail_install: Mutex<BTreeSet<String>>,
    fail_refresh: Mutex<BTreeSet<String>>,
    daemon: Option<Arc<MockDaemon>>,
}

impl MockSnapTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn linked(daemon: Arc<MockDaemon>) -> Self {
        Self {
            daemon: Some(daemon),
            ..Self::default()
        }
    }

    pub fn fail_acknowledge(&self, name: &str) {
        lock(&self.fail_ack).insert(name.to_owned());
    }

    pub fn fail_install(&self, name: &str) {
        lock(&self.fail_install).insert(name.to_owned());
    }

    pub fn fail_refresh(&self, name: &str) {
        lock(&self.fail_refresh).insert(name.to_owned());
    }

    pub fn calls(&self) -> Vec<(Elevation, SnapOp)> {
        lock(&self.calls).clone()
    }

    pub fn ops(&self) -> Vec<SnapOp> {
        lock(&self.calls).iter().map(|(_, op)| op.clone()).collect()
    }

    /// Names of the archives passed to `install`, in call order.
    pub fn installed_names(&self) -> Vec<String> {
        lock(&self.calls)
            .iter()
            .filter_map(|(_, op)| match op {
                SnapOp::Install { archive, .. } => stem_name(archive).map(|(n, _)| n.into_inner()),
                _ => None,
            })
            .collect()
    }
}

impl SnapTool for MockSnapTool {
    fn run(&self, elevation: Elevation, op: &SnapOp) -> Result<ToolStatus, RuntimeError> {
        lock(&self.calls).push((elevation, op.clone()));

        let failed = |set: &Mutex<BTreeSet<String>>, name: &str| lock(set).contains(name);

        match op {
            SnapOp::Acknowledge(signature) => {
                let rejected =
                    stem_name(signature).is_some_and(|(n, _)| failed(&self.fail_ack, n.as_str()));
                if rejected {
                    return Ok(ToolStatus::failed(1, "error: cannot assert"));
                }
            }
            SnapOp::Install { archive, .. } => {
                let Some((name, revision)) = stem_name(archive) else {
                    return Ok(ToolStatus::failed(1, "error: cannot open archive"));
                };
                if failed(&self.fail_install, name.as_str()) {
                    return Ok(ToolStatus::failed(1, "error: cannot install"));
                }
                if let Some(daemon) = &self.daemon {
                    daemon.mark_installed(name.as_str(), &revision);
                }
            }
            SnapOp::Refresh(name) => {
                if failed(&self.fail_refresh, name.as_str()) {
                    return Ok(ToolStatus::failed(1, "error: cannot refresh"));
                }
                if let Some(daemon) = &self.daemon {
                    daemon.clear_remote_update(name.as_str());
                }
            }
        }
        Ok(ToolStatus::ok())
    }
}

/// Serves manifests registered per archive path.
#[derive(Default)]
pub struct MockArchiveReader {
    manifests: Mutex<HashMap<PathBuf, PackageManifest>>,
    reads: AtomicUsize,
}

impl MockArchiveReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, archive_path: impl Into<PathBuf>, manifest: PackageManifest) {
        lock(&self.manifests).insert(archive_path.into(), manifest);
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ArchiveReader for MockArchiveReader {
    fn read_manifest(&self, archive_path: &Path) -> Result<PackageManifest, RuntimeError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        lock(&self.manifests)
            .get(archive_path)
            .cloned()
            .ok_or_else(|| RuntimeError::unreadable(archive_path, "no manifest registered"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapshelf_schema::{parse_manifest_str, Revision};

    #[test]
    fn daemon_reports_installed() {
        let daemon = MockDaemon::with_installed([("core", "9066"), ("atom", "200")]);
        assert!(daemon.is_installed("atom").unwrap());
        assert!(!daemon.is_installed("kiwi").unwrap());
        let listed = daemon.list_installed().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(daemon.query_count(), 3);
    }

    #[test]
    fn linked_tool_marks_installs() {
        let daemon = Arc::new(MockDaemon::new());
        let tool = MockSnapTool::linked(Arc::clone(&daemon));
        let op = SnapOp::Install {
            archive: PathBuf::from("/cache/atom_248.snap"),
            classic: false,
        };
        assert!(tool.run(Elevation::Sudo, &op).unwrap().success);
        assert_eq!(daemon.installed_revision("atom").as_deref(), Some("248"));
        assert_eq!(tool.installed_names(), vec!["atom"]);
    }

    #[test]
    fn configured_failures() {
        let daemon = Arc::new(MockDaemon::new());
        let tool = MockSnapTool::linked(Arc::clone(&daemon));
        tool.fail_acknowledge("atom");
        tool.fail_install("kiwi");

        let ack = SnapOp::Acknowledge(PathBuf::from("/cache/atom_248.assert"));
        assert!(!tool.run(Elevation::Pkexec, &ack).unwrap().success);

        let install = SnapOp::Install {
            archive: PathBuf::from("/cache/kiwi_3.snap"),
            classic: false,
        };
        let status = tool.run(Elevation::Pkexec, &install).unwrap();
        assert!(!status.success);
        assert!(!daemon.is_installed("kiwi").unwrap());
        assert_eq!(tool.calls().len(), 2);
    }

    #[test]
    fn refresh_clears_remote_update() {
        let daemon = Arc::new(MockDaemon::new());
        daemon.set_remote_updates([("atom", 1024)]);
        let tool = MockSnapTool::linked(Arc::clone(&daemon));
        tool.run(Elevation::Sudo, &SnapOp::Refresh(PackageName::new("atom")))
            .unwrap();
        assert!(daemon.list_remote_updates().unwrap().is_empty());
    }

    #[test]
    fn reader_serves_registered_manifests() {
        let reader = MockArchiveReader::new();
        let manifest =
            parse_manifest_str("name: atom\n", PackageName::new("atom"), Revision::new(248))
                .unwrap();
        reader.insert("/cache/atom_248.snap", manifest.clone());

        assert_eq!(
            reader
                .read_manifest(Path::new("/cache/atom_248.snap"))
                .unwrap(),
            manifest
        );
        assert!(matches!(
            reader.read_manifest(Path::new("/cache/kiwi_1.snap")),
            Err(RuntimeError::ArchiveUnreadable { .. })
        ));
        assert_eq!(reader.read_count(), 2);
    }
}
