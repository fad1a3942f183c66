use crate::concurrency::shutdown_requested;
use crate::outcome::InstallOutcome;
use crate::CoreError;
use serde::Serialize;
use snapshelf_catalog::{updatable_best, Catalog};
use snapshelf_runtime::{
    ArchiveReader, Elevation, ShelfConfig, SnapCommand, SnapDaemon, SnapOp, SnapTool,
    SnapdClient, UnsquashfsReader,
};
use snapshelf_schema::{signature_path_for, PackageManifest, PackageName};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Drives installs against the host.
///
/// Holds no installed-package state of its own: every decision is made
/// against a fresh daemon query, so an `Engine` can be shared between
/// threads and reused across catalogs.
pub struct Engine {
    daemon: Arc<dyn SnapDaemon>,
    tool: Arc<dyn SnapTool>,
    reader: Arc<dyn ArchiveReader>,
    elevation: Option<Elevation>,
    support_package: PackageName,
}

/// Outcome of one package in a batch pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageResult {
    pub name: PackageName,
    /// Catalog revision for offline updates; `None` for online refreshes.
    pub revision: Option<u64>,
    pub outcome: InstallOutcome,
}

/// Per-package outcomes of an update pass, in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub results: Vec<PackageResult>,
    /// The pass stopped early on a shutdown request.
    pub interrupted: bool,
}

impl BatchReport {
    /// Sum of the failure codes, saturating at 255.
    pub fn exit_status(&self) -> u8 {
        self.results
            .iter()
            .fold(0u8, |acc, r| acc.saturating_add(r.outcome.code()))
    }

    pub fn failures(&self) -> impl Iterator<Item = &PackageResult> {
        self.results.iter().filter(|r| !r.outcome.is_success())
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Fold another pass into this one.
    pub fn merge(&mut self, other: BatchReport) {
        self.results.extend(other.results);
        self.interrupted |= other.interrupted;
    }
}

impl Engine {
    /// Engine over the given collaborators. The privilege context is detected
    /// from the environment; the support package defaults to `snapd`.
    pub fn new(
        daemon: Arc<dyn SnapDaemon>,
        tool: Arc<dyn SnapTool>,
        reader: Arc<dyn ArchiveReader>,
    ) -> Self {
        Self {
            daemon,
            tool,
            reader,
            elevation: Elevation::detect(),
            support_package: PackageName::new("snapd"),
        }
    }

    /// Engine over the real host tools named in `config`.
    pub fn from_config(config: &ShelfConfig) -> Self {
        Self::new(
            Arc::new(SnapdClient::new(&config.socket_path)),
            Arc::new(SnapCommand::new(config.snap_binary.clone())),
            Arc::new(UnsquashfsReader::new(config.unsquashfs_binary.clone())),
        )
        .with_support_package(config.support_package.clone())
    }

    #[must_use]
    pub fn with_elevation(mut self, elevation: Option<Elevation>) -> Self {
        self.elevation = elevation;
        self
    }

    #[must_use]
    pub fn with_support_package(mut self, name: impl Into<PackageName>) -> Self {
        self.support_package = name.into();
        self
    }

    #[inline]
    pub fn elevation(&self) -> Option<Elevation> {
        self.elevation
    }

    pub fn daemon(&self) -> &dyn SnapDaemon {
        self.daemon.as_ref()
    }

    pub fn read_manifest(&self, archive_path: &Path) -> Result<PackageManifest, CoreError> {
        Ok(self.reader.read_manifest(archive_path)?)
    }

    /// A failed daemon query counts as not installed; the install attempt
    /// that follows surfaces the real problem.
    fn is_installed(&self, name: &str) -> bool {
        match self.daemon.is_installed(name) {
            Ok(installed) => installed,
            Err(e) => {
                warn!("cannot tell whether {name} is installed: {e}");
                false
            }
        }
    }

    fn run_tool(&self, elevation: Elevation, op: &SnapOp) -> bool {
        match self.tool.run(elevation, op) {
            Ok(status) if status.success => {
                debug!("{op:?} succeeded: {}", status.output);
                true
            }
            Ok(status) => {
                error!(
                    "{op:?} exited with {}: {}",
                    status
                        .code
                        .map_or_else(|| "signal".to_owned(), |c| c.to_string()),
                    status.output
                );
                false
            }
            Err(e) => {
                error!("{op:?} could not run: {e}");
                false
            }
        }
    }

    /// Acknowledge and install one archive with no dependency handling.
    pub fn install_offline(&self, archive_path: &Path) -> InstallOutcome {
        let manifest = match self.reader.read_manifest(archive_path) {
            Ok(m) => m,
            Err(e) => {
                error!("{e}");
                return InstallOutcome::ArchiveUnreadable;
            }
        };
        let classic = manifest.is_classic();
        debug!(
            "confinement for {}: {:?}",
            archive_path.display(),
            manifest.confinement
        );

        let signature = signature_path_for(archive_path);
        if !signature.is_file() {
            error!("{} is missing", signature.display());
            error!("try installing {} from the online store instead", manifest.name);
            return InstallOutcome::MissingArchiveOrSignature;
        }

        let Some(elevation) = self.elevation else {
            error!("not started through pkexec or sudo; cannot install {}", manifest.name);
            return InstallOutcome::NoPrivilegeContext;
        };

        info!("acknowledging {}", signature.display());
        if !self.run_tool(elevation, &SnapOp::Acknowledge(signature)) {
            return InstallOutcome::AcknowledgeFailed;
        }

        if classic {
            info!("installing {} with --classic", archive_path.display());
        } else {
            info!("installing {}", archive_path.display());
        }
        let op = SnapOp::Install {
            archive: archive_path.to_path_buf(),
            classic,
        };
        if !self.run_tool(elevation, &op) {
            return InstallOutcome::InstallFailed;
        }
        InstallOutcome::Success
    }

    /// Install `target` from `catalog`, bringing in the support package, its
    /// base, and its providers first.
    ///
    /// Stops at the first failure and returns it. Packages installed before
    /// the failure stay installed.
    pub fn install_with_prerequisites(&self, target: &str, catalog: &Catalog) -> InstallOutcome {
        let mut in_progress = Vec::new();
        self.install_chain(target, catalog, &mut in_progress)
    }

    fn install_chain(
        &self,
        target: &str,
        catalog: &Catalog,
        in_progress: &mut Vec<PackageName>,
    ) -> InstallOutcome {
        if self.is_installed(target) {
            debug!("{target} is already installed");
            return InstallOutcome::Success;
        }
        if in_progress.iter().any(|n| n == target) {
            error!(
                "cyclic dependency: {} -> {target}",
                in_progress
                    .iter()
                    .map(PackageName::as_str)
                    .collect::<Vec<_>>()
                    .join(" -> ")
            );
            return InstallOutcome::CyclicDependency;
        }

        let Some(entry) = catalog.lookup(target) else {
            error!("{target} not found in {}", catalog.root().display());
            return InstallOutcome::DependencyMissing;
        };
        info!("starting install process for {}", entry.archive_path.display());

        let manifest = match self.reader.read_manifest(&entry.archive_path) {
            Ok(m) => m,
            Err(e) => {
                error!("{e}");
                return InstallOutcome::ArchiveUnreadable;
            }
        };

        in_progress.push(PackageName::new(target));
        let mut outcome = self.install_requirements(&manifest, catalog, in_progress);
        if outcome.is_success() {
            outcome = self.install_offline(&entry.archive_path);
        }
        in_progress.pop();

        debug!("install of {target} finished: {outcome}");
        outcome
    }

    fn install_requirements(
        &self,
        manifest: &PackageManifest,
        catalog: &Catalog,
        in_progress: &mut Vec<PackageName>,
    ) -> InstallOutcome {
        let support = self.support_package.as_str();
        if manifest.name != support && !self.is_installed(support) {
            info!("installing {support} first");
            let Some(entry) = catalog.lookup(support) else {
                error!("{support} not found in {}", catalog.root().display());
                return InstallOutcome::DependencyMissing;
            };
            let outcome = self.install_offline(&entry.archive_path);
            if !outcome.is_success() {
                return outcome;
            }
        }

        match manifest.required_base() {
            Some(base) if !self.is_installed(base) => {
                info!("installing base {base} for {}", manifest.name);
                let outcome = self.install_chain(base, catalog, in_progress);
                if !outcome.is_success() {
                    return outcome;
                }
            }
            Some(_) => {}
            None => debug!("{} needs no base", manifest.name),
        }

        let missing: Vec<&PackageName> = manifest
            .prerequisites
            .iter()
            .filter(|p| !self.is_installed(p))
            .collect();
        if !missing.is_empty() {
            info!("prerequisites for {}: {missing:?}", manifest.name);
        }
        for prerequisite in missing {
            let outcome = self.install_chain(prerequisite, catalog, in_progress);
            if !outcome.is_success() {
                return outcome;
            }
        }
        InstallOutcome::Success
    }

    /// Install the newest catalog revision of every installed package that
    /// has one. Stops between packages on Ctrl-C.
    pub fn update_offline(&self, catalog: &Catalog) -> Result<BatchReport, CoreError> {
        self.update_offline_until(catalog, shutdown_requested)
    }

    /// [`update_offline`](Self::update_offline) with an explicit stop check,
    /// consulted before each package.
    pub fn update_offline_until(
        &self,
        catalog: &Catalog,
        stop: impl Fn() -> bool,
    ) -> Result<BatchReport, CoreError> {
        let installed = self.daemon.list_installed()?;
        info!("{} packages installed", installed.len());
        for pkg in &installed {
            info!("installed: {} {}", pkg.name, pkg.revision);
        }

        let mut report = BatchReport::default();
        for entry in updatable_best(catalog.entries(), &installed) {
            if stop() {
                warn!("update pass interrupted before {}", entry.name);
                report.interrupted = true;
                break;
            }
            info!(
                "updating {} to revision {} from {}",
                entry.name,
                entry.revision,
                catalog.root().display()
            );
            let outcome = self.install_offline(&entry.archive_path);
            report.results.push(PackageResult {
                name: entry.name,
                revision: Some(entry.revision.get()),
                outcome,
            });
        }
        Ok(report)
    }

    /// Refresh one package from the online store.
    pub fn refresh(&self, name: &PackageName) -> InstallOutcome {
        let Some(elevation) = self.elevation else {
            error!("not started through pkexec or sudo; cannot refresh {name}");
            return InstallOutcome::NoPrivilegeContext;
        };
        info!("refreshing {name} online");
        if self.run_tool(elevation, &SnapOp::Refresh(name.clone())) {
            InstallOutcome::Success
        } else {
            InstallOutcome::RefreshFailed
        }
    }

    /// Refresh every package the daemon reports an online update for.
    pub fn update_online(&self) -> Result<BatchReport, CoreError> {
        self.update_online_until(shutdown_requested)
    }

    pub fn update_online_until(&self, stop: impl Fn() -> bool) -> Result<BatchReport, CoreError> {
        let updates = self.daemon.list_remote_updates()?;
        info!("{} packages have online updates", updates.len());

        let mut report = BatchReport::default();
        for name in updates.into_keys() {
            if stop() {
                warn!("update pass interrupted before {name}");
                report.interrupted = true;
                break;
            }
            let outcome = self.refresh(&name);
            report.results.push(PackageResult {
                name,
                revision: None,
                outcome,
            });
        }
        Ok(report)
    }
}
