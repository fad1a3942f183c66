pub mod arrange;
pub mod completions;
pub mod discover;
pub mod doctor;
pub mod info;
pub mod install;
pub mod installable;
pub mod man_pages;
pub mod refresh_list;
pub mod scan;
pub mod update;
pub mod updatable;

use indicatif::{ProgressBar, ProgressStyle};
use snapshelf_catalog::{discover_offline_root, host_machine, Catalog, CatalogError, SearchRoots};
use snapshelf_core::{BatchReport, Engine, InstallOutcome};
use snapshelf_runtime::{invoking_user, SnapDaemon, SnapdClient, ShelfConfig};
use snapshelf_schema::InstalledPackage;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_CONFIG_ERROR: u8 = 2;

/// Settings shared by every command.
pub struct Context {
    pub config: ShelfConfig,
    pub json: bool,
    pub machine: String,
}

impl Context {
    pub fn new(config: ShelfConfig, json: bool, machine: Option<String>) -> Self {
        Self {
            config,
            json,
            machine: machine.unwrap_or_else(host_machine),
        }
    }

    pub fn daemon(&self) -> SnapdClient {
        SnapdClient::new(&self.config.socket_path)
    }

    pub fn engine(&self) -> Engine {
        Engine::from_config(&self.config)
    }

    /// The folder given on the command line, else the configured one, else
    /// a discovered offline mirror or the user's home.
    pub fn resolve_folder(&self, dir: Option<&Path>) -> PathBuf {
        if let Some(dir) = dir {
            return dir.to_path_buf();
        }
        if let Some(dir) = &self.config.offline_root {
            return dir.clone();
        }
        discover_folder()
    }

    /// An unsupported architecture yields an empty catalog after a warning.
    pub fn load_catalog(&self, dir: &Path) -> Result<Catalog, String> {
        match Catalog::scan(dir, &self.machine) {
            Ok(catalog) => Ok(catalog),
            Err(e @ CatalogError::UnsupportedArchitecture(_)) => {
                eprintln!("warning: {e}");
                Ok(Catalog::from_entries(dir, Vec::new()))
            }
            Err(e) => Err(e.to_string()),
        }
    }

    pub fn installed(&self) -> Result<Vec<InstalledPackage>, String> {
        self.daemon().list_installed().map_err(|e| e.to_string())
    }
}

pub fn discover_folder() -> PathBuf {
    let user = invoking_user();
    let user_name = user.as_ref().map(|u| u.name.as_str());
    let home = match user_name {
        Some(name) => PathBuf::from("/home").join(name),
        None => std::env::var_os("HOME").map_or_else(|| PathBuf::from("/"), PathBuf::from),
    };
    discover_offline_root(&SearchRoots::default(), user_name, &home)
}

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .expect("valid template")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(msg.to_owned());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn spin_ok(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✓ {msg}"));
}

pub fn spin_fail(pb: &ProgressBar, msg: &str) {
    pb.set_style(ProgressStyle::with_template("{msg}").expect("valid template"));
    pb.finish_with_message(format!("✗ {msg}"));
}

pub fn colorize_outcome(outcome: InstallOutcome) -> String {
    use console::Style;
    if outcome.is_success() {
        Style::new().green().apply_to(outcome.describe()).to_string()
    } else {
        Style::new().red().apply_to(outcome.to_string()).to_string()
    }
}

/// Download size the way the store reports it to users: whole megabytes or
/// kilobytes, falling back to bytes.
pub fn human_size(bytes: u64) -> String {
    let kb = (bytes + 512) / 1024;
    let mb = (kb + 512) / 1024;
    if mb > 1 {
        format!("{mb} MB")
    } else if kb > 1 {
        format!("{kb} KB")
    } else {
        format!("{bytes} B")
    }
}

pub fn print_report(report: &BatchReport, json: bool) -> Result<(), String> {
    if json {
        println!("{}", json_pretty(report)?);
        return Ok(());
    }
    for result in &report.results {
        let revision = result
            .revision
            .map(|r| format!(" ({r})"))
            .unwrap_or_default();
        println!(
            "{:<32} {}",
            format!("{}{revision}", result.name),
            colorize_outcome(result.outcome)
        );
    }
    if report.interrupted {
        println!("stopped before all packages were processed");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_pretty_serializes_array() {
        let val = vec![1, 2, 3];
        let result = json_pretty(&val).unwrap();
        assert!(result.contains('1'));
    }

    #[test]
    fn human_size_units() {
        assert_eq!(human_size(100), "100 B");
        assert_eq!(human_size(1024), "1024 B");
        assert_eq!(human_size(4096), "4 KB");
        assert_eq!(human_size(104_857_600), "100 MB");
    }

    #[test]
    fn colorize_outcome_keeps_text() {
        assert!(colorize_outcome(InstallOutcome::Success).contains("success"));
        assert!(colorize_outcome(InstallOutcome::InstallFailed).contains("(12)"));
    }

    #[test]
    fn explicit_folder_wins() {
        let ctx = Context::new(
            ShelfConfig {
                offline_root: Some(PathBuf::from("/configured")),
                ..ShelfConfig::default()
            },
            false,
            Some("x86_64".to_owned()),
        );
        assert_eq!(
            ctx.resolve_folder(Some(Path::new("/given"))),
            PathBuf::from("/given")
        );
        assert_eq!(ctx.resolve_folder(None), PathBuf::from("/configured"));
    }

    #[test]
    fn unsupported_machine_gives_empty_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context::new(ShelfConfig::default(), false, Some("riscv64".to_owned()));
        let catalog = ctx.load_catalog(dir.path()).unwrap();
        assert!(catalog.is_empty());
    }
}
