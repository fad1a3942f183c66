use crate::config::ShelfConfig;
use std::fmt;
use std::path::Path;
use std::process::Command;

/// A missing host tool with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: String,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn command_exists(name: &str) -> bool {
    if name.contains('/') {
        return Path::new(name).is_file();
    }
    Command::new("which")
        .arg(name)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn check_snap_and_elevation(config: &ShelfConfig, missing: &mut Vec<MissingPrereq>) {
    if !command_exists(&config.snap_binary) {
        missing.push(MissingPrereq {
            name: config.snap_binary.clone(),
            purpose: "installing and refreshing packages",
            install_hint: "apt install snapd",
        });
    }

    if !command_exists("pkexec") && !command_exists("sudo") {
        missing.push(MissingPrereq {
            name: "pkexec or sudo".to_owned(),
            purpose: "running the snap tool with elevated privileges",
            install_hint: "apt install policykit-1 | apt install sudo",
        });
    }
}

/// Tools needed to install from an offline folder.
/// Returns a list of missing items. Empty list means all prerequisites are met.
pub fn check_offline_prereqs(config: &ShelfConfig) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if !command_exists(&config.unsquashfs_binary) {
        missing.push(MissingPrereq {
            name: config.unsquashfs_binary.clone(),
            purpose: "reading manifests out of package archives",
            install_hint: "apt install squashfs-tools",
        });
    }
    check_snap_and_elevation(config, &mut missing);

    missing
}

/// Tools needed to refresh from the online store.
pub fn check_online_prereqs(config: &ShelfConfig) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();
    check_snap_and_elevation(config, &mut missing);
    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\nsnapshelf needs these tools to install packages.");
    msg
}
