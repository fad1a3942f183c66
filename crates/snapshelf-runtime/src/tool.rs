use crate::elevation::Elevation;
use crate::RuntimeError;
use snapshelf_schema::PackageName;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;

/// One privileged `snap` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapOp {
    /// `snap ack <signature>`: trust the archive's assertions.
    Acknowledge(PathBuf),
    /// `snap install [--classic] <archive>`.
    Install { archive: PathBuf, classic: bool },
    /// `snap refresh <name>` from the online store.
    Refresh(PackageName),
}

impl SnapOp {
    pub fn args(&self) -> Vec<OsString> {
        match self {
            Self::Acknowledge(signature) => vec!["ack".into(), signature.into()],
            Self::Install { archive, classic } => {
                let mut args: Vec<OsString> = vec!["install".into()];
                if *classic {
                    args.push("--classic".into());
                }
                args.push(archive.into());
                args
            }
            Self::Refresh(name) => vec!["refresh".into(), name.as_str().into()],
        }
    }
}

/// Exit information of a finished invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolStatus {
    pub success: bool,
    pub code: Option<i32>,
    /// Combined stdout and stderr, for logging.
    pub output: String,
}

impl ToolStatus {
    pub fn ok() -> Self {
        Self {
            success: true,
            code: Some(0),
            output: String::new(),
        }
    }

    pub fn failed(code: i32, output: impl Into<String>) -> Self {
        Self {
            success: false,
            code: Some(code),
            output: output.into(),
        }
    }
}

/// The external installer. Each call is atomic at the package-manager level
/// and blocks until the tool exits; no timeout is imposed.
pub trait SnapTool: Send + Sync {
    fn run(&self, elevation: Elevation, op: &SnapOp) -> Result<ToolStatus, RuntimeError>;
}

/// Runs `<pkexec|sudo> snap <args>` on the host.
#[derive(Debug, Clone)]
pub struct SnapCommand {
    snap_binary: String,
}

impl Default for SnapCommand {
    fn default() -> Self {
        Self::new("snap")
    }
}

impl SnapCommand {
    pub fn new(snap_binary: impl Into<String>) -> Self {
        Self {
            snap_binary: snap_binary.into(),
        }
    }

    /// Full argv, starting with the elevation program.
    pub fn command_line(&self, elevation: Elevation, op: &SnapOp) -> Vec<OsString> {
        let mut argv: Vec<OsString> = vec![
            elevation.program().into(),
            self.snap_binary.clone().into(),
        ];
        argv.extend(op.args());
        argv
    }
}

impl SnapTool for SnapCommand {
    fn run(&self, elevation: Elevation, op: &SnapOp) -> Result<ToolStatus, RuntimeError> {
        let argv = self.command_line(elevation, op);
        debug!(
            "command: {}",
            argv.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .output()
            .map_err(|e| RuntimeError::ExecFailed {
                program: elevation.program().to_owned(),
                reason: e.to_string(),
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(ToolStatus {
            success: output.status.success(),
            code: output.status.code(),
            output: text.trim().to_owned(),
        })
    }
}
