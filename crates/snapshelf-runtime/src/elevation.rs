use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

const PASSWD_FILE: &str = "/etc/passwd";

/// How the privileged `snap` invocations are elevated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Elevation {
    Pkexec,
    Sudo,
}

impl Elevation {
    /// Detect the mechanism the current process was started through.
    pub fn detect() -> Option<Self> {
        Self::detect_with(|key| std::env::var(key).ok())
    }

    /// `PKEXEC_UID` takes precedence over `SUDO_UID`.
    pub fn detect_with(env: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let set = |key: &str| env(key).is_some_and(|v| !v.is_empty());
        if set("PKEXEC_UID") {
            Some(Self::Pkexec)
        } else if set("SUDO_UID") {
            Some(Self::Sudo)
        } else {
            None
        }
    }

    pub fn program(self) -> &'static str {
        match self {
            Self::Pkexec => "pkexec",
            Self::Sudo => "sudo",
        }
    }

    fn uid_var(self) -> &'static str {
        match self {
            Self::Pkexec => "PKEXEC_UID",
            Self::Sudo => "SUDO_UID",
        }
    }

    /// Uid of the user who asked for elevation.
    pub fn invoking_uid_with(self, env: impl Fn(&str) -> Option<String>) -> Option<u32> {
        env(self.uid_var())?.trim().parse().ok()
    }

    pub fn invoking_uid(self) -> Option<u32> {
        self.invoking_uid_with(|key| std::env::var(key).ok())
    }
}

impl fmt::Display for Elevation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// The user behind the current elevation, as listed in `/etc/passwd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokingUser {
    pub uid: u32,
    pub gid: u32,
    pub name: String,
}

impl InvokingUser {
    /// Hand `path` to this user and their primary group.
    pub fn chown(&self, path: &Path) -> io::Result<()> {
        std::os::unix::fs::chown(path, Some(self.uid), Some(self.gid))
    }
}

pub fn invoking_user() -> Option<InvokingUser> {
    let uid = Elevation::detect()?.invoking_uid()?;
    passwd_entry(uid, Path::new(PASSWD_FILE))
}

/// `name:password:uid:gid:...`
pub fn passwd_entry(uid: u32, passwd: &Path) -> Option<InvokingUser> {
    let content = fs::read_to_string(passwd).ok()?;
    content.lines().find_map(|line| {
        let mut fields = line.split(':');
        let name = fields.next()?;
        let entry_uid: u32 = fields.nth(1)?.parse().ok()?;
        if entry_uid != uid {
            return None;
        }
        let gid = fields.next()?.parse().ok()?;
        Some(InvokingUser {
            uid,
            gid,
            name: name.to_owned(),
        })
    })
}
