use crate::layout::OFFLINE_ROOT_SENTINEL;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Mount points searched for an offline mirror.
#[derive(Debug, Clone)]
pub struct SearchRoots {
    pub media: PathBuf,
    pub mnt: PathBuf,
}

impl Default for SearchRoots {
    fn default() -> Self {
        Self {
            media: PathBuf::from("/media"),
            mnt: PathBuf::from("/mnt"),
        }
    }
}

/// Guess the offline folder to start from.
///
/// In order: `<media>/<user>/*/wasta-offline` (removable drives),
/// `<mnt>/wasta-offline`, `<media>/*/wasta-offline` (shared folders), and
/// finally `fallback` (normally the user's home).
pub fn discover_offline_root(roots: &SearchRoots, user: Option<&str>, fallback: &Path) -> PathBuf {
    let mut candidates = Vec::new();
    if let Some(user) = user {
        candidates.extend(mirrors_one_level_down(&roots.media.join(user)));
    }
    let mnt_mirror = roots.mnt.join(OFFLINE_ROOT_SENTINEL);
    if mnt_mirror.is_dir() {
        candidates.push(mnt_mirror);
    }
    candidates.extend(mirrors_one_level_down(&roots.media));

    if let Some(found) = candidates.into_iter().next() {
        info!("offline mirror found at {}", found.display());
        found
    } else {
        warn!(
            "no offline mirror found; falling back to {}",
            fallback.display()
        );
        fallback.to_path_buf()
    }
}

/// `<dir>/*/wasta-offline`, sorted.
fn mirrors_one_level_down(dir: &Path) -> Vec<PathBuf> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = read
        .flatten()
        .map(|entry| entry.path().join(OFFLINE_ROOT_SENTINEL))
        .filter(|path| path.is_dir())
        .collect();
    found.sort();
    found
}
