use crate::arch::Arch;
use snapshelf_schema::ARCH_ALL;
use std::path::{Path, PathBuf};

/// Base name that marks the root of an offline mirror.
pub const OFFLINE_ROOT_SENTINEL: &str = "wasta-offline";

/// Where archives live inside an offline mirror root.
const MIRROR_SNAPS_DIR: [&str; 2] = ["local-cache", "snaps"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutKind {
    /// Any folder picked by the user; archives sit directly under it.
    Plain,
    /// An offline mirror; archives sit under `local-cache/snaps`.
    OfflineMirror,
}

/// Directory layout of an offline package folder.
///
/// The two supported layouts differ only in where the architecture folders
/// hang; which one applies is decided by the root's base name.
#[derive(Debug, Clone)]
pub struct CatalogLayout {
    root: PathBuf,
    kind: LayoutKind,
}

impl CatalogLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let kind = if is_offline_mirror(&root) {
            LayoutKind::OfflineMirror
        } else {
            LayoutKind::Plain
        };
        Self { root, kind }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Folder that holds the catalog (and its architecture subfolders).
    pub fn snaps_dir(&self) -> PathBuf {
        match self.kind {
            LayoutKind::Plain => self.root.clone(),
            LayoutKind::OfflineMirror => MIRROR_SNAPS_DIR
                .iter()
                .fold(self.root.clone(), |dir, part| dir.join(part)),
        }
    }

    /// Folders searched for archives, highest priority first: the catalog
    /// folder itself, the architecture-agnostic folder, then the host's
    /// architecture folder.
    pub fn candidate_dirs(&self, arch: Arch) -> [PathBuf; 3] {
        let base = self.snaps_dir();
        [base.clone(), base.join(ARCH_ALL), base.join(arch.folder())]
    }

    #[inline]
    pub fn arch_dir(&self, arch_folder: &str) -> PathBuf {
        self.snaps_dir().join(arch_folder)
    }
}

pub fn is_offline_mirror(root: &Path) -> bool {
    root.file_name()
        .is_some_and(|name| name == OFFLINE_ROOT_SENTINEL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_layout_uses_root() {
        let layout = CatalogLayout::new("/home/user/snaps");
        assert_eq!(layout.kind(), LayoutKind::Plain);
        assert_eq!(layout.snaps_dir(), PathBuf::from("/home/user/snaps"));
        let dirs = layout.candidate_dirs(Arch::Amd64);
        assert_eq!(dirs[0], PathBuf::from("/home/user/snaps"));
        assert_eq!(dirs[1], PathBuf::from("/home/user/snaps/all"));
        assert_eq!(dirs[2], PathBuf::from("/home/user/snaps/amd64"));
    }

    #[test]
    fn mirror_layout_nests_under_local_cache() {
        let layout = CatalogLayout::new("/media/user/USB/wasta-offline");
        assert_eq!(layout.kind(), LayoutKind::OfflineMirror);
        assert_eq!(
            layout.snaps_dir(),
            PathBuf::from("/media/user/USB/wasta-offline/local-cache/snaps")
        );
        assert_eq!(
            layout.arch_dir("arm64"),
            PathBuf::from("/media/user/USB/wasta-offline/local-cache/snaps/arm64")
        );
    }

    #[test]
    fn sentinel_must_be_the_base_name() {
        assert!(!is_offline_mirror(Path::new(
            "/media/wasta-offline/somewhere"
        )));
        assert!(!is_offline_mirror(Path::new("/media/wasta-offline-old")));
        assert!(is_offline_mirror(Path::new("/mnt/wasta-offline")));
    }
}
