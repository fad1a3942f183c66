use crate::types::{Confinement, PackageName, Revision};
use serde::{Deserialize, Serialize};

/// A package as reported by the package daemon.
///
/// The daemon reports revisions as strings; sideloaded packages carry
/// non-numeric revisions such as `x1`, so the raw value is kept and parsed on
/// demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub name: PackageName,
    pub revision: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub confinement: Option<Confinement>,
}

impl InstalledPackage {
    pub fn new(name: impl Into<PackageName>, revision: impl ToString) -> Self {
        Self {
            name: name.into(),
            revision: revision.to_string(),
            summary: String::new(),
            confinement: None,
        }
    }

    /// Numeric revision, or `None` for locally sideloaded revisions.
    pub fn numeric_revision(&self) -> Option<Revision> {
        self.revision.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_and_sideloaded_revisions() {
        assert_eq!(
            InstalledPackage::new("atom", 247).numeric_revision(),
            Some(Revision::new(247))
        );
        assert_eq!(InstalledPackage::new("atom", "x1").numeric_revision(), None);
    }

    #[test]
    fn deserializes_daemon_shape() {
        let json = r#"{"name":"core18","revision":"1705","summary":"Runtime","confinement":"strict","version":"20200427"}"#;
        let pkg: InstalledPackage = serde_json::from_str(json).unwrap();
        assert_eq!(pkg.name, "core18");
        assert_eq!(pkg.numeric_revision(), Some(Revision::new(1705)));
        assert_eq!(pkg.confinement, Some(Confinement::Strict));
    }
}
