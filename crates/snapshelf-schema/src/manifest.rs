use crate::types::{Confinement, PackageName, Revision};
use serde::{Deserialize, Serialize};
use serde_yaml_ng::Value;
use std::collections::BTreeSet;
use thiserror::Error;

/// Path of the manifest inside a package archive's filesystem image.
pub const MANIFEST_PATH: &str = "meta/snap.yaml";

/// Base runtime assumed when a manifest does not name one.
pub const DEFAULT_BASE: &str = "core";

/// Architecture folder used when a manifest lists no architectures.
pub const ARCH_ALL: &str = "all";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to parse manifest: {0}")]
    ParseYaml(#[from] serde_yaml_ng::Error),
    #[error("manifest is empty")]
    Empty,
    #[error("unknown confinement mode '{0}'")]
    UnknownConfinement(String),
}

/// What a package is for, as declared by its `type` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    #[default]
    App,
    Base,
    Os,
    Snapd,
    Gadget,
    Kernel,
}

impl PackageKind {
    /// Runtime packages do not run on top of another base.
    pub fn is_runtime(self) -> bool {
        matches!(self, Self::Base | Self::Os | Self::Snapd)
    }

    /// Unrecognized types are treated as applications.
    fn from_declared(kind: &str) -> Self {
        match kind.trim() {
            "base" => Self::Base,
            "os" => Self::Os,
            "snapd" => Self::Snapd,
            "gadget" => Self::Gadget,
            "kernel" => Self::Kernel,
            _ => Self::App,
        }
    }
}

/// On-disk shape of the embedded manifest. Only the keys we act on are
/// declared; everything else is ignored.
#[derive(Debug, Default, Deserialize)]
struct RawManifest {
    #[serde(default)]
    base: Option<String>,
    #[serde(default)]
    confinement: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    plugs: Option<Value>,
    #[serde(default)]
    architectures: Option<Vec<String>>,
}

/// Dependency and display facts read from a package archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    pub name: PackageName,
    pub revision: Revision,
    pub base: PackageName,
    /// `None` when the manifest has no `confinement` key; treated as not classic.
    pub confinement: Option<Confinement>,
    /// Provider packages named by `plugs.*.default-provider`, deduplicated and sorted.
    pub prerequisites: Vec<PackageName>,
    pub summary: String,
    pub kind: PackageKind,
    pub architectures: Vec<String>,
}

impl PackageManifest {
    pub fn is_classic(&self) -> bool {
        self.confinement == Some(Confinement::Classic)
    }

    /// The base that must be installed before this package, if any.
    ///
    /// Runtime packages (bases, the OS snap, snapd) and packages naming
    /// themselves as base need nothing underneath them.
    pub fn required_base(&self) -> Option<&PackageName> {
        if self.kind.is_runtime() || self.base == self.name {
            None
        } else {
            Some(&self.base)
        }
    }
}

/// Parse manifest text for the archive identified by `name` and `revision`.
///
/// Name and revision come from the archive's file name, which is what the
/// catalog and the installed-package list are keyed on.
pub fn parse_manifest_str(
    input: &str,
    name: PackageName,
    revision: Revision,
) -> Result<PackageManifest, ManifestError> {
    if input.trim().is_empty() {
        return Err(ManifestError::Empty);
    }
    let raw: RawManifest = serde_yaml_ng::from_str(input)?;

    let confinement = match raw.confinement.as_deref() {
        None => None,
        Some(mode) => Some(
            mode.parse::<Confinement>()
                .map_err(ManifestError::UnknownConfinement)?,
        ),
    };

    let base = raw
        .base
        .map(|b| b.trim().to_owned())
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE.to_owned());

    let architectures = match raw.architectures {
        Some(arches) if !arches.is_empty() => arches,
        _ => vec![ARCH_ALL.to_owned()],
    };

    Ok(PackageManifest {
        name,
        revision,
        base: PackageName::new(base),
        confinement,
        prerequisites: default_providers(raw.plugs.as_ref()),
        summary: raw.summary.unwrap_or_default().trim().to_owned(),
        kind: raw
            .kind
            .as_deref()
            .map(PackageKind::from_declared)
            .unwrap_or_default(),
        architectures,
    })
}

/// Collect `default-provider` values from a `plugs` mapping.
///
/// A provider may be written as `<package>:<slot>`; only the package part is
/// kept. Plugs without a provider, or written in the short string/null form,
/// contribute nothing.
fn default_providers(plugs: Option<&Value>) -> Vec<PackageName> {
    let Some(Value::Mapping(plugs)) = plugs else {
        return Vec::new();
    };

    let providers: BTreeSet<String> = plugs
        .values()
        .filter_map(|plug| plug.get("default-provider"))
        .filter_map(Value::as_str)
        .filter_map(|provider| {
            let package = provider.split(':').next()?.trim();
            (!package.is_empty()).then(|| package.to_owned())
        })
        .collect();

    providers.into_iter().map(PackageName::new).collect()
}
