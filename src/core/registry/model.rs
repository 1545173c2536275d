use serde::{Deserialize, Serialize};

/// Which physical side a mod must be installed on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModSide {
    Client,
    Server,
    #[default]
    Both,
}

/// Immutable registry identity of a mod.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModProject {
    /// Opaque stable key.
    pub id: String,
    /// Human-readable key; may change over a project's lifetime.
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub side: ModSide,
}

/// One algorithm → digest pair, in the order the registry declared it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileHash {
    pub algorithm: String,
    pub digest: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModFile {
    pub url: String,
    pub filename: String,
    pub hashes: Vec<FileHash>,
    #[serde(default)]
    pub primary: bool,
    /// Declared kind, e.g. `required-resource-pack`. `None` for the mod jar.
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Required,
    Optional,
    Incompatible,
    Embedded,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DependencyTarget {
    Project(String),
    Version(String),
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DependencyRef {
    pub kind: DependencyKind,
    pub target: DependencyTarget,
}

impl DependencyRef {
    pub fn required_project(project_id: impl Into<String>) -> Self {
        Self {
            kind: DependencyKind::Required,
            target: DependencyTarget::Project(project_id.into()),
        }
    }

    pub fn required_version(version_id: impl Into<String>) -> Self {
        Self {
            kind: DependencyKind::Required,
            target: DependencyTarget::Version(version_id.into()),
        }
    }

    /// Only required refs pointing somewhere take part in resolution.
    pub fn participates_in_resolution(&self) -> bool {
        self.kind == DependencyKind::Required && self.target != DependencyTarget::None
    }

    /// Label used when logging a skipped dependency.
    pub fn describe(&self) -> &str {
        match &self.target {
            DependencyTarget::Project(id) | DependencyTarget::Version(id) => id,
            DependencyTarget::None => "<none>",
        }
    }
}

/// A concrete version of a project, with its files and declared dependencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModVersion {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub version_number: String,
    pub files: Vec<ModFile>,
    #[serde(default)]
    pub dependencies: Vec<DependencyRef>,
}

/// The unit the resolver emits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedMod {
    pub project: ModProject,
    pub version: ModVersion,
}

/// Loader and game version a pack targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameTarget {
    pub loader_id: String,
    pub game_version: String,
}

impl GameTarget {
    pub fn new(loader_id: impl Into<String>, game_version: impl Into<String>) -> Self {
        Self {
            loader_id: loader_id.into(),
            game_version: game_version.into(),
        }
    }
}
