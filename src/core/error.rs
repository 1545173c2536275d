use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the modpack backend.
/// Every module returns `Result<T, ModboxError>`.
#[derive(Debug, Error)]
pub enum ModboxError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(std::time::Duration),

    // ── Registry ────────────────────────────────────────
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Version not found: {0}")]
    VersionNotFound(String),

    #[error("No compatible versions found for {project} ({loader} {game_version})")]
    NoCompatibleVersion {
        project: String,
        loader: String,
        game_version: String,
    },

    #[error("Registry returned HTTP {status} for {url}")]
    RegistryStatus { url: String, status: u16 },

    #[error("Version {0} has no downloadable file with a hash")]
    IncompleteVersion(String),

    // ── Resolution ──────────────────────────────────────
    #[error("Dependency resolution exceeded {limit} mods")]
    ResolutionLimitExceeded { limit: usize },

    #[error("{0} is already in this modpack")]
    AlreadyInstalled(String),

    #[error("{0} is not in this modpack")]
    NotInstalled(String),

    // ── Manifest ────────────────────────────────────────
    #[error("pack manifest {0} not found")]
    MissingPackManifest(String),

    #[error("pack manifest declares no mod loader")]
    MissingLoader,

    #[error("Unsupported hash format: {0}")]
    UnsupportedHashFormat(String),

    #[error("Invalid mod slug: {0:?}")]
    InvalidSlug(String),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    // ── Store ───────────────────────────────────────────
    #[error("Commit rejected, {0} changed since it was read")]
    Conflict(String),

    #[error("Store returned HTTP {status} for {url}")]
    StoreStatus { url: String, status: u16 },

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("Invalid GitHub repository URL: {0}")]
    InvalidRepositoryUrl(String),

    #[error("Invalid commit batch: {0}")]
    InvalidBatch(String),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("File {0} is not valid UTF-8")]
    NotUtf8(String),

    // ── Loader ──────────────────────────────────────────
    #[error("Unknown mod loader: {0}")]
    UnknownLoader(String),

    #[error("No {loader} versions available for Minecraft {game_version}")]
    NoLoaderVersions {
        loader: String,
        game_version: String,
    },

    // ── XML ─────────────────────────────────────────────
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::DeError),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Config ──────────────────────────────────────────
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the crate.
pub type ModboxResult<T> = Result<T, ModboxError>;

impl ModboxError {
    /// Network-level failures a caller may retry with backoff.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ModboxError::Http(_)
                | ModboxError::Timeout(_)
                | ModboxError::RegistryStatus { .. }
                | ModboxError::StoreStatus { .. }
        )
    }

    /// The manifest moved under us; re-read and retry the whole batch.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ModboxError::Conflict(_))
    }
}

impl From<std::io::Error> for ModboxError {
    fn from(source: std::io::Error) -> Self {
        ModboxError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}
