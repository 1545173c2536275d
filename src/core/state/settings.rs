use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{ModboxError, ModboxResult};
use crate::core::registry::MODRINTH_API;
use crate::core::resolver::DEFAULT_MAX_NODES;
use crate::core::store::GITHUB_API;

const APP_DIR_NAME: &str = "modbox";
const SETTINGS_FILE: &str = "settings.json";

pub const TOKEN_ENV: &str = "MODBOX_GITHUB_TOKEN";
pub const REPOSITORY_ENV: &str = "MODBOX_REPOSITORY";

/// User settings, persisted as pretty JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub github_token: Option<String>,
    /// `https://github.com/<owner>/<repo>` of the pack being edited.
    pub repository: Option<String>,
    pub branch: String,
    pub registry_url: String,
    pub github_api_url: String,
    pub request_timeout_secs: u64,
    pub max_resolution_nodes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_token: None,
            repository: None,
            branch: "main".to_string(),
            registry_url: MODRINTH_API.to_string(),
            github_api_url: GITHUB_API.to_string(),
            request_timeout_secs: 30,
            max_resolution_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl Settings {
    /// Read settings from `path` (or the default location), falling back to
    /// defaults when the file does not exist, then apply env overrides.
    pub fn load(path: Option<&Path>) -> ModboxResult<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_settings_path);
        let mut settings = load_settings_from_disk(&path)?.unwrap_or_default();
        settings.apply_overrides(
            std::env::var(TOKEN_ENV).ok(),
            std::env::var(REPOSITORY_ENV).ok(),
        );
        Ok(settings)
    }

    pub fn save(&self, path: Option<&Path>) -> ModboxResult<PathBuf> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_settings_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ModboxError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| ModboxError::Io {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    fn apply_overrides(&mut self, token: Option<String>, repository: Option<String>) {
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            self.github_token = Some(token);
        }
        if let Some(repo) = repository.filter(|r| !r.is_empty()) {
            self.repository = Some(repo);
        }
    }

    pub fn require_token(&self) -> ModboxResult<&str> {
        self.github_token.as_deref().ok_or_else(|| {
            ModboxError::Config(format!("no GitHub token configured (set {TOKEN_ENV})"))
        })
    }

    pub fn require_repository(&self) -> ModboxResult<&str> {
        self.repository.as_deref().ok_or_else(|| {
            ModboxError::Config(format!(
                "no repository configured (pass --repository or set {REPOSITORY_ENV})"
            ))
        })
    }
}

fn load_settings_from_disk(path: &Path) -> ModboxResult<Option<Settings>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(ModboxError::Io {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| ModboxError::Config(format!("{}: {e}", path.display())))
}

pub fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join(SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_settings_from_disk(&dir.path().join("nope.json")).unwrap();
        assert!(loaded.is_none());
        assert_eq!(Settings::default().branch, "main");
        assert_eq!(Settings::default().max_resolution_nodes, 256);
    }

    #[test]
    fn save_then_load_keeps_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            repository: Some("https://github.com/steve/cozy".into()),
            request_timeout_secs: 5,
            ..Settings::default()
        };

        settings.save(Some(&path)).unwrap();
        let loaded = load_settings_from_disk(&path).unwrap().unwrap();

        assert_eq!(loaded, settings);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{ "branch": "dev" }"#).unwrap();

        let loaded = load_settings_from_disk(&path).unwrap().unwrap();

        assert_eq!(loaded.branch, "dev");
        assert_eq!(loaded.registry_url, MODRINTH_API);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(load_settings_from_disk(&path), Err(ModboxError::Config(_))));
    }

    #[test]
    fn env_values_override_file_values() {
        let mut settings = Settings {
            github_token: Some("from-file".into()),
            ..Settings::default()
        };

        settings.apply_overrides(Some("from-env".into()), Some(String::new()));

        assert_eq!(settings.github_token.as_deref(), Some("from-env"));
        assert!(settings.repository.is_none());
        assert!(matches!(settings.require_repository(), Err(ModboxError::Config(_))));
    }
}
