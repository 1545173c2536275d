use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use super::Settings;
use crate::core::error::ModboxResult;
use crate::core::http::build_http_client;
use crate::core::modpack::ModpackService;
use crate::core::registry::{ModrinthClient, RegistryClient};
use crate::core::resolver::ResolverOptions;
use crate::core::store::{GitHubStore, ManifestStore, RepoLocator};

/// Shared wiring for every command: one HTTP client, one registry.
pub struct AppState {
    pub settings: Settings,
    pub http_client: Client,
    pub registry: Arc<dyn RegistryClient>,
}

impl AppState {
    pub fn new(settings: Settings) -> ModboxResult<Self> {
        let http_client = build_http_client(Duration::from_secs(settings.request_timeout_secs))?;
        let registry: Arc<dyn RegistryClient> = Arc::new(ModrinthClient::with_base_url(
            http_client.clone(),
            settings.registry_url.clone(),
        ));

        Ok(Self {
            settings,
            http_client,
            registry,
        })
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            max_nodes: self.settings.max_resolution_nodes,
            request_timeout: Some(Duration::from_secs(self.settings.request_timeout_secs)),
        }
    }

    /// Store for the configured repository and branch.
    pub fn store(&self) -> ModboxResult<Arc<dyn ManifestStore>> {
        let repo = RepoLocator::parse_url(self.settings.require_repository()?)?;
        self.store_for(repo)
    }

    pub fn store_for(&self, repo: RepoLocator) -> ModboxResult<Arc<dyn ManifestStore>> {
        let store = GitHubStore::new(
            self.http_client.clone(),
            self.settings.require_token()?,
            repo,
        )
        .with_branch(self.settings.branch.clone())
        .with_api_base(self.settings.github_api_url.clone());
        Ok(Arc::new(store))
    }

    pub fn modpack(&self) -> ModboxResult<ModpackService> {
        Ok(self.modpack_with(self.store()?))
    }

    pub fn modpack_with(&self, store: Arc<dyn ManifestStore>) -> ModpackService {
        ModpackService::new(self.registry.clone(), store, self.resolver_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ModboxError;

    #[test]
    fn resolver_options_follow_settings() {
        let state = AppState::new(Settings {
            request_timeout_secs: 7,
            max_resolution_nodes: 12,
            ..Settings::default()
        })
        .unwrap();

        let options = state.resolver_options();
        assert_eq!(options.max_nodes, 12);
        assert_eq!(options.request_timeout, Some(Duration::from_secs(7)));
        assert_eq!(state.registry.name(), "modrinth");
    }

    #[test]
    fn store_needs_repository_and_token() {
        let state = AppState::new(Settings::default()).unwrap();
        assert!(matches!(state.store(), Err(ModboxError::Config(_))));

        let state = AppState::new(Settings {
            repository: Some("https://github.com/steve/cozy".into()),
            ..Settings::default()
        })
        .unwrap();
        assert!(matches!(state.store(), Err(ModboxError::Config(_))));

        let state = AppState::new(Settings {
            repository: Some("https://github.com/steve/cozy".into()),
            github_token: Some("ghp_x".into()),
            ..Settings::default()
        })
        .unwrap();
        assert!(state.modpack().is_ok());
    }
}
