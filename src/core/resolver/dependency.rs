use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::core::error::{ModboxError, ModboxResult};
use crate::core::registry::{
    DependencyRef, DependencyTarget, GameTarget, RegistryClient, ResolvedMod,
};

/// Upper bound on distinct projects a single resolution may visit.
pub const DEFAULT_MAX_NODES: usize = 256;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ResolverOptions {
    pub max_nodes: usize,
    /// Applied to each dependency lookup; `None` disables the timeout.
    pub request_timeout: Option<Duration>,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            request_timeout: Some(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

/// Expands a requested mod into the full set of mods the pack must gain.
pub struct DependencyResolver {
    registry: Arc<dyn RegistryClient>,
    options: ResolverOptions,
}

impl DependencyResolver {
    pub fn new(registry: Arc<dyn RegistryClient>) -> Self {
        Self::with_options(registry, ResolverOptions::default())
    }

    pub fn with_options(registry: Arc<dyn RegistryClient>, options: ResolverOptions) -> Self {
        Self { registry, options }
    }

    /// Fetch a project and its best version for the target.
    ///
    /// "Best" is the first entry of the registry's filtered list. Both
    /// lookups together are bounded by the request timeout.
    pub async fn get_project_with_version(
        &self,
        id_or_slug: &str,
        target: &GameTarget,
    ) -> ModboxResult<ResolvedMod> {
        self.with_timeout(self.fetch_project_with_version(id_or_slug, target))
            .await
    }

    async fn fetch_project_with_version(
        &self,
        id_or_slug: &str,
        target: &GameTarget,
    ) -> ModboxResult<ResolvedMod> {
        let project = self.registry.get_project(id_or_slug).await?;

        let versions = self
            .registry
            .get_versions_for(&project.id, &target.loader_id, &target.game_version)
            .await?;

        let version = versions
            .into_iter()
            .next()
            .ok_or_else(|| ModboxError::NoCompatibleVersion {
                project: format!("{} ({})", project.title, project.slug),
                loader: target.loader_id.clone(),
                game_version: target.game_version.clone(),
            })?;

        debug!("Selected {} {} for {}", project.slug, version.id, target.game_version);
        Ok(ResolvedMod { project, version })
    }

    /// Breadth-first expansion of `root`'s required dependencies.
    ///
    /// Output is in discovery order, root first. Mods whose slug is in
    /// `already_installed` are neither emitted nor expanded. A dependency that
    /// cannot be resolved is logged and skipped.
    pub async fn resolve(
        &self,
        root: ResolvedMod,
        target: &GameTarget,
        already_installed: &HashSet<String>,
    ) -> ModboxResult<Vec<ResolvedMod>> {
        let mut queue = VecDeque::from([root]);
        let mut visited: HashSet<String> = HashSet::new();
        let mut resolved: Vec<ResolvedMod> = Vec::new();

        while let Some(current) = queue.pop_front() {
            if visited.contains(&current.project.id)
                || already_installed.contains(&current.project.slug)
            {
                continue;
            }

            if visited.len() >= self.options.max_nodes {
                return Err(ModboxError::ResolutionLimitExceeded {
                    limit: self.options.max_nodes,
                });
            }
            visited.insert(current.project.id.clone());

            let deps: Vec<DependencyRef> = current
                .version
                .dependencies
                .iter()
                .filter(|d| d.participates_in_resolution())
                .cloned()
                .collect();
            resolved.push(current);

            // Siblings are fetched together but drained in declaration order.
            let lookups = deps.iter().map(|dep| self.resolve_dependency(dep, target));
            let results = join_all(lookups).await;

            for (dep, result) in deps.iter().zip(results) {
                match result {
                    Ok(Some(found)) => {
                        if !visited.contains(&found.project.id)
                            && !already_installed.contains(&found.project.slug)
                        {
                            queue.push_back(found);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!("Failed to resolve dependency {}: {}", dep.describe(), e);
                    }
                }
            }
        }

        info!(
            "Resolved {} mod(s) for {} {}",
            resolved.len(),
            target.loader_id,
            target.game_version
        );
        Ok(resolved)
    }

    async fn resolve_dependency(
        &self,
        dep: &DependencyRef,
        target: &GameTarget,
    ) -> ModboxResult<Option<ResolvedMod>> {
        match &dep.target {
            DependencyTarget::Project(project_id) => self
                .get_project_with_version(project_id, target)
                .await
                .map(Some),
            DependencyTarget::Version(version_id) => {
                self.with_timeout(async {
                    let version = self.registry.get_version(version_id).await?;
                    let project = self.registry.get_project(&version.project_id).await?;
                    Ok(Some(ResolvedMod { project, version }))
                })
                .await
            }
            DependencyTarget::None => Ok(None),
        }
    }

    async fn with_timeout<T>(
        &self,
        fut: impl Future<Output = ModboxResult<T>>,
    ) -> ModboxResult<T> {
        match self.options.request_timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ModboxError::Timeout(limit))?,
            None => fut.await,
        }
    }
}
