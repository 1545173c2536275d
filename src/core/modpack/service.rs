use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use super::naming::{add_commit_message, add_summary};
use crate::core::error::{ModboxError, ModboxResult};
use crate::core::manifest::{
    BatchOutcome, DescriptorRenderer, ManifestConsistencyManager, ModAddition, PackManifest,
};
use crate::core::registry::{GameTarget, RegistryClient};
use crate::core::resolver::{DependencyResolver, ResolverOptions};
use crate::core::store::{CommitReceipt, ManifestStore};

/// Where an add/remove request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Snapshot,
    Resolution,
    Commit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Snapshot => write!(f, "reading the modpack"),
            Stage::Resolution => write!(f, "resolving mods"),
            Stage::Commit => write!(f, "saving the modpack"),
        }
    }
}

#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct OperationError {
    pub stage: Stage,
    #[source]
    pub source: ModboxError,
}

impl OperationError {
    fn at(stage: Stage) -> impl FnOnce(ModboxError) -> Self {
        move |source| Self { stage, source }
    }

    /// Message safe to show an end user: names the stage, never echoes
    /// registry or store response bodies.
    pub fn user_message(&self) -> String {
        let detail = match &self.source {
            ModboxError::ProjectNotFound(slug) => format!("{slug} was not found on the registry"),
            ModboxError::NoCompatibleVersion {
                project,
                loader,
                game_version,
            } => format!("no version of {project} supports {loader} on Minecraft {game_version}"),
            ModboxError::AlreadyInstalled(slug) => format!("{slug} is already in this modpack"),
            ModboxError::NotInstalled(slug) => format!("{slug} is not in this modpack"),
            ModboxError::ResolutionLimitExceeded { limit } => {
                format!("the dependency tree is larger than {limit} mods")
            }
            ModboxError::InvalidSlug(slug) => format!("{slug:?} is not a valid mod slug"),
            ModboxError::Conflict(_) => {
                "the modpack changed while saving; reload and try again".to_string()
            }
            ModboxError::MissingPackManifest(_) => "the repository has no pack.toml".to_string(),
            e if e.is_transport() => "a remote service is unavailable, try again later".to_string(),
            _ => "an internal error occurred".to_string(),
        };
        format!("Error {}: {}", self.stage, detail)
    }
}

pub type OperationResult<T> = Result<T, OperationError>;

/// A mod ready to be written, with the text of its descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMod {
    pub slug: String,
    pub title: String,
    pub version_id: String,
    pub descriptor: String,
}

#[derive(Debug, Clone)]
pub struct AddReport {
    /// Titles of every mod installed, requested mod first.
    pub titles: Vec<String>,
    pub slugs: Vec<String>,
    pub commit: CommitReceipt,
    pub index_hash: String,
}

impl AddReport {
    pub fn installed_count(&self) -> usize {
        self.titles.len()
    }

    pub fn summary(&self) -> String {
        add_summary(&self.titles)
    }
}

#[derive(Debug, Clone)]
pub struct RemoveReport {
    pub slug: String,
    pub commit: CommitReceipt,
}

/// Fields for a brand-new pack.
#[derive(Debug, Clone)]
pub struct NewModpack {
    pub name: String,
    pub creator: String,
    pub minecraft_version: String,
    pub loader: String,
    pub loader_version: String,
}

/// User-level operations on one modpack.
pub struct ModpackService {
    resolver: DependencyResolver,
    renderer: DescriptorRenderer,
    manifests: ManifestConsistencyManager,
}

impl ModpackService {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        store: Arc<dyn ManifestStore>,
        options: ResolverOptions,
    ) -> Self {
        let renderer = DescriptorRenderer::new(registry.name());
        Self {
            resolver: DependencyResolver::with_options(registry, options),
            renderer,
            manifests: ManifestConsistencyManager::new(store),
        }
    }

    pub fn manifests(&self) -> &ManifestConsistencyManager {
        &self.manifests
    }

    /// Resolve `root` and its dependencies, rendering a descriptor for each
    /// mod not already installed.
    pub async fn resolve_and_render(
        &self,
        root: &str,
        target: &GameTarget,
        installed: &HashSet<String>,
    ) -> ModboxResult<Vec<RenderedMod>> {
        let root = self.resolver.get_project_with_version(root, target).await?;
        let mods = self.resolver.resolve(root, target, installed).await?;

        mods.iter()
            .map(|m| {
                Ok(RenderedMod {
                    slug: m.project.slug.clone(),
                    title: m.project.title.clone(),
                    version_id: m.version.id.clone(),
                    descriptor: self.renderer.render(m)?,
                })
            })
            .collect()
    }

    pub async fn apply_batch(
        &self,
        adds: &[ModAddition],
        removes: &[String],
        message: &str,
    ) -> ModboxResult<BatchOutcome> {
        self.manifests.apply_batch(adds, removes, message).await
    }

    pub async fn add_mod(&self, slug: &str) -> OperationResult<AddReport> {
        let snapshot = self
            .manifests
            .snapshot()
            .await
            .map_err(OperationError::at(Stage::Snapshot))?;
        let target = snapshot
            .pack
            .game_target()
            .map_err(OperationError::at(Stage::Snapshot))?;
        let installed = snapshot.installed_slugs();

        if installed.contains(slug) {
            return Err(OperationError::at(Stage::Resolution)(
                ModboxError::AlreadyInstalled(slug.to_string()),
            ));
        }

        let rendered = self
            .resolve_and_render(slug, &target, &installed)
            .await
            .map_err(OperationError::at(Stage::Resolution))?;

        // The root can still be filtered out when `slug` was a project id
        // whose real slug is installed.
        if rendered.is_empty() {
            return Err(OperationError::at(Stage::Resolution)(
                ModboxError::AlreadyInstalled(slug.to_string()),
            ));
        }

        let titles: Vec<String> = rendered.iter().map(|m| m.title.clone()).collect();
        let adds: Vec<ModAddition> = rendered
            .into_iter()
            .map(|m| ModAddition {
                slug: m.slug,
                descriptor: m.descriptor,
            })
            .collect();

        // Commit against the snapshot the target and installed set came from.
        let outcome = self
            .manifests
            .apply_batch_on(snapshot, &adds, &[], &add_commit_message(&titles))
            .await
            .map_err(OperationError::at(Stage::Commit))?;

        info!("Added {} mod(s) starting with {}", titles.len(), slug);
        Ok(AddReport {
            titles,
            slugs: outcome.added,
            commit: outcome.receipt,
            index_hash: outcome.index_hash,
        })
    }

    pub async fn remove_mod(&self, slug: &str) -> OperationResult<RemoveReport> {
        let exists = self
            .manifests
            .mod_exists(slug)
            .await
            .map_err(OperationError::at(Stage::Snapshot))?;
        if !exists {
            return Err(OperationError::at(Stage::Snapshot)(ModboxError::NotInstalled(
                slug.to_string(),
            )));
        }

        let outcome = self
            .manifests
            .apply_batch(&[], &[slug.to_string()], &format!("Remove {slug}"))
            .await
            .map_err(OperationError::at(Stage::Commit))?;

        info!("Removed {}", slug);
        Ok(RemoveReport {
            slug: slug.to_string(),
            commit: outcome.receipt,
        })
    }

    /// Installed mod slugs, sorted.
    pub async fn list_mods(&self) -> ModboxResult<Vec<String>> {
        Ok(self.manifests.snapshot().await?.index.mod_slugs())
    }

    pub async fn initialize(&self, new: NewModpack) -> ModboxResult<CommitReceipt> {
        let pack = PackManifest::new(
            new.name,
            new.creator,
            new.minecraft_version,
            new.loader,
            new.loader_version,
            crate::core::manifest::INDEX_FILE,
        );
        self.manifests.initialize(pack).await
    }
}
