mod model;
mod modrinth;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

pub use model::{
    DependencyKind, DependencyRef, DependencyTarget, FileHash, GameTarget, ModFile, ModProject,
    ModSide, ModVersion, ResolvedMod,
};
pub use modrinth::{ModrinthClient, MODRINTH_API};

use crate::core::error::ModboxResult;

/// Read-only view of a mod registry.
///
/// Implementations are constructed by the caller and injected; nothing in the
/// core reaches for a global client.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Key used for the descriptor's `[update.<registry>]` table.
    fn name(&self) -> &str;

    /// Look up a project by id or slug.
    async fn get_project(&self, id_or_slug: &str) -> ModboxResult<ModProject>;

    /// Versions compatible with the loader/game version pair, in registry
    /// order. An empty list is a valid answer.
    async fn get_versions_for(
        &self,
        project_id: &str,
        loader_id: &str,
        game_version: &str,
    ) -> ModboxResult<Vec<ModVersion>>;

    async fn get_version(&self, version_id: &str) -> ModboxResult<ModVersion>;
}
