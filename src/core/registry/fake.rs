//! In-process registry for resolver and service tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use super::model::{DependencyRef, FileHash, ModFile, ModProject, ModSide, ModVersion};
use super::RegistryClient;
use crate::core::error::{ModboxError, ModboxResult};

#[derive(Default)]
pub(crate) struct FakeRegistry {
    projects: Vec<ModProject>,
    versions_by_project: HashMap<String, Vec<ModVersion>>,
    failing: HashSet<String>,
}

impl FakeRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a project whose id is `<slug>-id` with the given versions.
    pub(crate) fn with_project(
        mut self,
        slug: &str,
        title: &str,
        versions: Vec<ModVersion>,
    ) -> Self {
        let id = project_id(slug);
        self.projects.push(ModProject {
            id: id.clone(),
            slug: slug.to_string(),
            title: title.to_string(),
            side: ModSide::Both,
        });
        self.versions_by_project.insert(id, versions);
        self
    }

    /// Every lookup of this project id or slug fails with HTTP 503.
    pub(crate) fn failing(mut self, slug: &str) -> Self {
        self.failing.insert(slug.to_string());
        self.failing.insert(project_id(slug));
        self
    }

    fn check(&self, key: &str) -> ModboxResult<()> {
        if self.failing.contains(key) {
            return Err(ModboxError::RegistryStatus {
                url: format!("https://registry.example/project/{key}"),
                status: 503,
            });
        }
        Ok(())
    }
}

pub(crate) fn project_id(slug: &str) -> String {
    format!("{slug}-id")
}

/// A version of `<slug>` with one jar file and the given dependencies.
pub(crate) fn version(
    slug: &str,
    version_id: &str,
    dependencies: Vec<DependencyRef>,
) -> ModVersion {
    ModVersion {
        id: version_id.to_string(),
        project_id: project_id(slug),
        version_number: format!("{version_id}-number"),
        files: vec![ModFile {
            url: format!("https://cdn.example.com/{slug}/{version_id}.jar"),
            filename: format!("{slug}-{version_id}.jar"),
            hashes: vec![
                FileHash {
                    algorithm: "sha1".into(),
                    digest: format!("sha1-of-{version_id}"),
                },
                FileHash {
                    algorithm: "sha512".into(),
                    digest: format!("sha512-of-{version_id}"),
                },
            ],
            primary: true,
            kind: None,
        }],
        dependencies,
    }
}

/// Required dependency on `<slug>` by project id.
pub(crate) fn requires(slug: &str) -> DependencyRef {
    DependencyRef::required_project(project_id(slug))
}

#[async_trait]
impl RegistryClient for FakeRegistry {
    fn name(&self) -> &str {
        "modrinth"
    }

    async fn get_project(&self, id_or_slug: &str) -> ModboxResult<ModProject> {
        self.check(id_or_slug)?;
        self.projects
            .iter()
            .find(|p| p.id == id_or_slug || p.slug == id_or_slug)
            .cloned()
            .ok_or_else(|| ModboxError::ProjectNotFound(id_or_slug.to_string()))
    }

    async fn get_versions_for(
        &self,
        project_id: &str,
        _loader_id: &str,
        _game_version: &str,
    ) -> ModboxResult<Vec<ModVersion>> {
        self.check(project_id)?;
        Ok(self
            .versions_by_project
            .get(project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_version(&self, version_id: &str) -> ModboxResult<ModVersion> {
        self.check(version_id)?;
        self.versions_by_project
            .values()
            .flatten()
            .find(|v| v.id == version_id)
            .cloned()
            .ok_or_else(|| ModboxError::VersionNotFound(version_id.to_string()))
    }
}
