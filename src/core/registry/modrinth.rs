use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::model::{
    DependencyKind, DependencyRef, DependencyTarget, FileHash, ModFile, ModProject, ModSide,
    ModVersion,
};
use super::RegistryClient;
use crate::core::error::{ModboxError, ModboxResult};

pub const MODRINTH_API: &str = "https://api.modrinth.com/v2";

#[derive(Debug, Deserialize)]
struct ProjectWire {
    id: String,
    slug: String,
    title: String,
    #[serde(default)]
    client_side: Option<String>,
    #[serde(default)]
    server_side: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionWire {
    id: String,
    project_id: String,
    #[serde(default)]
    version_number: String,
    #[serde(default)]
    files: Vec<FileWire>,
    #[serde(default)]
    dependencies: Vec<DependencyWire>,
}

#[derive(Debug, Deserialize)]
struct FileWire {
    url: String,
    filename: String,
    /// Kept as a map so declaration order survives (`preserve_order`).
    #[serde(default)]
    hashes: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    primary: bool,
    #[serde(default)]
    file_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DependencyWire {
    #[serde(default)]
    version_id: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
    dependency_type: String,
}

impl From<ProjectWire> for ModProject {
    fn from(wire: ProjectWire) -> Self {
        let side = side_from_support(wire.client_side.as_deref(), wire.server_side.as_deref());
        ModProject {
            id: wire.id,
            slug: wire.slug,
            title: wire.title,
            side,
        }
    }
}

impl From<VersionWire> for ModVersion {
    fn from(wire: VersionWire) -> Self {
        ModVersion {
            id: wire.id,
            project_id: wire.project_id,
            version_number: wire.version_number,
            files: wire.files.into_iter().map(ModFile::from).collect(),
            dependencies: wire
                .dependencies
                .into_iter()
                .filter_map(DependencyWire::into_ref)
                .collect(),
        }
    }
}

impl From<FileWire> for ModFile {
    fn from(wire: FileWire) -> Self {
        let hashes = wire
            .hashes
            .into_iter()
            .filter_map(|(algorithm, digest)| {
                digest.as_str().map(|d| FileHash {
                    algorithm,
                    digest: d.to_string(),
                })
            })
            .collect();
        ModFile {
            url: wire.url,
            filename: wire.filename,
            hashes,
            primary: wire.primary,
            kind: wire.file_type,
        }
    }
}

impl DependencyWire {
    /// Unknown dependency types are dropped rather than failing the version.
    fn into_ref(self) -> Option<DependencyRef> {
        let kind = match self.dependency_type.as_str() {
            "required" => DependencyKind::Required,
            "optional" => DependencyKind::Optional,
            "incompatible" => DependencyKind::Incompatible,
            "embedded" => DependencyKind::Embedded,
            other => {
                debug!("Ignoring dependency of unknown type {}", other);
                return None;
            }
        };
        // A project reference wins over a pinned version: the pack wants the
        // build matching its own loader and game version.
        let target = match (self.project_id, self.version_id) {
            (Some(project), _) => DependencyTarget::Project(project),
            (None, Some(version)) => DependencyTarget::Version(version),
            (None, None) => DependencyTarget::None,
        };
        Some(DependencyRef { kind, target })
    }
}

fn side_from_support(client: Option<&str>, server: Option<&str>) -> ModSide {
    match (client, server) {
        (Some("unsupported"), Some("unsupported")) => ModSide::Both,
        (Some("unsupported"), _) => ModSide::Server,
        (_, Some("unsupported")) => ModSide::Client,
        _ => ModSide::Both,
    }
}

/// Modrinth v2 REST client.
pub struct ModrinthClient {
    client: Client,
    base_url: String,
}

impl ModrinthClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, MODRINTH_API)
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// GET a JSON document. `Ok(None)` on 404.
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> ModboxResult<Option<T>> {
        debug!("GET {}", url);
        let resp = self.client.get(url).query(query).send().await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ModboxError::RegistryStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(Some(resp.json::<T>().await?))
    }
}

#[async_trait]
impl RegistryClient for ModrinthClient {
    fn name(&self) -> &str {
        "modrinth"
    }

    async fn get_project(&self, id_or_slug: &str) -> ModboxResult<ModProject> {
        let url = format!("{}/project/{}", self.base_url, id_or_slug);
        self.get_json::<ProjectWire>(&url, &[])
            .await?
            .map(ModProject::from)
            .ok_or_else(|| ModboxError::ProjectNotFound(id_or_slug.to_string()))
    }

    async fn get_versions_for(
        &self,
        project_id: &str,
        loader_id: &str,
        game_version: &str,
    ) -> ModboxResult<Vec<ModVersion>> {
        let url = format!("{}/project/{}/version", self.base_url, project_id);
        // Facet parameters are JSON arrays in the query string.
        let query = [
            ("loaders", serde_json::to_string(&[loader_id])?),
            ("game_versions", serde_json::to_string(&[game_version])?),
        ];
        let versions = self
            .get_json::<Vec<VersionWire>>(&url, &query)
            .await?
            .ok_or_else(|| ModboxError::ProjectNotFound(project_id.to_string()))?;
        Ok(versions.into_iter().map(ModVersion::from).collect())
    }

    async fn get_version(&self, version_id: &str) -> ModboxResult<ModVersion> {
        let url = format!("{}/version/{}", self.base_url, version_id);
        self.get_json::<VersionWire>(&url, &[])
            .await?
            .map(ModVersion::from)
            .ok_or_else(|| ModboxError::VersionNotFound(version_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_version_keeps_hash_order_and_dependency_kinds() {
        let json = r#"{
            "id": "yaoBL9D9",
            "project_id": "AANobbMI",
            "version_number": "mc1.20.1-0.5.3",
            "files": [{
                "url": "https://cdn.modrinth.com/data/AANobbMI/versions/yaoBL9D9/sodium.jar",
                "filename": "sodium-fabric-mc1.20.1-0.5.3.jar",
                "primary": true,
                "hashes": { "sha512": "bbb", "sha1": "aaa" },
                "file_type": null
            }],
            "dependencies": [
                { "project_id": "P7dR8mSH", "version_id": "pinned", "dependency_type": "required" },
                { "project_id": null, "version_id": "v-only", "dependency_type": "required" },
                { "project_id": "opt", "dependency_type": "optional" },
                { "dependency_type": "embedded" },
                { "project_id": "weird", "dependency_type": "peer" }
            ]
        }"#;

        let version: ModVersion = serde_json::from_str::<VersionWire>(json).unwrap().into();

        assert_eq!(version.project_id, "AANobbMI");
        let hashes = &version.files[0].hashes;
        assert_eq!(hashes[0].algorithm, "sha512");
        assert_eq!(hashes[1].algorithm, "sha1");
        assert_eq!(version.dependencies.len(), 4);
        assert_eq!(
            version.dependencies[0],
            DependencyRef::required_project("P7dR8mSH")
        );
        assert_eq!(
            version.dependencies[1],
            DependencyRef::required_version("v-only")
        );
        assert_eq!(version.dependencies[2].kind, DependencyKind::Optional);
        assert_eq!(version.dependencies[3].target, DependencyTarget::None);
    }

    #[test]
    fn side_is_derived_from_support_flags() {
        assert_eq!(side_from_support(Some("required"), Some("optional")), ModSide::Both);
        assert_eq!(side_from_support(Some("required"), Some("unsupported")), ModSide::Client);
        assert_eq!(side_from_support(Some("unsupported"), Some("required")), ModSide::Server);
        assert_eq!(side_from_support(None, None), ModSide::Both);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ModrinthClient::with_base_url(Client::new(), "http://localhost:9000/v2/");
        assert_eq!(client.base_url, "http://localhost:9000/v2");
    }
}
