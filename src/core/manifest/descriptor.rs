use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{ModboxError, ModboxResult};
use crate::core::registry::{ModSide, ResolvedMod};

/// Per-mod `mods/<slug>.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModDescriptor {
    pub name: String,
    pub filename: String,
    pub side: ModSide,
    pub download: DescriptorDownload,
    /// Registry linkage for update checks, keyed by registry name.
    #[serde(default)]
    pub update: BTreeMap<String, UpdateLink>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorDownload {
    pub url: String,
    #[serde(rename = "hash-format")]
    pub hash_format: String,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateLink {
    #[serde(rename = "mod-id")]
    pub mod_id: String,
    pub version: String,
}

impl ModDescriptor {
    pub fn parse(text: &str) -> ModboxResult<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Turns a resolved mod into descriptor text.
///
/// Rendering is a pure function of the mod and the registry name: the index
/// stores a hash of this text, so it must not vary between calls.
#[derive(Debug, Clone)]
pub struct DescriptorRenderer {
    registry: String,
}

impl DescriptorRenderer {
    pub fn new(registry: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
        }
    }

    pub fn descriptor(&self, resolved: &ResolvedMod) -> ModboxResult<ModDescriptor> {
        let ResolvedMod { project, version } = resolved;

        let file = version
            .files
            .first()
            .ok_or_else(|| ModboxError::IncompleteVersion(version.id.clone()))?;
        let hash = file
            .hashes
            .first()
            .ok_or_else(|| ModboxError::IncompleteVersion(version.id.clone()))?;

        let mut update = BTreeMap::new();
        update.insert(
            self.registry.clone(),
            UpdateLink {
                mod_id: project.id.clone(),
                version: version.id.clone(),
            },
        );

        Ok(ModDescriptor {
            name: project.title.clone(),
            filename: file.filename.clone(),
            side: project.side,
            download: DescriptorDownload {
                url: file.url.clone(),
                hash_format: hash.algorithm.clone(),
                hash: hash.digest.clone(),
            },
            update,
        })
    }

    pub fn render(&self, resolved: &ResolvedMod) -> ModboxResult<String> {
        Ok(toml::to_string(&self.descriptor(resolved)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::fake::version;
    use crate::core::registry::ModProject;

    fn sodium() -> ResolvedMod {
        ResolvedMod {
            project: ModProject {
                id: "AANobbMI".into(),
                slug: "sodium".into(),
                title: "Sodium \"Fast\" Renderer".into(),
                side: ModSide::Client,
            },
            version: version("sodium", "v1", vec![]),
        }
    }

    #[test]
    fn render_is_deterministic() {
        let renderer = DescriptorRenderer::new("modrinth");
        assert_eq!(renderer.render(&sodium()).unwrap(), renderer.render(&sodium()).unwrap());
    }

    #[test]
    fn render_uses_first_file_and_first_hash() {
        let renderer = DescriptorRenderer::new("modrinth");
        let text = renderer.render(&sodium()).unwrap();
        let parsed = ModDescriptor::parse(&text).unwrap();

        assert_eq!(parsed.name, "Sodium \"Fast\" Renderer");
        assert_eq!(parsed.filename, "sodium-v1.jar");
        assert_eq!(parsed.side, ModSide::Client);
        assert_eq!(parsed.download.url, "https://cdn.example.com/sodium/v1.jar");
        assert_eq!(parsed.download.hash_format, "sha1");
        assert_eq!(parsed.download.hash, "sha1-of-v1");
        let link = parsed.update.get("modrinth").unwrap();
        assert_eq!(link.mod_id, "AANobbMI");
        assert_eq!(link.version, "v1");
    }

    #[test]
    fn rendered_text_has_packwiz_tables() {
        let text = DescriptorRenderer::new("modrinth").render(&sodium()).unwrap();
        assert!(text.contains("side = \"client\""));
        assert!(text.contains("[download]"));
        assert!(text.contains("[update.modrinth]"));
        assert!(text.contains("mod-id = \"AANobbMI\""));
    }

    #[test]
    fn version_without_files_is_rejected() {
        let mut m = sodium();
        m.version.files.clear();
        assert!(matches!(
            DescriptorRenderer::new("modrinth").render(&m),
            Err(ModboxError::IncompleteVersion(id)) if id == "v1"
        ));
    }

    #[test]
    fn file_without_hashes_is_rejected() {
        let mut m = sodium();
        m.version.files[0].hashes.clear();
        assert!(DescriptorRenderer::new("modrinth").render(&m).is_err());
    }
}
