use reqwest::Client;
use serde::Serialize;

use super::ModLoader;
use crate::core::error::{ModboxError, ModboxResult};
use crate::core::maven::{metadata_url, MavenMetadata, FABRIC_MAVEN, NEOFORGE_MAVEN, QUILT_MAVEN};

/// Available loader versions for one Minecraft version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderVersions {
    pub versions: Vec<String>,
    pub recommended: String,
}

/// Minecraft version whose NeoForge builds live under the old `forge` artifact.
const NEOFORGE_LEGACY_MC: &str = "1.20.1";

pub(super) async fn fetch(
    loader: ModLoader,
    client: &Client,
    game_version: &str,
) -> ModboxResult<LoaderVersions> {
    match loader {
        ModLoader::Fabric => {
            let url = metadata_url(FABRIC_MAVEN, "net.fabricmc", "fabric-loader");
            Ok(unfiltered(&MavenMetadata::fetch(client, &url).await?))
        }
        ModLoader::Quilt => {
            let url = metadata_url(QUILT_MAVEN, "org.quiltmc", "quilt-loader");
            Ok(unfiltered(&MavenMetadata::fetch(client, &url).await?))
        }
        ModLoader::NeoForge if game_version == NEOFORGE_LEGACY_MC => {
            let url = metadata_url(NEOFORGE_MAVEN, "net.neoforged", "forge");
            let meta = MavenMetadata::fetch(client, &url).await?;
            let found = filtered(&meta, loader, game_version, has_game_version_prefix)?;
            Ok(strip_game_version(found, game_version))
        }
        ModLoader::NeoForge => {
            let url = metadata_url(NEOFORGE_MAVEN, "net.neoforged", "neoforge");
            let meta = MavenMetadata::fetch(client, &url).await?;
            filtered(&meta, loader, game_version, matches_neoforge_numbering)
        }
    }
}

/// Every published version, recommending the `release` tag.
pub(super) fn unfiltered(meta: &MavenMetadata) -> LoaderVersions {
    LoaderVersions {
        versions: meta.versions().to_vec(),
        recommended: meta.release().to_string(),
    }
}

/// Versions accepted by `filter`, recommending `release`, then `latest`,
/// then the last accepted version.
pub(super) fn filtered(
    meta: &MavenMetadata,
    loader: ModLoader,
    game_version: &str,
    filter: fn(&str, &str) -> bool,
) -> ModboxResult<LoaderVersions> {
    let versions: Vec<String> = meta
        .versions()
        .iter()
        .filter(|v| filter(v, game_version))
        .cloned()
        .collect();

    let Some(last) = versions.last().cloned() else {
        return Err(ModboxError::NoLoaderVersions {
            loader: loader.friendly_name().to_string(),
            game_version: game_version.to_string(),
        });
    };

    let recommended = [meta.release(), meta.latest()]
        .into_iter()
        .find(|v| filter(v, game_version))
        .map(str::to_string)
        .unwrap_or(last);

    Ok(LoaderVersions {
        versions,
        recommended,
    })
}

/// `1.20.1-47.1.3` belongs to Minecraft `1.20.1`.
pub(super) fn has_game_version_prefix(version: &str, game_version: &str) -> bool {
    let mut parts = version.split('-');
    parts.next() == Some(game_version) && parts.next().is_some()
}

/// NeoForge numbers builds `<minor>.<patch>.<build>`: `21.1.77` is for
/// Minecraft `1.21.1`, `21.0.x` for `1.21`.
pub(super) fn matches_neoforge_numbering(version: &str, game_version: &str) -> bool {
    let mut split = game_version.split('.');
    let (Some(_), Some(minor)) = (split.next(), split.next()) else {
        return false;
    };
    let patch = split.next().unwrap_or("0");
    version.starts_with(&format!("{minor}.{patch}."))
}

fn strip_game_version(found: LoaderVersions, game_version: &str) -> LoaderVersions {
    LoaderVersions {
        versions: found
            .versions
            .iter()
            .map(|v| remove_game_version(v, game_version))
            .collect(),
        recommended: remove_game_version(&found.recommended, game_version),
    }
}

/// `1.20.1-47.1.3` → `47.1.3`.
pub(super) fn remove_game_version(version: &str, game_version: &str) -> String {
    version
        .split('-')
        .filter(|component| *component != game_version)
        .collect::<Vec<_>>()
        .join("-")
}
