mod versions;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use versions::LoaderVersions;

use crate::core::error::{ModboxError, ModboxResult};

/// Mod loaders a pack can target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModLoader {
    Fabric,
    Quilt,
    NeoForge,
}

impl ModLoader {
    pub const ALL: [ModLoader; 3] = [ModLoader::Fabric, ModLoader::Quilt, ModLoader::NeoForge];

    /// Key used in `pack.toml` `[versions]` and in registry queries.
    pub fn id(&self) -> &'static str {
        match self {
            ModLoader::Fabric => "fabric",
            ModLoader::Quilt => "quilt",
            ModLoader::NeoForge => "neoforge",
        }
    }

    pub fn friendly_name(&self) -> &'static str {
        match self {
            ModLoader::Fabric => "Fabric loader",
            ModLoader::Quilt => "Quilt loader",
            ModLoader::NeoForge => "NeoForge",
        }
    }

    /// Loader versions usable with `game_version`, plus a recommendation.
    pub async fn fetch_versions(
        &self,
        client: &reqwest::Client,
        game_version: &str,
    ) -> ModboxResult<LoaderVersions> {
        versions::fetch(*self, client, game_version).await
    }
}

impl fmt::Display for ModLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ModLoader {
    type Err = ModboxError;

    fn from_str(s: &str) -> ModboxResult<Self> {
        Self::ALL
            .into_iter()
            .find(|l| l.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModboxError::UnknownLoader(s.to_string()))
    }
}

/// Display name for a `[versions]` key.
pub fn component_friendly_name(component: &str) -> String {
    if component == "minecraft" {
        return "Minecraft".to_string();
    }
    component
        .parse::<ModLoader>()
        .map(|l| l.friendly_name().to_string())
        .unwrap_or_else(|_| component.to_string())
}
