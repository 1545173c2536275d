use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{ModboxError, ModboxResult};
use crate::core::hashing::HashFormat;
use crate::core::registry::GameTarget;

pub const PACK_FORMAT: &str = "packwiz:1.1.0";

/// Top-level `pack.toml`.
///
/// Keys this crate does not model are kept in `extra` and written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackManifest {
    pub name: String,
    #[serde(default)]
    pub creator: String,
    #[serde(rename = "pack-format", default, skip_serializing_if = "Option::is_none")]
    pub pack_format: Option<String>,
    pub versions: PackVersions,
    pub index: PackIndexRef,
    #[serde(flatten)]
    pub extra: toml::Table,
}

/// `[versions]`: `minecraft` plus one key per loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackVersions {
    pub minecraft: String,
    #[serde(flatten)]
    pub loaders: BTreeMap<String, String>,
}

/// `[index]`: where the index lives and its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackIndexRef {
    pub file: String,
    #[serde(rename = "hash-format")]
    pub hash_format: String,
    pub hash: String,
}

impl PackManifest {
    /// A fresh manifest pointing at `index_file`, whose hash is left empty
    /// until the first index is written.
    pub fn new(
        name: impl Into<String>,
        creator: impl Into<String>,
        minecraft: impl Into<String>,
        loader: impl Into<String>,
        loader_version: impl Into<String>,
        index_file: impl Into<String>,
    ) -> Self {
        let mut loaders = BTreeMap::new();
        loaders.insert(loader.into(), loader_version.into());
        Self {
            name: name.into(),
            creator: creator.into(),
            pack_format: Some(PACK_FORMAT.to_string()),
            versions: PackVersions {
                minecraft: minecraft.into(),
                loaders,
            },
            index: PackIndexRef {
                file: index_file.into(),
                hash_format: HashFormat::default().to_string(),
                hash: String::new(),
            },
            extra: toml::Table::new(),
        }
    }

    pub fn parse(text: &str) -> ModboxResult<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml_string(&self) -> ModboxResult<String> {
        Ok(toml::to_string(self)?)
    }

    pub fn index_hash_format(&self) -> ModboxResult<HashFormat> {
        self.index.hash_format.parse()
    }

    /// Loader and game version the pack is built for.
    ///
    /// Packs name exactly one loader; if several are present the first in key
    /// order is used.
    pub fn game_target(&self) -> ModboxResult<GameTarget> {
        let (loader, _) = self
            .versions
            .loaders
            .iter()
            .next()
            .ok_or(ModboxError::MissingLoader)?;
        Ok(GameTarget::new(loader.clone(), self.versions.minecraft.clone()))
    }
}
