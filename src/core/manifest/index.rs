use serde::{Deserialize, Serialize};

use super::{slug_from_descriptor_path, DESCRIPTOR_EXT, MODS_DIR};
use crate::core::error::ModboxResult;
use crate::core::hashing::HashFormat;

/// `index.toml`: every file in the pack with its hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    #[serde(rename = "hash-format")]
    pub hash_format: String,
    #[serde(default)]
    pub files: Vec<IndexEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub file: String,
    pub hash: String,
    /// Per-entry override of the index-wide format.
    #[serde(rename = "hash-format", default, skip_serializing_if = "Option::is_none")]
    pub hash_format: Option<String>,
    #[serde(default)]
    pub metafile: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub preserve: bool,
}

impl IndexEntry {
    pub fn metafile(file: impl Into<String>, hash: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            hash: hash.into(),
            hash_format: None,
            metafile: true,
            preserve: false,
        }
    }
}

impl Index {
    pub fn empty(format: HashFormat) -> Self {
        Self {
            hash_format: format.to_string(),
            files: Vec::new(),
        }
    }

    pub fn parse(text: &str) -> ModboxResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Serialize with entries ordered by path, so the text (and its hash)
    /// depends only on the set of entries.
    pub fn to_toml_string(&self) -> ModboxResult<String> {
        let mut sorted = self.clone();
        sorted.files.sort_by(|a, b| a.file.cmp(&b.file));
        Ok(toml::to_string(&sorted)?)
    }

    pub fn hash_format(&self) -> ModboxResult<HashFormat> {
        self.hash_format.parse()
    }

    pub fn get(&self, path: &str) -> Option<&IndexEntry> {
        self.files.iter().find(|f| f.file == path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Insert `entry`, replacing any entry with the same path.
    pub fn upsert(&mut self, entry: IndexEntry) {
        self.files.retain(|f| f.file != entry.file);
        self.files.push(entry);
    }

    /// Drop the entry at `path`. Returns whether one was present.
    pub fn remove(&mut self, path: &str) -> bool {
        let before = self.files.len();
        self.files.retain(|f| f.file != path);
        self.files.len() != before
    }

    /// Slugs of every mod descriptor listed, in path order.
    pub fn mod_slugs(&self) -> Vec<String> {
        let mut slugs: Vec<String> = self
            .files
            .iter()
            .filter(|f| f.metafile)
            .filter_map(|f| slug_from_descriptor_path(&f.file))
            .map(str::to_string)
            .collect();
        slugs.sort();
        slugs
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::empty(HashFormat::default())
    }
}

/// Path of a mod's descriptor inside the pack tree.
pub fn descriptor_path(slug: &str) -> String {
    format!("{MODS_DIR}/{slug}.{DESCRIPTOR_EXT}")
}
