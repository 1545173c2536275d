mod descriptor;
mod index;
mod manager;
mod pack;

pub use descriptor::{DescriptorDownload, DescriptorRenderer, ModDescriptor, UpdateLink};
pub use index::{descriptor_path, Index, IndexEntry};
pub use manager::{BatchOutcome, ManifestConsistencyManager, ManifestSnapshot, ModAddition};
pub use pack::{PackIndexRef, PackManifest, PackVersions, PACK_FORMAT};

use crate::core::error::{ModboxError, ModboxResult};

pub const PACK_FILE: &str = "pack.toml";
pub const INDEX_FILE: &str = "index.toml";
pub const MODS_DIR: &str = "mods";
pub const DESCRIPTOR_EXT: &str = "toml";

/// A slug becomes a single file name under `mods/`.
pub fn validate_slug(slug: &str) -> ModboxResult<()> {
    let bad = slug.is_empty()
        || slug == "."
        || slug.contains("..")
        || slug.contains('/')
        || slug.contains('\\')
        || slug.chars().any(char::is_control);
    if bad {
        return Err(ModboxError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Inverse of [`descriptor_path`]; `None` for anything outside `mods/`.
pub(crate) fn slug_from_descriptor_path(path: &str) -> Option<&str> {
    let name = path.strip_prefix(MODS_DIR)?.strip_prefix('/')?;
    let slug = name.strip_suffix(DESCRIPTOR_EXT)?.strip_suffix('.')?;
    if slug.is_empty() || slug.contains('/') {
        return None;
    }
    Some(slug)
}
