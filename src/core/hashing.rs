// ─── Content Hashing ───
// Digests used by the index/pack hash chain and by descriptor verification.

use std::fmt;
use std::str::FromStr;

use md5::Md5;
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

use crate::core::error::{ModboxError, ModboxResult};

/// Hash formats understood by packwiz manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashFormat {
    Sha1,
    #[default]
    Sha256,
    Sha512,
    Md5,
}

impl HashFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashFormat::Sha1 => "sha1",
            HashFormat::Sha256 => "sha256",
            HashFormat::Sha512 => "sha512",
            HashFormat::Md5 => "md5",
        }
    }

    /// Lowercase hex digest of `bytes`.
    pub fn digest(&self, bytes: &[u8]) -> String {
        match self {
            HashFormat::Sha1 => hex::encode(Sha1::digest(bytes)),
            HashFormat::Sha256 => hex::encode(Sha256::digest(bytes)),
            HashFormat::Sha512 => hex::encode(Sha512::digest(bytes)),
            HashFormat::Md5 => hex::encode(Md5::digest(bytes)),
        }
    }

    pub fn hash_str(&self, text: &str) -> String {
        self.digest(text.as_bytes())
    }
}

impl FromStr for HashFormat {
    type Err = ModboxError;

    fn from_str(s: &str) -> ModboxResult<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha1" => Ok(HashFormat::Sha1),
            "sha256" => Ok(HashFormat::Sha256),
            "sha512" => Ok(HashFormat::Sha512),
            "md5" => Ok(HashFormat::Md5),
            _ => Err(ModboxError::UnsupportedHashFormat(s.to_string())),
        }
    }
}

impl fmt::Display for HashFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// SHA-256 of a UTF-8 string, the default format for new manifests.
pub fn hash_string(text: &str) -> String {
    HashFormat::default().hash_str(text)
}
