// ─── Manifest Store ───
// Contract for the version-controlled tree that holds the pack files.
//
//   memory.rs : in-process tree, used for tests and dry runs
//   github.rs : GitHub REST reads + GraphQL single-commit writes

mod github;
mod memory;

use std::fmt;

use async_trait::async_trait;

pub use github::{create_repository, GitHubStore, RepoLocator, GITHUB_API};
pub use memory::InMemoryStore;

use crate::core::error::ModboxResult;

/// Opaque revision marker returned by a read and checked at commit time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConcurrencyToken(String);

impl ConcurrencyToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConcurrencyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content: String,
    pub token: ConcurrencyToken,
}

/// "`path` is still what I read": `None` means it must still be absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Precondition {
    pub path: String,
    pub expected: Option<ConcurrencyToken>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileWrite {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRequest {
    pub message: String,
    pub preconditions: Vec<Precondition>,
    pub writes: Vec<FileWrite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitReceipt {
    /// Identifier of the new revision (commit oid for Git hosts).
    pub revision: String,
    pub url: Option<String>,
}

/// A remote file tree with conditional, all-or-nothing multi-file commits.
///
/// Stores are not required to delete files.
#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// `Ok(None)` if nothing exists at `path`.
    async fn read_file(&self, path: &str) -> ModboxResult<Option<StoredFile>>;

    /// Apply every write or none. A failed precondition is `Conflict`.
    async fn commit_batch(&self, request: CommitRequest) -> ModboxResult<CommitReceipt>;
}
