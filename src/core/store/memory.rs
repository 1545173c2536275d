use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{CommitReceipt, CommitRequest, ConcurrencyToken, ManifestStore, StoredFile};
use crate::core::error::{ModboxError, ModboxResult};

#[derive(Debug, Default)]
struct Tree {
    /// path → (content, revision that last wrote it)
    files: HashMap<String, (String, u64)>,
    revision: u64,
    messages: Vec<String>,
}

/// A store held entirely in memory.
///
/// Tokens are the revision number that last touched a file, so any write to
/// a file invalidates tokens handed out for it earlier.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tree: Mutex<Tree>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a file outside of any commit, bumping its token.
    pub async fn put(&self, path: &str, content: &str) {
        let mut tree = self.tree.lock().await;
        tree.revision += 1;
        let revision = tree.revision;
        tree.files
            .insert(path.to_string(), (content.to_string(), revision));
    }

    pub async fn content(&self, path: &str) -> Option<String> {
        let tree = self.tree.lock().await;
        tree.files.get(path).map(|(content, _)| content.clone())
    }

    /// Commit messages in the order they were applied.
    pub async fn commit_messages(&self) -> Vec<String> {
        self.tree.lock().await.messages.clone()
    }
}

fn token(revision: u64) -> ConcurrencyToken {
    ConcurrencyToken::new(format!("r{revision}"))
}

#[async_trait]
impl ManifestStore for InMemoryStore {
    async fn read_file(&self, path: &str) -> ModboxResult<Option<StoredFile>> {
        let tree = self.tree.lock().await;
        Ok(tree.files.get(path).map(|(content, revision)| StoredFile {
            content: content.clone(),
            token: token(*revision),
        }))
    }

    async fn commit_batch(&self, request: CommitRequest) -> ModboxResult<CommitReceipt> {
        let mut tree = self.tree.lock().await;

        for pre in &request.preconditions {
            let current = tree.files.get(&pre.path).map(|(_, rev)| token(*rev));
            if current != pre.expected {
                return Err(ModboxError::Conflict(pre.path.clone()));
            }
        }

        tree.revision += 1;
        let revision = tree.revision;
        for write in request.writes {
            tree.files.insert(write.path, (write.content, revision));
        }
        tree.messages.push(request.message);

        debug!("In-memory commit r{}", revision);
        Ok(CommitReceipt {
            revision: format!("r{revision}"),
            url: None,
        })
    }
}
