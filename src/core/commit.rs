use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::core::error::{ModboxError, ModboxResult};
use crate::core::store::{
    CommitReceipt, CommitRequest, ConcurrencyToken, FileWrite, ManifestStore, Precondition,
};

/// A set of file writes that must land together.
#[derive(Debug, Clone)]
pub struct CommitBatch {
    message: String,
    preconditions: Vec<Precondition>,
    writes: Vec<FileWrite>,
}

impl CommitBatch {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            preconditions: Vec::new(),
            writes: Vec::new(),
        }
    }

    /// Require `path` to still carry `token` (or still be absent) at commit.
    pub fn require(mut self, path: impl Into<String>, token: Option<ConcurrencyToken>) -> Self {
        self.preconditions.push(Precondition {
            path: path.into(),
            expected: token,
        });
        self
    }

    pub fn write(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.writes.push(FileWrite {
            path: path.into(),
            content: content.into(),
        });
        self
    }

    fn into_request(self) -> ModboxResult<CommitRequest> {
        if self.writes.is_empty() {
            return Err(ModboxError::InvalidBatch("no files to write".into()));
        }
        let mut seen = HashSet::new();
        for write in &self.writes {
            if !seen.insert(write.path.as_str()) {
                return Err(ModboxError::InvalidBatch(format!(
                    "{} written twice",
                    write.path
                )));
            }
        }
        Ok(CommitRequest {
            message: self.message,
            preconditions: self.preconditions,
            writes: self.writes,
        })
    }
}

/// Submits batches to the store as single commits. No retries: a conflict
/// means the caller's snapshot is stale and the whole batch must be rebuilt.
pub struct CommitBatcher {
    store: Arc<dyn ManifestStore>,
}

impl CommitBatcher {
    pub fn new(store: Arc<dyn ManifestStore>) -> Self {
        Self { store }
    }

    pub async fn submit(&self, batch: CommitBatch) -> ModboxResult<CommitReceipt> {
        let request = batch.into_request()?;
        let message = request.message.clone();
        let files = request.writes.len();

        match self.store.commit_batch(request).await {
            Ok(receipt) => {
                info!("Committed \"{}\" ({} files) as {}", message, files, receipt.revision);
                Ok(receipt)
            }
            Err(e) => {
                warn!("Commit \"{}\" failed: {}", message, e);
                Err(e)
            }
        }
    }
}
