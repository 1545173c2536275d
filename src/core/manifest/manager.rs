use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use super::index::{descriptor_path, Index, IndexEntry};
use super::pack::PackManifest;
use super::{validate_slug, INDEX_FILE, PACK_FILE};
use crate::core::commit::{CommitBatch, CommitBatcher};
use crate::core::error::{ModboxError, ModboxResult};
use crate::core::hashing::HashFormat;
use crate::core::store::{CommitReceipt, ConcurrencyToken, ManifestStore};

/// A descriptor to add (or overwrite) under `mods/<slug>.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModAddition {
    pub slug: String,
    pub descriptor: String,
}

/// Pack manifest and index as read together, with their tokens.
#[derive(Debug, Clone)]
pub struct ManifestSnapshot {
    pub pack: PackManifest,
    pub pack_token: ConcurrencyToken,
    pub index: Index,
    /// `None` when the index did not exist and was synthesized.
    pub index_token: Option<ConcurrencyToken>,
}

impl ManifestSnapshot {
    pub fn installed_slugs(&self) -> HashSet<String> {
        self.index.mod_slugs().into_iter().collect()
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub receipt: CommitReceipt,
    pub index_hash: String,
    pub added: Vec<String>,
    /// Slugs that were actually present and got dropped.
    pub removed: Vec<String>,
}

/// Keeps `pack.toml` → `index.toml` → `mods/*.toml` consistent.
///
/// Nothing is cached: every operation reads the pair fresh and writes both
/// back in a single conditional commit.
pub struct ManifestConsistencyManager {
    store: Arc<dyn ManifestStore>,
    batcher: CommitBatcher,
    pack_path: String,
}

impl ManifestConsistencyManager {
    pub fn new(store: Arc<dyn ManifestStore>) -> Self {
        Self {
            batcher: CommitBatcher::new(store.clone()),
            store,
            pack_path: PACK_FILE.to_string(),
        }
    }

    pub async fn snapshot(&self) -> ModboxResult<ManifestSnapshot> {
        let pack_file = self
            .store
            .read_file(&self.pack_path)
            .await?
            .ok_or_else(|| ModboxError::MissingPackManifest(self.pack_path.clone()))?;
        let pack = PackManifest::parse(&pack_file.content)?;

        let (index, index_token) = match self.store.read_file(&pack.index.file).await? {
            Some(file) => (Index::parse(&file.content)?, Some(file.token)),
            None => {
                debug!("{} missing, starting from an empty index", pack.index.file);
                (Index::empty(HashFormat::Sha256), None)
            }
        };

        Ok(ManifestSnapshot {
            pack,
            pack_token: pack_file.token,
            index,
            index_token,
        })
    }

    pub async fn installed_slugs(&self) -> ModboxResult<HashSet<String>> {
        Ok(self.snapshot().await?.installed_slugs())
    }

    pub async fn mod_exists(&self, slug: &str) -> ModboxResult<bool> {
        let snapshot = self.snapshot().await?;
        Ok(snapshot.index.contains(&descriptor_path(slug)))
    }

    /// Add/overwrite descriptors and drop index entries in one commit.
    ///
    /// Adds are applied before removes; a slug added twice keeps its last
    /// descriptor. Removed descriptor files are left in the tree.
    pub async fn apply_batch(
        &self,
        adds: &[ModAddition],
        removes: &[String],
        message: &str,
    ) -> ModboxResult<BatchOutcome> {
        validate_batch(adds, removes)?;
        let snapshot = self.snapshot().await?;
        self.commit_on(snapshot, adds, removes, message).await
    }

    /// Like [`apply_batch`](Self::apply_batch), but against a snapshot the
    /// caller already read. The commit fails with `Conflict` if either file
    /// moved since that read.
    pub async fn apply_batch_on(
        &self,
        snapshot: ManifestSnapshot,
        adds: &[ModAddition],
        removes: &[String],
        message: &str,
    ) -> ModboxResult<BatchOutcome> {
        validate_batch(adds, removes)?;
        self.commit_on(snapshot, adds, removes, message).await
    }

    async fn commit_on(
        &self,
        snapshot: ManifestSnapshot,
        adds: &[ModAddition],
        removes: &[String],
        message: &str,
    ) -> ModboxResult<BatchOutcome> {
        let ManifestSnapshot {
            mut pack,
            pack_token,
            mut index,
            index_token,
        } = snapshot;

        let entry_format = index.hash_format()?;
        let index_format = pack.index_hash_format()?;

        let mut latest: HashMap<&str, &ModAddition> = HashMap::new();
        let mut order: Vec<&str> = Vec::new();
        for add in adds {
            if latest.insert(add.slug.as_str(), add).is_none() {
                order.push(add.slug.as_str());
            }
        }
        let additions: Vec<&ModAddition> = order.iter().map(|slug| latest[slug]).collect();

        for add in &additions {
            let path = descriptor_path(&add.slug);
            index.upsert(IndexEntry::metafile(path, entry_format.hash_str(&add.descriptor)));
        }

        let mut removed = Vec::new();
        for slug in removes {
            if index.remove(&descriptor_path(slug)) {
                removed.push(slug.clone());
            } else {
                debug!("{} not in index, nothing to remove", slug);
            }
        }

        let index_text = index.to_toml_string()?;
        let index_hash = index_format.hash_str(&index_text);
        pack.index.hash = index_hash.clone();
        let pack_text = pack.to_toml_string()?;

        let index_path = pack.index.file.clone();
        let mut batch = CommitBatch::new(message)
            .require(self.pack_path.clone(), Some(pack_token))
            .require(index_path.clone(), index_token)
            .write(index_path, index_text)
            .write(self.pack_path.clone(), pack_text);
        for add in &additions {
            batch = batch.write(descriptor_path(&add.slug), add.descriptor.clone());
        }

        let receipt = self.batcher.submit(batch).await?;

        info!(
            "Manifest updated: +{} -{} (index {})",
            additions.len(),
            removed.len(),
            index_hash
        );
        Ok(BatchOutcome {
            receipt,
            index_hash,
            added: additions.iter().map(|a| a.slug.clone()).collect(),
            removed,
        })
    }

    /// Write a brand-new pack with an empty index. Fails with `Conflict` if
    /// either file already exists.
    pub async fn initialize(&self, mut pack: PackManifest) -> ModboxResult<CommitReceipt> {
        if pack.index.file.is_empty() {
            pack.index.file = INDEX_FILE.to_string();
        }
        let index = Index::empty(HashFormat::Sha256);
        let index_text = index.to_toml_string()?;
        pack.index.hash = pack.index_hash_format()?.hash_str(&index_text);

        let batch = CommitBatch::new("Initialize modpack with pack.toml and index.toml")
            .require(self.pack_path.clone(), None)
            .require(pack.index.file.clone(), None)
            .write(self.pack_path.clone(), pack.to_toml_string()?)
            .write(pack.index.file.clone(), index_text);

        self.batcher.submit(batch).await
    }
}

fn validate_batch(adds: &[ModAddition], removes: &[String]) -> ModboxResult<()> {
    for slug in adds.iter().map(|a| &a.slug).chain(removes) {
        validate_slug(slug)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use crate::core::hashing::hash_string;
    use crate::core::store::{CommitRequest, InMemoryStore, StoredFile};

    async fn seeded_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        let pack = PackManifest::new("Cozy", "steve", "1.20.1", "fabric", "0.15.11", INDEX_FILE);
        store.put(PACK_FILE, &pack.to_toml_string().unwrap()).await;
        store
    }

    fn add(slug: &str, descriptor: &str) -> ModAddition {
        ModAddition {
            slug: slug.into(),
            descriptor: descriptor.into(),
        }
    }

    async fn read_index(store: &InMemoryStore) -> Index {
        Index::parse(&store.content(INDEX_FILE).await.unwrap()).unwrap()
    }

    async fn read_pack(store: &InMemoryStore) -> PackManifest {
        PackManifest::parse(&store.content(PACK_FILE).await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn add_chains_descriptor_index_and_pack_hashes() {
        let store = seeded_store().await;
        let manager = ManifestConsistencyManager::new(store.clone());

        let outcome = manager
            .apply_batch(
                &[
                    add("sodium", "name = \"Sodium\"\n"),
                    add("fabric-api", "name = \"Fabric API\"\n"),
                ],
                &[],
                "Add Sodium and 1 dependencies",
            )
            .await
            .unwrap();

        let index = read_index(&store).await;
        let pack = read_pack(&store).await;
        assert_eq!(index.files.len(), 2);
        assert!(index.files.iter().all(|f| f.metafile));
        assert_eq!(
            index.get("mods/sodium.toml").unwrap().hash,
            hash_string("name = \"Sodium\"\n")
        );
        let index_text = store.content(INDEX_FILE).await.unwrap();
        assert_eq!(pack.index.hash, hash_string(&index_text));
        assert_eq!(outcome.index_hash, pack.index.hash);
        assert_eq!(
            store.content("mods/fabric-api.toml").await.unwrap(),
            "name = \"Fabric API\"\n"
        );
        assert_eq!(outcome.added, vec!["sodium", "fabric-api"]);
    }

    #[tokio::test]
    async fn applying_same_adds_twice_is_idempotent() {
        let store = seeded_store().await;
        let manager = ManifestConsistencyManager::new(store.clone());
        let adds = [add("b", "b"), add("a", "a")];

        let first = manager.apply_batch(&adds, &[], "Add").await.unwrap();
        let index_after_first = read_index(&store).await;
        let second = manager.apply_batch(&adds, &[], "Add again").await.unwrap();
        let index_after_second = read_index(&store).await;

        assert_eq!(index_after_first, index_after_second);
        assert_eq!(first.index_hash, second.index_hash);
        assert_eq!(read_pack(&store).await.index.hash, first.index_hash);
    }

    #[tokio::test]
    async fn readding_an_existing_mod_keeps_other_entries_stable() {
        let store = seeded_store().await;
        let manager = ManifestConsistencyManager::new(store.clone());
        manager
            .apply_batch(&[add("a", "a"), add("b", "b"), add("c", "c")], &[], "Add")
            .await
            .unwrap();
        let before = read_pack(&store).await.index.hash;

        manager.apply_batch(&[add("a", "a")], &[], "Re-add a").await.unwrap();

        assert_eq!(read_pack(&store).await.index.hash, before);
    }

    #[tokio::test]
    async fn duplicate_slug_in_one_batch_keeps_last_descriptor() {
        let store = seeded_store().await;
        let manager = ManifestConsistencyManager::new(store.clone());

        manager
            .apply_batch(&[add("a", "first"), add("a", "second")], &[], "Add")
            .await
            .unwrap();

        let index = read_index(&store).await;
        assert_eq!(index.files.len(), 1);
        assert_eq!(index.files[0].hash, hash_string("second"));
        assert_eq!(store.content("mods/a.toml").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn removing_absent_mod_still_commits() {
        let store = seeded_store().await;
        let manager = ManifestConsistencyManager::new(store.clone());

        let outcome = manager
            .apply_batch(&[], &["ghost".to_string()], "Remove ghost")
            .await
            .unwrap();

        assert!(outcome.removed.is_empty());
        assert_eq!(store.commit_messages().await, vec!["Remove ghost"]);
        let index_text = store.content(INDEX_FILE).await.unwrap();
        assert_eq!(read_pack(&store).await.index.hash, hash_string(&index_text));
    }

    #[tokio::test]
    async fn remove_drops_entry_but_leaves_descriptor_file() {
        let store = seeded_store().await;
        let manager = ManifestConsistencyManager::new(store.clone());
        manager
            .apply_batch(&[add("a", "a"), add("b", "b")], &[], "Add")
            .await
            .unwrap();

        let outcome = manager
            .apply_batch(&[], &["a".to_string()], "Remove a")
            .await
            .unwrap();

        assert_eq!(outcome.removed, vec!["a"]);
        let index = read_index(&store).await;
        assert!(!index.contains("mods/a.toml"));
        assert!(index.contains("mods/b.toml"));
        assert!(store.content("mods/a.toml").await.is_some());
        assert!(!manager.mod_exists("a").await.unwrap());
        assert!(manager.mod_exists("b").await.unwrap());
    }

    #[tokio::test]
    async fn missing_pack_manifest_is_fatal() {
        let store = Arc::new(InMemoryStore::new());
        let manager = ManifestConsistencyManager::new(store.clone());

        let err = manager.apply_batch(&[add("a", "a")], &[], "Add").await.unwrap_err();

        assert!(matches!(err, ModboxError::MissingPackManifest(p) if p == PACK_FILE));
        assert!(store.content(INDEX_FILE).await.is_none());
    }

    #[tokio::test]
    async fn invalid_slug_is_rejected_before_reading() {
        let store = seeded_store().await;
        let manager = ManifestConsistencyManager::new(store.clone());

        let err = manager
            .apply_batch(&[add("../pack", "x")], &[], "Add")
            .await
            .unwrap_err();

        assert!(matches!(err, ModboxError::InvalidSlug(_)));
        assert!(store.commit_messages().await.is_empty());
    }

    #[tokio::test]
    async fn unsupported_index_format_is_rejected() {
        let store = seeded_store().await;
        store.put(INDEX_FILE, "hash-format = \"murmur2\"\n").await;
        let manager = ManifestConsistencyManager::new(store.clone());

        let err = manager.apply_batch(&[add("a", "a")], &[], "Add").await.unwrap_err();

        assert!(matches!(err, ModboxError::UnsupportedHashFormat(_)));
    }

    #[tokio::test]
    async fn installed_slugs_reads_index() {
        let store = seeded_store().await;
        let manager = ManifestConsistencyManager::new(store.clone());
        assert!(manager.installed_slugs().await.unwrap().is_empty());

        manager
            .apply_batch(&[add("sodium", "s"), add("lithium", "l")], &[], "Add")
            .await
            .unwrap();

        let installed = manager.installed_slugs().await.unwrap();
        assert!(installed.contains("sodium"));
        assert!(installed.contains("lithium"));
    }

    #[tokio::test]
    async fn commit_on_stale_snapshot_is_a_conflict() {
        let store = seeded_store().await;
        let manager = ManifestConsistencyManager::new(store.clone());
        let snapshot = manager.snapshot().await.unwrap();
        manager.apply_batch(&[add("a", "a")], &[], "Add a").await.unwrap();

        let err = manager
            .apply_batch_on(snapshot, &[add("b", "b")], &[], "Add b")
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(store.commit_messages().await, vec!["Add a"]);
        assert!(store.content("mods/b.toml").await.is_none());
    }

    #[tokio::test]
    async fn commit_on_fresh_snapshot_applies() {
        let store = seeded_store().await;
        let manager = ManifestConsistencyManager::new(store.clone());
        let snapshot = manager.snapshot().await.unwrap();

        let outcome = manager
            .apply_batch_on(snapshot, &[add("b", "b")], &[], "Add b")
            .await
            .unwrap();

        assert_eq!(outcome.added, vec!["b"]);
        assert!(manager.mod_exists("b").await.unwrap());
    }

    /// Lets another writer touch the index right before our commit lands.
    struct RacingStore {
        inner: InMemoryStore,
    }

    #[async_trait]
    impl ManifestStore for RacingStore {
        async fn read_file(&self, path: &str) -> ModboxResult<Option<StoredFile>> {
            self.inner.read_file(path).await
        }

        async fn commit_batch(&self, request: CommitRequest) -> ModboxResult<CommitReceipt> {
            self.inner
                .put(INDEX_FILE, "hash-format = \"sha256\"\n")
                .await;
            self.inner.commit_batch(request).await
        }
    }

    #[tokio::test]
    async fn concurrent_writer_surfaces_as_conflict_without_partial_state() {
        let inner = InMemoryStore::new();
        let pack = PackManifest::new("Cozy", "steve", "1.20.1", "fabric", "0.15.11", INDEX_FILE);
        let pack_text = pack.to_toml_string().unwrap();
        inner.put(PACK_FILE, &pack_text).await;
        let store = Arc::new(RacingStore { inner });
        let manager = ManifestConsistencyManager::new(store.clone());

        let err = manager.apply_batch(&[add("a", "a")], &[], "Add").await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(store.inner.content(PACK_FILE).await.unwrap(), pack_text);
        assert!(store.inner.content("mods/a.toml").await.is_none());
    }

    #[tokio::test]
    async fn initialize_writes_consistent_pair_once() {
        let store = Arc::new(InMemoryStore::new());
        let manager = ManifestConsistencyManager::new(store.clone());
        let pack = PackManifest::new("Cozy", "steve", "1.20.1", "quilt", "0.26.0", INDEX_FILE);

        manager.initialize(pack.clone()).await.unwrap();

        let written = read_pack(&store).await;
        let index_text = store.content(INDEX_FILE).await.unwrap();
        assert_eq!(written.index.hash, hash_string(&index_text));
        assert!(read_index(&store).await.files.is_empty());

        let err = manager.initialize(pack).await.unwrap_err();
        assert!(err.is_conflict());
    }
}
