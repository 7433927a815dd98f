//! Named-collection vector store
//!
//! One collection per document category, created eagerly. Each collection
//! sits behind its own `RwLock` so queries run concurrently while writes to
//! a collection are serialised. When a persist directory is configured
//! every mutation is followed by a JSON snapshot of the touched collection.

pub mod collection;
pub mod persistence;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::RwLock;
use tracing::debug;
use tracing::info;

pub use collection::cosine_distance;
pub use collection::Collection;
pub use collection::QueryHit;
pub use persistence::SnapshotStore;

use crate::config::VectorStoreConfig;
use crate::errors::Result;
use crate::errors::TutorRagError;
use crate::models::Category;
use crate::models::CollectionInfo;
use crate::models::Metadata;

/// Shared reference to one collection
#[derive(Clone)]
pub struct CollectionHandle {
    name: String,
    inner: Arc<RwLock<Collection>>,
}

impl CollectionHandle {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionHandle").field("name", &self.name).finish()
    }
}

pub struct VectorStore {
    collections: DashMap<String, Arc<RwLock<Collection>>>,
    snapshots: Option<SnapshotStore>,
}

impl VectorStore {
    /// In-memory store with every category collection present
    #[must_use]
    pub fn in_memory() -> Self {
        let store = Self {
            collections: DashMap::new(),
            snapshots: None,
        };
        for category in Category::ALL {
            store.register(category.collection_name(), category.collection_metadata());
        }
        store
    }

    /// Open the configured store, reloading snapshots when persistence is on
    pub async fn open(config: &VectorStoreConfig) -> Result<Self> {
        let Some(directory) = &config.persist_directory else {
            info!("Vector store running in memory");
            return Ok(Self::in_memory());
        };

        let snapshots = SnapshotStore::new(directory);
        let store = Self {
            collections: DashMap::new(),
            snapshots: Some(snapshots.clone()),
        };
        for collection in snapshots.load_all().await? {
            store
                .collections
                .insert(collection.name.clone(), Arc::new(RwLock::new(collection)));
        }
        for category in Category::ALL {
            store
                .get_or_create(category.collection_name(), category.collection_metadata())
                .await?;
        }
        info!("Vector store persisting to {}", directory.display());
        Ok(store)
    }

    fn register(&self, name: &str, metadata: Metadata) -> (CollectionHandle, bool) {
        let mut created = false;
        let inner = self
            .collections
            .entry(name.to_string())
            .or_insert_with(|| {
                created = true;
                Arc::new(RwLock::new(Collection::new(name, metadata)))
            })
            .value()
            .clone();
        (
            CollectionHandle {
                name: name.to_string(),
                inner,
            },
            created,
        )
    }

    /// Fails when `handle` outlived a drop of its collection
    fn ensure_registered(&self, handle: &CollectionHandle) -> Result<()> {
        match self.collections.get(&handle.name) {
            Some(entry) if Arc::ptr_eq(entry.value(), &handle.inner) => Ok(()),
            _ => Err(TutorRagError::CollectionNotFound(handle.name.clone())),
        }
    }

    async fn snapshot(&self, collection: &Collection) -> Result<()> {
        if let Some(snapshots) = &self.snapshots {
            snapshots.save(collection).await?;
        }
        Ok(())
    }

    /// Idempotent; never fails on "not found"
    pub async fn get_or_create(&self, name: &str, metadata: Metadata) -> Result<CollectionHandle> {
        let (handle, created) = self.register(name, metadata);
        if created {
            debug!("Created collection {}", name);
            let guard = handle.inner.read().await;
            self.snapshot(&guard).await?;
        }
        Ok(handle)
    }

    /// Look up an existing collection
    pub fn collection(&self, name: &str) -> Result<CollectionHandle> {
        self.collections
            .get(name)
            .map(|entry| CollectionHandle {
                name: name.to_string(),
                inner: Arc::clone(entry.value()),
            })
            .ok_or_else(|| TutorRagError::CollectionNotFound(name.to_string()))
    }

    /// Insert or replace documents by id
    pub async fn upsert(
        &self,
        handle: &CollectionHandle,
        ids: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
    ) -> Result<usize> {
        let mut guard = handle.inner.write().await;
        self.ensure_registered(handle)?;
        let written = guard.upsert(ids, embeddings, documents, metadatas)?;
        if written > 0 {
            self.snapshot(&guard).await?;
        }
        Ok(written)
    }

    /// Nearest documents, ascending by distance
    pub async fn query(
        &self,
        handle: &CollectionHandle,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<QueryHit>> {
        handle.inner.read().await.query(embedding, n_results)
    }

    pub async fn count(&self, handle: &CollectionHandle) -> usize {
        handle.inner.read().await.len()
    }

    /// Remove every document but keep the collection registered
    pub async fn delete_all(&self, handle: &CollectionHandle) -> Result<usize> {
        let mut guard = handle.inner.write().await;
        self.ensure_registered(handle)?;
        let removed = guard.clear();
        self.snapshot(&guard).await?;
        Ok(removed)
    }

    /// Unregister a collection and delete its snapshot
    pub async fn drop_collection(&self, name: &str) -> Result<()> {
        let Some((_, inner)) = self.collections.remove(name) else {
            return Err(TutorRagError::CollectionNotFound(name.to_string()));
        };
        // wait out any writer that passed its registration check
        let _guard = inner.write().await;
        if let Some(snapshots) = &self.snapshots {
            snapshots.remove(name).await?;
        }
        info!("Dropped collection {}", name);
        Ok(())
    }

    /// Registered collection names, sorted
    #[must_use]
    pub fn list_collections(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub async fn collection_info(&self, name: &str) -> Result<CollectionInfo> {
        let handle = self.collection(name)?;
        let guard = handle.inner.read().await;
        Ok(CollectionInfo {
            name: guard.name.clone(),
            count: guard.len(),
            metadata: guard.metadata.clone(),
        })
    }

    #[must_use]
    pub const fn is_persistent(&self) -> bool {
        self.snapshots.is_some()
    }
}
