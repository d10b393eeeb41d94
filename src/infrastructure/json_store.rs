//! JSON file store
//!
//! Keeps the org directory and all drafts in one JSON document. Every write
//! replaces the file atomically, so a failed operation leaves the previous
//! content in place. Operations on clones of one store run one at a time;
//! separate processes sharing the file are not coordinated.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{Change, Draft, DraftId, OrgSnapshot};
use crate::infrastructure::document::StoreDocument;
use crate::infrastructure::traits::{
    DraftStore, FileSystem, OrgDirectory, StoreError, StoreResult,
};

/// Store backed by a single JSON file.
#[derive(Clone)]
pub struct JsonFileStore {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl JsonFileStore {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create an empty store file unless one exists.
    pub fn init(&self) -> StoreResult<bool> {
        if self.fs.exists(&self.path) {
            return Ok(false);
        }
        self.fs
            .ensure_parent(&self.path)
            .map_err(|e| StoreError::transport(format!("create {}", self.path.display()), e))?;
        self.write(&StoreDocument::default())?;
        Ok(true)
    }

    fn read(&self) -> StoreResult<StoreDocument> {
        if !self.fs.exists(&self.path) {
            debug!("read: no store at {}, using empty", self.path.display());
            return Ok(StoreDocument::default());
        }
        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| StoreError::transport(format!("read {}", self.path.display()), e))?;
        serde_json::from_str(&content)
            .map_err(|e| StoreError::transport(format!("parse {}", self.path.display()), e))
    }

    fn write(&self, doc: &StoreDocument) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(doc)
            .map_err(|e| StoreError::transport("serialize store document", e))?;
        self.fs
            .write_atomic(&self.path, &content)
            .map_err(|e| StoreError::transport(format!("write {}", self.path.display()), e))
    }

    /// Load, mutate a copy, persist; runs on the blocking pool.
    ///
    /// The lock guard moves into the blocking task and is released only when
    /// the write has finished, even if the caller is dropped.
    async fn update<T, F>(&self, op: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut StoreDocument) -> StoreResult<T> + Send + 'static,
    {
        let guard = self.lock.clone().lock_owned().await;
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let mut doc = store.read()?;
            let out = op(&mut doc)?;
            store.write(&doc)?;
            Ok(out)
        })
        .await
        .map_err(|e| StoreError::transport("store task", e))?
    }

    async fn load(&self) -> StoreResult<StoreDocument> {
        let guard = self.lock.clone().lock_owned().await;
        let store = self.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            store.read()
        })
            .await
            .map_err(|e| StoreError::transport("store task", e))?
    }
}

#[async_trait]
impl OrgDirectory for JsonFileStore {
    async fn snapshot(&self) -> StoreResult<OrgSnapshot> {
        Ok(self.load().await?.org)
    }

    async fn import(&self, snapshot: OrgSnapshot) -> StoreResult<u64> {
        self.update(move |doc| doc.import(snapshot)).await
    }
}

#[async_trait]
impl DraftStore for JsonFileStore {
    async fn list_drafts(&self) -> StoreResult<Vec<Draft>> {
        Ok(self.load().await?.drafts)
    }

    async fn create_draft(&self, draft: &Draft) -> StoreResult<()> {
        let draft = draft.clone();
        self.update(move |doc| doc.create_draft(&draft)).await
    }

    async fn save_changes(&self, id: DraftId, changes: &[Change]) -> StoreResult<()> {
        let changes = changes.to_vec();
        self.update(move |doc| doc.save_changes(id, &changes)).await
    }

    async fn delete_draft(&self, id: DraftId) -> StoreResult<()> {
        self.update(move |doc| doc.delete_draft(id)).await
    }

    async fn publish_draft(&self, id: DraftId) -> StoreResult<u64> {
        self.update(move |doc| doc.publish_draft(id)).await
    }
}
