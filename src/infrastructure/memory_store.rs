//! Process-local store, for embedding and tests.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{Change, Draft, DraftId, OrgSnapshot};
use crate::infrastructure::document::StoreDocument;
use crate::infrastructure::traits::{DraftStore, OrgDirectory, StoreError, StoreResult};

/// Store holding its document in memory.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    doc: Mutex<StoreDocument>,
}

impl InMemoryStore {
    pub fn new(org: OrgSnapshot) -> Self {
        Self {
            doc: Mutex::new(StoreDocument::new(org)),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, StoreDocument>> {
        self.doc.lock().map_err(|_| StoreError::Transport {
            context: "in-memory store lock poisoned".to_string(),
            source: "poisoned".into(),
        })
    }

    /// Run `op` on a copy and keep it only on success.
    fn update<T>(&self, op: impl FnOnce(&mut StoreDocument) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.lock()?;
        let mut scratch = guard.clone();
        let out = op(&mut scratch)?;
        *guard = scratch;
        Ok(out)
    }
}

#[async_trait]
impl OrgDirectory for InMemoryStore {
    async fn snapshot(&self) -> StoreResult<OrgSnapshot> {
        Ok(self.lock()?.org.clone())
    }

    async fn import(&self, snapshot: OrgSnapshot) -> StoreResult<u64> {
        self.update(|doc| doc.import(snapshot))
    }
}

#[async_trait]
impl DraftStore for InMemoryStore {
    async fn list_drafts(&self) -> StoreResult<Vec<Draft>> {
        Ok(self.lock()?.drafts.clone())
    }

    async fn create_draft(&self, draft: &Draft) -> StoreResult<()> {
        self.update(|doc| doc.create_draft(draft))
    }

    async fn save_changes(&self, id: DraftId, changes: &[Change]) -> StoreResult<()> {
        self.update(|doc| doc.save_changes(id, changes))
    }

    async fn delete_draft(&self, id: DraftId) -> StoreResult<()> {
        self.update(|doc| doc.delete_draft(id))
    }

    async fn publish_draft(&self, id: DraftId) -> StoreResult<u64> {
        self.update(|doc| doc.publish_draft(id))
    }
}
