//! Draft management service
//!
//! Orchestrates draft creation, change upserts and publishing against the
//! external `DraftStore`. Local state only changes after the store confirmed
//! the operation, so a failed call leaves the caller's view untouched.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    Change, DomainError, Draft, DraftId, EditMode, PartialChange, UserId,
};
use crate::infrastructure::traits::{DraftStore, OrgDirectory};

/// Service for editing and publishing organizational drafts.
pub struct DraftService {
    store: Arc<dyn DraftStore>,
    directory: Arc<dyn OrgDirectory>,
    drafts: BTreeMap<DraftId, Draft>,
    published: BTreeSet<DraftId>,
    mode: EditMode,
}

impl DraftService {
    /// Create a new draft service; call `refresh` to load existing drafts.
    pub fn new(store: Arc<dyn DraftStore>, directory: Arc<dyn OrgDirectory>) -> Self {
        Self {
            store,
            directory,
            drafts: BTreeMap::new(),
            published: BTreeSet::new(),
            mode: EditMode::Live,
        }
    }

    /// Reload the unpublished drafts from the store.
    ///
    /// A stored edit mode pointing at a draft that no longer exists falls
    /// back to `Live`.
    pub async fn refresh(&mut self) -> ApplicationResult<()> {
        let (published, open): (Vec<_>, Vec<_>) = self
            .store
            .list_drafts()
            .await?
            .into_iter()
            .partition(Draft::is_published);
        self.published = published.into_iter().map(|d| d.id).collect();
        self.drafts = open.into_iter().map(|d| (d.id, d)).collect();
        if let Some(active) = self.mode.active_draft() {
            if !self.drafts.contains_key(&active) {
                warn!("active draft {} is gone, leaving draft mode", active);
                self.mode = EditMode::Live;
            }
        }
        debug!("refresh: {} open drafts", self.drafts.len());
        Ok(())
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    /// Restore a previously persisted edit mode.
    pub fn restore_mode(&mut self, mode: EditMode) {
        self.mode = match mode.active_draft() {
            Some(id) if !self.drafts.contains_key(&id) => EditMode::Live,
            _ => mode,
        };
    }

    /// Unpublished drafts, oldest first.
    pub fn drafts(&self) -> Vec<&Draft> {
        let mut drafts: Vec<_> = self.drafts.values().collect();
        drafts.sort_by_key(|d| d.created_at);
        drafts
    }

    /// Open draft by id; published drafts are reported as such.
    pub fn draft(&self, id: DraftId) -> ApplicationResult<&Draft> {
        if self.published.contains(&id) {
            return Err(ApplicationError::AlreadyPublished(id));
        }
        self.drafts
            .get(&id)
            .ok_or_else(|| ApplicationError::draft_not_found(id))
    }

    /// Draft currently being edited, if any.
    pub fn active_draft(&self) -> Option<&Draft> {
        self.mode.active_draft().and_then(|id| self.drafts.get(&id))
    }

    /// Resolve an explicit draft id, falling back to the active draft.
    pub fn resolve(&self, id: Option<DraftId>) -> ApplicationResult<DraftId> {
        id.or_else(|| self.mode.active_draft())
            .ok_or_else(|| ApplicationError::validation("no draft selected"))
    }

    /// Create an empty draft against the current org revision.
    pub async fn create_draft(&mut self, name: &str) -> ApplicationResult<Draft> {
        let revision = self.directory.snapshot().await?.revision;
        let draft = Draft::new(name, revision).map_err(|e| match e {
            DomainError::InvalidDraftName(_) => {
                ApplicationError::validation("draft name must not be empty")
            }
            other => other.into(),
        })?;
        self.store.create_draft(&draft).await?;
        info!("created draft '{}' ({})", draft.name, draft.id);
        self.drafts.insert(draft.id, draft.clone());
        Ok(draft)
    }

    /// Make `id` the draft being edited.
    pub fn select_draft(&mut self, id: DraftId) -> ApplicationResult<&Draft> {
        self.draft(id)?;
        self.mode = EditMode::Editing(id);
        self.draft(id)
    }

    /// Stop editing; the draft itself is kept.
    pub fn exit_draft_mode(&mut self) {
        self.mode = EditMode::Live;
    }

    /// Insert or merge the change for `user_id` in draft `id`.
    ///
    /// Originals are captured from the authoritative user on the first edit
    /// of that user only.
    pub async fn upsert_change(
        &mut self,
        id: DraftId,
        user_id: UserId,
        partial: PartialChange,
    ) -> ApplicationResult<Change> {
        if partial.is_empty() {
            return Err(ApplicationError::validation(format!(
                "no field change given for user {user_id}"
            )));
        }
        if partial.supervisor_id == Some(Some(user_id)) {
            return Err(ApplicationError::validation(format!(
                "user {user_id} cannot report to themselves"
            )));
        }
        let snapshot = self.directory.snapshot().await?;
        let user = snapshot
            .user(user_id)
            .ok_or_else(|| ApplicationError::NotFound {
                kind: "user",
                id: user_id.to_string(),
            })?;
        if let Some(Some(supervisor)) = partial.supervisor_id {
            if snapshot.user(supervisor).is_none() {
                return Err(ApplicationError::NotFound {
                    kind: "supervisor",
                    id: supervisor.to_string(),
                });
            }
        }

        let mut updated = self.draft(id)?.clone();
        if updated.is_published() {
            return Err(ApplicationError::AlreadyPublished(id));
        }
        let change = updated.upsert_change(user, partial)?.clone();

        self.store.save_changes(id, &updated.changes).await?;
        debug!("upsert_change: draft {} now has {} changes", id, updated.changes.len());
        self.drafts.insert(id, updated);
        Ok(change)
    }

    /// Drop the change for `user_id` from draft `id`.
    pub async fn remove_change(&mut self, id: DraftId, user_id: UserId) -> ApplicationResult<()> {
        let mut updated = self.draft(id)?.clone();
        if updated.remove_change(user_id)?.is_none() {
            return Err(ApplicationError::NotFound {
                kind: "change",
                id: user_id.to_string(),
            });
        }
        self.store.save_changes(id, &updated.changes).await?;
        self.drafts.insert(id, updated);
        Ok(())
    }

    /// Discard a draft; leaves draft mode if it was the active one.
    pub async fn delete_draft(&mut self, id: DraftId) -> ApplicationResult<()> {
        self.draft(id)?;
        self.store.delete_draft(id).await?;
        self.drafts.remove(&id);
        if self.mode.is_editing(id) {
            self.mode = EditMode::Live;
        }
        info!("deleted draft {}", id);
        Ok(())
    }

    /// Commit every change of the draft through the store.
    ///
    /// The draft leaves the open set only after the store confirmed. On any
    /// failure the local draft and its changes stay exactly as they were.
    pub async fn publish_draft(&mut self, id: DraftId) -> ApplicationResult<u64> {
        let draft = self.draft(id)?;
        if draft.is_published() {
            return Err(ApplicationError::AlreadyPublished(id));
        }
        let count = draft.changes.len();

        let revision = match self.store.publish_draft(id).await {
            Ok(revision) => revision,
            Err(e) => {
                warn!("publish of draft {} failed: {}", id, e);
                return Err(e.into());
            }
        };

        self.drafts.remove(&id);
        self.published.insert(id);
        if self.mode.is_editing(id) {
            self.mode = EditMode::Live;
        }
        info!("published draft {} ({} changes), revision {}", id, count, revision);
        Ok(revision)
    }
}
