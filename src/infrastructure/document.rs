//! Store document: authoritative org data plus drafts
//!
//! Both store implementations keep one `StoreDocument` and run every
//! operation against a copy of it, swapping the copy in only when the
//! operation succeeds. Publishing is therefore all-or-nothing.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::{Change, Draft, DraftId, ForestBuilder, OrgSnapshot, SquadCatalog, User};
use crate::infrastructure::traits::{StoreError, StoreResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(flatten)]
    pub org: OrgSnapshot,
    #[serde(default)]
    pub drafts: Vec<Draft>,
}

impl StoreDocument {
    pub fn new(org: OrgSnapshot) -> Self {
        Self {
            org,
            drafts: Vec::new(),
        }
    }

    fn draft_mut(&mut self, id: DraftId) -> StoreResult<&mut Draft> {
        self.drafts
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::draft_not_found(id))
    }

    /// Replace users and squads; the result must form a valid hierarchy.
    pub fn import(&mut self, snapshot: OrgSnapshot) -> StoreResult<u64> {
        ForestBuilder::new().build(&snapshot.users)?;
        self.org.users = snapshot.users;
        self.org.squads = snapshot.squads;
        self.org.revision += 1;
        info!(
            "import: {} users, {} squads, revision {}",
            self.org.users.len(),
            self.org.squads.len(),
            self.org.revision
        );
        Ok(self.org.revision)
    }

    pub fn create_draft(&mut self, draft: &Draft) -> StoreResult<()> {
        if self.drafts.iter().any(|d| d.id == draft.id) {
            return Err(StoreError::Conflict(format!(
                "draft {} already exists",
                draft.id
            )));
        }
        self.drafts.push(draft.clone());
        Ok(())
    }

    pub fn save_changes(&mut self, id: DraftId, changes: &[Change]) -> StoreResult<()> {
        let draft = self.draft_mut(id)?;
        if draft.is_published() {
            return Err(StoreError::AlreadyPublished(id));
        }
        draft.changes = changes.to_vec();
        Ok(())
    }

    pub fn delete_draft(&mut self, id: DraftId) -> StoreResult<()> {
        let before = self.drafts.len();
        self.drafts.retain(|d| d.id != id);
        if self.drafts.len() == before {
            return Err(StoreError::draft_not_found(id));
        }
        Ok(())
    }

    /// Apply every change of the draft to the user directory.
    ///
    /// Call on a scratch copy: on error the document is left half-applied.
    pub fn publish_draft(&mut self, id: DraftId) -> StoreResult<u64> {
        let revision = self.org.revision;
        let draft = self
            .drafts
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| StoreError::draft_not_found(id))?;

        if draft.is_published() {
            return Err(StoreError::AlreadyPublished(id));
        }
        if draft.base_revision != revision {
            return Err(StoreError::Conflict(format!(
                "org data changed since draft '{}' was created (revision {} → {})",
                draft.name, draft.base_revision, revision
            )));
        }

        let catalog = self.org.catalog();
        for change in &draft.changes {
            let user = self
                .org
                .users
                .iter_mut()
                .find(|u| u.id == change.user_id)
                .ok_or_else(|| StoreError::NotFound {
                    kind: "user",
                    id: change.user_id.to_string(),
                })?;
            apply_change(user, change, &catalog);
        }
        ForestBuilder::new().build(&self.org.users)?;

        self.org.revision += 1;
        self.draft_mut(id)?.mark_published();
        debug!(
            "publish: draft {} applied {} changes",
            id,
            draft.changes.len()
        );
        Ok(self.org.revision)
    }
}

/// Same field semantics as the preview: unknown squads are dropped.
fn apply_change(user: &mut User, change: &Change, catalog: &SquadCatalog) {
    if let Some(supervisor) = change.new.supervisor_id {
        user.supervisor_id = supervisor;
    }
    if let Some(department) = &change.new.department {
        user.department = department.clone();
    }
    if let Some(role) = change.new.role {
        user.role = role;
    }
    if let Some(squads) = &change.new.squad_ids {
        user.squad_ids = squads
            .iter()
            .copied()
            .filter(|s| catalog.contains(*s))
            .collect();
    }
}
