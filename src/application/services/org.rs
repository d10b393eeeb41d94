//! Org hierarchy service
//!
//! Loads the authoritative forest, projects drafts onto it for preview and
//! renders the pending-changes panel.

use std::sync::Arc;

use tracing::debug;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    diff_change, ChangeDiff, Draft, ForestBuilder, OrgForest, Projection, ProjectionOptions,
    SquadCatalog, TreeProjector, UserId,
};
use crate::infrastructure::traits::OrgDirectory;

/// Authoritative forest plus the squad catalog it references.
#[derive(Debug, Clone)]
pub struct OrgView {
    pub revision: u64,
    pub forest: OrgForest,
    pub catalog: SquadCatalog,
}

impl OrgView {
    /// Restrict to the subtree below `root` (a supervisor's own view).
    pub fn scoped(self, root: Option<UserId>) -> ApplicationResult<Self> {
        match root {
            None => Ok(self),
            Some(user) => {
                let forest = self.forest.subtree(user).map_err(|_| ApplicationError::NotFound {
                    kind: "user",
                    id: user.to_string(),
                })?;
                Ok(Self { forest, ..self })
            }
        }
    }
}

/// Service for reading and previewing the org hierarchy.
pub struct OrgService {
    directory: Arc<dyn OrgDirectory>,
    options: ProjectionOptions,
}

impl OrgService {
    pub fn new(directory: Arc<dyn OrgDirectory>, options: ProjectionOptions) -> Self {
        Self { directory, options }
    }

    /// Build the authoritative forest from the directory.
    pub async fn load(&self) -> ApplicationResult<OrgView> {
        let snapshot = self.directory.snapshot().await?;
        let forest = ForestBuilder::new().build(&snapshot.users)?;
        debug!(
            "load: revision {}, {} users",
            snapshot.revision,
            forest.len()
        );
        Ok(OrgView {
            revision: snapshot.revision,
            catalog: snapshot.catalog(),
            forest,
        })
    }

    /// Hypothetical forest after applying the draft; `view` is not touched.
    pub fn preview(&self, view: &OrgView, draft: &Draft) -> ApplicationResult<Projection> {
        if draft.base_revision != view.revision {
            debug!(
                "preview: draft {} based on revision {}, directory at {}",
                draft.id, draft.base_revision, view.revision
            );
        }
        Ok(TreeProjector::new(&view.catalog)
            .with_options(self.options)
            .project(&view.forest, &draft.changes)?)
    }

    /// Per-change diffs for the pending-changes panel, in draft order.
    pub fn pending_changes(&self, view: &OrgView, draft: &Draft) -> ApplicationResult<Vec<ChangeDiff>> {
        let names = view.forest.names();
        draft
            .changes
            .iter()
            .map(|change| diff_change(change, &names, &view.catalog).map_err(Into::into))
            .collect()
    }
}
