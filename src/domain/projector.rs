//! Tree projection: base forest + draft changes → preview forest.
//!
//! The base forest is never mutated. The projection works on a deep clone and
//! re-parents nodes through the live id → index map, so chained moves within
//! one batch resolve the same way whatever order they arrive in.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, instrument, warn};

use crate::domain::arena::{OrgForest, OrgTreeNode};
use crate::domain::draft::{Change, OriginalValues};
use crate::domain::entities::{SquadCatalog, SquadId, UserId};
use crate::domain::error::{DomainError, DomainResult};

/// Knobs for projection strictness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionOptions {
    /// Reject squad ids missing from the catalog instead of dropping them
    pub strict_squads: bool,
}

/// Side-table entry for a node touched by a change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAnnotation {
    pub original: OriginalValues,
    /// Node was re-parented by this projection
    pub moved: bool,
    pub changed_fields: Vec<&'static str>,
}

/// Result of projecting a draft onto the base forest.
#[derive(Debug, Clone)]
pub struct Projection {
    pub forest: OrgForest,
    /// Pre-change values keyed by user id; users stay plain entities
    pub annotations: BTreeMap<UserId, NodeAnnotation>,
}

impl Projection {
    pub fn annotation(&self, user_id: UserId) -> Option<&NodeAnnotation> {
        self.annotations.get(&user_id)
    }
}

/// Applies an ordered change list to a copy of the base forest.
#[derive(Debug, Clone)]
pub struct TreeProjector<'a> {
    catalog: &'a SquadCatalog,
    options: ProjectionOptions,
}

impl<'a> TreeProjector<'a> {
    pub fn new(catalog: &'a SquadCatalog) -> Self {
        Self {
            catalog,
            options: ProjectionOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ProjectionOptions) -> Self {
        self.options = options;
        self
    }

    #[instrument(level = "debug", skip_all, fields(nodes = base.len(), changes = changes.len()))]
    pub fn project(&self, base: &OrgForest, changes: &[Change]) -> DomainResult<Projection> {
        Self::check_distinct(changes)?;

        let mut forest = base.clone();
        let mut annotations = BTreeMap::new();

        for change in changes {
            if !forest.contains(change.user_id) {
                return Err(DomainError::UnknownUser(change.user_id));
            }
            if let Some(Some(target)) = change.supervisor_move() {
                if !forest.contains(target) {
                    return Err(DomainError::UnknownSupervisor {
                        user: change.user_id,
                        supervisor: target,
                    });
                }
            }
        }

        for change in changes {
            self.apply_fields(&mut forest, change)?;
        }

        let mut moved = HashSet::new();
        for change in changes {
            if let Some(target) = change.supervisor_move() {
                if Self::reparent(&mut forest, change.user_id, target) {
                    moved.insert(change.user_id);
                }
            }
        }

        Self::check_acyclic(&forest)?;

        for change in changes {
            annotations.insert(
                change.user_id,
                NodeAnnotation {
                    original: change.original.clone(),
                    moved: moved.contains(&change.user_id),
                    changed_fields: change.changed_fields(),
                },
            );
        }

        debug!(
            "project: {} moves, {} roots after projection",
            moved.len(),
            forest.roots().len()
        );
        Ok(Projection {
            forest,
            annotations,
        })
    }

    fn check_distinct(changes: &[Change]) -> DomainResult<()> {
        let mut seen = HashSet::with_capacity(changes.len());
        for change in changes {
            if !seen.insert(change.user_id) {
                return Err(DomainError::DuplicateChange(change.user_id));
            }
        }
        Ok(())
    }

    /// Scalar overwrites and squad replacement on the cloned node.
    fn apply_fields(&self, forest: &mut OrgForest, change: &Change) -> DomainResult<()> {
        let squads = match &change.new.squad_ids {
            Some(ids) => Some(self.resolve_squads(change.user_id, ids)?),
            None => None,
        };
        let user = forest
            .user_mut(change.user_id)
            .ok_or(DomainError::UnknownUser(change.user_id))?;

        if let Some(department) = &change.new.department {
            user.department = department.clone();
        }
        if let Some(role) = change.new.role {
            user.role = role;
        }
        if let Some(squads) = squads {
            user.squad_ids = squads;
        }
        Ok(())
    }

    fn resolve_squads(
        &self,
        user: UserId,
        ids: &BTreeSet<SquadId>,
    ) -> DomainResult<BTreeSet<SquadId>> {
        let mut resolved = BTreeSet::new();
        for &squad in ids {
            if self.catalog.contains(squad) {
                resolved.insert(squad);
            } else if self.options.strict_squads {
                return Err(DomainError::UnknownSquad { user, squad });
            } else {
                warn!("dropping unknown squad {} proposed for {}", squad, user);
            }
        }
        Ok(resolved)
    }

    /// Move the subtree rooted at `user` below `target` (None: new root).
    ///
    /// Returns false when the node already sits below `target`.
    fn reparent(forest: &mut OrgForest, user: UserId, target: Option<UserId>) -> bool {
        let Some(idx) = forest.index_of(user) else {
            return false;
        };
        let current = forest.get_node(idx).and_then(|n| n.parent);
        let target_idx = target.and_then(|t| forest.index_of(t));
        if current == target_idx {
            return false;
        }
        forest.detach(idx);
        forest.attach(idx, target_idx);
        debug!("reparent: {} -> {:?}", user, target);
        true
    }

    /// After all moves, every node must still hang off a root.
    fn check_acyclic(forest: &OrgForest) -> DomainResult<()> {
        let reachable = forest.reachable_ids();
        if reachable.len() == forest.len() {
            return Ok(());
        }
        let stranded = forest
            .user_ids()
            .into_iter()
            .find(|id| !reachable.contains(id));
        match stranded {
            Some(id) => Err(DomainError::CycleDetected(id)),
            None => Ok(()),
        }
    }
}

/// Project `changes` onto `base` with default options.
pub fn project_tree(
    base: &OrgForest,
    changes: &[Change],
    catalog: &SquadCatalog,
) -> DomainResult<OrgForest> {
    TreeProjector::new(catalog)
        .project(base, changes)
        .map(|p| p.forest)
}

/// Project raw nested nodes; builds the lookup maps first.
pub fn project_nodes(
    base: &[OrgTreeNode],
    changes: &[Change],
    catalog: &SquadCatalog,
) -> DomainResult<Vec<OrgTreeNode>> {
    let forest = OrgForest::from_nodes(base)?;
    project_tree(&forest, changes, catalog).map(|f| f.to_nodes())
}
