//! Forest builder: flat user directory → reporting hierarchy.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument};

use crate::domain::arena::OrgForest;
use crate::domain::entities::{User, UserId};
use crate::domain::error::{DomainError, DomainResult};

/// Constructs the reporting forest from users linked by `supervisor_id`.
#[derive(Debug, Default)]
pub struct ForestBuilder {
    relationship_cache: HashMap<UserId, Vec<UserId>>,
    visited: HashSet<UserId>,
}

impl ForestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the forest; roots and siblings keep the input order.
    #[instrument(level = "debug", skip(self, users), fields(users = users.len()))]
    pub fn build(&mut self, users: &[User]) -> DomainResult<OrgForest> {
        self.relationship_cache.clear();
        self.visited.clear();

        let mut by_id: HashMap<UserId, &User> = HashMap::with_capacity(users.len());
        for user in users {
            if by_id.insert(user.id, user).is_some() {
                return Err(DomainError::DuplicateNode(user.id));
            }
        }

        let mut root_ids = Vec::new();
        for user in users {
            match user.supervisor_id {
                Some(supervisor) if !by_id.contains_key(&supervisor) => {
                    return Err(DomainError::UnknownSupervisor {
                        user: user.id,
                        supervisor,
                    });
                }
                Some(supervisor) => self
                    .relationship_cache
                    .entry(supervisor)
                    .or_default()
                    .push(user.id),
                None => root_ids.push(user.id),
            }
        }

        let mut forest = OrgForest::new();
        for root in root_ids {
            let mut stack = vec![(root, None)];
            while let Some((current, parent_idx)) = stack.pop() {
                if !self.visited.insert(current) {
                    return Err(DomainError::CycleDetected(current));
                }
                let user = by_id
                    .get(&current)
                    .ok_or(DomainError::UnknownUser(current))?;
                let current_idx = forest.insert_node((*user).clone(), parent_idx)?;

                if let Some(children) = self.relationship_cache.get(&current) {
                    for child in children.iter().rev() {
                        stack.push((*child, Some(current_idx)));
                    }
                }
            }
        }

        // Whatever was not reached from a root sits on a supervisor cycle
        if let Some(unreached) = users.iter().find(|u| !self.visited.contains(&u.id)) {
            return Err(DomainError::CycleDetected(unreached.id));
        }

        debug!(
            "build: {} users in {} trees",
            forest.len(),
            forest.roots().len()
        );
        Ok(forest)
    }
}
