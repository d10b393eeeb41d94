//! Displayable before/after diff for a single change.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;

use crate::domain::draft::Change;
use crate::domain::entities::{SquadCatalog, UserId};
use crate::domain::error::{DomainError, DomainResult};

/// Old/new pair for a scalar field; `None` renders as "None".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueDiff {
    pub old: Option<String>,
    pub new: Option<String>,
}

impl ValueDiff {
    fn new(old: Option<String>, new: Option<String>) -> Self {
        Self { old, new }
    }
}

impl fmt::Display for ValueDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {}",
            self.old.as_deref().unwrap_or("None"),
            self.new.as_deref().unwrap_or("None")
        )
    }
}

/// Squad membership partition, resolved to names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SquadDiff {
    pub removed: Vec<String>,
    pub added: Vec<String>,
    pub unchanged: Vec<String>,
}

/// Per-field diff of one user's change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeDiff {
    pub user_id: UserId,
    pub user_name: String,
    pub supervisor: Option<ValueDiff>,
    pub department: Option<ValueDiff>,
    pub role: Option<ValueDiff>,
    pub squads: Option<SquadDiff>,
}

impl ChangeDiff {
    pub fn is_empty(&self) -> bool {
        self.supervisor.is_none()
            && self.department.is_none()
            && self.role.is_none()
            && self.squads.is_none()
    }
}

/// Compute the displayable diff of `change`.
///
/// Supervisor ids must resolve through `names`; a dangling id is an error.
/// Squad ids missing from the catalog are dropped from the partition.
pub fn diff_change(
    change: &Change,
    names: &HashMap<UserId, String>,
    catalog: &SquadCatalog,
) -> DomainResult<ChangeDiff> {
    let user_name = names
        .get(&change.user_id)
        .cloned()
        .ok_or(DomainError::UnknownUser(change.user_id))?;

    let supervisor = match change.new.supervisor_id {
        Some(new) if new != change.original.supervisor_id => Some(ValueDiff::new(
            resolve_name(change.user_id, change.original.supervisor_id, names)?,
            resolve_name(change.user_id, new, names)?,
        )),
        _ => None,
    };

    let department = change
        .new
        .department
        .as_ref()
        .and_then(|new| scalar_diff(change.original.department.as_deref(), new.as_deref()));

    let role = change.new.role.and_then(|new| {
        scalar_diff(Some(change.original.role.as_str()), Some(new.as_str()))
    });

    let squads = change.new.squad_ids.as_ref().and_then(|new| {
        let original = &change.original.squad_ids;
        if new == original {
            return None;
        }
        let removed: BTreeSet<_> = original.difference(new).collect();
        let added: BTreeSet<_> = new.difference(original).collect();
        let unchanged: BTreeSet<_> = original.intersection(new).collect();
        Some(SquadDiff {
            removed: catalog.resolve_names(removed),
            added: catalog.resolve_names(added),
            unchanged: catalog.resolve_names(unchanged),
        })
    });

    Ok(ChangeDiff {
        user_id: change.user_id,
        user_name,
        supervisor,
        department,
        role,
        squads,
    })
}

fn resolve_name(
    user: UserId,
    id: Option<UserId>,
    names: &HashMap<UserId, String>,
) -> DomainResult<Option<String>> {
    match id {
        None => Ok(None),
        Some(id) => names
            .get(&id)
            .cloned()
            .map(Some)
            .ok_or(DomainError::UnknownSupervisor {
                user,
                supervisor: id,
            }),
    }
}

/// Emit a pair only when the sides differ and at least one is non-empty.
fn scalar_diff(old: Option<&str>, new: Option<&str>) -> Option<ValueDiff> {
    let old = old.filter(|s| !s.is_empty());
    let new = new.filter(|s| !s.is_empty());
    if old == new {
        return None;
    }
    Some(ValueDiff::new(
        old.map(str::to_string),
        new.map(str::to_string),
    ))
}
