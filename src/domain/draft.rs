//! Drafts and per-user changes
//!
//! A draft is a named batch of proposed reorganization changes. Each user has
//! at most one `Change` per draft; further edits merge into it.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::domain::entities::{DraftId, Role, SquadId, User, UserId};
use crate::domain::error::{DomainError, DomainResult};

/// Lifecycle state of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    Draft,
    Published,
}

impl fmt::Display for DraftStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DraftStatus::Draft => f.write_str("draft"),
            DraftStatus::Published => f.write_str("published"),
        }
    }
}

/// Pre-change values of a user, captured when the user is first edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalValues {
    pub supervisor_id: Option<UserId>,
    pub department: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub squad_ids: BTreeSet<SquadId>,
}

impl From<&User> for OriginalValues {
    fn from(user: &User) -> Self {
        Self {
            supervisor_id: user.supervisor_id,
            department: user.department.clone(),
            role: user.role,
            squad_ids: user.squad_ids.clone(),
        }
    }
}

/// Proposed field values; `None` means "no change proposed".
///
/// For nullable fields `Some(None)` is an explicit clear (become a root,
/// drop the department). `squad_ids` always replaces the full membership:
/// `Some(empty)` removes every squad.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialChange {
    #[serde(
        default,
        deserialize_with = "deserialize_optional_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub supervisor_id: Option<Option<UserId>>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_field",
        skip_serializing_if = "Option::is_none"
    )]
    pub department: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squad_ids: Option<BTreeSet<SquadId>>,
}

/// Deserialize a field that can be:
/// - absent (None) - no change proposed
/// - null (Some(None)) - cleared
/// - present (Some(Some(value))) - set to value
fn deserialize_optional_field<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

impl PartialChange {
    pub fn supervisor(supervisor: Option<UserId>) -> Self {
        Self {
            supervisor_id: Some(supervisor),
            ..Self::default()
        }
    }

    pub fn department(department: Option<String>) -> Self {
        Self {
            department: Some(department),
            ..Self::default()
        }
    }

    pub fn role(role: Role) -> Self {
        Self {
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn squads(squads: impl IntoIterator<Item = SquadId>) -> Self {
        Self {
            squad_ids: Some(squads.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.supervisor_id.is_none()
            && self.department.is_none()
            && self.role.is_none()
            && self.squad_ids.is_none()
    }

    /// Overwrite the fields `other` proposes; leave the rest untouched.
    pub fn merge(&mut self, other: PartialChange) {
        if let Some(supervisor) = other.supervisor_id {
            self.supervisor_id = Some(supervisor);
        }
        if let Some(department) = other.department {
            self.department = Some(department);
        }
        if let Some(role) = other.role {
            self.role = Some(role);
        }
        if let Some(squads) = other.squad_ids {
            self.squad_ids = Some(squads);
        }
    }
}

/// One user's proposed mutations within a draft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub user_id: UserId,
    pub original: OriginalValues,
    pub new: PartialChange,
}

impl Change {
    /// Start a change for `user`, capturing its current values as originals.
    pub fn new(user: &User, new: PartialChange) -> Self {
        Self {
            user_id: user.id,
            original: OriginalValues::from(user),
            new,
        }
    }

    /// Target supervisor if this change re-parents the user.
    ///
    /// `Some(None)` means the user becomes a root.
    pub fn supervisor_move(&self) -> Option<Option<UserId>> {
        match self.new.supervisor_id {
            Some(target) if target != self.original.supervisor_id => Some(target),
            _ => None,
        }
    }

    pub fn changes_department(&self) -> bool {
        matches!(&self.new.department, Some(d) if *d != self.original.department)
    }

    pub fn changes_role(&self) -> bool {
        matches!(self.new.role, Some(r) if r != self.original.role)
    }

    pub fn changes_squads(&self) -> bool {
        matches!(&self.new.squad_ids, Some(s) if *s != self.original.squad_ids)
    }

    /// Names of the fields whose proposed value differs from the original.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.supervisor_move().is_some() {
            fields.push("supervisor");
        }
        if self.changes_department() {
            fields.push("department");
        }
        if self.changes_role() {
            fields.push("role");
        }
        if self.changes_squads() {
            fields.push("squads");
        }
        fields
    }
}

/// A named batch of proposed changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub id: DraftId,
    pub name: String,
    pub status: DraftStatus,
    /// Revision of the org data the draft was created against
    #[serde(default)]
    pub base_revision: u64,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub changes: Vec<Change>,
}

impl Draft {
    /// Create an empty draft; the name must not be blank.
    pub fn new(name: &str, base_revision: u64) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::InvalidDraftName(name.to_string()));
        }
        Ok(Self {
            id: DraftId::new(),
            name: name.to_string(),
            status: DraftStatus::Draft,
            base_revision,
            created_at: Utc::now(),
            published_at: None,
            changes: Vec::new(),
        })
    }

    pub fn is_published(&self) -> bool {
        self.status == DraftStatus::Published
    }

    pub fn change_for(&self, user_id: UserId) -> Option<&Change> {
        self.changes.iter().find(|c| c.user_id == user_id)
    }

    /// Insert or merge the change for `user`.
    ///
    /// The first edit of a user captures its current values as originals;
    /// later edits only overwrite the proposed fields.
    pub fn upsert_change(&mut self, user: &User, partial: PartialChange) -> DomainResult<&Change> {
        self.ensure_editable()?;
        let pos = match self.changes.iter().position(|c| c.user_id == user.id) {
            Some(pos) => {
                debug!("upsert_change: merging into change for {}", user.id);
                self.changes[pos].new.merge(partial);
                pos
            }
            None => {
                debug!("upsert_change: new change for {}", user.id);
                self.changes.push(Change::new(user, partial));
                self.changes.len() - 1
            }
        };
        Ok(&self.changes[pos])
    }

    /// Drop the change for `user_id`; returns it if there was one.
    pub fn remove_change(&mut self, user_id: UserId) -> DomainResult<Option<Change>> {
        self.ensure_editable()?;
        Ok(self
            .changes
            .iter()
            .position(|c| c.user_id == user_id)
            .map(|pos| self.changes.remove(pos)))
    }

    pub fn mark_published(&mut self) {
        self.status = DraftStatus::Published;
        self.published_at = Some(Utc::now());
    }

    fn ensure_editable(&self) -> DomainResult<()> {
        if self.is_published() {
            return Err(DomainError::DraftPublished(self.id.to_string()));
        }
        Ok(())
    }
}

/// Which draft, if any, the editor is currently working on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "draft_id", rename_all = "lowercase")]
pub enum EditMode {
    /// Viewing the authoritative org data
    #[default]
    Live,
    /// Editing the given draft
    Editing(DraftId),
}

impl EditMode {
    pub fn active_draft(&self) -> Option<DraftId> {
        match self {
            EditMode::Live => None,
            EditMode::Editing(id) => Some(*id),
        }
    }

    pub fn is_editing(&self, draft_id: DraftId) -> bool {
        *self == EditMode::Editing(draft_id)
    }
}
