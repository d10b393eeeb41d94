//! Domain entities: core data structures

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a user (employee) in the org directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches('#').parse().map(UserId)
    }
}

/// Identifier of a squad in the global squad catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquadId(pub u64);

impl fmt::Display for SquadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SquadId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(SquadId)
    }
}

/// Identifier of a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(pub Uuid);

impl DraftId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DraftId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(DraftId)
    }
}

/// Role of a user within the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Employee,
    Supervisor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employee => "employee",
            Role::Supervisor => "supervisor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a role name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleParseError(pub String);

impl fmt::Display for RoleParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown role '{}' (expected employee, supervisor or admin)",
            self.0
        )
    }
}

impl std::error::Error for RoleParseError {}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(Role::Employee),
            "supervisor" => Ok(Role::Supervisor),
            "admin" => Ok(Role::Admin),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

/// A member of the organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default)]
    pub squad_ids: BTreeSet<SquadId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<UserId>,
}

impl User {
    pub fn new(id: u64, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: UserId(id),
            name: name.into(),
            role,
            department: None,
            squad_ids: BTreeSet::new(),
            supervisor_id: None,
        }
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_supervisor(mut self, supervisor: u64) -> Self {
        self.supervisor_id = Some(UserId(supervisor));
        self
    }

    pub fn with_squads(mut self, squads: impl IntoIterator<Item = u64>) -> Self {
        self.squad_ids = squads.into_iter().map(SquadId).collect();
        self
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// A squad: a flat, cross-cutting team referenced by id from users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Squad {
    pub id: SquadId,
    pub name: String,
}

impl Squad {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id: SquadId(id),
            name: name.into(),
        }
    }
}

/// Global squad catalog indexed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SquadCatalog {
    by_id: BTreeMap<SquadId, Squad>,
}

impl SquadCatalog {
    pub fn new(squads: impl IntoIterator<Item = Squad>) -> Self {
        Self {
            by_id: squads.into_iter().map(|s| (s.id, s)).collect(),
        }
    }

    pub fn get(&self, id: SquadId) -> Option<&Squad> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: SquadId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn name(&self, id: SquadId) -> Option<&str> {
        self.by_id.get(&id).map(|s| s.name.as_str())
    }

    /// Resolve ids to names in id order, dropping ids not in the catalog.
    pub fn resolve_names<'a>(&self, ids: impl IntoIterator<Item = &'a SquadId>) -> Vec<String> {
        ids.into_iter()
            .filter_map(|id| self.name(*id).map(str::to_string))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Squad> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Authoritative org data as handed out by the directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgSnapshot {
    /// Monotonic revision, bumped on every committed change
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub squads: Vec<Squad>,
}

impl OrgSnapshot {
    pub fn catalog(&self) -> SquadCatalog {
        SquadCatalog::new(self.squads.iter().cloned())
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}
