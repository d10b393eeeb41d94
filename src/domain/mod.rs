//! Domain layer: entities and org-structure logic
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod builder;
pub mod diff;
pub mod draft;
pub mod entities;
pub mod error;
pub mod projector;

pub use arena::{OrgForest, OrgNode, OrgTreeNode};
pub use builder::ForestBuilder;
pub use diff::{diff_change, ChangeDiff, SquadDiff, ValueDiff};
pub use draft::{Change, Draft, DraftStatus, EditMode, OriginalValues, PartialChange};
pub use entities::*;
pub use error::{DomainError, DomainResult};
pub use projector::{
    project_nodes, project_tree, NodeAnnotation, Projection, ProjectionOptions, TreeProjector,
};
