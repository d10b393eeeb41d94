//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (OrgDirectory, DraftStore)
//! but are themselves concrete structs, not traits.

mod draft;
mod org;

pub use draft::DraftService;
pub use org::{OrgService, OrgView};
