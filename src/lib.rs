//! orgdraft: propose, preview and publish changes to a reporting hierarchy.
//!
//! Layers, innermost first:
//! - `domain`: org model, tree building, draft projection and diffs (pure)
//! - `application`: services orchestrating drafts against the store
//! - `infrastructure`: store implementations, session file, DI container
//! - `cli`: argument parsing, command dispatch and terminal rendering

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
