//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::{DraftId, Role, SquadId, UserId};

/// Organizational drafts: propose, preview and publish reorganizations
#[derive(Parser, Debug)]
#[command(name = "orgdraft")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Data directory holding the store (default: from config)
    #[arg(short = 'D', long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the reporting hierarchy
    Tree {
        /// Only the subtree below this user
        #[arg(long)]
        root: Option<UserId>,
        /// Preview the given draft
        #[arg(long, conflicts_with = "preview")]
        draft: Option<DraftId>,
        /// Preview the active draft
        #[arg(short, long)]
        preview: bool,
    },

    /// Manage drafts
    Draft {
        #[command(subcommand)]
        command: DraftCommands,
    },

    /// Edit the changes of a draft
    Change {
        #[command(subcommand)]
        command: ChangeCommands,
    },

    /// Replace the org directory from a JSON file ({"users": [...], "squads": [...]})
    Import {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Show status
    Info,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum DraftCommands {
    /// Create an empty draft
    Create {
        /// Draft name
        name: String,
        /// Start editing it right away
        #[arg(short, long)]
        select: bool,
    },

    /// List open drafts
    List,

    /// Start editing a draft
    Select {
        id: DraftId,
    },

    /// Stop editing (the draft is kept)
    Exit,

    /// Show the pending changes of a draft (default: active)
    Show {
        id: Option<DraftId>,
    },

    /// Discard a draft
    Delete {
        id: DraftId,
    },

    /// Commit all changes of a draft (default: active)
    Publish {
        id: Option<DraftId>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ChangeCommands {
    /// Propose field changes for a user
    Set {
        /// User to change
        user: UserId,
        /// New supervisor
        #[arg(long, conflicts_with = "no_supervisor")]
        supervisor: Option<UserId>,
        /// Make the user a top-level root
        #[arg(long)]
        no_supervisor: bool,
        /// New department
        #[arg(long, conflicts_with = "clear_department")]
        department: Option<String>,
        /// Remove the department
        #[arg(long)]
        clear_department: bool,
        /// New role (employee, supervisor, admin)
        #[arg(long)]
        role: Option<Role>,
        /// Replace squad membership (comma separated ids)
        #[arg(long, value_delimiter = ',', conflicts_with = "clear_squads")]
        squads: Option<Vec<SquadId>>,
        /// Remove all squads
        #[arg(long)]
        clear_squads: bool,
        /// Draft to edit (default: active)
        #[arg(long)]
        draft: Option<DraftId>,
    },

    /// Drop a user's change from the draft
    Remove {
        user: UserId,
        /// Draft to edit (default: active)
        #[arg(long)]
        draft: Option<DraftId>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
