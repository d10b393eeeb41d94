//! Command dispatch

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{DraftService, OrgView};
use crate::application::ApplicationError;
use crate::cli::args::{ChangeCommands, Cli, Commands, ConfigCommands, DraftCommands};
use crate::cli::output;
use crate::cli::render::{render_forest, render_projection};
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{ChangeDiff, DraftId, OrgSnapshot, PartialChange, UserId};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::StoreError;
use crate::infrastructure::InfraError;

pub async fn execute_command(cli: &Cli, container: &ServiceContainer) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Tree {
            root,
            draft,
            preview,
        }) => tree(container, *root, *draft, *preview).await,
        Some(Commands::Draft { command }) => draft_command(container, command).await,
        Some(Commands::Change { command }) => change_command(container, command).await,
        Some(Commands::Import { file }) => import(container, file).await,
        Some(Commands::Config { command }) => config_command(container, command),
        Some(Commands::Info) => info(container).await,
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => {
            Cli::command()
                .print_help()
                .map_err(|e| InfraError::io("print help", e))?;
            Ok(())
        }
    }
}

/// Draft service with the persisted edit mode restored.
async fn open_drafts(container: &ServiceContainer) -> CliResult<DraftService> {
    let mut service = container.draft_service();
    service.refresh().await?;
    service.restore_mode(container.session().load()?);
    Ok(service)
}

fn save_mode(container: &ServiceContainer, service: &DraftService) -> CliResult<()> {
    container.session().save(service.mode())?;
    Ok(())
}

#[instrument(skip(container))]
async fn tree(
    container: &ServiceContainer,
    root: Option<UserId>,
    draft: Option<DraftId>,
    preview: bool,
) -> CliResult<()> {
    let org = container.org_service();
    let view = org.load().await?;

    if draft.is_none() && !preview {
        let view = view.scoped(root)?;
        for tree in render_forest(&view.forest, &view.catalog) {
            output::info(&tree);
        }
        return Ok(());
    }

    let drafts = open_drafts(container).await?;
    let draft = drafts.draft(drafts.resolve(draft)?)?;
    let mut projection = org.preview(&view, draft)?;
    if let Some(root) = root {
        projection.forest = projection
            .forest
            .subtree(root)
            .map_err(ApplicationError::from)?;
    }
    output::header(&format!(
        "Preview of '{}' ({} changes)",
        draft.name,
        draft.changes.len()
    ));
    for tree in render_projection(&projection, &view.catalog) {
        output::info(&tree);
    }
    Ok(())
}

async fn draft_command(container: &ServiceContainer, command: &DraftCommands) -> CliResult<()> {
    let mut drafts = open_drafts(container).await?;
    match command {
        DraftCommands::Create { name, select } => {
            let draft = drafts.create_draft(name).await?;
            output::action("Created", &format!("{} ({})", draft.name, draft.id));
            if *select {
                drafts.select_draft(draft.id)?;
                output::action("Editing", &draft.name);
            }
        }
        DraftCommands::List => {
            let active = drafts.mode().active_draft();
            if drafts.drafts().is_empty() {
                output::detail(&"no open drafts");
            }
            for draft in drafts.drafts() {
                output::draft_row(draft, Some(draft.id) == active);
            }
        }
        DraftCommands::Select { id } => {
            let draft = drafts.select_draft(*id)?;
            output::action("Editing", &draft.name);
        }
        DraftCommands::Exit => {
            drafts.exit_draft_mode();
            output::success("Left draft mode");
        }
        DraftCommands::Show { id } => {
            let id = drafts.resolve(*id)?;
            let org = container.org_service();
            let view = org.load().await?;
            show_draft(&org.pending_changes(&view, drafts.draft(id)?)?, &view, &drafts, id)?;
        }
        DraftCommands::Delete { id } => {
            drafts.delete_draft(*id).await?;
            output::action("Deleted", id);
        }
        DraftCommands::Publish { id } => {
            let id = drafts.resolve(*id)?;
            let revision = drafts.publish_draft(id).await?;
            output::success(&format!("Published {} (org revision {})", id, revision));
        }
    }
    save_mode(container, &drafts)
}

fn show_draft(
    diffs: &[ChangeDiff],
    view: &OrgView,
    drafts: &DraftService,
    id: DraftId,
) -> CliResult<()> {
    let draft = drafts.draft(id)?;
    output::header(&format!("{} ({}, {})", draft.name, draft.status, draft.id));
    if draft.base_revision != view.revision {
        output::warning(&format!(
            "org data changed since this draft was created (revision {} → {}); publishing will conflict",
            draft.base_revision, view.revision
        ));
    }
    if diffs.is_empty() {
        output::detail(&"no changes");
    }
    diffs.iter().for_each(output::pending_change);
    Ok(())
}

async fn change_command(container: &ServiceContainer, command: &ChangeCommands) -> CliResult<()> {
    let mut drafts = open_drafts(container).await?;
    match command {
        ChangeCommands::Set {
            user,
            supervisor,
            no_supervisor,
            department,
            clear_department,
            role,
            squads,
            clear_squads,
            draft,
        } => {
            let partial = PartialChange {
                supervisor_id: match (supervisor, no_supervisor) {
                    (Some(s), _) => Some(Some(*s)),
                    (None, true) => Some(None),
                    (None, false) => None,
                },
                department: match (department, clear_department) {
                    (Some(d), _) => Some(Some(d.clone())),
                    (None, true) => Some(None),
                    (None, false) => None,
                },
                role: *role,
                squad_ids: match (squads, clear_squads) {
                    (Some(s), _) => Some(s.iter().copied().collect()),
                    (None, true) => Some(Default::default()),
                    (None, false) => None,
                },
            };
            if partial.is_empty() {
                return Err(CliError::Usage(
                    "nothing to change: pass at least one field option".to_string(),
                ));
            }
            let id = drafts.resolve(*draft)?;
            let change = drafts.upsert_change(id, *user, partial).await?;
            debug!("change_command: {:?}", change);
            output::action(
                "Changed",
                &format!("{} ({})", change.user_id, change.changed_fields().join(", ")),
            );
        }
        ChangeCommands::Remove { user, draft } => {
            let id = drafts.resolve(*draft)?;
            drafts.remove_change(id, *user).await?;
            output::action("Removed", &format!("change for {}", user));
        }
    }
    save_mode(container, &drafts)
}

async fn import(container: &ServiceContainer, file: &std::path::Path) -> CliResult<()> {
    let content = container
        .fs
        .read_to_string(file)
        .map_err(|e| InfraError::io(format!("read {}", file.display()), e))?;
    let snapshot: OrgSnapshot = serde_json::from_str(&content).map_err(|e| {
        CliError::InvalidArgs(format!("parse {}: {}", file.display(), e))
    })?;
    container.json_store().init().map_err(ApplicationError::from)?;
    let users = snapshot.users.len();
    let revision = container
        .directory
        .import(snapshot)
        .await
        .map_err(ApplicationError::from)?;
    output::success(&format!("Imported {} users (org revision {})", users, revision));
    Ok(())
}

fn config_command(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Init { global } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("cannot determine global config directory".to_string())
                })?
            } else {
                let cwd = std::env::current_dir()
                    .map_err(|e| InfraError::io("current directory", e))?;
                local_config_path(&cwd)
            };
            if container.fs.exists(&path) {
                return Err(CliError::Usage(format!(
                    "config already exists: {}",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .and_then(|_| container.fs.write(&path, &Settings::template()))
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::info(&format!("global: {}", path.display())),
                None => output::info(&"global: (unavailable)"),
            }
            if let Ok(cwd) = std::env::current_dir() {
                output::info(&format!("local:  {}", local_config_path(&cwd).display()));
            }
            output::info(&format!("store:  {}", container.settings.store_path().display()));
            output::info(&format!(
                "session: {}",
                container.settings.session_path().display()
            ));
        }
    }
    Ok(())
}

async fn info(container: &ServiceContainer) -> CliResult<()> {
    output::header(&"orgdraft");
    output::detail(&format!("data dir: {}", container.settings.data_dir.display()));
    let snapshot = match container.directory.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(StoreError::Transport { context, .. }) => {
            output::warning(&format!("store unavailable: {}", context));
            return Ok(());
        }
        Err(e) => return Err(ApplicationError::from(e).into()),
    };
    output::detail(&format!("revision: {}", snapshot.revision));
    output::detail(&format!("users:    {}", snapshot.users.len()));
    output::detail(&format!("squads:   {}", snapshot.squads.len()));

    let drafts = open_drafts(container).await?;
    output::detail(&format!("drafts:   {}", drafts.drafts().len()));
    match drafts.active_draft() {
        Some(draft) => output::detail(&format!("editing:  {} ({})", draft.name, draft.id)),
        None => output::detail(&"editing:  (live)"),
    }
    Ok(())
}
