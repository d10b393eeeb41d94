//! Edit-mode persistence between CLI invocations.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::EditMode;
use crate::infrastructure::error::{InfraError, InfraResult};
use crate::infrastructure::traits::FileSystem;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionState {
    #[serde(default)]
    edit: EditMode,
}

/// TOML file remembering which draft is being edited.
pub struct SessionFile {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl SessionFile {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    /// Stored mode; `Live` when nothing was saved yet.
    pub fn load(&self) -> InfraResult<EditMode> {
        if !self.fs.exists(&self.path) {
            return Ok(EditMode::Live);
        }
        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| InfraError::io(format!("read {}", self.path.display()), e))?;
        let state: SessionState = toml::from_str(&content).map_err(|e| InfraError::Session {
            message: format!("parse {}: {}", self.path.display(), e),
        })?;
        debug!("session: loaded {:?}", state.edit);
        Ok(state.edit)
    }

    pub fn save(&self, edit: EditMode) -> InfraResult<()> {
        let content =
            toml::to_string_pretty(&SessionState { edit }).map_err(|e| InfraError::Session {
                message: format!("serialize session: {e}"),
            })?;
        self.fs
            .ensure_parent(&self.path)
            .map_err(|e| InfraError::io(format!("create {}", self.path.display()), e))?;
        self.fs
            .write(&self.path, &content)
            .map_err(|e| InfraError::io(format!("write {}", self.path.display()), e))
    }
}
