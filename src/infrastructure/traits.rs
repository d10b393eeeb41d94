//! I/O boundary traits for testability
//!
//! These traits abstract the filesystem and the external org/draft store,
//! allowing services to be tested with mock implementations.

use std::io;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Change, DomainError, Draft, DraftId, OrgSnapshot};

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Replace file content in one step: readers see the old or the new
    /// content, never a mix.
    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

/// Errors reported by store implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("draft already published: {0}")]
    AlreadyPublished(DraftId),

    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Rejected(#[from] DomainError),

    #[error("{context}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StoreError {
    pub fn transport(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn draft_not_found(id: DraftId) -> Self {
        Self::NotFound {
            kind: "draft",
            id: id.to_string(),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Read access to the authoritative org data.
#[async_trait]
pub trait OrgDirectory: Send + Sync {
    /// Current users, squads and revision.
    async fn snapshot(&self) -> StoreResult<OrgSnapshot>;

    /// Replace users and squads wholesale; returns the new revision.
    async fn import(&self, snapshot: OrgSnapshot) -> StoreResult<u64>;
}

/// Persistence of drafts, including the atomic publish.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// All drafts, published ones included.
    async fn list_drafts(&self) -> StoreResult<Vec<Draft>>;

    /// Persist a new, empty draft.
    async fn create_draft(&self, draft: &Draft) -> StoreResult<()>;

    /// Replace the stored change list of an unpublished draft.
    async fn save_changes(&self, id: DraftId, changes: &[Change]) -> StoreResult<()>;

    /// Discard a draft.
    async fn delete_draft(&self, id: DraftId) -> StoreResult<()>;

    /// Commit every change of the draft, all or nothing.
    ///
    /// Fails with `Conflict` when the org data moved on since the draft's
    /// base revision, `AlreadyPublished` when it was committed before.
    /// Returns the new org revision.
    async fn publish_draft(&self, id: DraftId) -> StoreResult<u64>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn write_atomic(&self, path: &Path, content: &str) -> io::Result<()> {
        use std::io::Write;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}
