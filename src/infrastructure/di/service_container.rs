//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{DraftService, OrgService};
use crate::config::Settings;
use crate::infrastructure::json_store::JsonFileStore;
use crate::infrastructure::session::SessionFile;
use crate::infrastructure::traits::{DraftStore, FileSystem, OrgDirectory, RealFileSystem};

/// Container holding the shared dependencies of all services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Authoritative org data
    pub directory: Arc<dyn OrgDirectory>,

    /// Draft persistence
    pub drafts: Arc<dyn DraftStore>,

    store: JsonFileStore,
}

impl ServiceContainer {
    /// Create a new service container backed by the JSON file store.
    pub fn new(settings: Settings) -> Self {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let store = JsonFileStore::new(fs.clone(), settings.store_path());
        let shared = Arc::new(store.clone());
        Self {
            settings: Arc::new(settings),
            fs,
            directory: shared.clone(),
            drafts: shared,
            store,
        }
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        directory: Arc<dyn OrgDirectory>,
        drafts: Arc<dyn DraftStore>,
    ) -> Self {
        let store = JsonFileStore::new(fs.clone(), settings.store_path());
        Self {
            settings: Arc::new(settings),
            fs,
            directory,
            drafts,
            store,
        }
    }

    pub fn draft_service(&self) -> DraftService {
        DraftService::new(self.drafts.clone(), self.directory.clone())
    }

    pub fn org_service(&self) -> OrgService {
        OrgService::new(self.directory.clone(), self.settings.projection_options())
    }

    pub fn session(&self) -> SessionFile {
        SessionFile::new(self.fs.clone(), self.settings.session_path())
    }

    /// The JSON store; clones share its operation lock.
    pub fn json_store(&self) -> JsonFileStore {
        self.store.clone()
    }
}
