//! Tests for JsonFileStore and SessionFile on a real filesystem

use std::sync::Arc;

use tempfile::TempDir;

use orgdraft::domain::{Draft, DraftStatus, EditMode, OrgSnapshot, PartialChange, Role, User, UserId};
use orgdraft::infrastructure::json_store::JsonFileStore;
use orgdraft::infrastructure::session::SessionFile;
use orgdraft::infrastructure::traits::{
    DraftStore, FileSystem, OrgDirectory, RealFileSystem, StoreError,
};

fn snapshot() -> OrgSnapshot {
    OrgSnapshot {
        revision: 0,
        users: vec![
            User::new(1, "Ada", Role::Admin),
            User::new(7, "Gus", Role::Employee)
                .with_supervisor(1)
                .with_department("Marketing"),
        ],
        squads: vec![],
    }
}

fn store_in(temp: &TempDir) -> JsonFileStore {
    JsonFileStore::new(Arc::new(RealFileSystem), temp.path().join("data").join("org.json"))
}

#[tokio::test]
async fn given_missing_file_when_initializing_then_creates_empty_store() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);

    // Act
    let created = store.init().unwrap();

    // Assert
    assert!(created);
    assert!(store.path().exists());
    assert!(!store.init().unwrap(), "second init keeps existing file");
    assert_eq!(store.snapshot().await.unwrap(), OrgSnapshot::default());
}

#[tokio::test]
async fn given_missing_file_when_reading_then_behaves_as_empty_store() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);

    assert!(store.list_drafts().await.unwrap().is_empty());
    assert!(store.snapshot().await.unwrap().users.is_empty());
}

#[tokio::test]
async fn given_snapshot_when_importing_then_persists_and_bumps_revision() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    store.init().unwrap();

    // Act
    let revision = store.import(snapshot()).await.unwrap();

    // Assert
    assert_eq!(revision, 1);
    let reopened = store_in(&temp);
    let org = reopened.snapshot().await.unwrap();
    assert_eq!(org.revision, 1);
    assert_eq!(org.users.len(), 2);
}

#[tokio::test]
async fn given_invalid_hierarchy_when_importing_then_rejects_and_keeps_file() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    store.init().unwrap();
    store.import(snapshot()).await.unwrap();
    let before = std::fs::read_to_string(store.path()).unwrap();
    let broken = OrgSnapshot {
        users: vec![User::new(2, "Bob", Role::Employee).with_supervisor(42)],
        ..OrgSnapshot::default()
    };

    // Act
    let result = store.import(broken).await;

    // Assert
    assert!(matches!(result, Err(StoreError::Rejected(_))));
    assert_eq!(std::fs::read_to_string(store.path()).unwrap(), before);
}

#[tokio::test]
async fn given_draft_with_changes_when_publishing_then_file_reflects_commit() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    store.init().unwrap();
    let revision = store.import(snapshot()).await.unwrap();
    let mut draft = Draft::new("reorg", revision).unwrap();
    store.create_draft(&draft).await.unwrap();
    let gus = store.snapshot().await.unwrap().user(UserId(7)).cloned().unwrap();
    draft
        .upsert_change(&gus, PartialChange::department(Some("Sales".into())))
        .unwrap();
    store.save_changes(draft.id, &draft.changes).await.unwrap();

    // Act
    let new_revision = store.publish_draft(draft.id).await.unwrap();

    // Assert
    assert_eq!(new_revision, revision + 1);
    let reopened = store_in(&temp);
    let org = reopened.snapshot().await.unwrap();
    assert_eq!(org.user(UserId(7)).unwrap().department.as_deref(), Some("Sales"));
    let drafts = reopened.list_drafts().await.unwrap();
    assert_eq!(drafts[0].status, DraftStatus::Published);
    assert!(drafts[0].published_at.is_some());
    assert!(matches!(
        store.publish_draft(draft.id).await,
        Err(StoreError::AlreadyPublished(_))
    ));
}

// ============================================================
// Overlapping operations on one store
// ============================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_overlapping_creates_when_all_succeed_then_every_draft_is_stored() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = Arc::new(store_in(&temp));
    store.init().unwrap();
    let revision = store.import(snapshot()).await.unwrap();

    // Act
    let handles: Vec<_> = (0..32)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                let draft = Draft::new(&format!("draft {i}"), revision).unwrap();
                store.create_draft(&draft).await.map(|_| draft.id)
            })
        })
        .collect();
    let mut created = Vec::new();
    for handle in handles {
        created.push(handle.await.unwrap().unwrap());
    }

    // Assert
    let stored = store_in(&temp).list_drafts().await.unwrap();
    assert_eq!(stored.len(), 32);
    for id in created {
        assert!(stored.iter().any(|d| d.id == id), "draft {id} lost");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn given_two_drafts_from_same_revision_when_publishing_concurrently_then_second_conflicts() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let store = Arc::new(store_in(&temp));
    store.init().unwrap();
    let mut org = snapshot();
    org.users.push(
        User::new(8, "Hal", Role::Employee)
            .with_supervisor(1)
            .with_department("Marketing"),
    );
    let revision = store.import(org).await.unwrap();
    let current = store.snapshot().await.unwrap();

    let mut drafts = Vec::new();
    for (user, department) in [(7, "Sales"), (8, "Support")] {
        let mut draft = Draft::new(&format!("move {user}"), revision).unwrap();
        store.create_draft(&draft).await.unwrap();
        let target = current.user(UserId(user)).cloned().unwrap();
        draft
            .upsert_change(&target, PartialChange::department(Some(department.into())))
            .unwrap();
        store.save_changes(draft.id, &draft.changes).await.unwrap();
        drafts.push(draft.id);
    }

    // Act
    let handles: Vec<_> = drafts
        .iter()
        .map(|&id| {
            let store = store.clone();
            tokio::spawn(async move { store.publish_draft(id).await })
        })
        .collect();
    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }

    // Assert
    let published = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::Conflict(_))))
        .count();
    assert_eq!((published, conflicts), (1, 1), "results: {results:?}");

    let org = store_in(&temp).snapshot().await.unwrap();
    assert_eq!(org.revision, revision + 1);
    let departments = (
        org.user(UserId(7)).unwrap().department.as_deref(),
        org.user(UserId(8)).unwrap().department.as_deref(),
    );
    assert!(
        departments == (Some("Sales"), Some("Marketing"))
            || departments == (Some("Marketing"), Some("Support")),
        "exactly one draft applied, got {departments:?}"
    );
}

#[tokio::test]
async fn given_unknown_draft_when_saving_changes_then_returns_not_found() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    store.init().unwrap();
    let draft = Draft::new("ghost", 0).unwrap();

    let result = store.save_changes(draft.id, &[]).await;

    assert!(matches!(result, Err(StoreError::NotFound { kind: "draft", .. })));
}

#[tokio::test]
async fn given_corrupt_file_when_reading_then_returns_transport_error() {
    let temp = TempDir::new().unwrap();
    let store = store_in(&temp);
    store.init().unwrap();
    std::fs::write(store.path(), "{ not json").unwrap();

    let result = store.snapshot().await;

    assert!(matches!(result, Err(StoreError::Transport { .. })));
}

// ============================================================
// SessionFile
// ============================================================

#[test]
fn given_no_session_file_when_loading_then_returns_live() {
    let temp = TempDir::new().unwrap();
    let session = SessionFile::new(Arc::new(RealFileSystem), temp.path().join("session.toml"));

    assert_eq!(session.load().unwrap(), EditMode::Live);
}

#[test]
fn given_editing_mode_when_saving_then_loads_back_same_draft() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("nested").join("session.toml");
    let session = SessionFile::new(Arc::new(RealFileSystem), path.clone());
    let mode = EditMode::Editing(Draft::new("reorg", 0).unwrap().id);

    // Act
    session.save(mode).unwrap();

    // Assert
    assert!(RealFileSystem.exists(&path));
    assert_eq!(session.load().unwrap(), mode);
}

#[test]
fn given_file_when_writing_atomically_then_replaces_content() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("doc.json");
    std::fs::write(&path, "old").unwrap();

    RealFileSystem.write_atomic(&path, "new").unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
    assert_eq!(std::fs::read_dir(temp.path()).unwrap().count(), 1);
}
