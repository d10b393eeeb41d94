//! Tests for Draft, Change and PartialChange

use orgdraft::domain::{
    Change, DomainError, Draft, DraftStatus, EditMode, PartialChange, Role, SquadId, User, UserId,
};

fn gus() -> User {
    User::new(7, "Gus", Role::Employee)
        .with_supervisor(1)
        .with_department("Marketing")
        .with_squads([1])
}

#[test]
fn given_blank_name_when_creating_draft_then_fails() {
    assert_eq!(
        Draft::new("   ", 0).unwrap_err(),
        DomainError::InvalidDraftName(String::new())
    );
}

#[test]
fn given_name_when_creating_draft_then_starts_empty_and_open() {
    let draft = Draft::new(" Q3 reorg ", 4).unwrap();

    assert_eq!(draft.name, "Q3 reorg");
    assert_eq!(draft.status, DraftStatus::Draft);
    assert_eq!(draft.base_revision, 4);
    assert!(draft.changes.is_empty());
    assert!(draft.published_at.is_none());
}

#[test]
fn given_two_edits_of_same_user_when_upserting_then_keeps_one_merged_change() {
    // Arrange
    let mut draft = Draft::new("reorg", 0).unwrap();
    let user = gus();

    // Act
    draft
        .upsert_change(&user, PartialChange::department(Some("Sales".into())))
        .unwrap();
    draft
        .upsert_change(&user, PartialChange::role(Role::Supervisor))
        .unwrap();

    // Assert
    assert_eq!(draft.changes.len(), 1);
    let change = draft.change_for(UserId(7)).unwrap();
    assert_eq!(change.new.department, Some(Some("Sales".to_string())));
    assert_eq!(change.new.role, Some(Role::Supervisor));
    assert_eq!(change.changed_fields(), vec!["department", "role"]);
}

#[test]
fn given_user_changed_elsewhere_when_upserting_again_then_originals_come_from_first_edit() {
    // Arrange
    let mut draft = Draft::new("reorg", 0).unwrap();
    draft
        .upsert_change(&gus(), PartialChange::department(Some("Sales".into())))
        .unwrap();
    let mut later = gus();
    later.department = Some("Finance".into());

    // Act
    draft
        .upsert_change(&later, PartialChange::department(Some("Legal".into())))
        .unwrap();

    // Assert
    let change = draft.change_for(UserId(7)).unwrap();
    assert_eq!(change.original.department.as_deref(), Some("Marketing"));
    assert_eq!(change.new.department, Some(Some("Legal".to_string())));
}

#[test]
fn given_change_when_removing_then_draft_no_longer_contains_it() {
    let mut draft = Draft::new("reorg", 0).unwrap();
    draft
        .upsert_change(&gus(), PartialChange::role(Role::Admin))
        .unwrap();

    let removed = draft.remove_change(UserId(7)).unwrap();

    assert_eq!(removed.map(|c| c.user_id), Some(UserId(7)));
    assert!(draft.changes.is_empty());
    assert!(draft.remove_change(UserId(7)).unwrap().is_none());
}

#[test]
fn given_published_draft_when_upserting_then_fails() {
    let mut draft = Draft::new("reorg", 0).unwrap();
    draft.mark_published();

    let result = draft.upsert_change(&gus(), PartialChange::role(Role::Admin));

    assert!(matches!(result, Err(DomainError::DraftPublished(_))));
    assert!(draft.published_at.is_some());
}

#[test]
fn given_explicit_null_when_deserializing_partial_change_then_distinguishes_clear_from_absent() {
    // Act
    let cleared: PartialChange =
        serde_json::from_str(r#"{"supervisor_id": null, "department": null}"#).unwrap();
    let absent: PartialChange = serde_json::from_str("{}").unwrap();
    let set: PartialChange =
        serde_json::from_str(r#"{"supervisor_id": 3, "squad_ids": []}"#).unwrap();

    // Assert
    assert_eq!(cleared.supervisor_id, Some(None));
    assert_eq!(cleared.department, Some(None));
    assert!(absent.is_empty());
    assert_eq!(set.supervisor_id, Some(Some(UserId(3))));
    assert_eq!(set.squad_ids, Some(Default::default()));
}

#[test]
fn given_partial_change_when_serializing_then_omits_unproposed_fields() {
    let partial = PartialChange::supervisor(None);

    let json = serde_json::to_value(&partial).unwrap();

    assert_eq!(json, serde_json::json!({ "supervisor_id": null }));
}

#[test]
fn given_unchanged_values_when_listing_changed_fields_then_reports_none() {
    let change = Change::new(
        &gus(),
        PartialChange {
            supervisor_id: Some(Some(UserId(1))),
            department: Some(Some("Marketing".into())),
            role: Some(Role::Employee),
            squad_ids: Some([SquadId(1)].into_iter().collect()),
        },
    );

    assert!(change.changed_fields().is_empty());
    assert_eq!(change.supervisor_move(), None);
}

#[test]
fn given_cleared_supervisor_when_checking_move_then_targets_root() {
    let change = Change::new(&gus(), PartialChange::supervisor(None));

    assert_eq!(change.supervisor_move(), Some(None));
}

#[test]
fn given_edit_mode_when_serialized_then_uses_tagged_form() {
    let draft = Draft::new("reorg", 0).unwrap();
    let editing = EditMode::Editing(draft.id);

    let json = serde_json::to_value(editing).unwrap();
    let live = serde_json::to_value(EditMode::Live).unwrap();

    assert_eq!(json["mode"], "editing");
    assert_eq!(json["draft_id"], draft.id.to_string());
    assert_eq!(live, serde_json::json!({ "mode": "live" }));
    assert!(editing.is_editing(draft.id));
    assert_eq!(EditMode::default().active_draft(), None);
}
