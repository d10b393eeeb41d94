//! Tests for ForestBuilder

use orgdraft::domain::{DomainError, ForestBuilder, Role, User, UserId};

fn names(forest: &orgdraft::domain::OrgForest) -> Vec<String> {
    forest.iter().map(|(_, n)| n.user.name.clone()).collect()
}

#[test]
fn given_flat_directory_when_building_then_links_reports_below_supervisors() {
    // Arrange
    let users = vec![
        User::new(1, "Ada", Role::Admin),
        User::new(2, "Bob", Role::Supervisor).with_supervisor(1),
        User::new(3, "Cid", Role::Employee).with_supervisor(2),
        User::new(4, "Dee", Role::Employee).with_supervisor(2),
    ];

    // Act
    let forest = ForestBuilder::new().build(&users).unwrap();

    // Assert
    assert_eq!(forest.len(), 4);
    assert_eq!(forest.roots().len(), 1);
    assert_eq!(forest.depth(), 3);
    assert_eq!(names(&forest), vec!["Ada", "Bob", "Cid", "Dee"]);
    assert_eq!(forest.parent_of(UserId(3)).unwrap().user.id, UserId(2));
}

#[test]
fn given_users_listed_before_their_supervisor_when_building_then_order_does_not_matter() {
    // Arrange
    let users = vec![
        User::new(3, "Cid", Role::Employee).with_supervisor(2),
        User::new(2, "Bob", Role::Supervisor).with_supervisor(1),
        User::new(1, "Ada", Role::Admin),
    ];

    // Act
    let forest = ForestBuilder::new().build(&users).unwrap();

    // Assert
    assert_eq!(names(&forest), vec!["Ada", "Bob", "Cid"]);
}

#[test]
fn given_several_top_level_users_when_building_then_keeps_roots_in_input_order() {
    // Arrange
    let users = vec![
        User::new(5, "Eve", Role::Supervisor),
        User::new(1, "Ada", Role::Supervisor),
        User::new(6, "Fay", Role::Employee).with_supervisor(5),
    ];

    // Act
    let forest = ForestBuilder::new().build(&users).unwrap();

    // Assert
    let roots: Vec<_> = forest.root_users().iter().map(|u| u.id).collect();
    assert_eq!(roots, vec![UserId(5), UserId(1)]);
}

#[test]
fn given_duplicate_user_id_when_building_then_returns_duplicate_node() {
    let users = vec![
        User::new(1, "Ada", Role::Admin),
        User::new(1, "Ada again", Role::Admin),
    ];

    let result = ForestBuilder::new().build(&users);

    assert_eq!(result.unwrap_err(), DomainError::DuplicateNode(UserId(1)));
}

#[test]
fn given_dangling_supervisor_when_building_then_returns_unknown_supervisor() {
    let users = vec![User::new(2, "Bob", Role::Employee).with_supervisor(99)];

    let result = ForestBuilder::new().build(&users);

    assert_eq!(
        result.unwrap_err(),
        DomainError::UnknownSupervisor {
            user: UserId(2),
            supervisor: UserId(99)
        }
    );
}

#[test]
fn given_supervisor_cycle_when_building_then_returns_cycle_detected() {
    // Arrange: 2 and 3 report to each other, nobody reaches them from a root
    let users = vec![
        User::new(1, "Ada", Role::Admin),
        User::new(2, "Bob", Role::Supervisor).with_supervisor(3),
        User::new(3, "Cid", Role::Supervisor).with_supervisor(2),
    ];

    // Act
    let result = ForestBuilder::new().build(&users);

    // Assert
    assert!(matches!(result, Err(DomainError::CycleDetected(_))));
}

#[test]
fn given_empty_directory_when_building_then_returns_empty_forest() {
    let forest = ForestBuilder::new().build(&[]).unwrap();

    assert!(forest.is_empty());
    assert_eq!(forest.depth(), 0);
}

#[test]
fn given_very_deep_reporting_chain_when_building_then_traverses_without_recursion() {
    // Arrange
    const CHAIN: u64 = 100_000;
    let users: Vec<User> = (1..=CHAIN)
        .map(|id| {
            let user = User::new(id, format!("U{id}"), Role::Employee);
            if id == 1 {
                user
            } else {
                user.with_supervisor(id - 1)
            }
        })
        .collect();

    // Act
    let forest = ForestBuilder::new().build(&users).unwrap();

    // Assert
    assert_eq!(forest.depth(), CHAIN as usize);
    assert_eq!(forest.leaf_users(), vec![UserId(CHAIN)]);
    assert!(forest.is_descendant_of(UserId(CHAIN), UserId(1)));
    assert_eq!(forest.iter_postorder().count(), CHAIN as usize);
}
