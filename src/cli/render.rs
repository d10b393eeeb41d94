//! Tree rendering with termtree.

use std::collections::HashMap;

use colored::Colorize;
use generational_arena::Index;
use itertools::Itertools;
use termtree::Tree;

use crate::domain::{NodeAnnotation, OrgForest, Projection, SquadCatalog, User};

/// Render every tree of the forest; one `Tree` per root.
pub fn render_forest(forest: &OrgForest, catalog: &SquadCatalog) -> Vec<Tree<String>> {
    render_trees(forest, catalog, None)
}

/// Render a projection, marking nodes touched by the draft.
pub fn render_projection(projection: &Projection, catalog: &SquadCatalog) -> Vec<Tree<String>> {
    render_trees(&projection.forest, catalog, Some(projection))
}

fn render_trees(
    forest: &OrgForest,
    catalog: &SquadCatalog,
    projection: Option<&Projection>,
) -> Vec<Tree<String>> {
    let mut built: HashMap<Index, Tree<String>> = HashMap::with_capacity(forest.len());
    for (idx, node) in forest.iter_postorder() {
        let annotation = projection.and_then(|p| p.annotation(node.user.id));
        let leaves: Vec<_> = node
            .children
            .iter()
            .filter_map(|child| built.remove(child))
            .collect();
        built.insert(
            idx,
            Tree::new(label(&node.user, catalog, annotation)).with_leaves(leaves),
        );
    }
    forest
        .roots()
        .iter()
        .filter_map(|root| built.remove(root))
        .collect()
}

fn label(user: &User, catalog: &SquadCatalog, annotation: Option<&NodeAnnotation>) -> String {
    let mut parts = vec![format!("{} {}", user.name.bold(), user.id.to_string().dimmed())];
    parts.push(format!("[{}]", user.role));
    if let Some(department) = &user.department {
        parts.push(department.clone());
    }
    let squads = catalog.resolve_names(&user.squad_ids);
    if !squads.is_empty() {
        parts.push(format!("{{{}}}", squads.iter().join(", ")));
    }

    let mut text = parts.join(" ");
    if let Some(annotation) = annotation {
        let mut marks = annotation.changed_fields.clone();
        if annotation.moved && !marks.contains(&"supervisor") {
            marks.insert(0, "supervisor");
        }
        if !marks.is_empty() {
            text.push_str(&format!(" {}", format!("* {}", marks.join(", ")).yellow()));
        }
    }
    text
}
