use std::collections::{BTreeSet, HashMap};

use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::entities::{User, UserId};
use crate::domain::error::{DomainError, DomainResult};

/// Raw, nested forest node as exchanged with collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgTreeNode {
    #[serde(flatten)]
    pub user: User,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<OrgTreeNode>,
}

impl OrgTreeNode {
    pub fn leaf(user: User) -> Self {
        Self {
            user,
            children: Vec::new(),
        }
    }

    pub fn with_children(user: User, children: Vec<OrgTreeNode>) -> Self {
        Self { user, children }
    }
}

/// Node in the arena-based reporting hierarchy.
#[derive(Debug, Clone)]
pub struct OrgNode {
    pub user: User,
    /// Index of the supervisor's node, None for root nodes
    pub parent: Option<Index>,
    /// Indices of direct reports, in display order
    pub children: Vec<Index>,
}

/// Arena-based forest of reporting hierarchies.
///
/// One or more root nodes; a supervisor's view is a single tree, an admin
/// view holds every top-level tree. Nodes are addressed by arena index and
/// looked up by user id in O(1) (`nodeById`); each node stores its parent
/// index (`parentById`).
///
/// Invariant: every user id appears exactly once.
#[derive(Debug, Clone, Default)]
pub struct OrgForest {
    arena: Arena<OrgNode>,
    roots: Vec<Index>,
    by_id: HashMap<UserId, Index>,
}

impl OrgForest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a forest (and its lookup maps) from raw nested nodes.
    #[instrument(level = "debug", skip(nodes), fields(roots = nodes.len()))]
    pub fn from_nodes(nodes: &[OrgTreeNode]) -> DomainResult<Self> {
        let mut forest = Self::new();
        let mut stack: Vec<(&OrgTreeNode, Option<Index>)> =
            nodes.iter().rev().map(|n| (n, None)).collect();

        while let Some((node, parent)) = stack.pop() {
            let mut user = node.user.clone();
            user.supervisor_id = parent
                .and_then(|p| forest.arena.get(p))
                .map(|p| p.user.id);
            let idx = forest.insert_node(user, parent)?;
            for child in node.children.iter().rev() {
                stack.push((child, Some(idx)));
            }
        }
        Ok(forest)
    }

    /// Insert a user below `parent` (or as a new root).
    #[instrument(level = "trace", skip(self, user), fields(user = %user.id))]
    pub fn insert_node(&mut self, user: User, parent: Option<Index>) -> DomainResult<Index> {
        if self.by_id.contains_key(&user.id) {
            return Err(DomainError::DuplicateNode(user.id));
        }
        let user_id = user.id;
        let node_idx = self.arena.insert(OrgNode {
            user,
            parent,
            children: Vec::new(),
        });
        self.by_id.insert(user_id, node_idx);

        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent_node) => parent_node.children.push(node_idx),
            None => {
                if let Some(node) = self.arena.get_mut(node_idx) {
                    node.parent = None;
                }
                self.roots.push(node_idx);
            }
        }
        Ok(node_idx)
    }

    pub fn get_node(&self, idx: Index) -> Option<&OrgNode> {
        self.arena.get(idx)
    }

    pub fn index_of(&self, user_id: UserId) -> Option<Index> {
        self.by_id.get(&user_id).copied()
    }

    pub fn node(&self, user_id: UserId) -> Option<&OrgNode> {
        self.index_of(user_id).and_then(|idx| self.arena.get(idx))
    }

    pub fn user(&self, user_id: UserId) -> Option<&User> {
        self.node(user_id).map(|n| &n.user)
    }

    pub fn user_mut(&mut self, user_id: UserId) -> Option<&mut User> {
        let idx = self.index_of(user_id)?;
        self.arena.get_mut(idx).map(|n| &mut n.user)
    }

    /// Supervisor node of a user; None for roots and unknown users.
    pub fn parent_of(&self, user_id: UserId) -> Option<&OrgNode> {
        self.node(user_id)
            .and_then(|n| n.parent)
            .and_then(|p| self.arena.get(p))
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.by_id.contains_key(&user_id)
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn root_users(&self) -> Vec<&User> {
        self.roots
            .iter()
            .filter_map(|&r| self.arena.get(r))
            .map(|n| &n.user)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn user_ids(&self) -> BTreeSet<UserId> {
        self.by_id.keys().copied().collect()
    }

    /// Id → display name lookup for every user in the forest.
    pub fn names(&self) -> HashMap<UserId, String> {
        self.arena
            .iter()
            .map(|(_, n)| (n.user.id, n.user.name.clone()))
            .collect()
    }

    /// Pre-order traversal over all trees, roots in order.
    pub fn iter(&self) -> ForestIterator<'_> {
        ForestIterator::new(self)
    }

    /// Post-order traversal over all trees, roots in order.
    pub fn iter_postorder(&self) -> PostOrderIterator<'_> {
        PostOrderIterator::new(self)
    }

    /// Depth of the deepest tree (a lone root has depth 1).
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut stack: Vec<(Index, usize)> = self.roots.iter().map(|&r| (r, 1)).collect();
        let mut deepest = 0;
        while let Some((idx, depth)) = stack.pop() {
            if let Some(node) = self.get_node(idx) {
                deepest = deepest.max(depth);
                stack.extend(node.children.iter().map(|&child| (child, depth + 1)));
            }
        }
        deepest
    }

    /// Users without direct reports.
    pub fn leaf_users(&self) -> Vec<UserId> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(_, node)| node.user.id)
            .collect()
    }

    /// True if `ancestor` lies on the path from `user` up to its root.
    pub fn is_descendant_of(&self, user: UserId, ancestor: UserId) -> bool {
        let Some(target) = self.index_of(ancestor) else {
            return false;
        };
        let mut current = self.node(user).and_then(|n| n.parent);
        let mut steps = 0;
        while let Some(idx) = current {
            if idx == target {
                return true;
            }
            // a detached cycle never reaches a root
            steps += 1;
            if steps > self.arena.len() {
                return false;
            }
            current = self.arena.get(idx).and_then(|n| n.parent);
        }
        false
    }

    /// Remove a node from its parent's children (or from the roots).
    ///
    /// The node keeps its own children; it is left without a parent.
    pub fn detach(&mut self, idx: Index) {
        let parent = self.arena.get(idx).and_then(|n| n.parent);
        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent_node) => parent_node.children.retain(|&c| c != idx),
            None => self.roots.retain(|&r| r != idx),
        }
        if let Some(node) = self.arena.get_mut(idx) {
            node.parent = None;
        }
    }

    /// Append a detached node below `parent`, or as an additional root.
    pub fn attach(&mut self, idx: Index, parent: Option<Index>) {
        let parent_id = parent.and_then(|p| self.arena.get(p)).map(|n| n.user.id);
        match parent.and_then(|p| self.arena.get_mut(p)) {
            Some(parent_node) => parent_node.children.push(idx),
            None => self.roots.push(idx),
        }
        if let Some(node) = self.arena.get_mut(idx) {
            node.parent = parent_id.and(parent);
            node.user.supervisor_id = parent_id;
        }
    }

    /// Ids of all nodes reachable from the roots.
    ///
    /// Has `len()` entries for a well-formed forest; fewer when some nodes
    /// form a detached cycle.
    pub fn reachable_ids(&self) -> BTreeSet<UserId> {
        self.iter().map(|(_, node)| node.user.id).collect()
    }

    /// Single-tree view rooted at `user_id` (a supervisor's own subtree).
    #[instrument(level = "debug", skip(self))]
    pub fn subtree(&self, user_id: UserId) -> DomainResult<OrgForest> {
        let root = self
            .index_of(user_id)
            .ok_or(DomainError::UnknownUser(user_id))?;
        let mut view = OrgForest::new();
        let mut stack = vec![(root, None)];
        while let Some((idx, parent)) = stack.pop() {
            let Some(node) = self.arena.get(idx) else {
                continue;
            };
            let mut user = node.user.clone();
            if parent.is_none() {
                user.supervisor_id = None;
            }
            let new_idx = view.insert_node(user, parent)?;
            for &child in node.children.iter().rev() {
                stack.push((child, Some(new_idx)));
            }
        }
        Ok(view)
    }

    /// Convert back into raw nested nodes.
    pub fn to_nodes(&self) -> Vec<OrgTreeNode> {
        // Post-order guarantees every child is built before its parent.
        let mut built: HashMap<Index, OrgTreeNode> = HashMap::with_capacity(self.len());
        for (idx, node) in self.iter_postorder() {
            let children = node
                .children
                .iter()
                .filter_map(|c| built.remove(c))
                .collect();
            built.insert(idx, OrgTreeNode::with_children(node.user.clone(), children));
        }
        self.roots
            .iter()
            .filter_map(|root| built.remove(root))
            .collect()
    }
}

pub struct ForestIterator<'a> {
    forest: &'a OrgForest,
    stack: Vec<Index>,
}

impl<'a> ForestIterator<'a> {
    fn new(forest: &'a OrgForest) -> Self {
        Self {
            forest,
            stack: forest.roots.iter().rev().copied().collect(),
        }
    }
}

impl<'a> Iterator for ForestIterator<'a> {
    type Item = (Index, &'a OrgNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a> {
    forest: &'a OrgForest,
    stack: Vec<(Index, bool)>,
}

impl<'a> PostOrderIterator<'a> {
    fn new(forest: &'a OrgForest) -> Self {
        Self {
            forest,
            stack: forest.roots.iter().rev().map(|&r| (r, false)).collect(),
        }
    }
}

impl<'a> Iterator for PostOrderIterator<'a> {
    type Item = (Index, &'a OrgNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.forest.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
