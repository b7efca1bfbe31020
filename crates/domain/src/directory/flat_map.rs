use std::collections::{HashMap, HashSet};

use super::{DirectoryNode, GroupId};

/// Id-indexed arena of directory nodes.
///
/// Parent links are stored as ids; a parent id with no entry in the map is
/// treated as the top of the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatGroupMap {
    nodes: HashMap<GroupId, DirectoryNode>,
}

impl FlatGroupMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, replacing any node with the same id.
    pub fn insert(&mut self, node: DirectoryNode) {
        self.nodes.insert(node.id(), node);
    }

    /// Returns the node with the given id.
    #[must_use]
    pub fn get(&self, id: &GroupId) -> Option<&DirectoryNode> {
        self.nodes.get(id)
    }

    /// Returns whether the map holds a node with the given id.
    #[must_use]
    pub fn contains(&self, id: &GroupId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns whether the map is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterates nodes in arbitrary order.
    pub fn nodes(&self) -> impl Iterator<Item = &DirectoryNode> {
        self.nodes.values()
    }

    /// Returns node ids in arbitrary order.
    pub fn ids(&self) -> impl Iterator<Item = &GroupId> {
        self.nodes.keys()
    }

    /// Returns the node registered under `path`.
    #[must_use]
    pub fn find_by_path(&self, path: &str) -> Option<&DirectoryNode> {
        self.nodes.values().find(|node| node.path() == path)
    }

    /// Returns a copy of the map without hidden nodes.
    #[must_use]
    pub fn visible(&self) -> Self {
        self.filtered(|node| !node.is_hidden())
    }

    /// Returns a copy of the map holding only nodes matching the predicate.
    #[must_use]
    pub fn filtered<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&DirectoryNode) -> bool,
    {
        Self {
            nodes: self
                .nodes
                .iter()
                .filter(|(_, node)| predicate(node))
                .map(|(id, node)| (*id, node.clone()))
                .collect(),
        }
    }

    /// Returns the parent of a node, `None` when it is a root or dangling.
    #[must_use]
    pub fn parent_of(&self, node: &DirectoryNode) -> Option<&DirectoryNode> {
        node.parent_id().and_then(|parent_id| self.nodes.get(&parent_id))
    }

    /// Returns the direct children of a node.
    #[must_use]
    pub fn children_of(&self, id: &GroupId) -> Vec<&DirectoryNode> {
        let mut children: Vec<&DirectoryNode> = self
            .nodes
            .values()
            .filter(|node| node.parent_id().as_ref() == Some(id))
            .collect();
        children.sort_by(|left, right| left.path().cmp(right.path()));
        children
    }

    /// Returns the ancestor chain of a node, nearest first.
    ///
    /// Stops at the first parent missing from the map and never revisits a
    /// node, so cyclic parent links terminate.
    #[must_use]
    pub fn ancestors_of(&self, id: &GroupId) -> Vec<&DirectoryNode> {
        let mut ancestors = Vec::new();
        let mut visited = HashSet::from([*id]);
        let mut current = self.nodes.get(id).and_then(|node| node.parent_id());

        while let Some(parent_id) = current {
            if !visited.insert(parent_id) {
                break;
            }
            let Some(parent) = self.nodes.get(&parent_id) else {
                break;
            };
            ancestors.push(parent);
            current = parent.parent_id();
        }

        ancestors
    }

    /// Returns nodes sorted by path.
    #[must_use]
    pub fn sorted_by_path(&self) -> Vec<&DirectoryNode> {
        let mut nodes: Vec<&DirectoryNode> = self.nodes.values().collect();
        nodes.sort_by(|left, right| left.path().cmp(right.path()));
        nodes
    }

    /// Keeps only nodes matching the predicate.
    pub fn retain<F>(&mut self, mut predicate: F)
    where
        F: FnMut(&DirectoryNode) -> bool,
    {
        self.nodes.retain(|_, node| predicate(node));
    }

    /// Mutably iterates nodes in arbitrary order.
    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut DirectoryNode> {
        self.nodes.values_mut()
    }
}

impl FromIterator<DirectoryNode> for FlatGroupMap {
    fn from_iter<T: IntoIterator<Item = DirectoryNode>>(iter: T) -> Self {
        Self {
            nodes: iter.into_iter().map(|node| (node.id(), node)).collect(),
        }
    }
}

impl IntoIterator for FlatGroupMap {
    type Item = DirectoryNode;
    type IntoIter = std::collections::hash_map::IntoValues<GroupId, DirectoryNode>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_values()
    }
}
