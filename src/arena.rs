//! Index-addressed node storage for the treap
//!
//! Nodes live in a single `Vec` and refer to their children by index. Slots are
//! handed out monotonically and never reclaimed: a node detached from the tree
//! simply becomes unreachable, so every `NodeId` stays valid for the lifetime of
//! the arena.

use std::ops::{Index, IndexMut};

/// Stable index of a node inside a [`NodeArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index)
    }
}

/// A child slot: `None` means "no child"
pub type Link = Option<NodeId>;

/// A node in the treap
#[derive(Debug, Clone)]
pub struct Node<K> {
    pub key: K,
    pub priority: u32,
    /// Multiplicity of `key`
    pub count: usize,
    /// Elements in this subtree, duplicates included
    pub size: usize,
    pub left: Link,
    pub right: Link,
}

impl<K> Node<K> {
    fn new(key: K, priority: u32) -> Self {
        Node {
            key,
            priority,
            count: 1,
            size: 1,
            left: None,
            right: None,
        }
    }
}

/// Growable pool of treap nodes
#[derive(Debug, Clone)]
pub struct NodeArena<K> {
    nodes: Vec<Node<K>>,
}

impl<K> NodeArena<K> {
    pub fn new() -> Self {
        NodeArena { nodes: Vec::new() }
    }

    /// Create a leaf node holding one copy of `key` and return its index
    pub fn allocate(&mut self, key: K, priority: u32) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(key, priority));
        id
    }

    /// Number of slots ever allocated, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Subtree size behind a child slot
    pub fn size(&self, link: Link) -> usize {
        link.map_or(0, |id| self[id].size)
    }

    /// Recompute `size` of `id` from its children
    pub fn pull_up(&mut self, id: NodeId) {
        let node = &self[id];
        let size = self.size(node.left) + self.size(node.right) + node.count;
        self[id].size = size;
    }
}

impl<K> Default for NodeArena<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Index<NodeId> for NodeArena<K> {
    type Output = Node<K>;

    fn index(&self, id: NodeId) -> &Node<K> {
        &self.nodes[id.index()]
    }
}

impl<K> IndexMut<NodeId> for NodeArena<K> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<K> {
        &mut self.nodes[id.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_returns_stable_indices() {
        let mut arena = NodeArena::new();
        let a = arena.allocate(10, 7);
        let b = arena.allocate(20, 3);

        assert_ne!(a, b);
        assert_eq!(arena.len(), 2);
        assert_eq!(arena[a].key, 10);
        assert_eq!(arena[b].key, 20);
        assert_eq!(arena[a].priority, 7);
        assert_eq!(arena[a].count, 1);
        assert_eq!(arena[a].size, 1);
        assert!(arena[a].left.is_none() && arena[a].right.is_none());
    }

    #[test]
    fn test_pull_up() {
        let mut arena = NodeArena::new();
        let root = arena.allocate(5, 100);
        let left = arena.allocate(3, 50);
        let right = arena.allocate(8, 10);
        arena[left].count = 2;
        arena.pull_up(left);
        arena[root].left = Some(left);
        arena[root].right = Some(right);
        arena.pull_up(root);

        assert_eq!(arena[root].size, 4);
        assert_eq!(arena.size(None), 0);
        assert_eq!(arena.size(Some(left)), 2);
    }
}
