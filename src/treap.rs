//! A randomized binary search tree (treap) over a multiset of ordered keys
//!
//! A treap maintains both BST property (for keys) and heap property (for priorities).
//! Every node also carries a duplicate counter and the number of elements in its
//! subtree, which is what makes rank and select queries logarithmic.
//!
//! ## Layout
//!
//! Nodes are stored in a [`NodeArena`] and refer to their children by index. A
//! rotation never rewires pointers: it returns the index of the new subtree root,
//! and the caller writes that index back into the parent's child slot.
//!
//! ## Sentinels
//!
//! Two permanent nodes holding the lower and upper bound bracket the real data.
//! They are allocated at construction with the maximum priority, so no inserted
//! node can ever rotate above them: the lower sentinel is always the root, the
//! upper sentinel is always its right child, and the real keys form an ordinary
//! treap in the upper sentinel's left subtree. Queries that have no answer return
//! one of the two bounds.
//!
//! ## Randomness
//!
//! Priorities are drawn from a generator owned by the treap. Any [`rand::Rng`] can
//! be supplied, so tests can seed it and get the same shapes on every run.

use crate::arena::{Link, NodeArena, NodeId};
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::fmt::Debug;
use thiserror::Error;

/// Priority given to both sentinels; ties never trigger a rotation
const SENTINEL_PRIORITY: u32 = u32::MAX;

/// Errors raised while configuring a treap
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreapError {
    #[error("lower bound {lower} must be strictly below upper bound {upper}")]
    InvalidBounds { lower: String, upper: String },
}

/// Scalar key types with natural lower and upper bounds
///
/// The bounds are the default sentinel values of [`Treap::new`].
pub trait Bounded: Ord + Copy + Debug {
    const MIN: Self;
    const MAX: Self;
}

macro_rules! impl_bounded {
    ($($t:ty),*) => {
        $(
            impl Bounded for $t {
                const MIN: Self = <$t>::MIN;
                const MAX: Self = <$t>::MAX;
            }
        )*
    };
}

impl_bounded!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

/// An order-statistics multiset
///
/// Keys equal to either sentinel cannot be stored: [`Treap::insert`] and
/// [`Treap::remove`] ignore them.
#[derive(Debug, Clone)]
pub struct Treap<K, R = StdRng> {
    arena: NodeArena<K>,
    root: Link,
    neg_inf: K,
    pos_inf: K,
    rng: R,
}

impl<K: Bounded> Treap<K, StdRng> {
    /// Create an empty treap using the full range of `K` as sentinels
    pub fn new() -> Self {
        Self::from_parts(K::MIN, K::MAX, StdRng::from_entropy())
    }
}

impl<K: Bounded> Default for Treap<K, StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Copy + Debug, R: Rng> Treap<K, R> {
    /// Create an empty treap with explicit sentinels and priority generator
    ///
    /// Returns an error unless `neg_inf < pos_inf`.
    pub fn with_rng(neg_inf: K, pos_inf: K, rng: R) -> Result<Self, TreapError> {
        if neg_inf >= pos_inf {
            return Err(TreapError::InvalidBounds {
                lower: format!("{neg_inf:?}"),
                upper: format!("{pos_inf:?}"),
            });
        }
        Ok(Self::from_parts(neg_inf, pos_inf, rng))
    }

    pub(crate) fn from_parts(neg_inf: K, pos_inf: K, rng: R) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.allocate(neg_inf, SENTINEL_PRIORITY);
        let upper = arena.allocate(pos_inf, SENTINEL_PRIORITY);
        arena[root].right = Some(upper);
        arena.pull_up(root);
        debug!("treap initialised with sentinels {neg_inf:?} and {pos_inf:?}");
        Treap {
            arena,
            root: Some(root),
            neg_inf,
            pos_inf,
            rng,
        }
    }

    /// The lower sentinel, returned when no predecessor exists
    pub fn neg_infinity(&self) -> K {
        self.neg_inf
    }

    /// The upper sentinel, returned when no successor or no such rank exists
    pub fn pos_infinity(&self) -> K {
        self.pos_inf
    }

    /// Number of stored elements, duplicates included and sentinels excluded
    pub fn len(&self) -> usize {
        self.arena.size(self.root) - 2
    }

    /// Check if the treap holds no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of arena slots ever allocated, sentinels and detached nodes included
    pub fn allocated_nodes(&self) -> usize {
        self.arena.len()
    }

    /// Check if the treap contains a key
    pub fn contains(&self, key: &K) -> bool {
        self.count(key) > 0
    }

    /// Multiplicity of `key`
    pub fn count(&self, key: &K) -> usize {
        if self.is_sentinel(key) {
            return 0;
        }
        self.find(key).map_or(0, |id| self.arena[id].count)
    }

    /// Add one copy of `key`
    pub fn insert(&mut self, key: K) {
        if self.is_sentinel(&key) {
            warn!("ignoring insert of sentinel value {key:?}");
            return;
        }
        let root = self.root;
        let root = self.insert_node(root, key);
        self.root = Some(root);
    }

    /// Remove one copy of `key`, returning whether it was present
    pub fn remove(&mut self, key: &K) -> bool {
        if self.is_sentinel(key) {
            warn!("ignoring removal of sentinel value {key:?}");
            return false;
        }
        let root = self.root;
        let (root, removed) = self.remove_node(root, key);
        self.root = root;
        removed
    }

    /// 1-based rank of `key`: the number of stored elements strictly less than it, plus one
    ///
    /// Subtract one to get the count of smaller elements. The lower sentinel fills the
    /// "plus one", so the descent simply sums every element passed on the left.
    pub fn rank_by_value(&self, key: &K) -> usize {
        let mut rank = 0;
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.arena[id];
            match key.cmp(&node.key) {
                Ordering::Equal => return rank + self.arena.size(node.left),
                Ordering::Less => cur = node.left,
                Ordering::Greater => {
                    rank += self.arena.size(node.left) + node.count;
                    cur = node.right;
                }
            }
        }
        rank
    }

    /// The key of 1-based rank `rank`, with the lower sentinel at rank 1
    ///
    /// Real elements occupy ranks `2..=len() + 1`. Any rank that falls off the tree,
    /// including 0, yields the upper sentinel.
    pub fn value_by_rank(&self, mut rank: usize) -> K {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.arena[id];
            let left = self.arena.size(node.left);
            if left >= rank {
                cur = node.left;
            } else if left + node.count >= rank {
                return node.key;
            } else {
                rank -= left + node.count;
                cur = node.right;
            }
        }
        self.pos_inf
    }

    /// Largest stored key strictly less than `key`, or the lower sentinel
    pub fn find_prev(&self, key: &K) -> K {
        let mut best = self.neg_inf;
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.arena[id];
            if node.key < *key {
                best = node.key;
                cur = node.right;
            } else {
                cur = node.left;
            }
        }
        best
    }

    /// Smallest stored key strictly greater than `key`, or the upper sentinel
    pub fn find_next(&self, key: &K) -> K {
        let mut best = self.pos_inf;
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.arena[id];
            if node.key > *key {
                best = node.key;
                cur = node.left;
            } else {
                cur = node.right;
            }
        }
        best
    }

    /// Iterate over the stored keys in ascending order, repeating duplicates
    pub fn iter(&self) -> Iter<'_, K> {
        let mut iter = Iter {
            arena: &self.arena,
            stack: Vec::new(),
            current: None,
            neg_inf: self.neg_inf,
            pos_inf: self.pos_inf,
        };
        iter.push_left(self.root);
        iter
    }

    /// Verify every structural invariant, describing the first violation found
    pub fn check_invariants(&self) -> Result<(), String> {
        let Some(root) = self.root else {
            return Err("tree lost its root".to_string());
        };
        self.check_node(root, None, None)?;
        if self.find(&self.neg_inf) != Some(root) {
            return Err(format!("lower sentinel {:?} is not the root", self.neg_inf));
        }
        for sentinel in [self.neg_inf, self.pos_inf] {
            match self.find(&sentinel) {
                Some(id) if self.arena[id].count == 1 => {}
                _ => {
                    return Err(format!("sentinel {sentinel:?} is missing or duplicated"));
                }
            }
        }
        if self.find_prev(&self.neg_inf) != self.neg_inf
            || self.find_next(&self.pos_inf) != self.pos_inf
        {
            return Err("sentinels do not bracket the stored keys".to_string());
        }
        Ok(())
    }

    // Returns the subtree size, after checking order, heap and size invariants
    fn check_node(
        &self,
        id: NodeId,
        lower: Option<K>,
        upper: Option<K>,
    ) -> Result<usize, String> {
        let node = &self.arena[id];
        if lower.is_some_and(|lo| node.key <= lo) || upper.is_some_and(|hi| node.key >= hi) {
            return Err(format!("key {:?} breaks search order", node.key));
        }
        if node.count == 0 {
            return Err(format!("reachable node {:?} has a zero count", node.key));
        }
        let mut size = node.count;
        for child in [node.left, node.right].into_iter().flatten() {
            if self.arena[child].priority > node.priority {
                return Err(format!(
                    "child {:?} outranks parent {:?}",
                    self.arena[child].key, node.key
                ));
            }
        }
        if let Some(left) = node.left {
            size += self.check_node(left, lower, Some(node.key))?;
        }
        if let Some(right) = node.right {
            size += self.check_node(right, Some(node.key), upper)?;
        }
        if size != node.size {
            return Err(format!(
                "node {:?} records size {} but holds {}",
                node.key, node.size, size
            ));
        }
        Ok(size)
    }

    fn is_sentinel(&self, key: &K) -> bool {
        *key == self.neg_inf || *key == self.pos_inf
    }

    fn find(&self, key: &K) -> Option<NodeId> {
        let mut cur = self.root;
        while let Some(id) = cur {
            let node = &self.arena[id];
            match key.cmp(&node.key) {
                Ordering::Less => cur = node.left,
                Ordering::Greater => cur = node.right,
                Ordering::Equal => return Some(id),
            }
        }
        None
    }

    // Insert below `link` and return the (possibly rotated) subtree root
    fn insert_node(&mut self, link: Link, key: K) -> NodeId {
        let Some(id) = link else {
            let priority = self.rng.gen();
            return self.arena.allocate(key, priority);
        };
        let id = match key.cmp(&self.arena[id].key) {
            Ordering::Equal => {
                self.arena[id].count += 1;
                id
            }
            Ordering::Less => {
                let left = self.arena[id].left;
                let left = self.insert_node(left, key);
                self.arena[id].left = Some(left);
                // Maintain heap property
                if self.arena[left].priority > self.arena[id].priority {
                    self.zig(id, left)
                } else {
                    id
                }
            }
            Ordering::Greater => {
                let right = self.arena[id].right;
                let right = self.insert_node(right, key);
                self.arena[id].right = Some(right);
                // Maintain heap property
                if self.arena[right].priority > self.arena[id].priority {
                    self.zag(id, right)
                } else {
                    id
                }
            }
        };
        self.arena.pull_up(id);
        id
    }

    // Remove one copy of `key` below `link`; returns the new subtree root
    fn remove_node(&mut self, link: Link, key: &K) -> (Link, bool) {
        let Some(id) = link else {
            return (None, false);
        };
        let (link, removed) = match key.cmp(&self.arena[id].key) {
            Ordering::Less => {
                let left = self.arena[id].left;
                let (left, removed) = self.remove_node(left, key);
                self.arena[id].left = left;
                (Some(id), removed)
            }
            Ordering::Greater => {
                let right = self.arena[id].right;
                let (right, removed) = self.remove_node(right, key);
                self.arena[id].right = right;
                (Some(id), removed)
            }
            Ordering::Equal => {
                let node = &self.arena[id];
                let (count, left, right) = (node.count, node.left, node.right);
                if count > 1 {
                    self.arena[id].count -= 1;
                    (Some(id), true)
                } else {
                    match (left, right) {
                        // Leaf: detach, the slot stays allocated but unreachable
                        (None, None) => return (None, true),
                        (Some(child), None) => self.sink_right_of(id, child, key),
                        (None, Some(child)) => self.sink_left_of(id, child, key),
                        (Some(l), Some(r)) => {
                            if self.arena[l].priority > self.arena[r].priority {
                                self.sink_right_of(id, l, key)
                            } else {
                                self.sink_left_of(id, r, key)
                            }
                        }
                    }
                }
            }
        };
        if let Some(id) = link {
            self.arena.pull_up(id);
        }
        (link, removed)
    }

    // Lift the left child `top` over `id`, which lands in `top`'s right subtree,
    // then keep removing there
    fn sink_right_of(&mut self, id: NodeId, top: NodeId, key: &K) -> (Link, bool) {
        let top = self.zig(id, top);
        let right = self.arena[top].right;
        let (right, removed) = self.remove_node(right, key);
        self.arena[top].right = right;
        (Some(top), removed)
    }

    // Mirror of `sink_right_of` for the right child
    fn sink_left_of(&mut self, id: NodeId, top: NodeId, key: &K) -> (Link, bool) {
        let top = self.zag(id, top);
        let left = self.arena[top].left;
        let (left, removed) = self.remove_node(left, key);
        self.arena[top].left = left;
        (Some(top), removed)
    }

    // Rotate right: the left child `top` becomes the subtree root
    fn zig(&mut self, id: NodeId, top: NodeId) -> NodeId {
        let inner = self.arena[top].right;
        self.arena[id].left = inner;
        self.arena[top].right = Some(id);
        self.arena.pull_up(id);
        self.arena.pull_up(top);
        top
    }

    // Rotate left: the right child `top` becomes the subtree root
    fn zag(&mut self, id: NodeId, top: NodeId) -> NodeId {
        let inner = self.arena[top].left;
        self.arena[id].right = inner;
        self.arena[top].left = Some(id);
        self.arena.pull_up(id);
        self.arena.pull_up(top);
        top
    }
}

/// In-order iterator over a [`Treap`], see [`Treap::iter`]
pub struct Iter<'a, K> {
    arena: &'a NodeArena<K>,
    stack: Vec<NodeId>,
    current: Option<(K, usize)>,
    neg_inf: K,
    pos_inf: K,
}

impl<K: Copy + PartialEq> Iter<'_, K> {
    fn push_left(&mut self, mut link: Link) {
        while let Some(id) = link {
            self.stack.push(id);
            link = self.arena[id].left;
        }
    }
}

impl<K: Copy + PartialEq> Iterator for Iter<'_, K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        loop {
            if let Some((key, remaining)) = self.current.as_mut() {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Some(*key);
                }
            }
            let id = self.stack.pop()?;
            let arena = self.arena;
            let node = &arena[id];
            self.push_left(node.right);
            self.current = if node.key == self.neg_inf || node.key == self.pos_inf {
                None
            } else {
                Some((node.key, node.count))
            };
        }
    }
}

impl<'a, K: Ord + Copy + Debug, R: Rng> IntoIterator for &'a Treap<K, R> {
    type Item = K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}
