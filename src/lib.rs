//! An order-statistics multiset built on a treap (randomized binary search tree).
//!
//! Besides insertion and removal of possibly repeated keys, the [`Treap`] answers
//! four queries in expected `O(log n)`:
//!
//! - [`Treap::rank_by_value`]: how many stored elements precede a value
//! - [`Treap::value_by_rank`]: which element sits at a given position
//! - [`Treap::find_prev`] / [`Treap::find_next`]: nearest stored neighbours
//!
//! Two sentinel values bracket the data. Queries without an answer return one of
//! them instead of failing, so callers compare against [`Treap::neg_infinity`] and
//! [`Treap::pos_infinity`].
//!
//! The [`command`] module implements the numbered text protocol used by the
//! `ordtreap` binary.

mod arena;
pub mod command;
mod treap;

#[cfg(test)]
mod proptests;

pub use crate::command::{parse_commands, run, Command, CommandError};
pub use crate::treap::{Bounded, Iter, Treap, TreapError};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Builder for constructing [`Treap`] instances with validation and defaults
///
/// # Examples
///
/// ```
/// use ordtreap::Treap;
///
/// // Full `i64` range as sentinels, priorities from entropy
/// let treap: Treap<i64> = Treap::<i64>::builder().build().unwrap();
///
/// // Custom sentinels and a reproducible shape
/// let mut treap: Treap<i64> = Treap::<i64>::builder()
///     .bounds(-2_000_000_010, 2_000_000_010)
///     .seed(42)
///     .build()
///     .unwrap();
/// treap.insert(3);
/// assert_eq!(treap.find_next(&3), 2_000_000_010);
/// ```
#[derive(Debug, Clone)]
pub struct TreapBuilder<K> {
    bounds: Option<(K, K)>,
    seed: Option<u64>,
}

impl<K: Bounded> TreapBuilder<K> {
    /// Create a new builder with default values
    pub fn new() -> Self {
        TreapBuilder {
            bounds: None,
            seed: None,
        }
    }

    /// Set the sentinel values
    ///
    /// `neg_inf` is returned when a predecessor does not exist, `pos_inf` when a
    /// successor or a rank does not exist. Neither value can be stored.
    /// Must satisfy `neg_inf < pos_inf`.
    pub fn bounds(mut self, neg_inf: K, pos_inf: K) -> Self {
        self.bounds = Some((neg_inf, pos_inf));
        self
    }

    /// Seed the priority generator, making the tree shape reproducible
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the treap with validation
    ///
    /// Uses the following defaults if not specified:
    /// - bounds: `K::MIN` and `K::MAX`
    /// - seed: drawn from the operating system's entropy source
    ///
    /// Returns an error if the bounds are not strictly ordered.
    pub fn build(self) -> Result<Treap<K, StdRng>, TreapError> {
        let (neg_inf, pos_inf) = self.bounds.unwrap_or((K::MIN, K::MAX));
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Treap::with_rng(neg_inf, pos_inf, rng)
    }
}

impl<K: Bounded> Default for TreapBuilder<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Bounded> Treap<K, StdRng> {
    /// Create a new builder for constructing treaps
    pub fn builder() -> TreapBuilder<K> {
        TreapBuilder::new()
    }
}
