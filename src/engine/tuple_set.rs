//! Fixed-arity integer relations for table constraints.

use std::collections::HashSet;

/// A set of allowed tuples of a fixed arity.
///
/// Duplicates are dropped on insertion; insertion order is kept for
/// deterministic propagation.
///
/// # Examples
///
/// ```
/// use u_lotsizing::engine::TupleSet;
///
/// let mut t = TupleSet::new(2);
/// t.insert(&[0, 1]);
/// t.insert(&[0, 1]);
/// t.insert(&[-1, 3]);
/// assert_eq!(t.num_tuples(), 2);
/// assert!(t.contains(&[-1, 3]));
/// ```
#[derive(Debug, Clone)]
pub struct TupleSet {
    arity: usize,
    tuples: Vec<Vec<i64>>,
    index: HashSet<Vec<i64>>,
}

impl TupleSet {
    /// Creates an empty relation of the given arity.
    pub fn new(arity: usize) -> Self {
        Self {
            arity,
            tuples: Vec::new(),
            index: HashSet::new(),
        }
    }

    /// Tuple width.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Adds a tuple. Returns `false` for duplicates.
    ///
    /// # Panics
    ///
    /// Panics if the tuple width differs from the arity.
    pub fn insert(&mut self, tuple: &[i64]) -> bool {
        assert_eq!(tuple.len(), self.arity, "tuple arity mismatch");
        if !self.index.insert(tuple.to_vec()) {
            return false;
        }
        self.tuples.push(tuple.to_vec());
        true
    }

    /// Number of distinct tuples.
    pub fn num_tuples(&self) -> usize {
        self.tuples.len()
    }

    /// Returns `true` if the relation holds no tuple.
    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// Membership test.
    pub fn contains(&self, tuple: &[i64]) -> bool {
        self.index.contains(tuple)
    }

    /// Iterates the tuples in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &[i64]> {
        self.tuples.iter().map(Vec::as_slice)
    }
}
