//! Constraint propagators.
//!
//! Every propagator narrows domains in the [`Store`] until its own
//! consistency level holds or a domain empties. Propagators may run many
//! times; they must be monotone and must not keep mutable state.

use std::collections::HashSet;
use std::fmt::Debug;
use std::sync::Arc;

use super::store::{Conflict, IntVar, Store};
use super::TupleSet;

/// A constraint that prunes variable domains.
pub trait Propagator: Debug {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Variables whose changes should wake this propagator.
    fn variables(&self) -> Vec<IntVar>;

    /// Prunes domains. Returns [`Conflict`] if the constraint cannot hold.
    fn propagate(&self, store: &mut Store) -> Result<(), Conflict>;
}

/// `left < right`.
#[derive(Debug, Clone, Copy)]
pub struct LessThan {
    left: IntVar,
    right: IntVar,
}

impl LessThan {
    pub fn new(left: IntVar, right: IntVar) -> Self {
        Self { left, right }
    }
}

impl Propagator for LessThan {
    fn name(&self) -> &str {
        "less_than"
    }

    fn variables(&self) -> Vec<IntVar> {
        vec![self.left, self.right]
    }

    fn propagate(&self, store: &mut Store) -> Result<(), Conflict> {
        let right_max = store.max(self.right);
        store.set_max(self.left, right_max.saturating_sub(1))?;
        let left_min = store.min(self.left);
        store.set_min(self.right, left_min.saturating_add(1))?;
        Ok(())
    }
}

/// The variables take the values of one tuple of the relation.
///
/// Enforces generalized arc consistency: after propagation every remaining
/// value of every variable belongs to at least one tuple whose values are all
/// still possible.
#[derive(Debug, Clone)]
pub struct AllowedAssignments {
    vars: Vec<IntVar>,
    tuples: Arc<TupleSet>,
}

impl AllowedAssignments {
    /// # Panics
    ///
    /// Panics if the number of variables differs from the relation arity.
    pub fn new(vars: Vec<IntVar>, tuples: Arc<TupleSet>) -> Self {
        assert_eq!(vars.len(), tuples.arity(), "table arity mismatch");
        Self { vars, tuples }
    }
}

impl Propagator for AllowedAssignments {
    fn name(&self) -> &str {
        "allowed_assignments"
    }

    fn variables(&self) -> Vec<IntVar> {
        self.vars.clone()
    }

    fn propagate(&self, store: &mut Store) -> Result<(), Conflict> {
        let mut supported: Vec<HashSet<i64>> = vec![HashSet::new(); self.vars.len()];
        for tuple in self.tuples.iter() {
            let alive = self
                .vars
                .iter()
                .zip(tuple)
                .all(|(&var, &value)| store.contains(var, value));
            if alive {
                for (support, &value) in supported.iter_mut().zip(tuple) {
                    support.insert(value);
                }
            }
        }
        for (&var, support) in self.vars.iter().zip(&supported) {
            store.retain(var, |v| support.contains(&v))?;
        }
        Ok(())
    }
}

/// `left[i] == j  <=>  right[j] == i` for all valid indices.
///
/// Both arrays end up as mutually inverse permutations of `0..n`.
#[derive(Debug, Clone)]
pub struct InversePermutation {
    left: Vec<IntVar>,
    right: Vec<IntVar>,
}

impl InversePermutation {
    /// # Panics
    ///
    /// Panics if the arrays differ in length.
    pub fn new(left: Vec<IntVar>, right: Vec<IntVar>) -> Self {
        assert_eq!(left.len(), right.len(), "inverse arrays differ in length");
        Self { left, right }
    }

    fn channel(store: &mut Store, from: &[IntVar], to: &[IntVar]) -> Result<(), Conflict> {
        let n = from.len() as i64;
        for (i, &var) in from.iter().enumerate() {
            let removals: Vec<i64> = store
                .domain(var)
                .iter()
                .filter(|&j| j < 0 || j >= n || !store.contains(to[j as usize], i as i64))
                .collect();
            store.remove_all(var, &removals)?;
            if let Some(j) = store.value(var) {
                store.assign(to[j as usize], i as i64)?;
            }
        }
        Ok(())
    }
}

impl Propagator for InversePermutation {
    fn name(&self) -> &str {
        "inverse_permutation"
    }

    fn variables(&self) -> Vec<IntVar> {
        self.left.iter().chain(&self.right).copied().collect()
    }

    fn propagate(&self, store: &mut Store) -> Result<(), Conflict> {
        Self::channel(store, &self.left, &self.right)?;
        Self::channel(store, &self.right, &self.left)
    }
}

/// `(x == a) <=> (y == b)`.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorEquality {
    x: IntVar,
    a: i64,
    y: IntVar,
    b: i64,
}

impl IndicatorEquality {
    pub fn new(x: IntVar, a: i64, y: IntVar, b: i64) -> Self {
        Self { x, a, y, b }
    }

    fn one_way(
        store: &mut Store,
        (x, a): (IntVar, i64),
        (y, b): (IntVar, i64),
    ) -> Result<(), Conflict> {
        if store.value(x) == Some(a) {
            store.assign(y, b)?;
        } else if !store.contains(x, a) {
            store.remove(y, b)?;
        }
        Ok(())
    }
}

impl Propagator for IndicatorEquality {
    fn name(&self) -> &str {
        "indicator_equality"
    }

    fn variables(&self) -> Vec<IntVar> {
        vec![self.x, self.y]
    }

    fn propagate(&self, store: &mut Store) -> Result<(), Conflict> {
        Self::one_way(store, (self.x, self.a), (self.y, self.b))?;
        Self::one_way(store, (self.y, self.b), (self.x, self.a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixpoint(store: &mut Store, p: &dyn Propagator) -> Result<(), Conflict> {
        loop {
            p.propagate(store)?;
            if store.take_modified().is_empty() {
                return Ok(());
            }
        }
    }

    #[test]
    fn test_less_than_bounds() {
        let mut store = Store::new();
        let x = store.new_var(0, 9, "x");
        let y = store.new_var(0, 5, "y");
        store.set_min(x, 2).unwrap();
        fixpoint(&mut store, &LessThan::new(x, y)).unwrap();
        assert_eq!((store.min(x), store.max(x)), (2, 4));
        assert_eq!((store.min(y), store.max(y)), (3, 5));
    }

    #[test]
    fn test_less_than_conflict() {
        let mut store = Store::new();
        let x = store.new_var(4, 4, "x");
        let y = store.new_var(0, 4, "y");
        assert_eq!(fixpoint(&mut store, &LessThan::new(x, y)), Err(Conflict));
    }

    #[test]
    fn test_table_is_arc_consistent() {
        let mut store = Store::new();
        let x = store.new_var(-1, 2, "x");
        let y = store.new_var(0, 3, "y");
        let mut t = TupleSet::new(2);
        t.insert(&[0, 0]);
        t.insert(&[1, 1]);
        t.insert(&[-1, 3]);
        let table = AllowedAssignments::new(vec![x, y], Arc::new(t));

        fixpoint(&mut store, &table).unwrap();
        assert_eq!(store.domain(x).iter().collect::<Vec<_>>(), vec![-1, 0, 1]);
        assert_eq!(store.domain(y).iter().collect::<Vec<_>>(), vec![0, 1, 3]);

        store.remove(y, 3).unwrap();
        fixpoint(&mut store, &table).unwrap();
        assert!(!store.contains(x, -1));

        store.assign(x, 1).unwrap();
        fixpoint(&mut store, &table).unwrap();
        assert_eq!(store.value(y), Some(1));
    }

    #[test]
    fn test_inverse_permutation_channels() {
        let mut store = Store::new();
        let left: Vec<_> = (0..3).map(|i| store.new_var(0, 5, format!("l{i}"))).collect();
        let right: Vec<_> = (0..3).map(|i| store.new_var(0, 2, format!("r{i}"))).collect();
        let inverse = InversePermutation::new(left.clone(), right.clone());

        fixpoint(&mut store, &inverse).unwrap();
        assert_eq!(store.max(left[0]), 2);

        store.assign(left[0], 2).unwrap();
        fixpoint(&mut store, &inverse).unwrap();
        assert_eq!(store.value(right[2]), Some(0));
        assert!(!store.contains(left[1], 2));
        assert!(!store.contains(right[0], 0));

        store.assign(right[0], 1).unwrap();
        fixpoint(&mut store, &inverse).unwrap();
        assert_eq!(store.value(left[1]), Some(0));
        assert_eq!(store.value(left[2]), Some(1));
        assert_eq!(store.value(right[1]), Some(2));
    }

    #[test]
    fn test_inverse_permutation_conflict() {
        let mut store = Store::new();
        let left: Vec<_> = (0..2).map(|i| store.new_var(0, 1, format!("l{i}"))).collect();
        let right: Vec<_> = (0..2).map(|i| store.new_var(0, 1, format!("r{i}"))).collect();
        store.assign(left[0], 0).unwrap();
        store.assign(left[1], 0).unwrap();
        let inverse = InversePermutation::new(left, right);
        assert_eq!(fixpoint(&mut store, &inverse), Err(Conflict));
    }

    #[test]
    fn test_indicator_equality() {
        let mut store = Store::new();
        let state = store.new_var(-1, 2, "state");
        let product = store.new_var(-1, 2, "product");
        let rule = IndicatorEquality::new(state, -1, product, -1);

        store.remove(product, -1).unwrap();
        fixpoint(&mut store, &rule).unwrap();
        assert!(!store.contains(state, -1));

        let mut store = Store::new();
        let state = store.new_var(-1, 2, "state");
        let product = store.new_var(-1, 2, "product");
        store.assign(state, -1).unwrap();
        fixpoint(&mut store, &IndicatorEquality::new(state, -1, product, -1)).unwrap();
        assert_eq!(store.value(product), Some(-1));
    }
}
