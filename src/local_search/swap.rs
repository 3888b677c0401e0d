//! Pairwise exchange of two periods' slots.

use rand::RngCore;

use super::{Delta, NeighborhoodOperator};

/// Restartable iterator over the unordered index pairs `(i, j)`, `i < j`,
/// of `0..n`.
///
/// The inner index advances first; when it runs past the end the outer
/// index moves on and the inner one restarts right after it. Every pair
/// comes exactly once per pass, so a pass has `n·(n-1)/2` pairs.
///
/// # Examples
///
/// ```
/// use u_lotsizing::local_search::PairIter;
///
/// let pairs: Vec<_> = PairIter::new(4).collect();
/// assert_eq!(pairs, vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
/// assert_eq!(PairIter::new(1).count(), 0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairIter {
    n: usize,
    outer: usize,
    inner: usize,
}

impl PairIter {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            outer: 0,
            inner: 1,
        }
    }

    /// Starts a new pass from `(0, 1)`.
    pub fn restart(&mut self) {
        self.outer = 0;
        self.inner = 1;
    }
}

impl Iterator for PairIter {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<(usize, usize)> {
        if self.outer + 1 >= self.n {
            return None;
        }
        let pair = (self.outer, self.inner);
        self.inner += 1;
        if self.inner >= self.n {
            self.outer += 1;
            self.inner = self.outer + 1;
        }
        Some(pair)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.outer + 1 >= self.n {
            return (0, Some(0));
        }
        let rows_after = self.n - self.outer - 1;
        let rest = (self.n - self.inner) + rows_after * (rows_after - 1) / 2;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for PairIter {}

/// Exchanges `item[i]` and `item[j]` for every pair of periods.
#[derive(Debug, Clone)]
pub struct SwapOperator {
    pairs: PairIter,
}

impl SwapOperator {
    pub fn new(num_periods: usize) -> Self {
        Self {
            pairs: PairIter::new(num_periods),
        }
    }
}

impl NeighborhoodOperator for SwapOperator {
    fn name(&self) -> &str {
        "swap"
    }

    fn start(&mut self, current: &[usize]) {
        self.pairs = PairIter::new(current.len());
    }

    fn next_neighbor(&mut self, current: &[usize], _rng: &mut dyn RngCore) -> Option<Delta> {
        let (i, j) = self.pairs.next()?;
        let mut delta = Delta::new();
        delta.assign(i, current[j]);
        delta.assign(j, current[i]);
        Some(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;
    use u_numflow::random::create_rng;

    #[test]
    fn test_swap_exchanges_values() {
        let mut op = SwapOperator::new(3);
        let current = [2, 0, 1];
        let mut rng = create_rng(0);
        op.start(&current);
        let d = op.next_neighbor(&current, &mut rng).unwrap();
        assert_eq!(d.apply(&current), Some(vec![0, 2, 1]));
        let d = op.next_neighbor(&current, &mut rng).unwrap();
        assert_eq!(d.apply(&current), Some(vec![1, 0, 2]));
        let d = op.next_neighbor(&current, &mut rng).unwrap();
        assert_eq!(d.apply(&current), Some(vec![2, 1, 0]));
        assert!(op.next_neighbor(&current, &mut rng).is_none());
    }

    #[test]
    fn test_restart() {
        let mut it = PairIter::new(3);
        assert_eq!(it.by_ref().count(), 3);
        assert_eq!(it.next(), None);
        it.restart();
        assert_eq!(it.next(), Some((0, 1)));
        assert_eq!(it.len(), 2);
    }

    #[test]
    fn test_no_move_for_tiny_arrays() {
        let mut rng = create_rng(0);
        for n in 0..=1 {
            let current: Vec<usize> = (0..n).collect();
            let mut op = SwapOperator::new(n);
            op.start(&current);
            assert!(op.next_neighbor(&current, &mut rng).is_none());
        }
    }

    proptest! {
        #[test]
        fn prop_each_pair_exactly_once(n in 0usize..40) {
            let pairs: Vec<_> = PairIter::new(n).collect();
            prop_assert_eq!(pairs.len(), n * n.saturating_sub(1) / 2);
            let unique: HashSet<_> = pairs.iter().copied().collect();
            prop_assert_eq!(unique.len(), pairs.len());
            prop_assert!(pairs.iter().all(|&(i, j)| i < j && j < n));
        }

        #[test]
        fn prop_size_hint_is_exact(n in 0usize..30, skip in 0usize..50) {
            let mut it = PairIter::new(n);
            for _ in 0..skip {
                it.next();
            }
            let expected = it.clone().count();
            prop_assert_eq!(it.size_hint(), (expected, Some(expected)));
        }
    }
}
