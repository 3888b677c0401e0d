//! Random large neighbourhood destruction.
//!
//! Frees a fixed number of randomly chosen periods of `item[]`; the driver
//! re-optimizes them with a bounded inner search.

use rand::seq::index;
use rand::{Rng, RngCore};
use u_metaheur::alns::DestroyOperator;

use super::{Delta, NeighborhoodOperator};

/// An `item[]` array where some periods are open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialAssignment {
    slots: Vec<Option<usize>>,
}

impl PartialAssignment {
    /// Fully assigned copy of `items`.
    pub fn from_items(items: &[usize]) -> Self {
        Self {
            slots: items.iter().copied().map(Some).collect(),
        }
    }

    pub fn slots(&self) -> &[Option<usize>] {
        &self.slots
    }

    /// Periods left open.
    pub fn open_periods(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_none())
            .map(|(p, _)| p)
            .collect()
    }

    /// The open periods as a partial [`Delta`].
    pub fn to_delta(&self) -> Delta {
        let mut delta = Delta::new();
        for p in self.open_periods() {
            delta.release(p);
        }
        delta
    }
}

/// Frees `size` random periods per neighbour.
///
/// A pass ends after `pass_length` neighbours since the last
/// [`start`](NeighborhoodOperator::start).
///
/// # Examples
///
/// ```
/// use u_lotsizing::local_search::{NeighborhoodOperator, RandomLns};
///
/// let mut rng = u_numflow::random::create_rng(42);
/// let current: Vec<usize> = (0..20).collect();
/// let mut lns = RandomLns::new(10, 2);
/// lns.start(&current);
///
/// let delta = lns.next_neighbor(&current, &mut rng).unwrap();
/// assert!(delta.is_partial());
/// assert_eq!(delta.released().count(), 10);
/// assert!(lns.next_neighbor(&current, &mut rng).is_some());
/// assert!(lns.next_neighbor(&current, &mut rng).is_none());
/// ```
#[derive(Debug, Clone)]
pub struct RandomLns {
    size: usize,
    pass_length: usize,
    generated: usize,
}

impl RandomLns {
    pub fn new(size: usize, pass_length: usize) -> Self {
        Self {
            size,
            pass_length,
            generated: 0,
        }
    }

    /// Fraction of `n` periods covered by `size`.
    pub fn degree_for(&self, n: usize) -> f64 {
        if n == 0 {
            return 0.0;
        }
        (self.size as f64 / n as f64).min(1.0)
    }
}

impl DestroyOperator<PartialAssignment> for RandomLns {
    fn name(&self) -> &str {
        "random_lns"
    }

    fn destroy<R: Rng>(
        &self,
        solution: &PartialAssignment,
        degree: f64,
        rng: &mut R,
    ) -> PartialAssignment {
        let mut out = solution.clone();
        let n = out.slots.len();
        if n == 0 {
            return out;
        }
        let count = ((n as f64 * degree).round() as usize).clamp(1, n);
        for p in index::sample(rng, n, count) {
            out.slots[p] = None;
        }
        out
    }
}

impl NeighborhoodOperator for RandomLns {
    fn name(&self) -> &str {
        "random_lns"
    }

    fn start(&mut self, _current: &[usize]) {
        self.generated = 0;
    }

    fn next_neighbor(&mut self, current: &[usize], mut rng: &mut dyn RngCore) -> Option<Delta> {
        if self.generated >= self.pass_length || current.is_empty() {
            return None;
        }
        self.generated += 1;
        let degree = self.degree_for(current.len());
        let partial = self.destroy(&PartialAssignment::from_items(current), degree, &mut rng);
        Some(partial.to_delta())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use u_numflow::random::create_rng;

    #[test]
    fn test_destroy_frees_requested_share() {
        let mut rng = create_rng(1);
        let sol = PartialAssignment::from_items(&(0..15).collect::<Vec<_>>());
        let lns = RandomLns::new(10, 1);
        let out = lns.destroy(&sol, lns.degree_for(15), &mut rng);
        assert_eq!(out.open_periods().len(), 10);
        for (p, s) in out.slots().iter().enumerate() {
            if let Some(v) = s {
                assert_eq!(*v, p);
            }
        }
    }

    #[test]
    fn test_size_larger_than_array_frees_everything() {
        let mut rng = create_rng(1);
        let current: Vec<usize> = (0..6).collect();
        let mut lns = RandomLns::new(10, 5);
        let delta = lns.next_neighbor(&current, &mut rng).expect("neighbour");
        assert_eq!(delta.released().count(), 6);
    }

    #[test]
    fn test_at_least_one_period_is_freed() {
        let mut rng = create_rng(1);
        let sol = PartialAssignment::from_items(&[0, 1, 2]);
        let out = RandomLns::new(0, 1).destroy(&sol, 0.0, &mut rng);
        assert_eq!(out.open_periods().len(), 1);
    }

    #[test]
    fn test_pass_length_and_restart() {
        let mut rng = create_rng(3);
        let current: Vec<usize> = (0..12).collect();
        let mut lns = RandomLns::new(4, 3);
        let mut count = 0;
        while lns.next_neighbor(&current, &mut rng).is_some() {
            count += 1;
        }
        assert_eq!(count, 3);
        lns.start(&current);
        assert!(lns.next_neighbor(&current, &mut rng).is_some());
    }

    #[test]
    fn test_neighbours_differ() {
        let mut rng = create_rng(9);
        let current: Vec<usize> = (0..30).collect();
        let mut lns = RandomLns::new(5, 10);
        let a = lns.next_neighbor(&current, &mut rng).unwrap();
        let b = lns.next_neighbor(&current, &mut rng).unwrap();
        assert_ne!(a, b);
    }
}
