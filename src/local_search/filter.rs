//! Incremental objective filtering of candidate moves.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::evaluation::{next_active, ScheduleEvaluator};
use crate::models::Production;

use super::{Delta, SlotChange};

/// Rejects candidates before the solver has to check them.
pub trait NeighborhoodFilter {
    fn name(&self) -> &str;

    /// Makes `items` the new reference assignment.
    fn synchronize(&mut self, items: &[usize]);

    /// Returns `true` if `delta` may be worth trying.
    fn accept(&mut self, delta: &Delta) -> bool;
}

impl fmt::Debug for dyn NeighborhoodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NeighborhoodFilter({})", self.name())
    }
}

/// Call counters of a filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStatistics {
    called: u64,
    accepted: u64,
}

impl FilterStatistics {
    #[inline]
    pub fn called(&self) -> u64 {
        self.called
    }

    #[inline]
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    #[inline]
    pub fn rejected(&self) -> u64 {
        self.called.saturating_sub(self.accepted)
    }

    #[inline]
    fn record_call(&mut self, accepted: bool) {
        self.called += 1;
        if accepted {
            self.accepted += 1;
        }
    }
}

impl fmt::Display for FilterStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FilterStatistics{{ called: {}, accepted: {}, rejected: {} }}",
            self.called,
            self.accepted,
            self.rejected()
        )
    }
}

/// Accepts a complete move only if it strictly lowers the objective.
///
/// Keeps a shadow copy of the current `item[]` and of what every period
/// produces. A move's cost is updated from the periods it touches plus the
/// next active period after each of them (before and after the move),
/// since only those changeovers can change. Moves that release periods
/// are passed on unchecked.
///
/// Ordering between items of the same product is not checked here; the
/// solver rejects such moves.
///
/// # Examples
///
/// ```
/// use u_lotsizing::local_search::{CostFilter, Delta, NeighborhoodFilter};
/// use u_lotsizing::models::Instance;
///
/// let inst = Instance::new(3, 2, 1, vec![vec![2], vec![2]], vec![vec![0, 5], vec![5, 0]])
///     .unwrap();
/// let mut filter = CostFilter::new(&inst);
/// // idle, product 0, product 1: earliness 1, one switch
/// filter.synchronize(&[2, 0, 1]);
/// assert_eq!(filter.current_cost(), Some(1 + 5));
///
/// // product 1, product 0, idle: pays earliness 2 + 1
/// let mut worse = Delta::new();
/// worse.assign(0, 1);
/// worse.assign(1, 0);
/// worse.assign(2, 2);
/// assert!(!filter.accept(&worse));
/// ```
#[derive(Debug, Clone)]
pub struct CostFilter<'a> {
    evaluator: ScheduleEvaluator<'a>,
    items: Vec<usize>,
    products: Vec<Production>,
    cost: Option<i64>,
    statistics: FilterStatistics,
}

impl<'a> CostFilter<'a> {
    pub fn new(instance: &'a crate::models::Instance) -> Self {
        Self {
            evaluator: ScheduleEvaluator::new(instance),
            items: Vec::new(),
            products: Vec::new(),
            cost: None,
            statistics: FilterStatistics::default(),
        }
    }

    /// Cost of the reference assignment; `None` before the first
    /// synchronization or if it is late somewhere.
    pub fn current_cost(&self) -> Option<i64> {
        self.cost
    }

    pub fn statistics(&self) -> &FilterStatistics {
        &self.statistics
    }

    /// Full objective of `items` from scratch, ignoring same-product order.
    pub fn full_cost(&self, items: &[usize]) -> Option<i64> {
        let products: Vec<Production> =
            items.iter().map(|&s| self.evaluator.production_of(s)).collect();
        let mut total = 0;
        for (period, &slot) in items.iter().enumerate() {
            total += self.evaluator.inventory_term(slot, period)?;
            total += self.evaluator.transition_term(&products, period);
        }
        Some(total)
    }

    /// Cost after a complete `delta`, computed incrementally.
    ///
    /// `None` if the delta is partial, if a real item would be late, or if
    /// there is no reference cost.
    pub fn evaluate(&mut self, delta: &Delta) -> Option<i64> {
        let current = self.cost?;
        // later assignments to the same period win, as in Delta::apply
        let mut moved = BTreeMap::new();
        for &(period, change) in delta.changes() {
            let SlotChange::Assign(slot) = change else {
                return None;
            };
            moved.insert(period, slot);
        }

        let mut inventory = 0;
        for (&period, &slot) in &moved {
            inventory += self.evaluator.inventory_term(slot, period)?;
            inventory -= self.evaluator.inventory_term(self.items[period], period)?;
        }

        let mut affected: BTreeSet<usize> = moved.keys().copied().collect();
        for &period in moved.keys() {
            affected.extend(next_active(&self.products, period));
        }
        let saved: Vec<(usize, Production)> =
            moved.keys().map(|&p| (p, self.products[p])).collect();
        for (&period, &slot) in &moved {
            self.products[period] = self.evaluator.production_of(slot);
        }
        for &period in moved.keys() {
            affected.extend(next_active(&self.products, period));
        }
        let new_transitions = self.transition_sum(&affected);
        for (period, production) in saved {
            self.products[period] = production;
        }
        let old_transitions = self.transition_sum(&affected);

        Some(current + inventory + new_transitions - old_transitions)
    }

    fn transition_sum(&self, periods: &BTreeSet<usize>) -> i64 {
        periods
            .iter()
            .map(|&p| self.evaluator.transition_term(&self.products, p))
            .sum()
    }
}

impl NeighborhoodFilter for CostFilter<'_> {
    fn name(&self) -> &str {
        "cost_filter"
    }

    fn synchronize(&mut self, items: &[usize]) {
        self.items = items.to_vec();
        self.products = items
            .iter()
            .map(|&s| self.evaluator.production_of(s))
            .collect();
        self.cost = self.full_cost(items);
    }

    fn accept(&mut self, delta: &Delta) -> bool {
        let accepted = if delta.is_partial() {
            true
        } else {
            match (self.evaluate(delta), self.cost) {
                (Some(candidate), Some(current)) => candidate < current,
                _ => false,
            }
        };
        self.statistics.record_call(accepted);
        accepted
    }
}
