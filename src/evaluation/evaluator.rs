//! Schedule evaluator that computes states, costs and feasibility.

use crate::models::{CarriedState, Instance, Production, Schedule, Violation, ViolationType};

/// Evaluates item permutations: derives products and carried states,
/// computes earliness and changeover costs, and checks due dates and
/// per-product ordering.
///
/// The evaluator is independent of the constraint model; the acceptance
/// filter uses its per-period terms for incremental cost updates.
///
/// # Examples
///
/// ```
/// use u_lotsizing::models::Instance;
/// use u_lotsizing::evaluation::ScheduleEvaluator;
///
/// let inst = Instance::new(4, 2, 2, vec![vec![2], vec![3]], vec![vec![0, 4], vec![6, 0]])
///     .unwrap();
/// let eval = ScheduleEvaluator::new(&inst);
///
/// // period 0 makes item 0 (product 0, due 2): 2 periods early
/// assert_eq!(eval.objective(&[0, 2, 3, 1]), Some(2 * 2 + 4));
/// // item 0 (due 2) made in period 3 is late
/// assert_eq!(eval.objective(&[2, 3, 1, 0]), None);
/// ```
#[derive(Debug, Clone)]
pub struct ScheduleEvaluator<'a> {
    instance: &'a Instance,
    item_to_product: Vec<usize>,
    due_dates: Vec<usize>,
}

impl<'a> ScheduleEvaluator<'a> {
    /// Creates a new evaluator for the given instance.
    pub fn new(instance: &'a Instance) -> Self {
        Self {
            instance,
            item_to_product: instance.item_to_product(),
            due_dates: instance.item_due_dates(),
        }
    }

    /// The evaluated instance.
    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    /// Number of real (non-idle) slots.
    pub fn num_items(&self) -> usize {
        self.item_to_product.len()
    }

    /// Owning product of every real item.
    pub fn item_to_product(&self) -> &[usize] {
        &self.item_to_product
    }

    /// Due period of every real item.
    pub fn due_dates(&self) -> &[usize] {
        &self.due_dates
    }

    /// What serving `slot` produces.
    #[inline]
    pub fn production_of(&self, slot: usize) -> Production {
        match self.item_to_product.get(slot) {
            Some(&product) => Production::Active(product),
            None => Production::Idle,
        }
    }

    /// Weighted earliness of serving `slot` in `period`.
    ///
    /// Returns `None` when a real item would be late. Idle slots cost nothing.
    #[inline]
    pub fn inventory_term(&self, slot: usize, period: usize) -> Option<i64> {
        match self.due_dates.get(slot) {
            Some(&due) if period > due => None,
            Some(&due) => Some((due - period) as i64 * self.instance.inventory_cost()),
            None => Some(0),
        }
    }

    /// Changeover charged when entering `period`.
    ///
    /// Zero for idle periods and for the first active period; otherwise the
    /// cost from the closest earlier active product.
    pub fn transition_term(&self, products: &[Production], period: usize) -> i64 {
        let Production::Active(to) = products[period] else {
            return 0;
        };
        match previous_active(products, period) {
            Some(prev) => match products[prev] {
                Production::Active(from) => self.instance.transition_cost(from, to),
                Production::Idle => 0,
            },
            None => 0,
        }
    }

    /// Checks an item array for structural and due-date violations.
    pub fn check(&self, items: &[usize]) -> Vec<Violation> {
        let n = self.instance.num_periods();
        let mut violations = Vec::new();
        let mut deliveries = vec![usize::MAX; n];

        if items.len() != n {
            violations.push(Violation::new(ViolationType::NotAPermutation {
                period: items.len().min(n),
                slot: usize::MAX,
            }));
            return violations;
        }
        for (period, &slot) in items.iter().enumerate() {
            if slot >= n || deliveries[slot] != usize::MAX {
                violations.push(Violation::new(ViolationType::NotAPermutation { period, slot }));
                continue;
            }
            deliveries[slot] = period;
        }
        if !violations.is_empty() {
            return violations;
        }

        for (item, &due) in self.due_dates.iter().enumerate() {
            if deliveries[item] > due {
                violations.push(Violation::new(ViolationType::LateDelivery {
                    item,
                    period: deliveries[item],
                    due,
                }));
            }
        }
        for item in 1..self.num_items() {
            let product = self.item_to_product[item];
            if self.item_to_product[item - 1] == product
                && deliveries[item - 1] >= deliveries[item]
            {
                violations.push(Violation::new(ViolationType::OutOfOrder {
                    product,
                    first: item - 1,
                    second: item,
                }));
            }
        }
        violations
    }

    /// Builds the full schedule for an item array.
    pub fn build(&self, items: &[usize]) -> Result<Schedule, Vec<Violation>> {
        let violations = self.check(items);
        if !violations.is_empty() {
            return Err(violations);
        }

        let n = items.len();
        let mut deliveries = vec![0; n];
        for (period, &slot) in items.iter().enumerate() {
            deliveries[slot] = period;
        }
        let products: Vec<Production> = items.iter().map(|&s| self.production_of(s)).collect();

        let mut states = Vec::with_capacity(n);
        let mut state = CarriedState::NoState;
        for &production in &products {
            state = state.after(production);
            states.push(state);
        }

        let transition_costs: Vec<i64> = (1..n)
            .map(|p| self.transition_term(&products, p))
            .collect();
        let earliness: i64 = self
            .due_dates
            .iter()
            .enumerate()
            .map(|(item, &due)| (due - deliveries[item]) as i64)
            .sum();

        Ok(Schedule::from_parts(
            products,
            items.to_vec(),
            deliveries,
            states,
            transition_costs,
            earliness,
            self.instance.inventory_cost(),
        ))
    }

    /// Objective of an item array, or `None` if it is infeasible.
    pub fn objective(&self, items: &[usize]) -> Option<i64> {
        self.build(items).ok().map(|s| s.objective())
    }
}

/// Closest period before `period` that produces something.
pub fn previous_active(products: &[Production], period: usize) -> Option<usize> {
    (0..period).rev().find(|&p| !products[p].is_idle())
}

/// Closest period after `period` that produces something.
pub fn next_active(products: &[Production], period: usize) -> Option<usize> {
    (period + 1..products.len()).find(|&p| !products[p].is_idle())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> Instance {
        // product 0 due at 2 and 4, product 1 due at 3
        Instance::new(
            6,
            2,
            3,
            vec![vec![2, 4], vec![3]],
            vec![vec![1, 10], vec![20, 2]],
        )
        .expect("valid")
    }

    #[test]
    fn test_production_of() {
        let inst = setup();
        let eval = ScheduleEvaluator::new(&inst);
        assert_eq!(eval.production_of(0), Production::Active(0));
        assert_eq!(eval.production_of(2), Production::Active(1));
        assert_eq!(eval.production_of(3), Production::Idle);
        assert_eq!(eval.production_of(5), Production::Idle);
    }

    #[test]
    fn test_inventory_term() {
        let inst = setup();
        let eval = ScheduleEvaluator::new(&inst);
        assert_eq!(eval.inventory_term(0, 0), Some(6));
        assert_eq!(eval.inventory_term(0, 2), Some(0));
        assert_eq!(eval.inventory_term(0, 3), None);
        assert_eq!(eval.inventory_term(4, 0), Some(0));
    }

    #[test]
    fn test_build_costs() {
        let inst = setup();
        let eval = ScheduleEvaluator::new(&inst);
        // periods: 0:idle 1:item0(p0) 2:idle 3:item2(p1) 4:item1(p0) 5:idle
        let items = [3, 0, 4, 2, 1, 5];
        let s = eval.build(&items).expect("feasible");
        assert_eq!(s.earliness(), 1);
        assert_eq!(s.inventory_cost(), 3);
        // 0 -> 1 after an idle gap costs 10, then 1 -> 0 costs 20
        assert_eq!(s.transition_costs(), &[0, 0, 10, 20, 0][..]);
        assert_eq!(s.transition_cost(), 30);
        assert_eq!(s.objective(), 33);
        assert_eq!(s.deliveries(), &[1, 4, 3, 0, 2, 5][..]);
        assert_eq!(s.states()[0], CarriedState::NoState);
        assert_eq!(s.states()[2], CarriedState::Carrying(0));
        assert_eq!(s.states()[5], CarriedState::Carrying(0));
    }

    #[test]
    fn test_diagonal_cost_is_charged() {
        let inst = setup();
        let eval = ScheduleEvaluator::new(&inst);
        // product 0 twice in a row pays transitions[0][0] = 1
        let items = [3, 0, 1, 2, 4, 5];
        let s = eval.build(&items).expect("feasible");
        assert_eq!(s.transition_cost(), 1 + 10);
    }

    #[test]
    fn test_late_delivery() {
        let inst = setup();
        let eval = ScheduleEvaluator::new(&inst);
        let items = [3, 4, 5, 0, 1, 2];
        let v = eval.check(&items);
        assert!(v
            .iter()
            .any(|v| matches!(v.kind, ViolationType::LateDelivery { item: 0, period: 3, due: 2 })));
        assert_eq!(eval.objective(&items), None);
    }

    #[test]
    fn test_out_of_order() {
        let inst = setup();
        let eval = ScheduleEvaluator::new(&inst);
        let items = [1, 0, 2, 3, 4, 5];
        let v = eval.check(&items);
        assert_eq!(
            v,
            vec![Violation::new(ViolationType::OutOfOrder {
                product: 0,
                first: 0,
                second: 1
            })]
        );
    }

    #[test]
    fn test_not_a_permutation() {
        let inst = setup();
        let eval = ScheduleEvaluator::new(&inst);
        let v = eval.check(&[0, 0, 1, 2, 3, 4]);
        assert!(matches!(
            v[0].kind,
            ViolationType::NotAPermutation { period: 1, slot: 0 }
        ));
        assert!(!eval.check(&[0, 1]).is_empty());
    }

    #[test]
    fn test_active_neighbours() {
        let products = [
            Production::Idle,
            Production::Active(1),
            Production::Idle,
            Production::Idle,
            Production::Active(0),
        ];
        assert_eq!(previous_active(&products, 4), Some(1));
        assert_eq!(previous_active(&products, 1), None);
        assert_eq!(next_active(&products, 1), Some(4));
        assert_eq!(next_active(&products, 4), None);
    }
}
