//! Schedule and violation types.

use serde::{Deserialize, Serialize};

use super::{CarriedState, Production};

/// A reason an item permutation is not a valid schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationType {
    /// The item array is not a permutation of `0..num_periods`.
    NotAPermutation {
        /// Period holding an out-of-range or repeated slot.
        period: usize,
        /// The offending slot value.
        slot: usize,
    },
    /// An item is produced after its due period.
    LateDelivery {
        /// Item index.
        item: usize,
        /// Period it is produced in.
        period: usize,
        /// Its due period.
        due: usize,
    },
    /// Two units of the same product are produced out of due-date order.
    OutOfOrder {
        /// Product index.
        product: usize,
        /// The earlier-due item.
        first: usize,
        /// The later-due item, produced no later than `first`.
        second: usize,
    },
}

/// A constraint violation in a schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ViolationType::NotAPermutation { period, slot } => {
                write!(f, "period {period} holds invalid slot {slot}")
            }
            ViolationType::LateDelivery { item, period, due } => {
                write!(f, "item {item} produced in period {period} after due period {due}")
            }
            ViolationType::OutOfOrder {
                product,
                first,
                second,
            } => write!(
                f,
                "product {product}: item {second} is not produced after item {first}"
            ),
        }
    }
}

/// A complete production plan.
///
/// Period `p` produces `products[p]` by serving slot `items[p]`; slot `k`
/// is served in period `deliveries[k]`. Slots `0..num_items` are real items,
/// the rest are idle placeholders. `items` and `deliveries` are inverse
/// permutations.
///
/// # Examples
///
/// ```
/// use u_lotsizing::models::{Instance, Production};
/// use u_lotsizing::evaluation::ScheduleEvaluator;
///
/// let inst = Instance::new(3, 2, 1, vec![vec![1], vec![2]], vec![vec![0, 5], vec![5, 0]])
///     .unwrap();
/// let schedule = ScheduleEvaluator::new(&inst).build(&[2, 0, 1]).unwrap();
/// assert_eq!(schedule.products()[0], Production::Idle);
/// assert_eq!(schedule.objective(), 5);
/// assert_eq!(schedule.render(), "-1 0 1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    products: Vec<Production>,
    items: Vec<usize>,
    deliveries: Vec<usize>,
    states: Vec<CarriedState>,
    transition_costs: Vec<i64>,
    earliness: i64,
    inventory_cost: i64,
    transition_cost: i64,
}

impl Schedule {
    /// Assembles a schedule from already consistent parts.
    pub(crate) fn from_parts(
        products: Vec<Production>,
        items: Vec<usize>,
        deliveries: Vec<usize>,
        states: Vec<CarriedState>,
        transition_costs: Vec<i64>,
        earliness: i64,
        inventory_rate: i64,
    ) -> Self {
        let transition_cost = transition_costs.iter().sum();
        Self {
            products,
            items,
            deliveries,
            states,
            transition_costs,
            earliness,
            inventory_cost: earliness * inventory_rate,
            transition_cost,
        }
    }

    /// Production of every period.
    pub fn products(&self) -> &[Production] {
        &self.products
    }

    /// Slot served in every period.
    pub fn items(&self) -> &[usize] {
        &self.items
    }

    /// Period serving every slot.
    pub fn deliveries(&self) -> &[usize] {
        &self.deliveries
    }

    /// Carried state of every period.
    pub fn states(&self) -> &[CarriedState] {
        &self.states
    }

    /// Changeover cost between period `p` and `p + 1`.
    pub fn transition_costs(&self) -> &[i64] {
        &self.transition_costs
    }

    /// Total periods of earliness over all items.
    pub fn earliness(&self) -> i64 {
        self.earliness
    }

    /// Weighted earliness cost.
    pub fn inventory_cost(&self) -> i64 {
        self.inventory_cost
    }

    /// Total changeover cost.
    pub fn transition_cost(&self) -> i64 {
        self.transition_cost
    }

    /// Objective value: inventory plus changeover cost.
    pub fn objective(&self) -> i64 {
        self.inventory_cost + self.transition_cost
    }

    /// Number of periods.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Returns `true` for a schedule without periods.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Product line: one value per period, `-1` for idle.
    pub fn render(&self) -> String {
        self.products
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_totals() {
        let s = Schedule::from_parts(
            vec![Production::Active(0), Production::Idle, Production::Active(1)],
            vec![0, 2, 1],
            vec![0, 2, 1],
            vec![
                CarriedState::Carrying(0),
                CarriedState::Carrying(0),
                CarriedState::Carrying(1),
            ],
            vec![0, 7],
            3,
            10,
        );
        assert_eq!(s.inventory_cost(), 30);
        assert_eq!(s.transition_cost(), 7);
        assert_eq!(s.objective(), 37);
        assert_eq!(s.render(), "0 -1 1");
        assert_eq!(s.len(), 3);
        assert!(!s.is_empty());
    }

    #[test]
    fn test_violation_display() {
        let v = Violation::new(ViolationType::LateDelivery {
            item: 2,
            period: 5,
            due: 4,
        });
        assert_eq!(v.to_string(), "item 2 produced in period 5 after due period 4");
    }
}
