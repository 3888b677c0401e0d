//! Lot sizing instance.

use serde::{Deserialize, Serialize};

/// An immutable discrete lot sizing instance.
///
/// One machine produces at most one unit per period. Every `1` flag of the
/// input becomes an *item*: a unit of a product that must be produced no
/// later than its due period. Producing early costs `inventory_cost` per
/// period of earliness; switching product costs `transitions[from][to]`.
///
/// # Examples
///
/// ```
/// use u_lotsizing::models::Instance;
///
/// let inst = Instance::new(
///     5,
///     2,
///     3,
///     vec![vec![2, 4], vec![3]],
///     vec![vec![0, 7], vec![4, 0]],
/// )
/// .unwrap();
/// assert_eq!(inst.num_items(), 3);
/// assert_eq!(inst.num_residual(), 2);
/// assert_eq!(inst.item_to_product(), vec![0, 0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    num_periods: usize,
    num_products: usize,
    inventory_cost: i64,
    due_dates: Vec<Vec<usize>>,
    transitions: Vec<Vec<i64>>,
}

impl Instance {
    /// Creates a new instance.
    ///
    /// Returns `None` if the shape is inconsistent: at least one period, a
    /// due-date row per product, strictly increasing due periods inside
    /// `[0, num_periods)`, a square non-negative transition matrix, and no
    /// more items than periods.
    pub fn new(
        num_periods: usize,
        num_products: usize,
        inventory_cost: i64,
        due_dates: Vec<Vec<usize>>,
        transitions: Vec<Vec<i64>>,
    ) -> Option<Self> {
        if num_periods == 0
            || due_dates.len() != num_products
            || transitions.len() != num_products
        {
            return None;
        }
        let ordered = due_dates.iter().all(|row| {
            row.windows(2).all(|w| w[0] < w[1]) && row.iter().all(|&d| d < num_periods)
        });
        if !ordered {
            return None;
        }
        if transitions
            .iter()
            .any(|row| row.len() != num_products || row.iter().any(|&c| c < 0))
        {
            return None;
        }
        let num_items: usize = due_dates.iter().map(Vec::len).sum();
        if num_items > num_periods || inventory_cost < 0 {
            return None;
        }
        Some(Self {
            num_periods,
            num_products,
            inventory_cost,
            due_dates,
            transitions,
        })
    }

    /// Number of production periods.
    pub fn num_periods(&self) -> usize {
        self.num_periods
    }

    /// Number of distinct products.
    pub fn num_products(&self) -> usize {
        self.num_products
    }

    /// Cost per unit per period of earliness.
    pub fn inventory_cost(&self) -> i64 {
        self.inventory_cost
    }

    /// Due periods of each product, strictly increasing.
    pub fn due_dates_per_product(&self) -> &[Vec<usize>] {
        &self.due_dates
    }

    /// Changeover cost from `from` to `to`.
    pub fn transition_cost(&self, from: usize, to: usize) -> i64 {
        self.transitions[from][to]
    }

    /// The full changeover matrix, row-major.
    pub fn transitions(&self) -> &[Vec<i64>] {
        &self.transitions
    }

    /// Largest entry of the changeover matrix (0 for an empty matrix).
    pub fn max_transition_cost(&self) -> i64 {
        self.transitions
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }

    /// Total number of demanded units.
    pub fn num_items(&self) -> usize {
        self.due_dates.iter().map(Vec::len).sum()
    }

    /// Number of periods left idle in every schedule.
    pub fn num_residual(&self) -> usize {
        self.num_periods - self.num_items()
    }

    /// Owning product of every item, product-major in due-date order.
    pub fn item_to_product(&self) -> Vec<usize> {
        self.due_dates
            .iter()
            .enumerate()
            .flat_map(|(product, row)| std::iter::repeat_n(product, row.len()))
            .collect()
    }

    /// Due period of every item, in the same order as [`item_to_product`](Self::item_to_product).
    pub fn item_due_dates(&self) -> Vec<usize> {
        self.due_dates.iter().flatten().copied().collect()
    }

    /// Short human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Instance({} periods, {} products, {} cost)",
            self.num_periods, self.num_products, self.inventory_cost
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Instance {
        Instance::new(
            6,
            3,
            2,
            vec![vec![1, 4], vec![], vec![5]],
            vec![vec![0, 3, 9], vec![1, 0, 2], vec![8, 4, 0]],
        )
        .expect("valid instance")
    }

    #[test]
    fn test_counts() {
        let inst = small();
        assert_eq!(inst.num_items(), 3);
        assert_eq!(inst.num_residual(), 3);
        assert_eq!(inst.num_items() + inst.num_residual(), inst.num_periods());
        assert_eq!(inst.max_transition_cost(), 9);
    }

    #[test]
    fn test_item_mappings() {
        let inst = small();
        assert_eq!(inst.item_to_product(), vec![0, 0, 2]);
        assert_eq!(inst.item_due_dates(), vec![1, 4, 5]);
    }

    #[test]
    fn test_rejects_unordered_due_dates() {
        assert!(Instance::new(4, 1, 1, vec![vec![2, 2]], vec![vec![0]]).is_none());
        assert!(Instance::new(4, 1, 1, vec![vec![3, 1]], vec![vec![0]]).is_none());
    }

    #[test]
    fn test_rejects_due_date_past_horizon() {
        assert!(Instance::new(4, 1, 1, vec![vec![4]], vec![vec![0]]).is_none());
    }

    #[test]
    fn test_rejects_too_many_items() {
        assert!(Instance::new(1, 2, 1, vec![vec![0], vec![0]], vec![vec![0, 1], vec![1, 0]])
            .is_none());
    }

    #[test]
    fn test_rejects_non_square_matrix() {
        assert!(Instance::new(3, 2, 1, vec![vec![0], vec![1]], vec![vec![0, 1], vec![1]])
            .is_none());
    }

    #[test]
    fn test_summary() {
        assert_eq!(small().summary(), "Instance(6 periods, 3 products, 2 cost)");
    }
}
