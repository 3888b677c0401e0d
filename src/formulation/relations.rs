//! Allowed-tuple relations derived from an instance.

use std::fmt;

use crate::engine::TupleSet;
use crate::models::{CarriedState, Instance, Production};

/// One legal step between consecutive periods and what it costs.
///
/// Encoded for the table constraint as
/// `(prev_product, prev_state, next_product, next_state, cost)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Transition {
    pub prev_product: Production,
    pub prev_state: CarriedState,
    pub next_product: Production,
    pub next_state: CarriedState,
    pub cost: i64,
}

impl Transition {
    pub fn encode(&self) -> [i64; 5] {
        [
            self.prev_product.code(),
            self.prev_state.code(),
            self.next_product.code(),
            self.next_state.code(),
            self.cost,
        ]
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}) -> ({}, {}) costs {}",
            self.prev_product, self.prev_state, self.next_product, self.next_state, self.cost
        )
    }
}

/// Every legal consecutive-period transition.
///
/// For `P` products this is `2P² + 3P + 1` tuples:
///
/// - `(i, i, j, j)` switching directly from `i` to `j`
/// - `(idle, i, j, j)` switching to `j` after idling with state `i`
/// - `(i, i, idle, i)` and `(idle, i, idle, i)` idling while carrying `i`, free
/// - `(idle, none, i, i)` first activation, free
/// - `(idle, none, idle, none)` nothing produced yet, free
///
/// Switching costs are charged from the carried product, so an idle run
/// does not reset the changeover.
///
/// # Examples
///
/// ```
/// use u_lotsizing::formulation::transition_relation;
/// use u_lotsizing::models::Instance;
///
/// let inst = Instance::new(3, 2, 1, vec![vec![1], vec![2]], vec![vec![0, 7], vec![9, 0]])
///     .unwrap();
/// assert_eq!(transition_relation(&inst).len(), 2 * 4 + 3 * 2 + 1);
/// ```
pub fn transition_relation(instance: &Instance) -> Vec<Transition> {
    let p = instance.num_products();
    let mut out = Vec::with_capacity(2 * p * p + 3 * p + 1);

    for i in 0..p {
        for j in 0..p {
            let cost = instance.transition_cost(i, j);
            out.push(Transition {
                prev_product: Production::Active(i),
                prev_state: CarriedState::Carrying(i),
                next_product: Production::Active(j),
                next_state: CarriedState::Carrying(j),
                cost,
            });
            out.push(Transition {
                prev_product: Production::Idle,
                prev_state: CarriedState::Carrying(i),
                next_product: Production::Active(j),
                next_state: CarriedState::Carrying(j),
                cost,
            });
        }
    }
    for i in 0..p {
        out.push(Transition {
            prev_product: Production::Active(i),
            prev_state: CarriedState::Carrying(i),
            next_product: Production::Idle,
            next_state: CarriedState::Carrying(i),
            cost: 0,
        });
        out.push(Transition {
            prev_product: Production::Idle,
            prev_state: CarriedState::Carrying(i),
            next_product: Production::Idle,
            next_state: CarriedState::Carrying(i),
            cost: 0,
        });
    }
    for i in 0..p {
        out.push(Transition {
            prev_product: Production::Idle,
            prev_state: CarriedState::NoState,
            next_product: Production::Active(i),
            next_state: CarriedState::Carrying(i),
            cost: 0,
        });
    }
    out.push(Transition {
        prev_product: Production::Idle,
        prev_state: CarriedState::NoState,
        next_product: Production::Idle,
        next_state: CarriedState::NoState,
        cost: 0,
    });
    out
}

/// The transition relation as a 5-ary table.
pub fn transition_table(instance: &Instance) -> TupleSet {
    let mut table = TupleSet::new(5);
    for t in transition_relation(instance) {
        table.insert(&t.encode());
    }
    table
}

/// Which production every slot stands for: the owning product of each real
/// item, then idle for each of the `num_residual` placeholder slots.
pub fn item_relation(instance: &Instance) -> Vec<(usize, Production)> {
    let items = instance
        .item_to_product()
        .into_iter()
        .map(Production::Active);
    let idle = std::iter::repeat_n(Production::Idle, instance.num_residual());
    items.chain(idle).enumerate().collect()
}

/// The item relation as a binary table over `(item[p], product[p])`.
pub fn item_table(instance: &Instance) -> TupleSet {
    let mut table = TupleSet::new(2);
    for (slot, production) in item_relation(instance) {
        table.insert(&[slot as i64, production.code()]);
    }
    table
}

/// Pairs `(product[0], state[0])` consistent with an empty history.
pub fn initial_state_table(instance: &Instance) -> TupleSet {
    let mut table = TupleSet::new(2);
    table.insert(&[Production::IDLE_CODE, CarriedState::NO_STATE_CODE]);
    for i in 0..instance.num_products() as i64 {
        table.insert(&[i, i]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn test_transition_count_formula() {
        for text in [fixtures::SAMPLE, fixtures::SMALL] {
            let inst = fixtures::load(text);
            let p = inst.num_products();
            let rel = transition_relation(&inst);
            assert_eq!(rel.len(), 2 * p * p + 3 * p + 1);
            assert_eq!(transition_table(&inst).num_tuples(), rel.len());
        }
    }

    #[test]
    fn test_switch_after_idle_costs_from_state() {
        let inst = fixtures::load(fixtures::SMALL);
        let table = transition_table(&inst);
        // product 0 carried through idle, then product 1: cost T[0][1] = 5
        assert!(table.contains(&[-1, 0, 1, 1, 5]));
        assert!(table.contains(&[0, 0, 1, 1, 5]));
        assert!(table.contains(&[1, 1, 0, 0, 3]));
        assert!(!table.contains(&[-1, 0, 1, 1, 0]));
        // the carried state never changes while idle
        assert!(!table.contains(&[0, 0, -1, 1, 0]));
        assert!(table.contains(&[-1, -1, -1, -1, 0]));
        assert!(table.contains(&[-1, -1, 0, 0, 0]));
    }

    #[test]
    fn test_no_tuple_mixes_product_and_state() {
        let inst = fixtures::load(fixtures::SAMPLE);
        for t in transition_relation(&inst) {
            if let Production::Active(j) = t.next_product {
                assert_eq!(t.next_state, CarriedState::Carrying(j), "{t}");
            }
            if let Production::Active(i) = t.prev_product {
                assert_eq!(t.prev_state, CarriedState::Carrying(i), "{t}");
            }
        }
    }

    #[test]
    fn test_item_relation_covers_every_slot() {
        let inst = fixtures::load(fixtures::SAMPLE);
        let rel = item_relation(&inst);
        assert_eq!(rel.len(), inst.num_periods());
        let idle = rel.iter().filter(|(_, p)| p.is_idle()).count();
        assert_eq!(idle, inst.num_residual());
        // product 0 has one item, product 1 the next two
        assert_eq!(rel[0], (0, Production::Active(0)));
        assert_eq!(rel[1], (1, Production::Active(1)));
        assert_eq!(rel[2], (2, Production::Active(1)));
        assert_eq!(rel[14], (14, Production::Idle));
        assert_eq!(item_table(&inst).num_tuples(), 15);
    }

    #[test]
    fn test_initial_state_table() {
        let inst = fixtures::load(fixtures::SMALL);
        let table = initial_state_table(&inst);
        assert_eq!(table.num_tuples(), 3);
        assert!(table.contains(&[1, 1]));
        assert!(!table.contains(&[1, 0]));
    }
}
