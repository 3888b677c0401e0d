//! Local search over the `item[]` array.
//!
//! - [`Delta`] — a candidate move, complete or partial
//! - [`NeighborhoodOperator`] — move generators: [`SwapOperator`], [`RandomLns`],
//!   and their [`ConcatenatedOperator`]
//! - [`CostFilter`] — incremental objective check of complete moves

mod delta;
mod filter;
mod operator;
mod random_lns;
mod swap;

pub use delta::{Delta, SlotChange};
pub use filter::{CostFilter, FilterStatistics, NeighborhoodFilter};
pub use operator::{ConcatenatedOperator, NeighborhoodOperator};
pub use random_lns::{PartialAssignment, RandomLns};
pub use swap::{PairIter, SwapOperator};
