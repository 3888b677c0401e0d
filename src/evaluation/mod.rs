//! Schedule evaluation: feasibility checks and objective computation
//! directly from an item permutation.

mod evaluator;

pub use evaluator::{next_active, previous_active, ScheduleEvaluator};
