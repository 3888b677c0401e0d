//! A small finite-domain constraint engine.
//!
//! - [`Domain`] / [`Store`] — bitset domains with a trail of saved copies
//! - [`Solver`] — propagation queue and a minimized [`LinearExpr`] with a cutoff
//! - [`propagators`] — strict ordering, tables, inverse permutations, indicator equality
//! - [`DepthFirstSearch`] — binary branching driven by a [`DecisionBuilder`]
//! - [`monitor`] — logging and stop conditions

mod domain;
pub mod monitor;
pub mod propagators;
mod search;
mod solver;
mod store;
mod tuple_set;

pub use domain::{Domain, DomainIter};
pub use monitor::{
    CompositeMonitor, LogMonitor, NoOpMonitor, SearchCommand, SearchMonitor, SearchStatistics,
    SolutionLimit, TimeLimit,
};
pub use propagators::{
    AllowedAssignments, IndicatorEquality, InversePermutation, LessThan, Propagator,
};
pub use search::{
    Decision, DecisionBuilder, DepthFirstSearch, MinSizeMinValue, RandomOrder, SearchOutcome, Then,
};
pub use solver::{LinearExpr, Solver};
pub use store::{Conflict, IntVar, Store};
pub use tuple_set::TupleSet;
