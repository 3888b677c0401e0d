//! Constraint formulation of the lot sizing problem.
//!
//! - [`relations`] — item and transition relations as typed tuples and tables
//! - [`ModelBuilder`] — declares variables, constraints and the objective

mod builder;
pub mod relations;

pub use builder::{AcpModel, ModelBuilder};
pub use relations::{item_relation, transition_relation, Transition};
