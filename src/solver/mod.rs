//! Search driver: construction, neighbourhood search and its configuration.

mod config;
mod driver;

pub use config::SolverConfig;
pub use driver::{LocalSearchDriver, SolveResult, SolveStatus};
