//! Search configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Parameters of the construction + local search run.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use u_lotsizing::solver::SolverConfig;
///
/// let config = SolverConfig::default()
///     .with_lns_size(6)
///     .with_seed(7)
///     .with_time_limit(Duration::from_secs(2));
/// assert_eq!(config.lns_size, 6);
/// assert_eq!(config.lns_limit, 30);
/// assert!(!config.use_swap);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Periods freed by each Random LNS neighbour.
    pub lns_size: usize,
    /// Failures allowed to the inner repair search of one neighbour.
    pub lns_limit: u64,
    /// Seed of the random generator.
    pub seed: u64,
    /// Wall-clock budget of the local search.
    pub time_limit: Option<Duration>,
    /// Stop after this many improving solutions (construction included).
    pub solution_limit: Option<u64>,
    /// Random LNS neighbours tried without improvement before the search stops.
    pub stall_limit: usize,
    /// Try the Swap neighbourhood before Random LNS.
    pub use_swap: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            lns_size: 10,
            lns_limit: 30,
            seed: 42,
            time_limit: None,
            solution_limit: None,
            stall_limit: 200,
            use_swap: false,
        }
    }
}

impl SolverConfig {
    pub fn with_lns_size(mut self, size: usize) -> Self {
        self.lns_size = size;
        self
    }

    pub fn with_lns_limit(mut self, limit: u64) -> Self {
        self.lns_limit = limit;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_solution_limit(mut self, limit: u64) -> Self {
        self.solution_limit = Some(limit);
        self
    }

    pub fn with_stall_limit(mut self, limit: usize) -> Self {
        self.stall_limit = limit;
        self
    }

    pub fn with_swap(mut self, enabled: bool) -> Self {
        self.use_swap = enabled;
        self
    }
}
