//! Search monitors: progress logging and external stop conditions.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Counters collected while searching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatistics {
    /// Decisions taken by tree searches.
    pub nodes: u64,
    /// Dead ends met by tree searches.
    pub failures: u64,
    /// Improving solutions found.
    pub solutions: u64,
    /// Neighbours produced by the operators.
    pub neighbors: u64,
    /// Neighbours rejected by the filter.
    pub filtered: u64,
    /// Neighbours accepted.
    pub accepted: u64,
}

impl SearchStatistics {
    /// Adds the tree-search counters of `other`.
    pub fn absorb_tree(&mut self, other: &SearchStatistics) {
        self.nodes += other.nodes;
        self.failures += other.failures;
    }
}

impl fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "neighbors: {}, filtered: {}, accepted: {}, solutions: {}, nodes: {}, failures: {}",
            self.neighbors, self.filtered, self.accepted, self.solutions, self.nodes, self.failures
        )
    }
}

/// What a monitor asks the search to do next.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum SearchCommand {
    #[default]
    Continue,
    Terminate(String),
}

impl fmt::Display for SearchCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchCommand::Continue => write!(f, "Continue"),
            SearchCommand::Terminate(reason) => write!(f, "Terminate: {}", reason),
        }
    }
}

/// Observer of a search run.
pub trait SearchMonitor {
    fn name(&self) -> &str;

    fn on_enter_search(&mut self) {}

    fn on_exit_search(&mut self, _stats: &SearchStatistics) {}

    /// Called for every improving solution.
    fn on_solution(&mut self, _objective: i64, _stats: &SearchStatistics) {}

    /// Called once per node or neighbour.
    fn on_step(&mut self, _stats: &SearchStatistics) {}

    fn search_command(&self) -> SearchCommand {
        SearchCommand::Continue
    }
}

impl fmt::Debug for dyn SearchMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SearchMonitor({})", self.name())
    }
}

/// Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpMonitor;

impl SearchMonitor for NoOpMonitor {
    fn name(&self) -> &str {
        "NoOpMonitor"
    }
}

/// Logs progress at a fixed interval.
#[derive(Debug, Clone)]
pub struct LogMonitor {
    start_time: Instant,
    last_log_time: Instant,
    log_interval: Duration,
    clock_check_mask: u64,
    steps: u64,
    best_objective: Option<i64>,
}

impl LogMonitor {
    pub fn new(log_interval: Duration, clock_check_mask: u64) -> Self {
        Self {
            start_time: Instant::now(),
            last_log_time: Instant::now(),
            log_interval,
            clock_check_mask,
            steps: 0,
            best_objective: None,
        }
    }

    /// Best objective seen so far.
    pub fn best_objective(&self) -> Option<i64> {
        self.best_objective
    }
}

impl Default for LogMonitor {
    fn default() -> Self {
        Self::new(Duration::from_secs(1), 0xFF)
    }
}

impl SearchMonitor for LogMonitor {
    fn name(&self) -> &str {
        "LogMonitor"
    }

    fn on_enter_search(&mut self) {
        self.start_time = Instant::now();
        self.last_log_time = self.start_time;
        self.best_objective = None;
        self.steps = 0;
    }

    fn on_exit_search(&mut self, stats: &SearchStatistics) {
        tracing::info!(
            elapsed = ?self.start_time.elapsed(),
            best = ?self.best_objective,
            "Search finished ({stats})"
        );
    }

    fn on_solution(&mut self, objective: i64, _stats: &SearchStatistics) {
        self.best_objective = Some(objective);
    }

    fn on_step(&mut self, stats: &SearchStatistics) {
        self.steps += 1;
        if (self.steps & self.clock_check_mask) == 0
            && self.last_log_time.elapsed() >= self.log_interval
        {
            tracing::debug!(
                elapsed = ?self.start_time.elapsed(),
                best = ?self.best_objective,
                "{stats}"
            );
            self.last_log_time = Instant::now();
        }
    }
}

/// Stops after a number of improving solutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolutionLimit {
    limit: u64,
    found: u64,
}

impl SolutionLimit {
    pub fn new(limit: u64) -> Self {
        Self { limit, found: 0 }
    }
}

impl SearchMonitor for SolutionLimit {
    fn name(&self) -> &str {
        "SolutionLimit"
    }

    fn on_enter_search(&mut self) {
        self.found = 0;
    }

    fn on_solution(&mut self, _objective: i64, _stats: &SearchStatistics) {
        self.found += 1;
    }

    fn search_command(&self) -> SearchCommand {
        if self.found >= self.limit {
            SearchCommand::Terminate(format!("solution limit of {} reached", self.limit))
        } else {
            SearchCommand::Continue
        }
    }
}

/// Stops once a wall-clock budget is spent.
///
/// The clock is read only every `clock_check_mask + 1` steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLimit {
    clock_check_mask: u64,
    steps: u64,
    time_limit: Duration,
    start_time: Instant,
    expired: bool,
}

impl TimeLimit {
    /// Check every 64 steps.
    const DEFAULT_STEP_CLOCK_CHECK_MASK: u64 = 0x3F;

    pub fn new(time_limit: Duration) -> Self {
        Self::with_clock_check_mask(time_limit, Self::DEFAULT_STEP_CLOCK_CHECK_MASK)
    }

    pub fn with_clock_check_mask(time_limit: Duration, clock_check_mask: u64) -> Self {
        Self {
            clock_check_mask,
            steps: 0,
            time_limit,
            start_time: Instant::now(),
            expired: false,
        }
    }
}

impl SearchMonitor for TimeLimit {
    fn name(&self) -> &str {
        "TimeLimit"
    }

    fn on_enter_search(&mut self) {
        self.start_time = Instant::now();
        self.steps = 0;
        self.expired = false;
    }

    fn on_step(&mut self, _stats: &SearchStatistics) {
        self.steps += 1;
        if (self.steps & self.clock_check_mask) == 0 {
            self.expired = self.start_time.elapsed() >= self.time_limit;
        }
    }

    fn search_command(&self) -> SearchCommand {
        if self.expired {
            SearchCommand::Terminate(format!("time limit of {:?} reached", self.time_limit))
        } else {
            SearchCommand::Continue
        }
    }
}

/// Forwards every event to a list of monitors; the first termination wins.
#[derive(Debug, Default)]
pub struct CompositeMonitor {
    monitors: Vec<Box<dyn SearchMonitor>>,
}

impl CompositeMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_monitor(&mut self, monitor: impl SearchMonitor + 'static) {
        self.monitors.push(Box::new(monitor));
    }

    pub fn len(&self) -> usize {
        self.monitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.monitors.is_empty()
    }
}

impl SearchMonitor for CompositeMonitor {
    fn name(&self) -> &str {
        "CompositeMonitor"
    }

    fn on_enter_search(&mut self) {
        self.monitors.iter_mut().for_each(|m| m.on_enter_search());
    }

    fn on_exit_search(&mut self, stats: &SearchStatistics) {
        self.monitors.iter_mut().for_each(|m| m.on_exit_search(stats));
    }

    fn on_solution(&mut self, objective: i64, stats: &SearchStatistics) {
        self.monitors
            .iter_mut()
            .for_each(|m| m.on_solution(objective, stats));
    }

    fn on_step(&mut self, stats: &SearchStatistics) {
        self.monitors.iter_mut().for_each(|m| m.on_step(stats));
    }

    fn search_command(&self) -> SearchCommand {
        self.monitors
            .iter()
            .map(|m| m.search_command())
            .find(|c| *c != SearchCommand::Continue)
            .unwrap_or_default()
    }
}
