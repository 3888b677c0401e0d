//! Construction followed by neighbourhood search.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use u_numflow::random::create_rng;

use crate::engine::{
    CompositeMonitor, DecisionBuilder, DepthFirstSearch, IntVar, LogMonitor, MinSizeMinValue,
    RandomOrder, SearchCommand, SearchMonitor, SearchOutcome, SearchStatistics, SolutionLimit,
    TimeLimit,
};
use crate::formulation::{AcpModel, ModelBuilder};
use crate::local_search::{
    ConcatenatedOperator, CostFilter, Delta, NeighborhoodFilter, NeighborhoodOperator, RandomLns,
    SwapOperator,
};
use crate::models::{Instance, Schedule};

use super::SolverConfig;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveStatus {
    /// A pass ended without improvement.
    LocalOptimum,
    /// A time or solution limit fired, possibly before any schedule was found.
    Stopped,
    /// The model has no solution.
    Infeasible,
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveStatus::LocalOptimum => write!(f, "local optimum"),
            SolveStatus::Stopped => write!(f, "stopped"),
            SolveStatus::Infeasible => write!(f, "infeasible"),
        }
    }
}

/// Outcome of [`LocalSearchDriver::solve`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResult {
    pub status: SolveStatus,
    /// Best schedule found, if any.
    pub best: Option<Schedule>,
    /// Objective of every improving solution, in discovery order.
    pub solutions: Vec<i64>,
    pub statistics: SearchStatistics,
}

impl SolveResult {
    /// Objective of the best schedule.
    pub fn objective(&self) -> Option<i64> {
        self.best.as_ref().map(Schedule::objective)
    }
}

/// Builds a first schedule with a smallest-domain search, then improves it
/// with neighbourhood moves repaired by a failure-bounded random search.
///
/// Each improving schedule is logged as its product line and handed to the
/// callback of [`solve_with`](Self::solve_with).
///
/// # Examples
///
/// ```
/// use u_lotsizing::loading::InstanceLoader;
/// use u_lotsizing::solver::{LocalSearchDriver, SolveStatus, SolverConfig};
///
/// let inst = InstanceLoader::new()
///     .from_text("4\n2\n0 1 0 1\n0 0 1 0\n1\n0 4\n4 0\n")
///     .unwrap();
/// let config = SolverConfig::default().with_stall_limit(20);
/// let result = LocalSearchDriver::new(&inst, config).solve();
/// assert_eq!(result.status, SolveStatus::LocalOptimum);
/// assert!(result.objective().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct LocalSearchDriver<'a> {
    instance: &'a Instance,
    config: SolverConfig,
}

impl<'a> LocalSearchDriver<'a> {
    pub fn new(instance: &'a Instance, config: SolverConfig) -> Self {
        Self { instance, config }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Runs the search to completion.
    pub fn solve(&self) -> SolveResult {
        self.solve_with(|_| {})
    }

    /// Runs the search, calling `on_solution` for every improving schedule.
    pub fn solve_with<F>(&self, mut on_solution: F) -> SolveResult
    where
        F: FnMut(&Schedule),
    {
        let config = &self.config;
        let mut model = ModelBuilder::new(self.instance).build();
        let mut rng = create_rng(config.seed);
        let mut monitor = self.monitor();
        let mut stats = SearchStatistics::default();
        let mut solutions = Vec::new();

        monitor.on_enter_search();

        let constructed = self.construct(&mut model, &mut rng, &mut monitor, &mut stats);
        let (mut current, mut best) = match constructed {
            Ok(found) => found,
            Err(status) => {
                match status {
                    SolveStatus::Stopped => tracing::info!("Stopped before a first solution"),
                    _ => tracing::info!("No solution found"),
                }
                monitor.on_exit_search(&stats);
                return SolveResult {
                    status,
                    best: None,
                    solutions,
                    statistics: stats,
                };
            }
        };
        self.report(&best, &mut monitor, &mut stats, &mut solutions, &mut on_solution);

        let mut operator = self.operator();
        let mut filter = CostFilter::new(self.instance);
        filter.synchronize(&current);
        operator.start(&current);
        let items = model.items().to_vec();
        let all_vars: Vec<IntVar> = model.solver().store().vars().collect();

        let status = loop {
            if let SearchCommand::Terminate(reason) = monitor.search_command() {
                tracing::debug!("Local search stopped: {reason}");
                break SolveStatus::Stopped;
            }
            let Some(delta) = operator.next_neighbor(&current, &mut rng) else {
                break SolveStatus::LocalOptimum;
            };
            stats.neighbors += 1;
            monitor.on_step(&stats);
            if !filter.accept(&delta) {
                stats.filtered += 1;
                continue;
            }

            model.solver_mut().push_frame();
            let fixed = Self::fix_kept(&mut model, &items, &current, &delta);
            let outcome = if fixed {
                let solver = model.solver_mut();
                solver.set_cutoff(Some(best.objective()));
                let mut dfs = DepthFirstSearch::new().with_failure_limit(config.lns_limit);
                let builder = RandomOrder::new(items.clone())
                    .then(MinSizeMinValue::new(all_vars.clone()));
                let outcome = dfs.solve(solver, builder, &mut rng, &mut monitor);
                stats.absorb_tree(dfs.statistics());
                outcome
            } else {
                SearchOutcome::Exhausted
            };

            let improved = match outcome {
                SearchOutcome::Solution => model.item_values().zip(model.extract_schedule()),
                _ => None,
            };
            let solver = model.solver_mut();
            solver.backtrack_to(0);
            solver.set_cutoff(None);

            if let Some((next, schedule)) = improved {
                stats.accepted += 1;
                current = next;
                best = schedule;
                filter.synchronize(&current);
                operator.start(&current);
                self.report(&best, &mut monitor, &mut stats, &mut solutions, &mut on_solution);
            }
        };

        tracing::info!("Search ended ({status}), best objective {}", best.objective());
        tracing::debug!("Filter: {}", filter.statistics());
        monitor.on_exit_search(&stats);

        SolveResult {
            status,
            best: Some(best),
            solutions,
            statistics: stats,
        }
    }

    fn monitor(&self) -> CompositeMonitor {
        let mut monitor = CompositeMonitor::new();
        monitor.add_monitor(LogMonitor::default());
        if let Some(limit) = self.config.time_limit {
            monitor.add_monitor(TimeLimit::new(limit));
        }
        if let Some(limit) = self.config.solution_limit {
            monitor.add_monitor(SolutionLimit::new(limit));
        }
        monitor
    }

    fn operator(&self) -> ConcatenatedOperator {
        let n = self.instance.num_periods();
        if self.config.lns_size == 0 {
            tracing::warn!("lns_size 0 still frees one period per neighbour");
        } else if self.config.lns_size >= n {
            tracing::warn!(
                "lns_size {} frees all {n} periods; every neighbour is a full restart",
                self.config.lns_size
            );
        }
        let mut operator = ConcatenatedOperator::new();
        if self.config.use_swap {
            operator.add_operator(SwapOperator::new(n));
        }
        operator.add_operator(RandomLns::new(self.config.lns_size, self.config.stall_limit));
        operator
    }

    /// First schedule from a static smallest-domain search over `item[]`.
    fn construct<R: Rng + ?Sized>(
        &self,
        model: &mut AcpModel<'_>,
        rng: &mut R,
        monitor: &mut dyn SearchMonitor,
        stats: &mut SearchStatistics,
    ) -> Result<(Vec<usize>, Schedule), SolveStatus> {
        let items = model.items().to_vec();
        let all_vars: Vec<IntVar> = model.solver().store().vars().collect();
        let solver = model.solver_mut();
        // root pruning is kept for every later search
        solver
            .propagate()
            .map_err(|_| SolveStatus::Infeasible)?;

        let mut dfs = DepthFirstSearch::new();
        let builder = MinSizeMinValue::new(items).then(MinSizeMinValue::new(all_vars));
        let outcome = dfs.solve(solver, builder, rng, monitor);
        stats.absorb_tree(dfs.statistics());

        let found = match outcome {
            SearchOutcome::Solution => model
                .item_values()
                .zip(model.extract_schedule())
                .ok_or(SolveStatus::Infeasible),
            SearchOutcome::Exhausted => Err(SolveStatus::Infeasible),
            SearchOutcome::LimitReached => Err(SolveStatus::Stopped),
        };
        model.solver_mut().backtrack_to(0);
        found
    }

    /// Fixes the periods `delta` keeps; returns `false` on a conflict.
    fn fix_kept(
        model: &mut AcpModel<'_>,
        items: &[IntVar],
        current: &[usize],
        delta: &Delta,
    ) -> bool {
        let target: Vec<Option<usize>> = match delta.apply(current) {
            Some(next) => next.into_iter().map(Some).collect(),
            None => {
                let mut target: Vec<Option<usize>> = current.iter().copied().map(Some).collect();
                for p in delta.released() {
                    target[p] = None;
                }
                target
            }
        };
        let solver = model.solver_mut();
        target
            .iter()
            .zip(items)
            .filter_map(|(slot, &var)| slot.map(|s| (var, s as i64)))
            .all(|(var, value)| solver.assign(var, value).is_ok())
    }

    fn report<F>(
        &self,
        schedule: &Schedule,
        monitor: &mut dyn SearchMonitor,
        stats: &mut SearchStatistics,
        solutions: &mut Vec<i64>,
        on_solution: &mut F,
    ) where
        F: FnMut(&Schedule),
    {
        stats.solutions += 1;
        solutions.push(schedule.objective());
        tracing::info!("{}", schedule.render());
        tracing::debug!(objective = schedule.objective(), "Improving solution");
        monitor.on_solution(schedule.objective(), stats);
        on_solution(schedule);
    }
}
