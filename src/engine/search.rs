//! Decision builders and depth-first tree search.

use std::fmt;

use rand::seq::IteratorRandom;
use rand::Rng;

use super::monitor::{SearchCommand, SearchMonitor, SearchStatistics};
use super::solver::Solver;
use super::store::IntVar;

/// Branching decision `var = value`; its refutation is `var != value`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Decision {
    pub var: IntVar,
    pub value: i64,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Decision({} = {})", self.var, self.value)
    }
}

/// Chooses the next decision, or `None` when its variables are all fixed.
pub trait DecisionBuilder {
    fn next_decision<R: Rng + ?Sized>(&mut self, solver: &Solver, rng: &mut R)
        -> Option<Decision>;

    /// Continues with `next` once this builder has nothing left to decide.
    fn then<B: DecisionBuilder>(self, next: B) -> Then<Self, B>
    where
        Self: Sized,
    {
        Then {
            first: self,
            second: next,
        }
    }
}

/// Smallest remaining domain first (ties by position), smallest value first.
#[derive(Debug, Clone)]
pub struct MinSizeMinValue {
    vars: Vec<IntVar>,
}

impl MinSizeMinValue {
    pub fn new(vars: Vec<IntVar>) -> Self {
        Self { vars }
    }
}

impl DecisionBuilder for MinSizeMinValue {
    fn next_decision<R: Rng + ?Sized>(
        &mut self,
        solver: &Solver,
        _rng: &mut R,
    ) -> Option<Decision> {
        let store = solver.store();
        let var = self
            .vars
            .iter()
            .copied()
            .filter(|&v| !store.is_fixed(v))
            .min_by_key(|&v| store.domain(v).size())?;
        Some(Decision {
            var,
            value: store.min(var),
        })
    }
}

/// Random unfixed variable, random value.
#[derive(Debug, Clone)]
pub struct RandomOrder {
    vars: Vec<IntVar>,
}

impl RandomOrder {
    pub fn new(vars: Vec<IntVar>) -> Self {
        Self { vars }
    }
}

impl DecisionBuilder for RandomOrder {
    fn next_decision<R: Rng + ?Sized>(
        &mut self,
        solver: &Solver,
        rng: &mut R,
    ) -> Option<Decision> {
        let store = solver.store();
        let var = self
            .vars
            .iter()
            .copied()
            .filter(|&v| !store.is_fixed(v))
            .choose(rng)?;
        let value = store.domain(var).iter().choose(rng)?;
        Some(Decision { var, value })
    }
}

/// Two builders run one after the other.
#[derive(Debug, Clone)]
pub struct Then<A, B> {
    first: A,
    second: B,
}

impl<A: DecisionBuilder, B: DecisionBuilder> DecisionBuilder for Then<A, B> {
    fn next_decision<R: Rng + ?Sized>(
        &mut self,
        solver: &Solver,
        rng: &mut R,
    ) -> Option<Decision> {
        self.first
            .next_decision(solver, rng)
            .or_else(|| self.second.next_decision(solver, rng))
    }
}

/// How a tree search ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Every variable is fixed. The solver stays on the solution until the
    /// caller backtracks.
    Solution,
    /// The tree holds no solution.
    Exhausted,
    /// The failure limit or a monitor stopped the search.
    LimitReached,
}

/// Depth-first search with binary branching.
///
/// Each decision opens a frame; on failure the last decision is undone and
/// refuted. An optional failure limit bounds the work.
///
/// # Examples
///
/// ```
/// use u_lotsizing::engine::{
///     DepthFirstSearch, LessThan, MinSizeMinValue, NoOpMonitor, SearchOutcome, Solver,
/// };
///
/// let mut solver = Solver::new();
/// let x = solver.new_var(0, 5, "x");
/// let y = solver.new_var(0, 5, "y");
/// solver.post(LessThan::new(y, x));
///
/// let mut rng = u_numflow::random::create_rng(7);
/// let mut dfs = DepthFirstSearch::new();
/// let outcome = dfs.solve(
///     &mut solver,
///     MinSizeMinValue::new(vec![x, y]),
///     &mut rng,
///     &mut NoOpMonitor,
/// );
/// assert_eq!(outcome, SearchOutcome::Solution);
/// assert_eq!(solver.store().value(x), Some(1));
/// assert_eq!(solver.store().value(y), Some(0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DepthFirstSearch {
    failure_limit: Option<u64>,
    statistics: SearchStatistics,
}

impl DepthFirstSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gives up after `limit` failures.
    pub fn with_failure_limit(mut self, limit: u64) -> Self {
        self.failure_limit = Some(limit);
        self
    }

    /// Nodes and failures of the last run.
    pub fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    fn limit_hit(&self) -> bool {
        self.failure_limit
            .is_some_and(|limit| self.statistics.failures >= limit)
    }

    /// Searches for the first solution below the current depth.
    ///
    /// On [`SearchOutcome::Solution`] the solver is left at the solution with
    /// one extra frame per decision plus one base frame; pop back to the
    /// depth held before the call to undo it. Any other outcome restores
    /// that depth itself.
    pub fn solve<B, R>(
        &mut self,
        solver: &mut Solver,
        mut builder: B,
        rng: &mut R,
        monitor: &mut dyn SearchMonitor,
    ) -> SearchOutcome
    where
        B: DecisionBuilder,
        R: Rng + ?Sized,
    {
        self.statistics = SearchStatistics::default();
        let base = solver.depth();
        solver.push_frame();
        let mut decisions: Vec<Decision> = Vec::new();
        let mut consistent = solver.propagate().is_ok();

        loop {
            if consistent {
                monitor.on_step(&self.statistics);
                if let SearchCommand::Terminate(reason) = monitor.search_command() {
                    tracing::debug!("Tree search stopped: {reason}");
                    solver.backtrack_to(base);
                    return SearchOutcome::LimitReached;
                }
                let Some(decision) = builder.next_decision(solver, rng) else {
                    return SearchOutcome::Solution;
                };
                self.statistics.nodes += 1;
                solver.push_frame();
                decisions.push(decision);
                consistent = solver.assign(decision.var, decision.value).is_ok()
                    && solver.propagate().is_ok();
                continue;
            }

            self.statistics.failures += 1;
            if self.limit_hit() {
                solver.backtrack_to(base);
                return SearchOutcome::LimitReached;
            }
            loop {
                let Some(decision) = decisions.pop() else {
                    solver.backtrack_to(base);
                    return SearchOutcome::Exhausted;
                };
                solver.pop_frame();
                if solver.remove(decision.var, decision.value).is_ok() {
                    consistent = solver.propagate().is_ok();
                    break;
                }
            }
        }
    }
}
