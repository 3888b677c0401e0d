//! Propagation loop and objective bound.

use std::collections::VecDeque;

use super::propagators::Propagator;
use super::store::{Conflict, IntVar, Store};
use super::Domain;

/// `constant + Σ coefficient·var`.
///
/// # Examples
///
/// ```
/// use u_lotsizing::engine::{LinearExpr, Solver};
///
/// let mut solver = Solver::new();
/// let x = solver.new_var(0, 4, "x");
/// let y = solver.new_var(1, 3, "y");
/// let expr = LinearExpr::constant(10).add_term(2, x).add_term(-1, y);
/// assert_eq!(expr.lower_bound(solver.store()), 10 + 0 - 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinearExpr {
    constant: i64,
    terms: Vec<(i64, IntVar)>,
}

impl LinearExpr {
    /// Expression with no variable term.
    pub fn constant(constant: i64) -> Self {
        Self {
            constant,
            terms: Vec::new(),
        }
    }

    /// Appends `coefficient · var`; zero coefficients are dropped.
    pub fn add_term(mut self, coefficient: i64, var: IntVar) -> Self {
        if coefficient != 0 {
            self.terms.push((coefficient, var));
        }
        self
    }

    /// The constant part.
    pub fn offset(&self) -> i64 {
        self.constant
    }

    /// The variable terms.
    pub fn terms(&self) -> &[(i64, IntVar)] {
        &self.terms
    }

    fn term_min(store: &Store, coefficient: i64, var: IntVar) -> i64 {
        if coefficient > 0 {
            coefficient * store.min(var)
        } else {
            coefficient * store.max(var)
        }
    }

    /// Smallest value reachable from the current domains.
    pub fn lower_bound(&self, store: &Store) -> i64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(c, v)| Self::term_min(store, c, v))
                .sum::<i64>()
    }

    /// Value once every variable is fixed.
    pub fn value(&self, store: &Store) -> Option<i64> {
        let mut total = self.constant;
        for &(c, v) in &self.terms {
            total += c * store.value(v)?;
        }
        Some(total)
    }

    /// Narrows the variable bounds so that the expression can be `<= bound`.
    pub fn enforce_at_most(&self, store: &mut Store, bound: i64) -> Result<(), Conflict> {
        let lb = self.lower_bound(store);
        if lb > bound {
            return Err(Conflict);
        }
        for &(c, v) in &self.terms {
            let slack = bound - (lb - Self::term_min(store, c, v));
            if c > 0 {
                store.set_max(v, slack.div_euclid(c))?;
            } else {
                store.set_min(v, -slack.div_euclid(-c))?;
            }
        }
        Ok(())
    }
}

/// Variables, propagators and an optional objective to minimize.
///
/// Domain changes wake every propagator watching the changed variable;
/// [`propagate`](Self::propagate) runs the queue to a fixpoint. With a
/// cutoff set, solutions must have an objective strictly below it.
#[derive(Debug, Default)]
pub struct Solver {
    store: Store,
    propagators: Vec<Box<dyn Propagator>>,
    watchers: Vec<Vec<usize>>,
    queue: VecDeque<usize>,
    queued: Vec<bool>,
    objective: Option<LinearExpr>,
    cutoff: Option<i64>,
}

impl Solver {
    /// Creates an empty solver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the domains.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Creates a variable with domain `[min, max]`.
    pub fn new_var(&mut self, min: i64, max: i64, name: impl Into<String>) -> IntVar {
        self.watchers.push(Vec::new());
        self.store.new_var(min, max, name)
    }

    /// Creates a variable whose domain is exactly `values`.
    pub fn new_var_from_values(
        &mut self,
        values: impl IntoIterator<Item = i64>,
        name: impl Into<String>,
    ) -> IntVar {
        self.watchers.push(Vec::new());
        self.store.new_var_with_domain(Domain::from_values(values), name)
    }

    /// Creates `count` variables named `prefix[i]`.
    pub fn new_var_array(&mut self, count: usize, min: i64, max: i64, prefix: &str) -> Vec<IntVar> {
        (0..count)
            .map(|i| self.new_var(min, max, format!("{prefix}[{i}]")))
            .collect()
    }

    /// Registers a constraint. It first runs on the next
    /// [`propagate`](Self::propagate).
    pub fn post(&mut self, propagator: impl Propagator + 'static) {
        let index = self.propagators.len();
        let mut vars = propagator.variables();
        vars.sort_unstable();
        vars.dedup();
        for var in vars {
            self.watchers[var.index()].push(index);
        }
        self.propagators.push(Box::new(propagator));
        self.queued.push(false);
        self.enqueue(index);
    }

    /// Number of posted constraints.
    pub fn num_constraints(&self) -> usize {
        self.propagators.len()
    }

    /// Sets the expression to minimize.
    pub fn minimize(&mut self, objective: LinearExpr) {
        self.objective = Some(objective);
    }

    /// The objective, if any.
    pub fn objective(&self) -> Option<&LinearExpr> {
        self.objective.as_ref()
    }

    /// Objective value when all its variables are fixed.
    pub fn objective_value(&self) -> Option<i64> {
        self.objective.as_ref()?.value(&self.store)
    }

    /// Requires the objective to be strictly below `cutoff`.
    pub fn set_cutoff(&mut self, cutoff: Option<i64>) {
        self.cutoff = cutoff;
    }

    /// Current cutoff.
    pub fn cutoff(&self) -> Option<i64> {
        self.cutoff
    }

    fn enqueue(&mut self, index: usize) {
        if !self.queued[index] {
            self.queued[index] = true;
            self.queue.push_back(index);
        }
    }

    fn schedule_modified(&mut self) -> bool {
        let modified = self.store.take_modified();
        let any = !modified.is_empty();
        for var in modified {
            for i in 0..self.watchers[var.index()].len() {
                let p = self.watchers[var.index()][i];
                self.enqueue(p);
            }
        }
        any
    }

    fn abort(&mut self) -> Conflict {
        for index in self.queue.drain(..) {
            self.queued[index] = false;
        }
        self.store.clear_modified();
        Conflict
    }

    /// Runs all pending propagators and the objective bound to a fixpoint.
    pub fn propagate(&mut self) -> Result<(), Conflict> {
        self.schedule_modified();
        loop {
            while let Some(index) = self.queue.pop_front() {
                self.queued[index] = false;
                if self.propagators[index].propagate(&mut self.store).is_err() {
                    return Err(self.abort());
                }
                self.schedule_modified();
            }
            let (Some(objective), Some(cutoff)) = (&self.objective, self.cutoff) else {
                return Ok(());
            };
            if objective.enforce_at_most(&mut self.store, cutoff - 1).is_err() {
                return Err(self.abort());
            }
            if !self.schedule_modified() {
                return Ok(());
            }
        }
    }

    /// Opens a decision level.
    pub fn push_frame(&mut self) {
        self.store.push_frame();
    }

    /// Restores the domains of the last decision level.
    pub fn pop_frame(&mut self) {
        self.store.pop_frame();
    }

    /// Pops decision levels until `depth` remain.
    pub fn backtrack_to(&mut self, depth: usize) {
        self.store.backtrack_to(depth);
    }

    /// Current decision depth.
    pub fn depth(&self) -> usize {
        self.store.depth()
    }

    /// Fixes `var` to `value` (propagation is deferred).
    pub fn assign(&mut self, var: IntVar, value: i64) -> Result<bool, Conflict> {
        self.store.assign(var, value).map_err(|_| self.abort())
    }

    /// Removes `value` from `var` (propagation is deferred).
    pub fn remove(&mut self, var: IntVar, value: i64) -> Result<bool, Conflict> {
        self.store.remove(var, value).map_err(|_| self.abort())
    }

    /// Returns `true` once every variable is fixed.
    pub fn all_fixed(&self) -> bool {
        self.store.vars().all(|v| self.store.is_fixed(v))
    }
}
