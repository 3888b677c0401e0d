//! Variable store with a trail for backtracking.

use std::fmt;

use super::Domain;

/// Handle of an integer decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IntVar(usize);

impl IntVar {
    /// Position of the variable in its store.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for IntVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

/// Raised when a domain becomes empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conflict;

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "domain wipe-out")
    }
}

impl std::error::Error for Conflict {}

/// Marks the start of a decision level on the trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Frame {
    id: u64,
    trail_start: usize,
}

/// Domains of all variables plus an undo log.
///
/// Every domain is saved at most once per frame before its first change;
/// [`pop_frame`](Self::pop_frame) restores the saved copies in reverse order.
/// Changed variables are queued for the propagation loop.
#[derive(Debug, Clone, Default)]
pub struct Store {
    domains: Vec<Domain>,
    names: Vec<String>,
    saved_in: Vec<u64>,
    trail: Vec<(IntVar, Domain)>,
    frames: Vec<Frame>,
    next_frame_id: u64,
    modified: Vec<IntVar>,
    is_modified: Vec<bool>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a variable with domain `[min, max]`.
    pub fn new_var(&mut self, min: i64, max: i64, name: impl Into<String>) -> IntVar {
        self.new_var_with_domain(Domain::new(min, max), name)
    }

    /// Adds a variable with an arbitrary initial domain.
    pub fn new_var_with_domain(&mut self, domain: Domain, name: impl Into<String>) -> IntVar {
        let var = IntVar(self.domains.len());
        self.domains.push(domain);
        self.names.push(name.into());
        self.saved_in.push(u64::MAX);
        self.is_modified.push(false);
        var
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.domains.len()
    }

    /// All variable handles.
    pub fn vars(&self) -> impl Iterator<Item = IntVar> {
        (0..self.domains.len()).map(IntVar)
    }

    /// Name given at creation.
    pub fn name(&self, var: IntVar) -> &str {
        &self.names[var.0]
    }

    /// Current domain.
    #[inline]
    pub fn domain(&self, var: IntVar) -> &Domain {
        &self.domains[var.0]
    }

    /// Returns `true` if `value` is still possible for `var`.
    #[inline]
    pub fn contains(&self, var: IntVar, value: i64) -> bool {
        self.domains[var.0].contains(value)
    }

    /// Value of a fixed variable.
    #[inline]
    pub fn value(&self, var: IntVar) -> Option<i64> {
        self.domains[var.0].value()
    }

    /// Returns `true` if `var` has a single value.
    #[inline]
    pub fn is_fixed(&self, var: IntVar) -> bool {
        self.domains[var.0].is_fixed()
    }

    /// Smallest value of `var`, `i64::MAX` when its domain is empty.
    #[inline]
    pub fn min(&self, var: IntVar) -> i64 {
        self.domains[var.0].min().unwrap_or(i64::MAX)
    }

    /// Largest value of `var`, `i64::MIN` when its domain is empty.
    #[inline]
    pub fn max(&self, var: IntVar) -> i64 {
        self.domains[var.0].max().unwrap_or(i64::MIN)
    }

    /// Current decision depth.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Opens a new decision level.
    pub fn push_frame(&mut self) {
        self.next_frame_id += 1;
        self.frames.push(Frame {
            id: self.next_frame_id,
            trail_start: self.trail.len(),
        });
    }

    /// Undoes every change since the matching [`push_frame`](Self::push_frame).
    pub fn pop_frame(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        while self.trail.len() > frame.trail_start {
            if let Some((var, domain)) = self.trail.pop() {
                self.domains[var.0] = domain;
                self.saved_in[var.0] = u64::MAX;
            }
        }
        self.clear_modified();
    }

    /// Pops frames until the depth is `depth`.
    pub fn backtrack_to(&mut self, depth: usize) {
        while self.frames.len() > depth {
            self.pop_frame();
        }
    }

    fn current_frame_id(&self) -> u64 {
        self.frames.last().map_or(0, |f| f.id)
    }

    fn update(
        &mut self,
        var: IntVar,
        change: impl FnOnce(&mut Domain) -> bool,
    ) -> Result<bool, Conflict> {
        let frame = self.current_frame_id();
        let mut next = None;
        if self.saved_in[var.0] != frame && !self.frames.is_empty() {
            next = Some(self.domains[var.0].clone());
        }
        let changed = change(&mut self.domains[var.0]);
        if changed {
            if let Some(saved) = next {
                self.trail.push((var, saved));
                self.saved_in[var.0] = frame;
            }
            if !self.is_modified[var.0] {
                self.is_modified[var.0] = true;
                self.modified.push(var);
            }
        }
        if self.domains[var.0].is_empty() {
            return Err(Conflict);
        }
        Ok(changed)
    }

    /// Removes `value` from `var`.
    pub fn remove(&mut self, var: IntVar, value: i64) -> Result<bool, Conflict> {
        if !self.contains(var, value) {
            return Ok(false);
        }
        self.update(var, |d| d.remove(value))
    }

    /// Removes every listed value from `var`.
    pub fn remove_all(&mut self, var: IntVar, values: &[i64]) -> Result<bool, Conflict> {
        if values.is_empty() {
            return Ok(false);
        }
        self.update(var, |d| {
            let mut changed = false;
            for &v in values {
                changed |= d.remove(v);
            }
            changed
        })
    }

    /// Fixes `var` to `value`.
    pub fn assign(&mut self, var: IntVar, value: i64) -> Result<bool, Conflict> {
        self.update(var, |d| d.assign(value))
    }

    /// Raises the lower bound of `var`.
    pub fn set_min(&mut self, var: IntVar, bound: i64) -> Result<bool, Conflict> {
        if self.domains[var.0].min().is_some_and(|m| m >= bound) {
            return Ok(false);
        }
        self.update(var, |d| d.remove_below(bound))
    }

    /// Lowers the upper bound of `var`.
    pub fn set_max(&mut self, var: IntVar, bound: i64) -> Result<bool, Conflict> {
        if self.domains[var.0].max().is_some_and(|m| m <= bound) {
            return Ok(false);
        }
        self.update(var, |d| d.remove_above(bound))
    }

    /// Keeps the values of `var` accepted by `keep`.
    pub fn retain(
        &mut self,
        var: IntVar,
        keep: impl FnMut(i64) -> bool,
    ) -> Result<bool, Conflict> {
        self.update(var, |d| d.retain(keep))
    }

    /// Drains the variables changed since the last call.
    pub fn take_modified(&mut self) -> Vec<IntVar> {
        for var in &self.modified {
            self.is_modified[var.0] = false;
        }
        std::mem::take(&mut self.modified)
    }

    /// Forgets pending modifications (after a conflict or a backtrack).
    pub fn clear_modified(&mut self) {
        self.take_modified();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backtrack_restores_domains() {
        let mut store = Store::new();
        let x = store.new_var(0, 9, "x");
        let y = store.new_var(0, 9, "y");

        store.push_frame();
        store.set_min(x, 3).unwrap();
        store.set_max(x, 6).unwrap();
        store.remove(y, 0).unwrap();
        store.push_frame();
        store.assign(x, 4).unwrap();
        assert_eq!(store.value(x), Some(4));
        assert_eq!(store.depth(), 2);

        store.pop_frame();
        assert_eq!(store.min(x), 3);
        assert_eq!(store.max(x), 6);
        store.pop_frame();
        assert_eq!(store.domain(x).size(), 10);
        assert!(store.contains(y, 0));
        assert_eq!(store.depth(), 0);
    }

    #[test]
    fn test_backtrack_to() {
        let mut store = Store::new();
        let x = store.new_var(0, 3, "x");
        store.push_frame();
        store.remove(x, 0).unwrap();
        store.push_frame();
        store.remove(x, 1).unwrap();
        store.push_frame();
        store.remove(x, 2).unwrap();
        store.backtrack_to(1);
        assert_eq!(store.domain(x).iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_root_changes_are_permanent() {
        let mut store = Store::new();
        let x = store.new_var(0, 3, "x");
        store.remove(x, 0).unwrap();
        store.push_frame();
        store.remove(x, 1).unwrap();
        store.pop_frame();
        assert_eq!(store.min(x), 1);
    }

    #[test]
    fn test_conflict_on_wipe_out() {
        let mut store = Store::new();
        let x = store.new_var(0, 1, "x");
        store.push_frame();
        assert_eq!(store.assign(x, 5), Err(Conflict));
        store.pop_frame();
        assert_eq!(store.domain(x).size(), 2);
    }

    #[test]
    fn test_modified_tracking() {
        let mut store = Store::new();
        let x = store.new_var(0, 3, "x");
        let y = store.new_var(0, 3, "y");
        store.remove(x, 0).unwrap();
        store.remove(x, 1).unwrap();
        store.remove(y, 3).unwrap();
        assert_eq!(store.take_modified(), vec![x, y]);
        assert!(store.take_modified().is_empty());
        assert_eq!(store.name(y), "y");
    }
}
