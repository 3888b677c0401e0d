//! Candidate moves over the `item[]` array.

use std::fmt;

/// What a move does to one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotChange {
    /// Serve this slot in the period.
    Assign(usize),
    /// Leave the period open for the repair search.
    Release,
}

/// A set of changes to `item[]`, keyed by period.
///
/// A delta with at least one [`SlotChange::Release`] is *partial*: its
/// final values are only known after a repair search.
///
/// # Examples
///
/// ```
/// use u_lotsizing::local_search::Delta;
///
/// let mut d = Delta::new();
/// d.assign(0, 3);
/// d.assign(3, 0);
/// assert!(!d.is_partial());
/// assert_eq!(d.apply(&[0, 1, 2, 3]), Some(vec![3, 1, 2, 0]));
///
/// d.release(1);
/// assert!(d.is_partial());
/// assert_eq!(d.apply(&[0, 1, 2, 3]), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    changes: Vec<(usize, SlotChange)>,
}

impl Delta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `item[period] = slot`.
    pub fn assign(&mut self, period: usize, slot: usize) {
        self.changes.push((period, SlotChange::Assign(slot)));
    }

    /// Frees `item[period]`.
    pub fn release(&mut self, period: usize) {
        self.changes.push((period, SlotChange::Release));
    }

    pub fn changes(&self) -> &[(usize, SlotChange)] {
        &self.changes
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Returns `true` if some period is released.
    pub fn is_partial(&self) -> bool {
        self.changes
            .iter()
            .any(|&(_, change)| change == SlotChange::Release)
    }

    /// Periods the delta touches, in order of appearance.
    pub fn periods(&self) -> impl Iterator<Item = usize> + '_ {
        self.changes.iter().map(|&(p, _)| p)
    }

    /// Released periods.
    pub fn released(&self) -> impl Iterator<Item = usize> + '_ {
        self.changes
            .iter()
            .filter(|&&(_, c)| c == SlotChange::Release)
            .map(|&(p, _)| p)
    }

    /// The item array after the move, or `None` for a partial delta.
    pub fn apply(&self, items: &[usize]) -> Option<Vec<usize>> {
        let mut out = items.to_vec();
        for &(period, change) in &self.changes {
            match change {
                SlotChange::Assign(slot) => out[period] = slot,
                SlotChange::Release => return None,
            }
        }
        Some(out)
    }
}

impl fmt::Display for Delta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Delta[")?;
        for (i, &(period, change)) in self.changes.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match change {
                SlotChange::Assign(slot) => write!(f, "{period}:{slot}")?,
                SlotChange::Release => write!(f, "{period}:?")?,
            }
        }
        write!(f, "]")
    }
}
