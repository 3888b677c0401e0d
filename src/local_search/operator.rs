//! Neighbourhood operator interface and concatenation.

use rand::RngCore;

use super::Delta;

/// Produces candidate moves around the current `item[]` assignment.
///
/// [`start`](Self::start) is called whenever the current assignment
/// changes; [`next_neighbor`](Self::next_neighbor) then yields moves until
/// the operator's pass is over.
pub trait NeighborhoodOperator {
    fn name(&self) -> &str;

    /// Restarts the pass around `current`.
    fn start(&mut self, current: &[usize]);

    /// Next candidate, or `None` when the pass is over.
    fn next_neighbor(&mut self, current: &[usize], rng: &mut dyn RngCore) -> Option<Delta>;
}

impl std::fmt::Debug for dyn NeighborhoodOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NeighborhoodOperator({})", self.name())
    }
}

/// Runs several operators one after the other within a pass.
#[derive(Debug, Default)]
pub struct ConcatenatedOperator {
    operators: Vec<Box<dyn NeighborhoodOperator>>,
    active: usize,
}

impl ConcatenatedOperator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_operator(&mut self, operator: impl NeighborhoodOperator + 'static) {
        self.operators.push(Box::new(operator));
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

impl NeighborhoodOperator for ConcatenatedOperator {
    fn name(&self) -> &str {
        "concatenate"
    }

    fn start(&mut self, current: &[usize]) {
        self.active = 0;
        self.operators.iter_mut().for_each(|op| op.start(current));
    }

    fn next_neighbor(&mut self, current: &[usize], rng: &mut dyn RngCore) -> Option<Delta> {
        while let Some(operator) = self.operators.get_mut(self.active) {
            if let Some(delta) = operator.next_neighbor(current, rng) {
                return Some(delta);
            }
            self.active += 1;
        }
        None
    }
}
