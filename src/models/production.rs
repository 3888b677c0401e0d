//! What a period produces and which product it remembers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Output of a single period.
///
/// Encoded as `-1` (idle) or the product index when stored in an integer
/// domain.
///
/// # Examples
///
/// ```
/// use u_lotsizing::models::Production;
///
/// assert_eq!(Production::Idle.code(), -1);
/// assert_eq!(Production::from_code(3), Some(Production::Active(3)));
/// assert_eq!(Production::Active(2).to_string(), "2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Production {
    /// Nothing is produced.
    Idle,
    /// One unit of the given product is produced.
    Active(usize),
}

impl Production {
    /// Integer code of the idle value.
    pub const IDLE_CODE: i64 = -1;

    /// Integer encoding used in constraint domains.
    pub fn code(self) -> i64 {
        match self {
            Self::Idle => Self::IDLE_CODE,
            Self::Active(p) => p as i64,
        }
    }

    /// Decodes an integer domain value. Returns `None` below `-1`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            Self::IDLE_CODE => Some(Self::Idle),
            c if c >= 0 => Some(Self::Active(c as usize)),
            _ => None,
        }
    }

    /// Returns the active product, if any.
    pub fn product(self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::Active(p) => Some(p),
        }
    }

    /// Returns `true` for [`Production::Idle`].
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// The last product made, carried forward through idle runs.
///
/// A period that produces `p` carries `p`; an idle period carries whatever
/// its predecessor carried. Before any production the state is
/// [`CarriedState::NoState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CarriedState {
    /// Nothing has been produced yet.
    NoState,
    /// The most recent product.
    Carrying(usize),
}

impl CarriedState {
    /// Integer code of the empty state.
    pub const NO_STATE_CODE: i64 = -1;

    /// Integer encoding used in constraint domains.
    pub fn code(self) -> i64 {
        match self {
            Self::NoState => Self::NO_STATE_CODE,
            Self::Carrying(p) => p as i64,
        }
    }

    /// Decodes an integer domain value. Returns `None` below `-1`.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            Self::NO_STATE_CODE => Some(Self::NoState),
            c if c >= 0 => Some(Self::Carrying(c as usize)),
            _ => None,
        }
    }

    /// State after a period producing `production`.
    pub fn after(self, production: Production) -> Self {
        match production {
            Production::Idle => self,
            Production::Active(p) => Self::Carrying(p),
        }
    }
}

impl fmt::Display for CarriedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_codes() {
        assert_eq!(Production::from_code(-1), Some(Production::Idle));
        assert_eq!(Production::from_code(0), Some(Production::Active(0)));
        assert_eq!(Production::from_code(-2), None);
        assert_eq!(Production::Active(7).code(), 7);
        assert!(Production::Idle.is_idle());
        assert_eq!(Production::Active(4).product(), Some(4));
        assert_eq!(Production::Idle.product(), None);
    }

    #[test]
    fn test_state_codes() {
        assert_eq!(CarriedState::from_code(-1), Some(CarriedState::NoState));
        assert_eq!(CarriedState::Carrying(2).code(), 2);
        assert_eq!(CarriedState::NoState.to_string(), "-1");
    }

    #[test]
    fn test_state_carry() {
        let s = CarriedState::NoState.after(Production::Idle);
        assert_eq!(s, CarriedState::NoState);
        let s = s.after(Production::Active(3));
        assert_eq!(s, CarriedState::Carrying(3));
        assert_eq!(s.after(Production::Idle), CarriedState::Carrying(3));
        assert_eq!(s.after(Production::Active(1)), CarriedState::Carrying(1));
    }
}
