//! Domain model types for discrete lot sizing.
//!
//! Provides the immutable instance, the explicit idle/active and carried
//! state values that replace integer sentinels, and the schedule produced
//! by the solver.

mod instance;
mod production;
mod schedule;

pub use instance::Instance;
pub use production::{CarriedState, Production};
pub use schedule::{Schedule, Violation, ViolationType};
