pub mod cause;
pub mod state;
pub mod transition;

pub use cause::SweepCause;
pub use state::SweepState;
pub use transition::{TransitionError, transition};
