//! Engine facade: snapshot lifecycle, persistence coordination, and the
//! debounce scheduler that coalesces bursts of changes into single saves.

pub mod debounce;
pub mod plan_manager;

pub use debounce::Debouncer;
pub use plan_manager::{LoadOutcome, PlanManager};
