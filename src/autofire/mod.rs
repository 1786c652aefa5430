//! Auto-fire planning and validation.
//!
//! Submodules:
//! - `planner` — derives a fire plan for a station.
//! - `validator` — checks a plan against the rosette before it is committed.

pub mod planner;
pub mod validator;

pub use planner::AutoFirePlanner;
pub use validator::validate;
