//! Frame budget: per-system cost measurement and adaptive throttling.
//!
//! # Invariants
//! - `Critical` systems run every tick.
//! - Frequencies are recomputed once per frame, in `begin_frame`; every
//!   `should_run` check within a frame sees the same values.
//! - Recovery lowers a frequency by at most one step per frame.
//!
//! The governor is advisory: it answers "should this system run now" and
//! records how long it took, but cannot interrupt a running system. Callers
//! that want a hard gate route execution through [`FrameBudgetGovernor::measure`].

mod governor;
mod timer;

pub use governor::{FrameBudgetGovernor, GovernorConfig, SystemRecord, SystemReport};
pub use timer::FrameTimer;

pub fn crate_info() -> &'static str {
    "simcore-governor v0.1.0"
}
