//! Simulation kernel: entity store, behavior system contract and the frame loop
//! that ties the governor, spatial index and culler together.
//!
//! # Invariants
//! - The spatial index is rebuilt from world positions before any system runs.
//! - A system the governor throttles is not called at all that tick.
//! - Each frame is bracketed by `begin_frame` / `end_frame` exactly once.
//! - Empty index buckets are dropped every `INDEX_PRUNE_INTERVAL` frames.

pub mod cadence;
pub mod config;
pub mod simulation;
pub mod system;
pub mod world;

pub use cadence::Cadence;
pub use config::{ConfigError, SimConfig};
pub use simulation::{FrameSummary, INDEX_PRUNE_INTERVAL, Simulation};
pub use system::{BehaviorSystem, TickContext};
pub use world::World;

pub fn crate_info() -> &'static str {
    "simcore-kernel v0.1.0"
}
