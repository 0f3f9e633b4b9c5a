use simcore_common::Priority;
use simcore_spatial::SpatialHashIndex;

use crate::world::World;

/// What a behavior system sees while it runs.
///
/// `index` was rebuilt from world positions at the start of the frame. Moves
/// made through `world` during the frame are not reflected in it until the
/// next frame.
pub struct TickContext<'a> {
    pub tick: u64,
    pub world: &'a mut World,
    pub index: &'a mut SpatialHashIndex,
}

/// A periodic world behavior driven by the simulation loop.
pub trait BehaviorSystem {
    /// Stable name used to key the system's budget record.
    fn name(&self) -> &str;

    fn priority(&self) -> Priority {
        Priority::Medium
    }

    fn update(&mut self, ctx: &mut TickContext<'_>);
}
