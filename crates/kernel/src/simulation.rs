use simcore_common::EntityId;
use simcore_cull::{ChunkVisibilityCuller, LodLevel};
use simcore_governor::FrameBudgetGovernor;
use simcore_spatial::SpatialHashIndex;
use std::time::{Duration, Instant};

use crate::config::SimConfig;
use crate::system::{BehaviorSystem, TickContext};
use crate::world::World;

/// Frames between drops of spatial buckets left empty by moving entities.
pub const INDEX_PRUNE_INTERVAL: u64 = 256;

/// What happened during one [`Simulation::run_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSummary {
    /// Tick the frame ran at, before the world stepped.
    pub tick: u64,
    pub ran: usize,
    pub skipped: usize,
    pub elapsed: Duration,
}

/// Owns the world and the performance triad, and drives registered behavior
/// systems one frame at a time.
pub struct Simulation {
    world: World,
    governor: FrameBudgetGovernor,
    index: SpatialHashIndex,
    culler: ChunkVisibilityCuller,
    systems: Vec<Box<dyn BehaviorSystem>>,
    view: Vec<(EntityId, LodLevel)>,
}

impl Simulation {
    pub fn new(world: World, config: &SimConfig) -> Self {
        Self {
            world,
            governor: FrameBudgetGovernor::new(config.governor.clone()),
            index: SpatialHashIndex::from_config(&config.spatial),
            culler: ChunkVisibilityCuller::new(config.culler),
            systems: Vec::new(),
            view: Vec::new(),
        }
    }

    /// Register a behavior system. Systems run in the order they were added.
    pub fn add_system(&mut self, system: Box<dyn BehaviorSystem>) {
        self.governor.register(system.name(), system.priority());
        self.systems.push(system);
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn governor(&self) -> &FrameBudgetGovernor {
        &self.governor
    }

    pub fn governor_mut(&mut self) -> &mut FrameBudgetGovernor {
        &mut self.governor
    }

    pub fn index(&self) -> &SpatialHashIndex {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut SpatialHashIndex {
        &mut self.index
    }

    pub fn culler(&self) -> &ChunkVisibilityCuller {
        &self.culler
    }

    pub fn culler_mut(&mut self) -> &mut ChunkVisibilityCuller {
        &mut self.culler
    }

    /// Run one frame at the observed `fps`.
    ///
    /// Systems the governor throttles this tick are not called. Every system
    /// that runs is timed and its cost recorded.
    pub fn run_frame(&mut self, fps: f32) -> FrameSummary {
        let tick = self.world.tick();
        let _span = tracing::info_span!("sim_frame", tick).entered();

        self.governor.begin_frame(fps);
        self.index.rebuild(self.world.points());
        if tick % INDEX_PRUNE_INTERVAL == INDEX_PRUNE_INTERVAL - 1 {
            self.index.prune_empty();
        }

        let (mut ran, mut skipped) = (0, 0);
        for system in &mut self.systems {
            if !self.governor.should_run(system.name(), system.priority()) {
                tracing::trace!(system = system.name(), "throttled");
                skipped += 1;
                continue;
            }
            let start = Instant::now();
            let mut ctx = TickContext {
                tick,
                world: &mut self.world,
                index: &mut self.index,
            };
            system.update(&mut ctx);
            self.governor.record(system.name(), start.elapsed());
            ran += 1;
        }

        self.world.step();
        let elapsed = self.governor.end_frame();
        tracing::trace!(ran, skipped, ?elapsed, "frame complete");

        FrameSummary {
            tick,
            ran,
            skipped,
            elapsed,
        }
    }

    /// Point the camera at a viewport and classify every visible entity.
    ///
    /// Returns `(id, lod)` pairs in id order; the slice is reused by the next
    /// call.
    pub fn cull_view(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        zoom: f32,
    ) -> &[(EntityId, LodLevel)] {
        self.culler.set_viewport(x, y, width, height, zoom);
        self.culler.cull_with_lod(self.world.points(), &mut self.view);
        &self.view
    }
}
