use simcore_common::{EntityId, Priority};
use simcore_kernel::{BehaviorSystem, Cadence, TickContext};

/// Synthetic behavior system: on its cadence, samples a few entities and
/// runs proximity queries around them, occasionally nudging one.
///
/// Randomness comes from the world seed, so two runs over worlds built with
/// the same seed stay identical.
pub struct Busywork {
    name: String,
    priority: Priority,
    cadence: Cadence,
    queries: usize,
    radius: f32,
    salt: u64,
    sample: Vec<EntityId>,
}

impl Busywork {
    pub fn new(index: usize, queries: usize) -> Self {
        const PRIORITIES: [Priority; 4] = [
            Priority::Critical,
            Priority::High,
            Priority::Medium,
            Priority::Low,
        ];
        Self {
            name: format!("busywork-{index:03}"),
            priority: PRIORITIES[index % PRIORITIES.len()],
            cadence: Cadence::new(1 + (index % 3) as u64),
            queries,
            radius: 6.0 + (index % 5) as f32 * 2.0,
            salt: (index as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15),
            sample: Vec::with_capacity(queries),
        }
    }
}

impl BehaviorSystem for Busywork {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    fn update(&mut self, ctx: &mut TickContext<'_>) {
        if !self.cadence.due(ctx.tick) {
            return;
        }
        let count = ctx.world.entity_count();
        if count == 0 {
            return;
        }

        let mut rng = fastrand::Rng::with_seed(ctx.world.seed() ^ self.salt);
        self.sample.clear();
        let ids = ctx.world.entities().keys();
        let stride = (count / self.queries.max(1)).max(1);
        let offset = rng.usize(..stride);
        self.sample
            .extend(ids.skip(offset).step_by(stride).take(self.queries));

        let mut neighbours = 0;
        for &id in &self.sample {
            let Some(pos) = ctx.world.get(id).map(|d| d.position) else {
                continue;
            };
            neighbours += ctx.index.query(pos.x, pos.y, self.radius).len();
        }

        if let Some(&id) = self.sample.first() {
            if let Some(data) = ctx.world.get_mut(id) {
                data.position.x += rng.f32() - 0.5;
                data.position.y += rng.f32() - 0.5;
            }
        }
        tracing::trace!(system = %self.name, neighbours, "busywork pass");
    }
}
