use glam::Vec2;
use simcore_common::{EntityId, EntityPoint};
use std::collections::BTreeMap;

/// Per-entity data stored in the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntityData {
    pub position: Vec2,
}

/// The shared entity store every behavior system reads and mutates.
///
/// Uses BTreeMap so iteration order, and therefore index rebuild and cull
/// order, is the same on every run.
#[derive(Debug, Clone, Default)]
pub struct World {
    entities: BTreeMap<EntityId, EntityData>,
    next_id: u32,
    tick: u64,
    /// Advanced every step. Behavior systems seed their per-tick RNG from it.
    seed: u64,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a world with a specific seed for reproducible runs.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn entities(&self) -> &BTreeMap<EntityId, EntityData> {
        &self.entities
    }

    /// Every entity with its position, in id order.
    pub fn points(&self) -> impl Iterator<Item = EntityPoint> + '_ {
        self.entities
            .iter()
            .map(|(id, data)| EntityPoint::new(*id, data.position.x, data.position.y))
    }

    /// Spawn a new entity at `position`. Returns its id.
    pub fn spawn(&mut self, position: Vec2) -> EntityId {
        let id = EntityId(self.next_id);
        self.spawn_with_id(id, position);
        id
    }

    /// Spawn with a caller-chosen id, replacing any entity that had it.
    pub fn spawn_with_id(&mut self, id: EntityId, position: Vec2) {
        self.next_id = self.next_id.max(id.0.wrapping_add(1));
        self.entities.insert(id, EntityData { position });
    }

    pub fn despawn(&mut self, id: EntityId) -> Option<EntityData> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut EntityData> {
        self.entities.get_mut(&id)
    }

    /// Move an entity. Returns false if it does not exist.
    pub fn set_position(&mut self, id: EntityId, position: Vec2) -> bool {
        match self.entities.get_mut(&id) {
            Some(data) => {
                data.position = position;
                true
            }
            None => false,
        }
    }

    /// Advance the shared clock by one tick.
    pub fn step(&mut self) {
        self.tick += 1;
        self.seed = splitmix64(self.seed);
    }
}

/// Splitmix64 step function; advances the world seed reproducibly.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
