use serde::Deserialize;
use simcore_common::{EntityId, EntityPoint};
use std::collections::{HashMap, HashSet};

/// Row stride used when packing a cell coordinate into a single key
/// (`cell_y * CELL_KEY_STRIDE + cell_x`).
///
/// Worlds wider than ±100000 cells alias distinct cells onto one key. Game
/// worlds are far below that, so the packing is kept for its cheap hashing.
pub const CELL_KEY_STRIDE: i64 = 100_000;

/// Tuning for the spatial hash.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Edge length of a grid cell in world units.
    pub cell_size: f32,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self { cell_size: 8.0 }
    }
}

/// Inclusive range of cell coordinates touched by a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl CellRange {
    /// A range that touches no cells.
    pub const EMPTY: CellRange = CellRange {
        min_x: 0,
        min_y: 0,
        max_x: -1,
        max_y: -1,
    };

    pub fn is_empty(&self) -> bool {
        self.max_x < self.min_x || self.max_y < self.min_y
    }

    /// Number of cells in the range.
    pub fn cell_count(&self) -> u64 {
        if self.is_empty() {
            return 0;
        }
        let w = (self.max_x as i64 - self.min_x as i64 + 1) as u64;
        let h = (self.max_y as i64 - self.min_y as i64 + 1) as u64;
        w.saturating_mul(h)
    }

    pub fn contains(&self, cx: i32, cy: i32) -> bool {
        cx >= self.min_x && cx <= self.max_x && cy >= self.min_y && cy <= self.max_y
    }
}

#[derive(Debug)]
struct Bucket {
    cx: i32,
    cy: i32,
    ids: Vec<EntityId>,
}

/// Reusable result storage for spatial queries.
///
/// Cleared and refilled on every query; its allocations survive across
/// queries and frames.
#[derive(Debug, Default)]
pub struct QueryScratch {
    seen: HashSet<EntityId>,
    out: Vec<EntityId>,
    // Populated buckets matched during a sparse walk, sorted row-major.
    matched: Vec<(i32, i32, i64)>,
}

impl QueryScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Results of the most recent query run against this scratch.
    pub fn results(&self) -> &[EntityId] {
        &self.out
    }
}

/// Uniform grid mapping cells to buckets of entity ids.
///
/// Expected protocol per tick: `clear` (or `rebuild`), insert every entity,
/// then query. Queries against a half-rebuilt index return arbitrary subsets.
#[derive(Debug)]
pub struct SpatialHashIndex {
    cell_size: f32,
    inv_cell: f32,
    cells: HashMap<i64, Bucket>,
    placements: usize,
    scratch: QueryScratch,
}

impl SpatialHashIndex {
    /// Create an empty index with the given cell size.
    pub fn new(cell_size: f32) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "cell_size must be positive"
        );
        Self {
            cell_size,
            inv_cell: 1.0 / cell_size,
            cells: HashMap::new(),
            placements: 0,
            scratch: QueryScratch::new(),
        }
    }

    pub fn from_config(config: &SpatialConfig) -> Self {
        Self::new(config.cell_size)
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell coordinate containing a world position.
    pub fn cell_of(&self, x: f32, y: f32) -> (i32, i32) {
        (
            (x * self.inv_cell).floor() as i32,
            (y * self.inv_cell).floor() as i32,
        )
    }

    /// Packed key for a cell coordinate.
    pub fn cell_key(cx: i32, cy: i32) -> i64 {
        cy as i64 * CELL_KEY_STRIDE + cx as i64
    }

    /// Register `id` at `(x, y)`. Non-finite positions are ignored.
    pub fn insert(&mut self, id: EntityId, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            tracing::trace!(%id, x, y, "ignoring non-finite position");
            return;
        }
        let (cx, cy) = self.cell_of(x, y);
        self.cells
            .entry(Self::cell_key(cx, cy))
            .or_insert_with(|| Bucket {
                cx,
                cy,
                ids: Vec::new(),
            })
            .ids
            .push(id);
        self.placements += 1;
    }

    /// Empty every bucket while keeping the buckets and their storage.
    pub fn clear(&mut self) {
        for bucket in self.cells.values_mut() {
            bucket.ids.clear();
        }
        self.placements = 0;
    }

    /// Clear the index and insert every point.
    pub fn rebuild<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = EntityPoint>,
    {
        self.clear();
        for p in points {
            self.insert(p.id, p.x, p.y);
        }
    }

    /// Drop buckets that are currently empty, releasing their storage.
    pub fn prune_empty(&mut self) {
        self.cells.retain(|_, bucket| !bucket.ids.is_empty());
    }

    /// Total number of id placements across all buckets.
    pub fn len(&self) -> usize {
        self.placements
    }

    pub fn is_empty(&self) -> bool {
        self.placements == 0
    }

    /// Number of allocated buckets, including empty ones kept for reuse.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Cells covering the bounding box of a circle. Empty for a negative
    /// radius or non-finite input.
    pub fn circle_range(&self, x: f32, y: f32, radius: f32) -> CellRange {
        if !(x.is_finite() && y.is_finite() && radius.is_finite()) || radius < 0.0 {
            return CellRange::EMPTY;
        }
        self.rect_range(x - radius, y - radius, x + radius, y + radius)
    }

    /// Cells covering an axis-aligned rectangle. Empty when the rectangle is
    /// inverted or non-finite.
    pub fn rect_range(&self, x1: f32, y1: f32, x2: f32, y2: f32) -> CellRange {
        if !(x1.is_finite() && y1.is_finite() && x2.is_finite() && y2.is_finite())
            || x2 < x1
            || y2 < y1
        {
            return CellRange::EMPTY;
        }
        let (min_x, min_y) = self.cell_of(x1, y1);
        let (max_x, max_y) = self.cell_of(x2, y2);
        CellRange {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Ids in cells touched by the circle around `(x, y)`.
    ///
    /// The result borrows the index's scratch buffer and is overwritten by
    /// the next query.
    pub fn query(&mut self, x: f32, y: f32, radius: f32) -> &[EntityId] {
        let range = self.circle_range(x, y, radius);
        collect(&self.cells, range, &mut self.scratch);
        &self.scratch.out
    }

    /// Ids in cells touched by the rectangle `[x1, x2] x [y1, y2]`.
    pub fn query_rect(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> &[EntityId] {
        let range = self.rect_range(x1, y1, x2, y2);
        collect(&self.cells, range, &mut self.scratch);
        &self.scratch.out
    }

    /// Same as [`query`](Self::query) but writes into caller-owned scratch.
    pub fn query_with<'s>(
        &self,
        scratch: &'s mut QueryScratch,
        x: f32,
        y: f32,
        radius: f32,
    ) -> &'s [EntityId] {
        collect(&self.cells, self.circle_range(x, y, radius), scratch);
        &scratch.out
    }

    /// Same as [`query_rect`](Self::query_rect) but writes into caller-owned scratch.
    pub fn query_rect_with<'s>(
        &self,
        scratch: &'s mut QueryScratch,
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    ) -> &'s [EntityId] {
        collect(&self.cells, self.rect_range(x1, y1, x2, y2), scratch);
        &scratch.out
    }
}

/// Gather the ids of every populated cell in `range` into `scratch`, in
/// row-major cell order, deduplicated.
fn collect(cells: &HashMap<i64, Bucket>, range: CellRange, scratch: &mut QueryScratch) {
    scratch.seen.clear();
    scratch.out.clear();
    if range.is_empty() || cells.is_empty() {
        return;
    }

    if range.cell_count() > cells.len() as u64 {
        // Range is larger than the populated map: walk buckets instead.
        scratch.matched.clear();
        scratch.matched.extend(
            cells
                .iter()
                .filter(|(_, b)| !b.ids.is_empty() && range.contains(b.cx, b.cy))
                .map(|(key, b)| (b.cy, b.cx, *key)),
        );
        scratch.matched.sort_unstable();
        for &(_, _, key) in &scratch.matched {
            if let Some(bucket) = cells.get(&key) {
                push_unique(&bucket.ids, &mut scratch.seen, &mut scratch.out);
            }
        }
        return;
    }

    for cy in range.min_y..=range.max_y {
        for cx in range.min_x..=range.max_x {
            if let Some(bucket) = cells.get(&SpatialHashIndex::cell_key(cx, cy)) {
                push_unique(&bucket.ids, &mut scratch.seen, &mut scratch.out);
            }
        }
    }
}

fn push_unique(ids: &[EntityId], seen: &mut HashSet<EntityId>, out: &mut Vec<EntityId>) {
    for &id in ids {
        if seen.insert(id) {
            out.push(id);
        }
    }
}
