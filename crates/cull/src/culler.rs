use serde::Deserialize;
use simcore_common::{EntityId, EntityPoint};
use std::collections::HashSet;

use crate::view::{ChunkCoord, CullingStats, LodLevel, TileBounds, Viewport};

/// Culling configuration: chunk grid, world extent and LOD thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct CullerConfig {
    /// Edge length of a chunk in tiles.
    pub chunk_size: u32,
    pub world_width: u32,
    pub world_height: u32,
    /// Screen-space tolerance used by `is_visible` when no margin is given.
    pub visibility_margin: f32,
    /// Fraction of the viewport half-diagonal rendered at full detail.
    pub lod_full_fraction: f32,
    /// Fraction of the viewport half-diagonal rendered at medium detail.
    pub lod_medium_fraction: f32,
    /// Zoom at or above which every visible object gets full detail.
    pub detail_zoom_threshold: f32,
    /// Radius, as a fraction of viewport width, that keeps detail when zoomed out.
    pub detail_radius_fraction: f32,
    pub min_zoom: f32,
}

impl Default for CullerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16,
            world_width: 200,
            world_height: 200,
            visibility_margin: 32.0,
            lod_full_fraction: 0.4,
            lod_medium_fraction: 0.75,
            detail_zoom_threshold: 0.5,
            detail_radius_fraction: 0.3,
            min_zoom: 0.01,
        }
    }
}

/// Tracks which chunks intersect the camera viewport and filters entities
/// against them.
#[derive(Debug)]
pub struct ChunkVisibilityCuller {
    config: CullerConfig,
    world_w: u32,
    world_h: u32,
    chunks_x: u32,
    chunks_y: u32,
    viewport: Viewport,
    center: (f32, f32),
    visible: HashSet<usize>,
    stats: CullingStats,
    cull_buf: Vec<EntityId>,
}

impl Default for ChunkVisibilityCuller {
    fn default() -> Self {
        Self::new(CullerConfig::default())
    }
}

impl ChunkVisibilityCuller {
    pub fn new(config: CullerConfig) -> Self {
        assert!(config.chunk_size > 0, "chunk_size must be positive");
        let mut culler = Self {
            config,
            world_w: 0,
            world_h: 0,
            chunks_x: 0,
            chunks_y: 0,
            viewport: Viewport::default(),
            center: (0.0, 0.0),
            visible: HashSet::new(),
            stats: CullingStats::default(),
            cull_buf: Vec::new(),
        };
        culler.set_world_size(config.world_width, config.world_height);
        culler
    }

    pub fn config(&self) -> &CullerConfig {
        &self.config
    }

    /// Resize the world and recompute the chunk grid. The current viewport is
    /// kept and its visible chunks are recomputed against the new grid.
    pub fn set_world_size(&mut self, width: u32, height: u32) {
        self.world_w = width;
        self.world_h = height;
        self.chunks_x = width.div_ceil(self.config.chunk_size);
        self.chunks_y = height.div_ceil(self.config.chunk_size);
        self.rebuild_visible_chunks();
    }

    pub fn world_size(&self) -> (u32, u32) {
        (self.world_w, self.world_h)
    }

    /// Chunk grid dimensions.
    pub fn chunk_grid(&self) -> (u32, u32) {
        (self.chunks_x, self.chunks_y)
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Move the camera. Negative extents collapse to zero; zoom is clamped to
    /// `min_zoom`, and a non-finite zoom falls back to 1.
    pub fn set_viewport(&mut self, x: f32, y: f32, width: f32, height: f32, zoom: f32) {
        let zoom = if zoom.is_finite() {
            zoom.max(self.config.min_zoom)
        } else {
            1.0
        };
        self.viewport = Viewport {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
            zoom,
        };
        self.center = self.viewport.center();
        self.rebuild_visible_chunks();
    }

    fn rebuild_visible_chunks(&mut self) {
        self.visible.clear();
        let vp = self.viewport;
        if self.chunks_x == 0
            || self.chunks_y == 0
            || !(vp.x.is_finite() && vp.y.is_finite())
            || !(vp.width.is_finite() && vp.height.is_finite())
        {
            return;
        }

        let Some((min_x, max_x)) =
            margin_span(vp.x, vp.width, self.config.chunk_size, self.chunks_x)
        else {
            return;
        };
        let Some((min_y, max_y)) =
            margin_span(vp.y, vp.height, self.config.chunk_size, self.chunks_y)
        else {
            return;
        };

        for cy in min_y..=max_y {
            for cx in min_x..=max_x {
                self.visible.insert(self.chunk_key(cx, cy));
            }
        }
        tracing::trace!(
            visible = self.visible.len(),
            min_x,
            min_y,
            max_x,
            max_y,
            "rebuilt visible chunks"
        );
    }

    fn chunk_key(&self, cx: u32, cy: u32) -> usize {
        cy as usize * self.chunks_x as usize + cx as usize
    }

    /// Chunk containing a world position, or `None` outside the world.
    pub fn chunk_of(&self, x: f32, y: f32) -> Option<ChunkCoord> {
        if !(x >= 0.0 && y >= 0.0 && x < self.world_w as f32 && y < self.world_h as f32) {
            return None;
        }
        let cs = self.config.chunk_size as f32;
        Some(ChunkCoord::new((x / cs) as u32, (y / cs) as u32))
    }

    /// Point test against the viewport grown by `margin` screen pixels.
    pub fn is_visible(&self, x: f32, y: f32, margin: f32) -> bool {
        let vp = &self.viewport;
        let m = margin / vp.zoom;
        x >= vp.x - m && x <= vp.x + vp.width + m && y >= vp.y - m && y <= vp.y + vp.height + m
    }

    /// [`is_visible`](Self::is_visible) with the configured default margin.
    pub fn is_visible_default(&self, x: f32, y: f32) -> bool {
        self.is_visible(x, y, self.config.visibility_margin)
    }

    /// Keep the entities whose chunk is visible. Updates [`stats`](Self::stats).
    ///
    /// The returned slice borrows the culler's buffer and is overwritten by
    /// the next pass.
    pub fn cull_entities<I>(&mut self, entities: I) -> &[EntityId]
    where
        I: IntoIterator<Item = EntityPoint>,
    {
        self.cull_buf.clear();
        let mut total = 0;
        for e in entities {
            total += 1;
            if self.in_visible_chunk(e.x, e.y) {
                self.cull_buf.push(e.id);
            }
        }
        self.stats = CullingStats::from_counts(total, self.cull_buf.len());
        &self.cull_buf
    }

    /// [`cull_entities`](Self::cull_entities) that also tags each kept entity
    /// with its [`lod_level`](Self::lod_level), taken from the same position.
    /// `out` is cleared first.
    pub fn cull_with_lod<I>(&mut self, entities: I, out: &mut Vec<(EntityId, LodLevel)>)
    where
        I: IntoIterator<Item = EntityPoint>,
    {
        out.clear();
        let mut total = 0;
        for e in entities {
            total += 1;
            if self.in_visible_chunk(e.x, e.y) {
                out.push((e.id, self.lod_level(e.x, e.y)));
            }
        }
        self.stats = CullingStats::from_counts(total, out.len());
    }

    fn in_visible_chunk(&self, x: f32, y: f32) -> bool {
        self.chunk_of(x, y)
            .is_some_and(|c| self.visible.contains(&self.chunk_key(c.x, c.y)))
    }

    /// Stats of the most recent cull pass.
    pub fn stats(&self) -> &CullingStats {
        &self.stats
    }

    /// Detail tier from the distance to the viewport center, relative to the
    /// viewport half-diagonal.
    pub fn lod_level(&self, x: f32, y: f32) -> LodLevel {
        let dist = (x - self.center.0).hypot(y - self.center.1);
        let half_diag = self.viewport.half_diagonal();
        if dist < half_diag * self.config.lod_full_fraction {
            LodLevel::Full
        } else if dist < half_diag * self.config.lod_medium_fraction {
            LodLevel::Medium
        } else {
            LodLevel::Low
        }
    }

    /// The viewport clamped to world tiles.
    pub fn visible_tile_bounds(&self) -> TileBounds {
        let vp = &self.viewport;
        let clamp_x = |v: f32| v.clamp(0.0, self.world_w as f32) as u32;
        let clamp_y = |v: f32| v.clamp(0.0, self.world_h as f32) as u32;
        TileBounds {
            start_x: clamp_x(vp.x.floor()),
            start_y: clamp_y(vp.y.floor()),
            end_x: clamp_x((vp.x + vp.width).ceil()),
            end_y: clamp_y((vp.y + vp.height).ceil()),
        }
    }

    /// Whether an object should get full detail rendering. Always true when
    /// zoomed in; when zoomed out only objects near the center qualify.
    pub fn should_render_detail(&self, x: f32, y: f32) -> bool {
        if self.viewport.zoom >= self.config.detail_zoom_threshold {
            return true;
        }
        let dist = (x - self.center.0).hypot(y - self.center.1);
        dist <= self.viewport.width * self.config.detail_radius_fraction
    }

    pub fn is_chunk_visible(&self, chunk_x: i32, chunk_y: i32) -> bool {
        if chunk_x < 0 || chunk_y < 0 {
            return false;
        }
        let (cx, cy) = (chunk_x as u32, chunk_y as u32);
        cx < self.chunks_x && cy < self.chunks_y && self.visible.contains(&self.chunk_key(cx, cy))
    }

    pub fn visible_chunk_count(&self) -> usize {
        self.visible.len()
    }

    /// Visible chunks in row-major order.
    pub fn visible_chunks(&self) -> impl Iterator<Item = ChunkCoord> + '_ {
        let cols = self.chunks_x as usize;
        let mut keys: Vec<usize> = self.visible.iter().copied().collect();
        keys.sort_unstable();
        keys.into_iter()
            .map(move |k| ChunkCoord::new((k % cols) as u32, (k / cols) as u32))
    }
}

/// Inclusive chunk span covering `[start, start + extent)` with one chunk of
/// margin on each side, clamped to `[0, chunks)`.
fn margin_span(start: f32, extent: f32, chunk_size: u32, chunks: u32) -> Option<(u32, u32)> {
    let cs = chunk_size as f64;
    let first = (start as f64 / cs).floor() as i64 - 1;
    let last = ((start as f64 + extent as f64) / cs).ceil() as i64;
    let lo = first.max(0);
    let hi = last.min(chunks as i64 - 1);
    (lo <= hi).then_some((lo as u32, hi as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn culler() -> ChunkVisibilityCuller {
        ChunkVisibilityCuller::default()
    }

    #[test]
    fn default_world_has_13_by_13_chunks() {
        let c = culler();
        assert_eq!(c.world_size(), (200, 200));
        assert_eq!(c.chunk_grid(), (13, 13));
    }

    #[test]
    fn small_viewport_marks_three_by_three() {
        let mut c = culler();
        c.set_viewport(0.0, 0.0, 32.0, 32.0, 1.0);

        for cy in 0..3 {
            for cx in 0..3 {
                assert!(c.is_chunk_visible(cx, cy), "chunk ({cx}, {cy})");
            }
        }
        assert_eq!(c.visible_chunk_count(), 9);
        assert!(!c.is_chunk_visible(3, 0));
        assert!(!c.is_chunk_visible(5, 5));
        assert!(!c.is_chunk_visible(-1, 0));
    }

    #[test]
    fn viewport_in_middle_gets_margin_on_both_sides() {
        let mut c = culler();
        c.set_viewport(64.0, 64.0, 16.0, 16.0, 1.0);
        let chunks: Vec<ChunkCoord> = c.visible_chunks().collect();
        assert_eq!(chunks.len(), 9);
        assert_eq!(chunks.first(), Some(&ChunkCoord::new(3, 3)));
        assert_eq!(chunks.last(), Some(&ChunkCoord::new(5, 5)));
    }

    #[test]
    fn viewport_outside_world_sees_nothing() {
        let mut c = culler();
        c.set_viewport(1000.0, 1000.0, 50.0, 50.0, 1.0);
        assert_eq!(c.visible_chunk_count(), 0);
        c.set_viewport(-500.0, 0.0, 10.0, 10.0, 1.0);
        assert_eq!(c.visible_chunk_count(), 0);
    }

    #[test]
    fn set_world_size_recomputes_grid_and_visibility() {
        let mut c = culler();
        c.set_viewport(180.0, 0.0, 40.0, 16.0, 1.0);
        assert!(c.is_chunk_visible(12, 0));

        c.set_world_size(100, 100);
        assert_eq!(c.chunk_grid(), (7, 7));
        assert!(!c.is_chunk_visible(12, 0));
        assert_eq!(c.visible_chunk_count(), 0);

        c.set_world_size(400, 64);
        assert_eq!(c.chunk_grid(), (25, 4));
        assert!(c.is_chunk_visible(13, 0));
    }

    #[test]
    fn is_visible_margin_scales_with_zoom() {
        let mut c = culler();
        c.set_viewport(100.0, 100.0, 20.0, 20.0, 1.0);
        assert!(c.is_visible(130.0, 110.0, 10.0));
        assert!(!c.is_visible(131.0, 110.0, 10.0));

        // Zoomed in 2x: the same screen margin covers half the world distance.
        c.set_viewport(100.0, 100.0, 20.0, 20.0, 2.0);
        assert!(c.is_visible(125.0, 110.0, 10.0));
        assert!(!c.is_visible(126.0, 110.0, 10.0));

        assert!(c.is_visible_default(130.0, 110.0));
    }

    #[test]
    fn cull_filters_by_chunk_and_updates_stats() {
        let mut c = culler();
        c.set_viewport(0.0, 0.0, 32.0, 32.0, 1.0);
        let entities = [
            EntityPoint::new(EntityId(1), 5.0, 5.0),
            EntityPoint::new(EntityId(2), 40.0, 40.0),
            EntityPoint::new(EntityId(3), 150.0, 150.0),
            EntityPoint::new(EntityId(4), -3.0, 5.0),
        ];
        let visible = c.cull_entities(entities).to_vec();
        assert_eq!(visible, vec![EntityId(1), EntityId(2)]);

        let stats = *c.stats();
        assert_eq!(stats.total_entities, 4);
        assert_eq!(stats.visible_entities, 2);
        assert_eq!(stats.culled_entities, 2);
        assert_eq!(stats.culling_ratio, 0.5);
    }

    #[test]
    fn cull_with_lod_matches_separate_passes() {
        let mut c = culler();
        c.set_viewport(0.0, 0.0, 32.0, 32.0, 1.0);
        let points = [
            EntityPoint::new(EntityId(1), 16.0, 16.0),
            EntityPoint::new(EntityId(2), 1.0, 1.0),
            EntityPoint::new(EntityId(3), 28.0, 16.0),
            EntityPoint::new(EntityId(4), 150.0, 150.0),
        ];

        let mut tagged = Vec::new();
        c.cull_with_lod(points, &mut tagged);
        let with_lod_stats = *c.stats();
        let ids = c.cull_entities(points).to_vec();

        assert_eq!(tagged.iter().map(|(id, _)| *id).collect::<Vec<_>>(), ids);
        assert_eq!(with_lod_stats, *c.stats());
        for (id, lod) in &tagged {
            let p = points.iter().find(|p| p.id == *id).map(|p| c.lod_level(p.x, p.y));
            assert_eq!(Some(*lod), p);
        }
        assert_eq!(tagged[0], (EntityId(1), LodLevel::Full));
        assert_eq!(tagged[1], (EntityId(2), LodLevel::Low));
        assert_eq!(tagged[2], (EntityId(3), LodLevel::Medium));

        c.cull_with_lod(std::iter::empty::<EntityPoint>(), &mut tagged);
        assert!(tagged.is_empty());
    }

    #[test]
    fn cull_of_nothing_has_zero_ratio() {
        let mut c = culler();
        c.set_viewport(0.0, 0.0, 32.0, 32.0, 1.0);
        assert!(c.cull_entities(std::iter::empty::<EntityPoint>()).is_empty());
        assert_eq!(c.stats().culling_ratio, 0.0);
        assert_eq!(c.stats().total_entities, 0);
    }

    #[test]
    fn lod_at_center_and_half_diagonal() {
        let mut c = culler();
        c.set_viewport(0.0, 0.0, 60.0, 80.0, 1.0);
        // Center (30, 40), half-diagonal 50.
        assert_eq!(c.lod_level(30.0, 40.0), LodLevel::Full);
        assert_eq!(c.lod_level(30.0 + 19.0, 40.0), LodLevel::Full);
        assert_eq!(c.lod_level(30.0 + 20.0, 40.0), LodLevel::Medium);
        assert_eq!(c.lod_level(30.0 + 37.0, 40.0), LodLevel::Medium);
        assert_eq!(c.lod_level(30.0 + 38.0, 40.0), LodLevel::Low);
        assert_eq!(c.lod_level(60.0, 80.0), LodLevel::Low);
    }

    #[test]
    fn tile_bounds_clamp_to_world() {
        let mut c = culler();
        c.set_viewport(-10.5, 190.2, 50.0, 30.0, 1.0);
        let b = c.visible_tile_bounds();
        assert_eq!(
            b,
            TileBounds {
                start_x: 0,
                start_y: 190,
                end_x: 40,
                end_y: 200,
            }
        );
    }

    #[test]
    fn detail_limited_to_center_when_zoomed_out() {
        let mut c = culler();
        c.set_viewport(0.0, 0.0, 100.0, 100.0, 1.0);
        assert!(c.should_render_detail(0.0, 0.0));

        c.set_viewport(0.0, 0.0, 100.0, 100.0, 0.25);
        assert!(c.should_render_detail(50.0, 50.0));
        assert!(c.should_render_detail(80.0, 50.0));
        assert!(!c.should_render_detail(81.0, 50.0));
    }

    #[test]
    fn zoom_is_clamped() {
        let mut c = culler();
        c.set_viewport(0.0, 0.0, 10.0, 10.0, 0.0);
        assert_eq!(c.viewport().zoom, 0.01);
        c.set_viewport(0.0, 0.0, 10.0, 10.0, f32::NAN);
        assert_eq!(c.viewport().zoom, 1.0);
    }

    #[test]
    fn chunk_of_rejects_outside_world() {
        let c = culler();
        assert_eq!(c.chunk_of(17.0, 33.0), Some(ChunkCoord::new(1, 2)));
        assert_eq!(c.chunk_of(199.9, 0.0), Some(ChunkCoord::new(12, 0)));
        assert_eq!(c.chunk_of(200.0, 0.0), None);
        assert_eq!(c.chunk_of(f32::NAN, 0.0), None);
    }
}
