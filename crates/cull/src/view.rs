use serde::Serialize;

/// Camera viewport in world units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub zoom: f32,
}

impl Viewport {
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Distance from the center to a corner.
    pub fn half_diagonal(&self) -> f32 {
        (self.width * 0.5).hypot(self.height * 0.5)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            zoom: 1.0,
        }
    }
}

/// Chunk coordinate in the chunk grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ChunkCoord {
    pub x: u32,
    pub y: u32,
}

impl ChunkCoord {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Viewport clamped to world tiles. `end_*` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TileBounds {
    pub start_x: u32,
    pub start_y: u32,
    pub end_x: u32,
    pub end_y: u32,
}

impl TileBounds {
    pub fn width(&self) -> u32 {
        self.end_x.saturating_sub(self.start_x)
    }

    pub fn height(&self) -> u32 {
        self.end_y.saturating_sub(self.start_y)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}

/// Render fidelity tier by distance from the viewport center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum LodLevel {
    Full = 0,
    Medium = 1,
    Low = 2,
}

impl LodLevel {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Outcome of the most recent cull pass.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CullingStats {
    pub total_entities: usize,
    pub visible_entities: usize,
    pub culled_entities: usize,
    /// `culled / total`, or 0 when nothing was culled against.
    pub culling_ratio: f32,
}

impl CullingStats {
    pub(crate) fn from_counts(total: usize, visible: usize) -> Self {
        let culled = total - visible;
        let culling_ratio = if total == 0 {
            0.0
        } else {
            culled as f32 / total as f32
        };
        Self {
            total_entities: total,
            visible_entities: visible,
            culled_entities: culled,
            culling_ratio,
        }
    }
}
