//! Visibility: chunk-based viewport culling and level-of-detail tiers.
//!
//! # Invariants
//! - The visible-chunk set always reflects the latest viewport and world size.
//! - After a cull pass, `visible + culled == total`.
//! - Entities outside the world are never visible.
//!
//! The world is split into square chunks of `chunk_size` tiles. Setting the
//! viewport marks every chunk it touches, plus one chunk of margin on each
//! side, as visible; entity culling is then a set lookup per entity.

mod culler;
mod view;

pub use culler::{ChunkVisibilityCuller, CullerConfig};
pub use view::{ChunkCoord, CullingStats, LodLevel, TileBounds, Viewport};

pub fn crate_info() -> &'static str {
    "simcore-cull v0.1.0"
}
