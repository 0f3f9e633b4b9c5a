//! Spatial indexing: uniform grid hash answering "which entities are near P".
//!
//! # Invariants
//! - An id sits in a cell bucket only while it is registered there.
//! - `clear` keeps buckets and their backing storage alive; the index is
//!   rebuilt every tick and reuses what the previous tick allocated.
//! - Queries never under-include: every id inside the queried region is
//!   returned, ids near cell edges may be over-included.
//!
//! Query results borrow scratch storage. The `&mut self` variants share one
//! buffer owned by the index, so the borrow checker rejects holding a result
//! across the next query. The `*_with` variants take a caller-owned
//! [`QueryScratch`] for callers that need several live result sets.

mod grid;

pub use grid::{CELL_KEY_STRIDE, CellRange, QueryScratch, SpatialConfig, SpatialHashIndex};

pub fn crate_info() -> &'static str {
    "simcore-spatial v0.1.0"
}
