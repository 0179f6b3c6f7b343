//! CPU-side liquid surface meshing.
//!
//! Walks the liquid cells of one chunk, culls hidden faces, attenuates
//! vertices by neighborhood foaminess and appends quads into per-type
//! growable buffers with 16-bit indices. Everything here is deterministic:
//! the same view meshes to byte-identical arrays every time.
#![forbid(unsafe_code)]

use std::fmt;

use undine_cells::LiquidType;

mod buffers;
mod builder;
mod corners;
mod face;

pub use buffers::{
    BufferSet, CapacityOverflow, GeometryBuffers, INITIAL_CAPACITY, LiquidVertex, MAX_VERTICES,
};
pub use builder::{BuildScratch, BuildStats, ChunkBuildOutcome, TypeGeometry, build_chunk_liquids};
pub use corners::{AttenuationCache, CORNER_NEIGHBORS, Corner, FACE_CORNERS, scratch_slot};
pub use face::{Face, FaceMask, visible_faces};

/// Every liquid vertex sits this far below its cell's nominal top.
pub const SURFACE_DIP: f32 = 0.6;
/// Extra downward offset for foamy corners in open water.
pub const FOAM_DIP: f32 = 0.4;
/// Foaminess at or below this fraction renders as flat water.
pub const FOAM_CUTOFF: f32 = 0.5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshError {
    /// The chunk needs more vertices of one liquid type than 16-bit
    /// indices can address. Legal chunk dimensions cannot reach this;
    /// it guards cell buffers constructed around the validation.
    IndexOverflow { liquid: LiquidType, vertices: usize },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeshError::IndexOverflow { liquid, vertices } => write!(
                f,
                "{} mesh needs {} vertices, 16-bit indices address {}",
                liquid, vertices, MAX_VERTICES
            ),
        }
    }
}

impl std::error::Error for MeshError {}
