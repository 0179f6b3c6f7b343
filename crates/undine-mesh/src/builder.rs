use std::time::Instant;

use undine_basin::BasinView;
use undine_cells::LiquidType;
use undine_geom::{Aabb, Vec3};

use crate::MeshError;
use crate::buffers::BufferSet;
use crate::corners::{AttenuationCache, FACE_CORNERS};
use crate::face::{Face, visible_faces};

/// Working state one rebuild borrows: the neighbor/corner scratch plus the
/// per-type geometry buffers. Pooled by the runtime so storage stays warm.
#[derive(Default)]
pub struct BuildScratch {
    pub cache: AttenuationCache,
    pub buffers: BufferSet,
}

impl BuildScratch {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Finalized sizes of one liquid type's geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TypeGeometry {
    pub vertices: usize,
    pub indices: usize,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BuildStats {
    /// Liquid cells that contributed at least one face.
    pub cells: usize,
    pub faces: usize,
    pub total_ms: u32,
}

/// Per-type results of one chunk build. `None` means the type was not
/// targeted; a targeted type always reports, a zero-geometry success
/// included, so publishers can clear stale surfaces.
#[derive(Clone, Debug)]
pub struct ChunkBuildOutcome {
    pub per_type: [Option<Result<TypeGeometry, MeshError>>; LiquidType::COUNT],
    pub bbox: Aabb,
    pub stats: BuildStats,
}

impl ChunkBuildOutcome {
    #[inline]
    pub fn result_for(&self, ty: LiquidType) -> Option<&Result<TypeGeometry, MeshError>> {
        ty.slot().and_then(|s| self.per_type[s].as_ref())
    }
}

fn elapsed_ms(start: Instant) -> u32 {
    start.elapsed().as_millis().min(u128::from(u32::MAX)) as u32
}

/// Local scan ceiling: cells above the reveal level are never visited.
fn scan_ceiling(sy: usize, base_y: i32, max_reveal: i32) -> usize {
    if max_reveal == i32::MAX {
        return sy;
    }
    let top = i64::from(max_reveal) - i64::from(base_y) + 1;
    top.clamp(0, sy as i64) as usize
}

/// Meshes the liquid cells of one chunk view into the scratch buffers.
///
/// Scans y outer (bounded by the reveal ceiling), then x, then z. Cells
/// with no liquid, a non-targeted type, or unexplored under fog of war
/// are skipped; so are cells with every face hidden, which therefore
/// leave the buffers untouched. An index overflow aborts only the
/// offending type; others keep building.
pub fn build_chunk_liquids(
    view: &BasinView,
    targets: &[LiquidType],
    scratch: &mut BuildScratch,
) -> ChunkBuildOutcome {
    let t_start = Instant::now();
    let opts = view.opts();
    let (sx, sy, sz) = view.dims();
    let (bx, by, bz) = view.origin();

    let mut targeted = [false; LiquidType::COUNT];
    for ty in targets {
        if let Some(s) = ty.slot() {
            if !targeted[s] {
                targeted[s] = true;
                scratch.buffers.slot_mut(s).begin();
            }
        }
    }

    let mut failed: [Option<MeshError>; LiquidType::COUNT] = Default::default();
    let mut stats = BuildStats::default();
    let y_end = scan_ceiling(sy, by, opts.max_reveal_level);

    for y in 0..y_end {
        for x in 0..sx {
            for z in 0..sz {
                let cell = view.cell(x, y, z);
                if !cell.has_liquid() {
                    continue;
                }
                let Some(slot) = cell.liquid.slot() else {
                    continue;
                };
                if !targeted[slot] || failed[slot].is_some() {
                    continue;
                }
                if opts.fog_of_war && !cell.explored {
                    continue;
                }

                let mask = visible_faces(view, x, y, z);
                let faces = mask.visible_count();
                if faces == 0 {
                    continue;
                }
                if let Err(overflow) = scratch.buffers.slot_mut(slot).ensure_capacity(faces) {
                    log::error!(
                        "liquid {} overflows 16-bit indices in chunk {}: needs {} vertices",
                        cell.liquid,
                        view.center().coord,
                        overflow.needed
                    );
                    failed[slot] = Some(MeshError::IndexOverflow {
                        liquid: cell.liquid,
                        vertices: overflow.needed,
                    });
                    continue;
                }

                scratch.cache.reset();
                stats.cells += 1;
                stats.faces += faces;
                for face in Face::ALL {
                    if !mask.get(face) {
                        continue;
                    }
                    let mut quad = [(0.0f32, Vec3::ZERO); 4];
                    for (i, corner) in FACE_CORNERS[face.index()].iter().enumerate() {
                        quad[i] = scratch.cache.corner_vertex(view, x, y, z, *corner);
                    }
                    scratch.buffers.slot_mut(slot).emit_quad(&quad);
                }
            }
        }
    }

    let mut per_type: [Option<Result<TypeGeometry, MeshError>>; LiquidType::COUNT] =
        Default::default();
    for s in 0..LiquidType::COUNT {
        if !targeted[s] {
            continue;
        }
        per_type[s] = Some(match failed[s].take() {
            Some(err) => Err(err),
            None => {
                let (vertices, indices) = scratch.buffers.slot_mut(s).finalize();
                Ok(TypeGeometry { vertices, indices })
            }
        });
    }

    stats.total_ms = elapsed_ms(t_start);
    log::info!(
        target: "perf",
        "ms total={} liquid_mesh cells={} faces={} coord={}",
        stats.total_ms,
        stats.cells,
        stats.faces,
        view.center().coord
    );

    ChunkBuildOutcome {
        per_type,
        bbox: Aabb::from_origin_size(
            Vec3::new(bx as f32, by as f32, bz as f32),
            Vec3::new(sx as f32, sy as f32, sz as f32),
        ),
        stats,
    }
}
