use std::sync::Arc;

use undine_basin::Basin;
use undine_cells::{ChunkCoord, LiquidType};
use undine_geom::{Aabb, Vec3};
use undine_mesh::{BuildStats, MeshError, TypeGeometry, build_chunk_liquids};

use crate::RuntimeError;
use crate::pool::ScratchPool;
use crate::surfaces::{ChunkSurfaces, SurfaceStore};

/// Report for one chunk rebuild: one slot per meshable liquid, `None`
/// for types the request did not target.
#[derive(Debug)]
pub struct ChunkRebuild {
    pub coord: ChunkCoord,
    pub results: [Option<Result<TypeGeometry, RuntimeError>>; LiquidType::COUNT],
    pub bbox: Aabb,
    pub stats: BuildStats,
}

impl ChunkRebuild {
    pub fn result_for(&self, ty: LiquidType) -> Option<&Result<TypeGeometry, RuntimeError>> {
        ty.slot().and_then(|slot| self.results[slot].as_ref())
    }

    pub fn failed(&self) -> bool {
        self.results.iter().flatten().any(|r| r.is_err())
    }
}

/// Runs the claim / build / publish cycle for chunk liquid surfaces.
///
/// A rebuild snapshots the basin, meshes into pooled scratch and swaps
/// the finished arrays into the published surface under its lock.
/// Claims are taken up front for every targeted type at once; a chunk
/// whose type is already being built rejects the whole request instead
/// of queueing behind it.
pub struct BuildCoordinator {
    basin: Arc<Basin>,
    store: SurfaceStore,
    pool: Arc<ScratchPool>,
}

impl BuildCoordinator {
    pub fn new(basin: Arc<Basin>, pool: Arc<ScratchPool>) -> Self {
        Self {
            basin,
            store: SurfaceStore::new(),
            pool,
        }
    }

    pub fn basin(&self) -> &Basin {
        &self.basin
    }

    pub fn store(&self) -> &SurfaceStore {
        &self.store
    }

    pub fn surfaces(&self, coord: ChunkCoord) -> Option<Arc<ChunkSurfaces>> {
        self.store.get(coord)
    }

    fn chunk_bbox(&self, coord: ChunkCoord) -> Aabb {
        let (sx, sy, sz) = self.basin.chunk_dims();
        let origin = Vec3::new(
            (coord.cx * sx as i32) as f32,
            (coord.cy * sy as i32) as f32,
            (coord.cz * sz as i32) as f32,
        );
        Aabb::from_origin_size(origin, Vec3::new(sx as f32, sy as f32, sz as f32))
    }

    fn poison_err(coord: ChunkCoord, liquid: LiquidType) -> RuntimeError {
        log::error!(
            "surface publish failed: poisoned lock coord={} liquid={}",
            coord,
            liquid
        );
        RuntimeError::SurfacePoisoned { liquid }
    }

    /// Rebuilds the targeted liquid surfaces of one chunk.
    ///
    /// Every targeted type publishes, including empty results, so stale
    /// surfaces cannot outlive the liquid that produced them. The one
    /// exception is a failed build, which keeps the previous surface
    /// live and reports the error in its slot. An unloaded chunk
    /// publishes empty across the board.
    pub fn rebuild_chunk(
        &self,
        coord: ChunkCoord,
        targets: &[LiquidType],
    ) -> Result<ChunkRebuild, RuntimeError> {
        let surfaces = self.store.chunk(coord);
        let _claim = surfaces
            .claim(targets)
            .map_err(|liquid| RuntimeError::AlreadyBuilding { liquid })?;

        let mut results: [Option<Result<TypeGeometry, RuntimeError>>; LiquidType::COUNT] =
            Default::default();

        let Some(view) = self.basin.view(coord) else {
            for ty in targets {
                let Some(slot) = ty.slot() else { continue };
                results[slot] = Some(match surfaces.surface(slot).clear() {
                    Ok(()) => Ok(TypeGeometry::default()),
                    Err(_) => Err(Self::poison_err(coord, *ty)),
                });
            }
            return Ok(ChunkRebuild {
                coord,
                results,
                bbox: self.chunk_bbox(coord),
                stats: BuildStats::default(),
            });
        };

        let mut scratch = self.pool.acquire();
        let outcome = build_chunk_liquids(&view, targets, &mut scratch);

        for ty in targets {
            let Some(slot) = ty.slot() else { continue };
            let Some(result) = outcome.result_for(*ty) else {
                continue;
            };
            results[slot] = Some(match result {
                Ok(geo) if geo.vertices == 0 => match surfaces.surface(slot).clear() {
                    Ok(()) => Ok(*geo),
                    Err(_) => Err(Self::poison_err(coord, *ty)),
                },
                Ok(geo) => {
                    match surfaces
                        .surface(slot)
                        .publish(scratch.buffers.slot_mut(slot), *geo)
                    {
                        Ok(()) => Ok(*geo),
                        Err(_) => Err(Self::poison_err(coord, *ty)),
                    }
                }
                // The old surface stays live when the new build failed.
                Err(MeshError::IndexOverflow { liquid, vertices }) => {
                    Err(RuntimeError::IndexOverflow {
                        liquid: *liquid,
                        vertices: *vertices,
                    })
                }
            });
        }

        Ok(ChunkRebuild {
            coord,
            results,
            bbox: outcome.bbox,
            stats: outcome.stats,
        })
    }
}
