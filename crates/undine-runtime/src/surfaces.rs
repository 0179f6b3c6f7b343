use std::sync::{Arc, Mutex, MutexGuard};

use hashbrown::HashMap;
use undine_cells::{ChunkCoord, LiquidType};
use undine_mesh::{GeometryBuffers, LiquidVertex, TypeGeometry};

/// Published geometry for one liquid type of one chunk. Only the first
/// `vertex_count` / `index_count` entries are live; the rest of each
/// array is retained capacity from earlier publishes.
#[derive(Default)]
pub struct SurfaceData {
    pub vertices: Vec<LiquidVertex>,
    pub indices: Vec<u16>,
    pub vertex_count: usize,
    pub index_count: usize,
    /// Set on every publish, cleared by the uploader.
    pub dirty: bool,
}

/// A surface lock was poisoned by a panicking writer. Reported instead
/// of unwrapped so one bad build cannot take every reader down with it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfacePoison;

/// One liquid type's published surface, swapped under a short lock.
#[derive(Default)]
pub struct LiquidSurface {
    data: Mutex<SurfaceData>,
}

impl LiquidSurface {
    fn lock(&self) -> Result<MutexGuard<'_, SurfaceData>, SurfacePoison> {
        self.data.lock().map_err(|_| SurfacePoison)
    }

    /// Swaps freshly built arrays in and retires the old ones into
    /// `bufs`, where the next build reuses their capacity.
    pub fn publish(
        &self,
        bufs: &mut GeometryBuffers,
        geo: TypeGeometry,
    ) -> Result<(), SurfacePoison> {
        let mut d = self.lock()?;
        let d = &mut *d;
        bufs.swap_storage(&mut d.vertices, &mut d.indices);
        d.vertex_count = geo.vertices;
        d.index_count = geo.indices;
        d.dirty = true;
        Ok(())
    }

    /// Publishes the empty surface. Counts drop to zero so stale
    /// geometry stops rendering; arrays stay for their capacity.
    pub fn clear(&self) -> Result<(), SurfacePoison> {
        let mut d = self.lock()?;
        d.vertex_count = 0;
        d.index_count = 0;
        d.dirty = true;
        Ok(())
    }

    pub fn counts(&self) -> Result<(usize, usize), SurfacePoison> {
        let d = self.lock()?;
        Ok((d.vertex_count, d.index_count))
    }

    /// True exactly once per publish.
    pub fn take_dirty(&self) -> Result<bool, SurfacePoison> {
        let mut d = self.lock()?;
        Ok(std::mem::take(&mut d.dirty))
    }

    /// Copies the live geometry into staging vectors, clearing them
    /// first. Returns the copied counts.
    pub fn copy_geometry(
        &self,
        vertices: &mut Vec<LiquidVertex>,
        indices: &mut Vec<u16>,
    ) -> Result<(usize, usize), SurfacePoison> {
        let d = self.lock()?;
        vertices.clear();
        vertices.extend_from_slice(&d.vertices[..d.vertex_count]);
        indices.clear();
        indices.extend_from_slice(&d.indices[..d.index_count]);
        Ok((d.vertex_count, d.index_count))
    }
}

/// Build claim flags and published surfaces for one chunk, one slot per
/// meshable liquid type.
#[derive(Default)]
pub struct ChunkSurfaces {
    building: Mutex<[bool; LiquidType::COUNT]>,
    surfaces: [LiquidSurface; LiquidType::COUNT],
}

impl ChunkSurfaces {
    /// Claims every listed type for building, or none of them: the
    /// first type already being built aborts the whole claim and is
    /// reported back so the caller can retry later.
    pub fn claim(self: &Arc<Self>, targets: &[LiquidType]) -> Result<ClaimGuard, LiquidType> {
        let mut flags = self.building.lock().unwrap();
        for ty in targets {
            if let Some(slot) = ty.slot() {
                if flags[slot] {
                    return Err(*ty);
                }
            }
        }
        let mut claimed = [false; LiquidType::COUNT];
        for ty in targets {
            if let Some(slot) = ty.slot() {
                flags[slot] = true;
                claimed[slot] = true;
            }
        }
        Ok(ClaimGuard {
            owner: Arc::clone(self),
            claimed,
        })
    }

    #[inline]
    pub fn surface(&self, slot: usize) -> &LiquidSurface {
        &self.surfaces[slot]
    }
}

/// Releases the claimed build flags when dropped, on success and
/// failure paths alike.
pub struct ClaimGuard {
    owner: Arc<ChunkSurfaces>,
    claimed: [bool; LiquidType::COUNT],
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        if let Ok(mut flags) = self.owner.building.lock() {
            for (slot, claimed) in self.claimed.iter().enumerate() {
                if *claimed {
                    flags[slot] = false;
                }
            }
        }
    }
}

/// Chunk coordinate to surface map shared by workers and the uploader.
#[derive(Default)]
pub struct SurfaceStore {
    chunks: Mutex<HashMap<ChunkCoord, Arc<ChunkSurfaces>>>,
}

impl SurfaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the chunk's surfaces, creating them on first touch.
    pub fn chunk(&self, coord: ChunkCoord) -> Arc<ChunkSurfaces> {
        let mut m = self.chunks.lock().unwrap();
        m.entry(coord).or_default().clone()
    }

    pub fn get(&self, coord: ChunkCoord) -> Option<Arc<ChunkSurfaces>> {
        self.chunks.lock().unwrap().get(&coord).cloned()
    }

    pub fn remove(&self, coord: ChunkCoord) -> bool {
        self.chunks.lock().unwrap().remove(&coord).is_some()
    }

    pub fn coords(&self) -> Vec<ChunkCoord> {
        let m = self.chunks.lock().unwrap();
        let mut coords: Vec<ChunkCoord> = m.keys().copied().collect();
        coords.sort_by_key(|c| (c.cy, c.cz, c.cx));
        coords
    }
}
