use std::sync::Arc;

use hashbrown::HashMap;
use undine_cells::{CellBuf, CellState, ChunkCoord};

use crate::ViewOptions;

/// Immutable per-rebuild read view: the center chunk, a snapshot of its
/// loaded neighbor chunks and the reveal options captured at creation.
pub struct BasinView {
    center: Arc<CellBuf>,
    neighbors: HashMap<ChunkCoord, Arc<CellBuf>>,
    opts: ViewOptions,
}

impl BasinView {
    pub(crate) fn new(
        center: Arc<CellBuf>,
        neighbors: HashMap<ChunkCoord, Arc<CellBuf>>,
        opts: ViewOptions,
    ) -> Self {
        Self {
            center,
            neighbors,
            opts,
        }
    }

    #[inline]
    pub fn center(&self) -> &CellBuf {
        &self.center
    }

    #[inline]
    pub fn opts(&self) -> ViewOptions {
        self.opts
    }

    #[inline]
    pub fn dims(&self) -> (usize, usize, usize) {
        (self.center.sx, self.center.sy, self.center.sz)
    }

    /// World-cell coordinate of the center chunk's (0,0,0) corner.
    #[inline]
    pub fn origin(&self) -> (i32, i32, i32) {
        self.center.world_origin()
    }

    /// Local read within the center chunk. Callers stay in bounds; the
    /// scan loops never step outside the chunk.
    #[inline]
    pub fn cell(&self, x: usize, y: usize, z: usize) -> CellState {
        self.center.get_local(x, y, z)
    }

    /// Resolves the cell at local position + offset, crossing into
    /// neighbor chunk snapshots when the offset leaves the center chunk.
    /// None means the neighbor is unresolvable: not loaded when the view
    /// was taken, or outside the world.
    pub fn neighbor(
        &self,
        x: usize,
        y: usize,
        z: usize,
        dx: i32,
        dy: i32,
        dz: i32,
    ) -> Option<CellState> {
        let (bx, by, bz) = self.origin();
        let wx = bx + x as i32 + dx;
        let wy = by + y as i32 + dy;
        let wz = bz + z as i32 + dz;
        if let Some(cell) = self.center.get_world(wx, wy, wz) {
            return Some(cell);
        }
        let coord = ChunkCoord::new(
            wx.div_euclid(self.center.sx as i32),
            wy.div_euclid(self.center.sy as i32),
            wz.div_euclid(self.center.sz as i32),
        );
        self.neighbors
            .get(&coord)
            .and_then(|buf| buf.get_world(wx, wy, wz))
    }
}
