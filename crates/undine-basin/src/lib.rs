//! Multi-chunk liquid container and the read views rebuilds run against.
//!
//! Chunks are immutable snapshots behind `Arc`: edits clone the buffer,
//! apply the change and swap the handle, so an in-flight rebuild keeps
//! reading the state it started from.
#![forbid(unsafe_code)]

use std::sync::{Arc, RwLock};

use hashbrown::HashMap;
use serde::Deserialize;
use undine_cells::{CellBuf, CellState, ChunkCoord};

pub mod fill;
mod view;

pub use view::BasinView;

/// Reveal settings captured once per rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct ViewOptions {
    /// Highest world-cell y the viewer can see. Cells above are never
    /// scanned; liquid columns crossing this level get a capping top face.
    #[serde(default = "default_max_reveal")]
    pub max_reveal_level: i32,
    /// When set, unexplored cells contribute no geometry at all.
    #[serde(default)]
    pub fog_of_war: bool,
}

fn default_max_reveal() -> i32 {
    i32::MAX
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            max_reveal_level: i32::MAX,
            fog_of_war: false,
        }
    }
}

pub struct Basin {
    sx: usize,
    sy: usize,
    sz: usize,
    chunks: RwLock<HashMap<ChunkCoord, Arc<CellBuf>>>,
    opts: RwLock<ViewOptions>,
}

impl Basin {
    pub fn new(sx: usize, sy: usize, sz: usize, opts: ViewOptions) -> Self {
        Self {
            sx,
            sy,
            sz,
            chunks: RwLock::new(HashMap::new()),
            opts: RwLock::new(opts),
        }
    }

    #[inline]
    pub fn chunk_dims(&self) -> (usize, usize, usize) {
        (self.sx, self.sy, self.sz)
    }

    pub fn opts(&self) -> ViewOptions {
        *self.opts.read().unwrap()
    }

    pub fn set_opts(&self, opts: ViewOptions) {
        *self.opts.write().unwrap() = opts;
    }

    pub fn insert_chunk(&self, buf: CellBuf) {
        let mut m = self.chunks.write().unwrap();
        m.insert(buf.coord, Arc::new(buf));
    }

    pub fn remove_chunk(&self, coord: ChunkCoord) -> bool {
        let mut m = self.chunks.write().unwrap();
        m.remove(&coord).is_some()
    }

    pub fn chunk(&self, coord: ChunkCoord) -> Option<Arc<CellBuf>> {
        let m = self.chunks.read().unwrap();
        m.get(&coord).cloned()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.read().unwrap().len()
    }

    /// Coordinates of all loaded chunks, sorted so callers iterate in a
    /// stable order.
    pub fn chunk_coords(&self) -> Vec<ChunkCoord> {
        let m = self.chunks.read().unwrap();
        let mut coords: Vec<ChunkCoord> = m.keys().copied().collect();
        coords.sort_by_key(|c| (c.cy, c.cz, c.cx));
        coords
    }

    /// Clone-on-write edit. Returns false when the chunk is not loaded.
    /// Readers holding the old `Arc` are unaffected.
    pub fn edit<F: FnOnce(&mut CellBuf)>(&self, coord: ChunkCoord, f: F) -> bool {
        let mut m = self.chunks.write().unwrap();
        let Some(slot) = m.get_mut(&coord) else {
            return false;
        };
        let mut next = CellBuf::clone(slot);
        f(&mut next);
        *slot = Arc::new(next);
        true
    }

    /// Snapshots the center chunk, its loaded neighbors and the current
    /// reveal options. Returns None when the center chunk is not loaded.
    /// The view holds no lock; it stays consistent for its whole lifetime.
    pub fn view(&self, coord: ChunkCoord) -> Option<BasinView> {
        let opts = self.opts();
        let m = self.chunks.read().unwrap();
        let center = m.get(&coord).cloned()?;
        let mut neighbors = HashMap::new();
        for dy in -1..=1 {
            for dz in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 && dz == 0 {
                        continue;
                    }
                    let nc = coord.offset(dx, dy, dz);
                    if let Some(buf) = m.get(&nc) {
                        neighbors.insert(nc, buf.clone());
                    }
                }
            }
        }
        Some(BasinView::new(center, neighbors, opts))
    }
}

/// Convenience for tests and tools: a view over a single free-standing
/// buffer with no neighbors loaded.
pub fn view_of_buf(buf: CellBuf, opts: ViewOptions) -> BasinView {
    BasinView::new(Arc::new(buf), HashMap::new(), opts)
}

/// One cell state fetched straight from a basin, crossing chunks.
pub fn cell_at(basin: &Basin, wx: i32, wy: i32, wz: i32) -> Option<CellState> {
    let (sx, sy, sz) = basin.chunk_dims();
    let coord = ChunkCoord::new(
        wx.div_euclid(sx as i32),
        wy.div_euclid(sy as i32),
        wz.div_euclid(sz as i32),
    );
    basin.chunk(coord).and_then(|c| c.get_world(wx, wy, wz))
}
