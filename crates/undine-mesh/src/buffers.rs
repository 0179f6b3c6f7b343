use undine_cells::LiquidType;
use undine_geom::Vec3;

/// Array length both buffers start at on first growth.
pub const INITIAL_CAPACITY: usize = 256;
/// One past the largest vertex index a `u16` can address.
pub const MAX_VERTICES: usize = 1 << 16;

/// One surface vertex as the renderer consumes it. Foaminess rides in the
/// first color channel; the tint and tangent are fixed for liquids.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiquidVertex {
    pub pos: [f32; 3],
    pub color: [u8; 4],
    pub tint: [u8; 4],
    pub uv: [f32; 2],
    pub aux: [f32; 4],
}

impl LiquidVertex {
    pub const ZERO: LiquidVertex = LiquidVertex {
        pos: [0.0; 3],
        color: [0; 4],
        tint: [0; 4],
        uv: [0.0; 2],
        aux: [0.0; 4],
    };

    /// Packs a resolved corner into the wire layout: foam in the red
    /// channel, full blue and alpha, white tint, planar x/z texture
    /// coordinates, fixed tangent.
    #[inline]
    pub fn surface(pos: Vec3, foam: f32) -> Self {
        LiquidVertex {
            pos: [pos.x, pos.y, pos.z],
            color: [(foam.clamp(0.0, 1.0) * 255.0) as u8, 0, 255, 255],
            tint: [255, 255, 255, 255],
            uv: [pos.x, pos.z],
            aux: [0.0, 0.0, 1.0, 1.0],
        }
    }
}

/// Raised when a cell's quads would push the vertex total past what
/// 16-bit indices can address. Nothing is grown or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityOverflow {
    pub needed: usize,
}

/// Growable vertex/index pair for one liquid type.
///
/// Array length is capacity; `vertex_count`/`index_count` are the logical
/// high-water marks of the current episode. Capacity only ever grows, so a
/// buffer stays warm across rebuilds that reuse it.
#[derive(Default, Clone)]
pub struct GeometryBuffers {
    vertices: Vec<LiquidVertex>,
    indices: Vec<u16>,
    vertex_count: usize,
    index_count: usize,
}

impl GeometryBuffers {
    /// Starts a new episode: counts rewind, storage is kept.
    #[inline]
    pub fn begin(&mut self) {
        self.vertex_count = 0;
        self.index_count = 0;
    }

    /// Guarantees room for `faces` more quads (4 vertices, 6 indices
    /// each), doubling from `INITIAL_CAPACITY` as needed. Fails without
    /// growing when the vertex total would leave 16-bit range.
    pub fn ensure_capacity(&mut self, faces: usize) -> Result<(), CapacityOverflow> {
        let need_v = self.vertex_count + faces * 4;
        if need_v > MAX_VERTICES {
            return Err(CapacityOverflow { needed: need_v });
        }
        if self.vertices.len() < need_v {
            let new_len = grown(self.vertices.len(), need_v);
            self.vertices.resize(new_len, LiquidVertex::ZERO);
        }
        let need_i = self.index_count + faces * 6;
        if self.indices.len() < need_i {
            let new_len = grown(self.indices.len(), need_i);
            self.indices.resize(new_len, 0);
        }
        Ok(())
    }

    /// Appends one quad from corner data in face winding order. The
    /// diagonal runs 0-2 unless corners 1 and 3 carry more foam combined,
    /// in which case it flips to 1-3 so the crease follows the foam.
    /// `ensure_capacity` must have covered this quad.
    pub fn emit_quad(&mut self, quad: &[(f32, Vec3); 4]) {
        let base = self.vertex_count as u16;
        for (foam, pos) in quad {
            self.vertices[self.vertex_count] = LiquidVertex::surface(*pos, *foam);
            self.vertex_count += 1;
        }
        let flipped = quad[0].0 + quad[2].0 < quad[1].0 + quad[3].0;
        let order: [u16; 6] = if flipped {
            [0, 1, 3, 1, 2, 3]
        } else {
            [0, 1, 2, 0, 2, 3]
        };
        for o in order {
            self.indices[self.index_count] = base + o;
            self.index_count += 1;
        }
    }

    /// Seals the episode and returns the authoritative (vertex, index)
    /// counts. The arrays may be longer; everything past the counts is
    /// stale storage.
    #[inline]
    pub fn finalize(&mut self) -> (usize, usize) {
        (self.vertex_count, self.index_count)
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    #[inline]
    pub fn index_count(&self) -> usize {
        self.index_count
    }

    /// Live vertices of the current episode.
    #[inline]
    pub fn vertices(&self) -> &[LiquidVertex] {
        &self.vertices[..self.vertex_count]
    }

    /// Live indices of the current episode.
    #[inline]
    pub fn indices(&self) -> &[u16] {
        &self.indices[..self.index_count]
    }

    /// Backing array lengths, distinct from the logical counts.
    #[inline]
    pub fn capacity(&self) -> (usize, usize) {
        (self.vertices.len(), self.indices.len())
    }

    /// Exchanges backing storage with a publish target. The freshly built
    /// arrays move out whole; the previously published arrays come back
    /// as warm storage for the next episode.
    #[inline]
    pub fn swap_storage(&mut self, vertices: &mut Vec<LiquidVertex>, indices: &mut Vec<u16>) {
        std::mem::swap(&mut self.vertices, vertices);
        std::mem::swap(&mut self.indices, indices);
    }
}

fn grown(len: usize, need: usize) -> usize {
    let mut new_len = len.max(INITIAL_CAPACITY);
    while new_len < need {
        new_len *= 2;
    }
    new_len
}

/// Fixed map from liquid-type slot to its geometry buffers, resolved once
/// per build episode.
#[derive(Default, Clone)]
pub struct BufferSet {
    sets: [GeometryBuffers; LiquidType::COUNT],
}

impl BufferSet {
    #[inline]
    pub fn slot(&self, slot: usize) -> &GeometryBuffers {
        &self.sets[slot]
    }

    #[inline]
    pub fn slot_mut(&mut self, slot: usize) -> &mut GeometryBuffers {
        &mut self.sets[slot]
    }
}
