//! Liquid cell types and dense per-chunk cell storage.
#![forbid(unsafe_code)]

use std::fmt;

/// Liquid carried by a cell. `None` is a real state so storage can hold
/// "no liquid here" without wrapping everything in `Option`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LiquidType {
    #[default]
    None,
    Water,
    Lava,
}

impl LiquidType {
    /// Number of meshable kinds; sizes every per-type array in the pipeline.
    pub const COUNT: usize = 2;
    /// Meshable kinds in slot order.
    pub const MESHABLE: [LiquidType; Self::COUNT] = [LiquidType::Water, LiquidType::Lava];

    /// Stable slot index for per-type arrays. `None` has no slot.
    #[inline]
    pub fn slot(self) -> Option<usize> {
        match self {
            LiquidType::None => None,
            LiquidType::Water => Some(0),
            LiquidType::Lava => Some(1),
        }
    }

    #[inline]
    pub fn from_slot(slot: usize) -> LiquidType {
        Self::MESHABLE[slot]
    }

    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            LiquidType::None => "none",
            LiquidType::Water => "water",
            LiquidType::Lava => "lava",
        }
    }
}

impl fmt::Display for LiquidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Highest liquid fill level a cell can hold.
pub const MAX_LEVEL: u8 = 8;

/// One voxel cell as the mesher reads it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellState {
    pub liquid: LiquidType,
    pub level: u8,
    pub solid: bool,
    pub explored: bool,
}

impl CellState {
    pub const AIR: CellState = CellState {
        liquid: LiquidType::None,
        level: 0,
        solid: false,
        explored: true,
    };

    #[inline]
    pub const fn solid() -> Self {
        CellState {
            liquid: LiquidType::None,
            level: 0,
            solid: true,
            explored: true,
        }
    }

    #[inline]
    pub const fn liquid(liquid: LiquidType, level: u8) -> Self {
        CellState {
            liquid,
            level,
            solid: false,
            explored: true,
        }
    }

    /// A cell counts as holding liquid only when its level is nonzero.
    #[inline]
    pub fn has_liquid(&self) -> bool {
        self.level > 0 && self.liquid != LiquidType::None
    }

    /// Open air: no terrain in the cell. Liquid does not make a cell solid.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.solid
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChunkCoord {
    pub cx: i32,
    pub cy: i32,
    pub cz: i32,
}

impl ChunkCoord {
    #[inline]
    pub const fn new(cx: i32, cy: i32, cz: i32) -> Self {
        Self { cx, cy, cz }
    }

    #[inline]
    pub fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            cx: self.cx + dx,
            cy: self.cy + dy,
            cz: self.cz + dz,
        }
    }
}

impl From<(i32, i32, i32)> for ChunkCoord {
    fn from(value: (i32, i32, i32)) -> Self {
        Self::new(value.0, value.1, value.2)
    }
}

impl fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.cx, self.cy, self.cz)
    }
}

/// Largest cell count a chunk may be created with. An isolated liquid cell
/// emits at most 5 faces (20 vertices), and isolation caps liquid density
/// at half the cells, so a legal chunk peaks at 10 vertices per cell:
/// 4096 cells stay below the 65536 limit of 16-bit indices.
pub const MAX_CELLS: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellsError {
    ChunkTooLarge { cells: usize, max: usize },
    BadArrayLen { what: &'static str, got: usize, want: usize },
}

impl fmt::Display for CellsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellsError::ChunkTooLarge { cells, max } => {
                write!(f, "chunk holds {} cells, limit is {}", cells, max)
            }
            CellsError::BadArrayLen { what, got, want } => {
                write!(f, "{} array has {} entries, expected {}", what, got, want)
            }
        }
    }
}

impl std::error::Error for CellsError {}

/// Dense cell storage for one chunk. Fields are public so tests and fill
/// generators can build buffers directly; `new` and `from_cells` are the
/// validated paths.
#[derive(Clone, Debug, PartialEq)]
pub struct CellBuf {
    pub coord: ChunkCoord,
    pub sx: usize,
    pub sy: usize,
    pub sz: usize,
    pub liquids: Vec<LiquidType>,
    pub levels: Vec<u8>,
    pub solids: Vec<bool>,
    pub explored: Vec<bool>,
}

impl CellBuf {
    /// Creates an all-air chunk. Dimensions are validated here so every
    /// buffer built through this path meshes within 16-bit index range.
    pub fn new(coord: ChunkCoord, sx: usize, sy: usize, sz: usize) -> Result<Self, CellsError> {
        let cells = sx * sy * sz;
        if cells > MAX_CELLS {
            return Err(CellsError::ChunkTooLarge {
                cells,
                max: MAX_CELLS,
            });
        }
        Ok(CellBuf {
            coord,
            sx,
            sy,
            sz,
            liquids: vec![LiquidType::None; cells],
            levels: vec![0; cells],
            solids: vec![false; cells],
            explored: vec![true; cells],
        })
    }

    /// Wraps pre-filled state arrays, validating dimensions and lengths.
    pub fn from_cells(
        coord: ChunkCoord,
        sx: usize,
        sy: usize,
        sz: usize,
        liquids: Vec<LiquidType>,
        levels: Vec<u8>,
        solids: Vec<bool>,
        explored: Vec<bool>,
    ) -> Result<Self, CellsError> {
        let cells = sx * sy * sz;
        if cells > MAX_CELLS {
            return Err(CellsError::ChunkTooLarge {
                cells,
                max: MAX_CELLS,
            });
        }
        for (what, got) in [
            ("liquids", liquids.len()),
            ("levels", levels.len()),
            ("solids", solids.len()),
            ("explored", explored.len()),
        ] {
            if got != cells {
                return Err(CellsError::BadArrayLen {
                    what,
                    got,
                    want: cells,
                });
            }
        }
        Ok(CellBuf {
            coord,
            sx,
            sy,
            sz,
            liquids,
            levels,
            solids,
            explored,
        })
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.sx * self.sy * self.sz
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize, z: usize) -> usize {
        (y * self.sz + z) * self.sx + x
    }

    #[inline]
    pub fn get_local(&self, x: usize, y: usize, z: usize) -> CellState {
        let i = self.idx(x, y, z);
        CellState {
            liquid: self.liquids[i],
            level: self.levels[i],
            solid: self.solids[i],
            explored: self.explored[i],
        }
    }

    #[inline]
    pub fn set_local(&mut self, x: usize, y: usize, z: usize, cell: CellState) {
        let i = self.idx(x, y, z);
        self.liquids[i] = cell.liquid;
        self.levels[i] = cell.level;
        self.solids[i] = cell.solid;
        self.explored[i] = cell.explored;
    }

    #[inline]
    pub fn set_liquid(&mut self, x: usize, y: usize, z: usize, liquid: LiquidType, level: u8) {
        let i = self.idx(x, y, z);
        self.liquids[i] = liquid;
        self.levels[i] = level;
    }

    #[inline]
    pub fn set_solid(&mut self, x: usize, y: usize, z: usize, solid: bool) {
        let i = self.idx(x, y, z);
        self.solids[i] = solid;
    }

    #[inline]
    pub fn set_explored(&mut self, x: usize, y: usize, z: usize, explored: bool) {
        let i = self.idx(x, y, z);
        self.explored[i] = explored;
    }

    /// World-cell coordinate of this chunk's (0,0,0) corner.
    #[inline]
    pub fn world_origin(&self) -> (i32, i32, i32) {
        (
            self.coord.cx * self.sx as i32,
            self.coord.cy * self.sy as i32,
            self.coord.cz * self.sz as i32,
        )
    }

    #[inline]
    pub fn contains_world(&self, wx: i32, wy: i32, wz: i32) -> bool {
        let (bx, by, bz) = self.world_origin();
        if wy < by || wy >= by + self.sy as i32 {
            return false;
        }
        wx >= bx && wx < bx + self.sx as i32 && wz >= bz && wz < bz + self.sz as i32
    }

    #[inline]
    pub fn get_world(&self, wx: i32, wy: i32, wz: i32) -> Option<CellState> {
        if !self.contains_world(wx, wy, wz) {
            return None;
        }
        let (bx, by, bz) = self.world_origin();
        let lx = (wx - bx) as usize;
        let ly = (wy - by) as usize;
        let lz = (wz - bz) as usize;
        Some(self.get_local(lx, ly, lz))
    }

    /// Quick occupancy scan used to skip meshing chunks with no liquid.
    #[inline]
    pub fn has_liquid(&self) -> bool {
        self.levels
            .iter()
            .zip(self.liquids.iter())
            .any(|(lv, ty)| *lv > 0 && *ty != LiquidType::None)
    }
}
