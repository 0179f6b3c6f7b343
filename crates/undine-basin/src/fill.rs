//! Deterministic demo fills: same spec + chunk coordinate, same cells.

use fastnoise_lite::{FastNoiseLite, NoiseType};
use serde::Deserialize;
use undine_cells::{CellBuf, CellsError, ChunkCoord, LiquidType, MAX_LEVEL};

use crate::Basin;

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    /// Noise terrain with water pooling in depressions, optional lava
    /// pockets carved under the surface.
    Pond,
    /// Flat floor with a uniform water body up to the sea level.
    Flood,
    /// Isolated liquid columns on an open grid. Worst-case face count,
    /// used by soak runs.
    Columns,
}

fn default_fill_mode() -> FillMode {
    FillMode::Pond
}

fn default_seed() -> i32 {
    1337
}

fn default_sea_level() -> i32 {
    8
}

fn default_frequency() -> f32 {
    0.05
}

fn default_explored() -> bool {
    true
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct FillSpec {
    #[serde(default = "default_fill_mode")]
    pub mode: FillMode,
    #[serde(default = "default_seed")]
    pub seed: i32,
    #[serde(default = "default_sea_level")]
    pub sea_level: i32,
    #[serde(default)]
    pub lava_pockets: bool,
    #[serde(default = "default_frequency")]
    pub frequency: f32,
    #[serde(default = "default_explored")]
    pub explored: bool,
}

impl Default for FillSpec {
    fn default() -> Self {
        Self {
            mode: FillMode::Pond,
            seed: default_seed(),
            sea_level: default_sea_level(),
            lava_pockets: false,
            frequency: default_frequency(),
            explored: true,
        }
    }
}

fn terrain_noise(spec: &FillSpec) -> FastNoiseLite {
    let mut n = FastNoiseLite::with_seed(spec.seed);
    n.set_noise_type(Some(NoiseType::OpenSimplex2));
    n.set_frequency(Some(spec.frequency));
    n
}

fn pocket_noise(spec: &FillSpec) -> FastNoiseLite {
    let mut n = FastNoiseLite::with_seed(spec.seed ^ 7919);
    n.set_noise_type(Some(NoiseType::OpenSimplex2));
    n.set_frequency(Some(spec.frequency * 2.3));
    n
}

/// Water level for a cell: full below the surface, partial at it.
#[inline]
fn water_level_at(wy: i32, sea_level: i32) -> u8 {
    if wy == sea_level { 6 } else { MAX_LEVEL }
}

pub fn generate_chunk(
    spec: &FillSpec,
    coord: ChunkCoord,
    sx: usize,
    sy: usize,
    sz: usize,
) -> Result<CellBuf, CellsError> {
    let mut buf = CellBuf::new(coord, sx, sy, sz)?;
    let (bx, by, bz) = buf.world_origin();
    match spec.mode {
        FillMode::Pond => {
            let terrain = terrain_noise(spec);
            let pockets = pocket_noise(spec);
            for z in 0..sz {
                for x in 0..sx {
                    let wx = bx + x as i32;
                    let wz = bz + z as i32;
                    let n = terrain.get_noise_2d(wx as f32, wz as f32);
                    let h = sy as f32 * 0.35 + n * sy as f32 * 0.3;
                    for y in 0..sy {
                        let wy = by + y as i32;
                        if (wy as f32) < h {
                            if spec.lava_pockets
                                && (wy as f32) < h - 2.0
                                && pockets.get_noise_3d(wx as f32, wy as f32, wz as f32) > 0.55
                            {
                                buf.set_liquid(x, y, z, LiquidType::Lava, MAX_LEVEL);
                            } else {
                                buf.set_solid(x, y, z, true);
                            }
                        } else if wy <= spec.sea_level {
                            buf.set_liquid(
                                x,
                                y,
                                z,
                                LiquidType::Water,
                                water_level_at(wy, spec.sea_level),
                            );
                        }
                    }
                }
            }
        }
        FillMode::Flood => {
            for z in 0..sz {
                for x in 0..sx {
                    for y in 0..sy {
                        let wy = by + y as i32;
                        if wy < 1 {
                            buf.set_solid(x, y, z, true);
                        } else if wy <= spec.sea_level {
                            buf.set_liquid(
                                x,
                                y,
                                z,
                                LiquidType::Water,
                                water_level_at(wy, spec.sea_level),
                            );
                        }
                    }
                }
            }
        }
        FillMode::Columns => {
            for z in 0..sz {
                for x in 0..sx {
                    let wx = bx + x as i32;
                    let wz = bz + z as i32;
                    if wx.rem_euclid(2) != 0 || wz.rem_euclid(2) != 0 {
                        continue;
                    }
                    let ty = if spec.lava_pockets && wx.rem_euclid(4) == 0 && wz.rem_euclid(4) == 0
                    {
                        LiquidType::Lava
                    } else {
                        LiquidType::Water
                    };
                    for y in 0..sy {
                        let wy = by + y as i32;
                        if wy <= spec.sea_level {
                            buf.set_liquid(x, y, z, ty, water_level_at(wy, spec.sea_level));
                        }
                    }
                }
            }
        }
    }
    if !spec.explored {
        buf.explored.fill(false);
    }
    Ok(buf)
}

/// Fills an `nx` by `nz` chunk grid at layer cy 0.
pub fn generate_basin(basin: &Basin, spec: &FillSpec, nx: i32, nz: i32) -> Result<(), CellsError> {
    let (sx, sy, sz) = basin.chunk_dims();
    for cz in 0..nz {
        for cx in 0..nx {
            let coord = ChunkCoord::new(cx, 0, cz);
            basin.insert_chunk(generate_chunk(spec, coord, sx, sy, sz)?);
        }
    }
    Ok(())
}
