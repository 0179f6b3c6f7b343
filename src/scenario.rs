//! TOML scenario describing the demo basin and its churn workload.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use undine_basin::ViewOptions;
use undine_basin::fill::FillSpec;
use undine_cells::MAX_CELLS;

fn default_chunk_size() -> [usize; 3] {
    [16, 16, 16]
}

fn default_grid() -> [i32; 2] {
    [3, 3]
}

fn default_ticks() -> u32 {
    12
}

fn default_edits_per_tick() -> u32 {
    6
}

fn default_tick_ms() -> u64 {
    40
}

/// Everything the headless run needs: basin shape, fill recipe, view
/// options and how hard to churn the liquids each tick.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
pub struct Scenario {
    /// Cells per chunk along x, y, z.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: [usize; 3],
    /// Loaded chunk grid: columns along x and z on the single y layer.
    #[serde(default = "default_grid")]
    pub grid: [i32; 2],
    #[serde(default = "default_ticks")]
    pub ticks: u32,
    /// Random liquid edits applied per tick to keep rebuilds flowing.
    #[serde(default = "default_edits_per_tick")]
    pub edits_per_tick: u32,
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Cycle the reveal ceiling down through the chunk each tick,
    /// remeshing everything at every step.
    #[serde(default)]
    pub sweep_reveal: bool,
    #[serde(default)]
    pub fill: FillSpec,
    #[serde(default)]
    pub view: ViewOptions,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            grid: default_grid(),
            ticks: default_ticks(),
            edits_per_tick: default_edits_per_tick(),
            tick_ms: default_tick_ms(),
            sweep_reveal: false,
            fill: FillSpec::default(),
            view: ViewOptions::default(),
        }
    }
}

#[derive(Debug)]
pub enum ScenarioError {
    Read(std::io::Error),
    Parse(toml::de::Error),
    ChunkTooLarge { cells: usize, max: usize },
    ZeroChunkAxis,
    EmptyGrid,
}

impl fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(err) => write!(f, "cannot read scenario: {}", err),
            Self::Parse(err) => write!(f, "cannot parse scenario: {}", err),
            Self::ChunkTooLarge { cells, max } => {
                write!(f, "chunk_size spans {} cells, limit is {}", cells, max)
            }
            Self::ZeroChunkAxis => write!(f, "chunk_size axes must all be at least 1"),
            Self::EmptyGrid => write!(f, "grid columns must both be at least 1"),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl From<std::io::Error> for ScenarioError {
    fn from(err: std::io::Error) -> Self {
        Self::Read(err)
    }
}

impl From<toml::de::Error> for ScenarioError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err)
    }
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ScenarioError> {
        if self.chunk_size.iter().any(|&d| d == 0) {
            return Err(ScenarioError::ZeroChunkAxis);
        }
        let cells = self.chunk_size.iter().product::<usize>();
        if cells > MAX_CELLS {
            return Err(ScenarioError::ChunkTooLarge {
                cells,
                max: MAX_CELLS,
            });
        }
        if self.grid[0] <= 0 || self.grid[1] <= 0 {
            return Err(ScenarioError::EmptyGrid);
        }
        Ok(())
    }
}

pub fn load_from_path(path: &Path) -> Result<Scenario, ScenarioError> {
    let text = std::fs::read_to_string(path)?;
    let scenario: Scenario = toml::from_str(&text)?;
    scenario.validate()?;
    Ok(scenario)
}

/// A missing file falls back to defaults so the demo runs out of the box.
pub fn load_or_default(path: &Path) -> Result<Scenario, ScenarioError> {
    if !path.exists() {
        log::warn!("scenario {} not found, using defaults", path.display());
        return Ok(Scenario::default());
    }
    load_from_path(path)
}
