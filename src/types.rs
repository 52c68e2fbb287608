//! Core map types shared across all modules.

use crate::error::MapError;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Block coordinates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Componentwise minimum of two positions.
    pub fn min(self, other: BlockPos) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.z.min(other.z),
        )
    }

    /// Componentwise maximum of two positions.
    pub fn max(self, other: BlockPos) -> Self {
        Self::new(
            self.x.max(other.x),
            self.y.max(other.y),
            self.z.max(other.z),
        )
    }
}

impl From<(i32, i32, i32)> for BlockPos {
    fn from((x, y, z): (i32, i32, i32)) -> Self {
        Self::new(x, y, z)
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{},{}]", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// World volumes
// ---------------------------------------------------------------------------

/// Axis-aligned block volume in one world, inclusive on both corners.
///
/// Construction guarantees `min <= max` on every axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldVolume {
    pub world: String,
    pub min: BlockPos,
    pub max: BlockPos,
}

impl WorldVolume {
    /// Build a volume from explicit min/max corners.
    ///
    /// Fails with [`MapError::InvalidVolume`] if `min` exceeds `max` on any axis.
    pub fn new(world: impl Into<String>, min: BlockPos, max: BlockPos) -> Result<Self, MapError> {
        for (axis, lo, hi) in [('x', min.x, max.x), ('y', min.y, max.y), ('z', min.z, max.z)] {
            if lo > hi {
                return Err(MapError::InvalidVolume {
                    axis,
                    min: lo,
                    max: hi,
                });
            }
        }
        Ok(Self {
            world: world.into(),
            min,
            max,
        })
    }

    /// Degenerate volume covering a single block.
    pub fn block(world: impl Into<String>, pos: BlockPos) -> Self {
        Self {
            world: world.into(),
            min: pos,
            max: pos,
        }
    }

    /// Volume spanned by two opposite corners given in any order.
    pub fn from_corners(world: impl Into<String>, a: BlockPos, b: BlockPos) -> Self {
        Self {
            world: world.into(),
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn is_single_block(&self) -> bool {
        self.min == self.max
    }
}

impl std::fmt::Display for WorldVolume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}..{}", self.world, self.min, self.max)
    }
}

// ---------------------------------------------------------------------------
// Tiles and jobs
// ---------------------------------------------------------------------------

/// One renderable map tile: world plus tile coordinate in projected (x/z) space.
///
/// Ordering is row-major (`tz`, then `tx`) so tile sets iterate deterministically.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct TileId {
    pub world: String,
    pub tx: i32,
    pub tz: i32,
}

impl TileId {
    pub fn new(world: impl Into<String>, tx: i32, tz: i32) -> Self {
        Self {
            world: world.into(),
            tx,
            tz,
        }
    }
}

impl Ord for TileId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.world
            .cmp(&other.world)
            .then(self.tz.cmp(&other.tz))
            .then(self.tx.cmp(&other.tx))
    }
}

impl PartialOrd for TileId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.world, self.tx, self.tz)
    }
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobClass {
    /// Full-world and radius renders.
    Full,
    /// Incremental renders triggered by block changes.
    Update,
}

impl JobClass {
    pub const ALL: [JobClass; 2] = [JobClass::Full, JobClass::Update];

    pub(crate) fn index(self) -> usize {
        match self {
            JobClass::Full => 0,
            JobClass::Update => 1,
        }
    }
}

impl std::fmt::Display for JobClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobClass::Full => f.write_str("full"),
            JobClass::Update => f.write_str("update"),
        }
    }
}

/// A queued request to re-render one tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderJob {
    pub tile: TileId,
    pub class: JobClass,
    /// Failed render attempts so far.
    pub attempts: u32,
}

impl RenderJob {
    pub fn new(tile: TileId, class: JobClass) -> Self {
        Self {
            tile,
            class,
            attempts: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// Stats & config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapStats {
    pub pending_full: usize,
    pub pending_update: usize,
    pub full_paused: bool,
    pub update_paused: bool,
    pub tiles_dispatched: u64,
    pub render_failures: u64,
    pub jobs_dropped: u64,
    pub hidden_players: usize,
}

/// Horizontal (x/z) block bounds of a world, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HorizontalBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_z: i32,
    pub max_z: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldConfig {
    pub name: String,
    /// Lowest block layer covered by a full render.
    #[serde(default = "default_min_y")]
    pub min_y: i32,
    /// Highest block layer covered by a full render.
    #[serde(default = "default_max_y")]
    pub max_y: i32,
    /// `None` means the world is unbounded horizontally.
    #[serde(default)]
    pub bounds: Option<HorizontalBounds>,
}

impl WorldConfig {
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min_y: default_min_y(),
            max_y: default_max_y(),
            bounds: None,
        }
    }
}

fn default_min_y() -> i32 {
    -64
}

fn default_max_y() -> i32 {
    319
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// Width/depth of a map tile in blocks.
    pub tile_size: i32,
    /// Worlds the map knows about; anything else is an unknown world.
    pub worlds: Vec<WorldConfig>,
    /// Largest volume, in tiles, one trigger may queue.
    pub max_tiles_per_request: u64,
    /// Max jobs drained per class per dispatch tick.
    pub batch_size: usize,
    /// Render attempts before a failing job is dropped.
    pub max_render_attempts: u32,
    /// Interval between dispatch ticks.
    pub dispatch_interval_ms: u64,
    /// Visibility of players never explicitly set.
    pub default_player_visible: bool,
    /// Inbound web chat longer than this (in chars) is truncated.
    pub max_web_chat_length: usize,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            tile_size: 32,
            worlds: vec![WorldConfig::unbounded("world")],
            max_tiles_per_request: 65_536,
            batch_size: 64,
            max_render_attempts: 3,
            dispatch_interval_ms: 500,
            default_player_visible: true,
            max_web_chat_length: 256,
        }
    }
}
