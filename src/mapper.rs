//! Region-to-tile mapping: block volumes to the flat (x/z) map tiles covering them.

use crate::types::{BlockPos, CoordinatorConfig, TileId, WorldConfig, WorldVolume};
use log::{debug, warn};
use std::collections::{BTreeSet, HashMap};

// ---------------------------------------------------------------------------
// Mapper
// ---------------------------------------------------------------------------

/// Maps world volumes onto the tiles of a flat top-down projection.
///
/// Each tile covers a `tile_size` x `tile_size` column of blocks at every
/// height, so the y axis never selects or excludes a tile.
pub struct TileMapper {
    tile_size: i32,
    worlds: HashMap<String, WorldConfig>,
}

impl TileMapper {
    pub fn new(config: &CoordinatorConfig) -> Self {
        let tile_size = if config.tile_size < 1 {
            warn!(
                "Configured tile_size {} is not positive, using 1",
                config.tile_size
            );
            1
        } else {
            config.tile_size
        };

        let worlds = config
            .worlds
            .iter()
            .map(|w| (w.name.clone(), w.clone()))
            .collect();

        Self { tile_size, worlds }
    }

    pub fn tile_size(&self) -> i32 {
        self.tile_size
    }

    pub fn is_known_world(&self, world: &str) -> bool {
        self.worlds.contains_key(world)
    }

    pub fn world(&self, world: &str) -> Option<&WorldConfig> {
        self.worlds.get(world)
    }

    /// Every tile intersecting `volume`, after clipping it to the world.
    ///
    /// Tiles are full-height columns, so y never excludes a tile. Unknown
    /// worlds and volumes outside a bounded world's x/z bounds yield an empty
    /// set; this never fails. Callers should check [`Self::tile_count`] first
    /// for untrusted volumes.
    pub fn map_volume_to_tiles(&self, volume: &WorldVolume) -> BTreeSet<TileId> {
        let mut tiles = BTreeSet::new();

        let Some((tx0, tz0, tx1, tz1)) = self.tile_range(volume) else {
            return tiles;
        };

        for tz in tz0..=tz1 {
            for tx in tx0..=tx1 {
                tiles.insert(TileId::new(volume.world.as_str(), tx, tz));
            }
        }

        tiles
    }

    /// Number of tiles [`Self::map_volume_to_tiles`] would return, without
    /// building the set.
    pub fn tile_count(&self, volume: &WorldVolume) -> u64 {
        match self.tile_range(volume) {
            Some((tx0, tz0, tx1, tz1)) => {
                let w = (i64::from(tx1) - i64::from(tx0) + 1) as u64;
                let d = (i64::from(tz1) - i64::from(tz0) + 1) as u64;
                w.saturating_mul(d)
            }
            None => 0,
        }
    }

    /// Inclusive tile range `(tx0, tz0, tx1, tz1)` covering the clipped volume.
    fn tile_range(&self, volume: &WorldVolume) -> Option<(i32, i32, i32, i32)> {
        let Some(world) = self.worlds.get(&volume.world) else {
            debug!("No tiles for unknown world '{}'", volume.world);
            return None;
        };

        let Some((min, max)) = clip(volume, world) else {
            debug!("Volume {} lies outside world bounds", volume);
            return None;
        };

        let (tx0, tz0) = self.tile_coord(min);
        let (tx1, tz1) = self.tile_coord(max);
        Some((tx0, tz0, tx1, tz1))
    }

    /// Every tile of a horizontally bounded world, or `None` if the world is
    /// unknown or unbounded.
    pub fn all_tiles(&self, world: &str) -> Option<BTreeSet<TileId>> {
        let config = self.worlds.get(world)?;
        let bounds = config.bounds?;
        let volume = WorldVolume::new(
            world,
            BlockPos::new(bounds.min_x, config.min_y, bounds.min_z),
            BlockPos::new(bounds.max_x, config.max_y, bounds.max_z),
        )
        .ok()?;
        Some(self.map_volume_to_tiles(&volume))
    }

    /// Inclusive block range covered by `tile`; a tile is an unbounded column in y.
    pub fn tile_footprint(&self, tile: &TileId) -> (BlockPos, BlockPos) {
        let x0 = tile.tx.saturating_mul(self.tile_size);
        let z0 = tile.tz.saturating_mul(self.tile_size);
        (
            BlockPos::new(x0, i32::MIN, z0),
            BlockPos::new(
                x0.saturating_add(self.tile_size - 1),
                i32::MAX,
                z0.saturating_add(self.tile_size - 1),
            ),
        )
    }

    fn tile_coord(&self, pos: BlockPos) -> (i32, i32) {
        (
            pos.x.div_euclid(self.tile_size),
            pos.z.div_euclid(self.tile_size),
        )
    }
}

/// Intersect `volume` with the world's horizontal bounds. y is not clipped:
/// every block, at any height, belongs to the column of its x/z tile.
fn clip(volume: &WorldVolume, world: &WorldConfig) -> Option<(BlockPos, BlockPos)> {
    let mut min = volume.min;
    let mut max = volume.max;

    if let Some(b) = world.bounds {
        min.x = min.x.max(b.min_x);
        max.x = max.x.min(b.max_x);
        min.z = min.z.max(b.min_z);
        max.z = max.z.min(b.max_z);
    }

    if min.x > max.x || min.z > max.z {
        None
    } else {
        Some((min, max))
    }
}
