//! Map tiles as seen by tile-bound features.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Linear index of a tile; `y * width + x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TileIndex(pub u32);

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile {:#x}", self.0)
    }
}

/// Map dimensions as powers of two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapSize {
    pub log_x: u8,
    pub log_y: u8,
}

impl Default for MapSize {
    fn default() -> Self {
        Self { log_x: 8, log_y: 8 }
    }
}

impl MapSize {
    pub fn new(log_x: u8, log_y: u8) -> Self {
        Self { log_x, log_y }
    }

    pub fn width(self) -> u32 {
        1 << self.log_x
    }

    pub fn height(self) -> u32 {
        1 << self.log_y
    }

    pub fn tiles(self) -> u32 {
        1 << (self.log_x + self.log_y)
    }

    /// Tile at `(x, y)`, wrapped into the map.
    pub fn tile(self, x: u32, y: u32) -> TileIndex {
        TileIndex(((y << self.log_x) | (x & (self.width() - 1))) & (self.tiles() - 1))
    }

    pub fn x(self, tile: TileIndex) -> u32 {
        tile.0 & (self.width() - 1)
    }

    pub fn y(self, tile: TileIndex) -> u32 {
        tile.0 >> self.log_x
    }

    /// Tile addressed by a nearby-tile parameter of variables 0x60..=0x6F.
    ///
    /// The low nibble is the x offset and the high nibble the y offset,
    /// read as -8..=7 when `signed` is set. `swap_axes` exchanges them for
    /// objects oriented along the y axis. Results wrap at the map edge.
    pub fn nearby_tile(self, tile: TileIndex, parameter: u8, signed: bool, swap_axes: bool) -> TileIndex {
        let mut dx = i64::from(parameter & 0x0F);
        let mut dy = i64::from(parameter >> 4);
        if signed {
            if dx >= 8 {
                dx -= 16;
            }
            if dy >= 8 {
                dy -= 16;
            }
        }
        if swap_axes {
            std::mem::swap(&mut dx, &mut dy);
        }
        let diff = dy * i64::from(self.width()) + dx;
        let wrapped = (i64::from(tile.0) + diff).rem_euclid(i64::from(self.tiles()));
        TileIndex(wrapped as u32)
    }
}

/// Hash of a tile position used to vary the look of neighbouring objects.
pub fn tile_hash(x: u32, y: u32) -> u32 {
    let mut hash = x >> 4;
    hash ^= x >> 6;
    hash ^= y >> 4;
    hash = hash.wrapping_sub(y >> 6);
    hash
}

/// What a tile looks like to a nearby-tile query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TileInfo {
    /// Tile class (clear, rail, house, water, ...)
    pub class: u8,
    /// Height in height levels
    pub height: u8,
    /// Terrain byte: water class, climate zone and water flag
    pub terrain: u8,
    pub slope: u8,
}

impl TileInfo {
    /// Packed form returned by the nearby-tile information variables.
    pub fn packed(self) -> u32 {
        u32::from(self.class) << 24
            | u32::from(self.height) << 16
            | u32::from(self.terrain) << 8
            | u32::from(self.slope)
    }
}

/// Sparse map of tile information; unset tiles are flat clear land.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileMap {
    pub size: MapSize,
    tiles: BTreeMap<TileIndex, TileInfo>,
}

impl TileMap {
    pub fn new(size: MapSize) -> Self {
        Self { size, tiles: BTreeMap::new() }
    }

    pub fn insert(&mut self, tile: TileIndex, info: TileInfo) {
        self.tiles.insert(tile, info);
    }

    pub fn info(&self, tile: TileIndex) -> TileInfo {
        self.tiles.get(&tile).copied().unwrap_or_default()
    }

    /// Packed information of the tile a nearby-tile parameter points at.
    pub fn nearby_info(&self, tile: TileIndex, parameter: u8, swap_axes: bool) -> u32 {
        self.info(self.size.nearby_tile(tile, parameter, true, swap_axes)).packed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinates() {
        let size = MapSize::new(6, 5);
        let tile = size.tile(10, 3);
        assert_eq!(tile, TileIndex(3 * 64 + 10));
        assert_eq!(size.x(tile), 10);
        assert_eq!(size.y(tile), 3);
    }

    #[test]
    fn test_nearby_tile_unsigned_and_signed() {
        let size = MapSize::new(6, 6);
        let origin = size.tile(10, 10);
        assert_eq!(size.nearby_tile(origin, 0x21, false, false), size.tile(11, 12));
        // 0xF is -1 on both axes when signed
        assert_eq!(size.nearby_tile(origin, 0xFF, true, false), size.tile(9, 9));
        assert_eq!(size.nearby_tile(origin, 0xFF, false, false), size.tile(25, 25));
        assert_eq!(size.nearby_tile(origin, 0x03, false, true), size.tile(10, 13));
    }

    #[test]
    fn test_nearby_tile_wraps() {
        let size = MapSize::new(4, 4);
        let corner = size.tile(0, 0);
        let wrapped = size.nearby_tile(corner, 0xFF, true, false);
        assert!(wrapped.0 < size.tiles());
    }

    #[test]
    fn test_tile_hash() {
        assert_eq!(tile_hash(0, 0), 0);
        assert_eq!(tile_hash(16, 0), 1);
        assert_eq!(tile_hash(64, 0), (64 >> 4) ^ 1);
    }

    #[test]
    fn test_nearby_info() {
        let size = MapSize::new(5, 5);
        let mut map = TileMap::new(size);
        map.insert(size.tile(4, 5), TileInfo { class: 3, height: 2, terrain: 0x04, slope: 1 });
        assert_eq!(map.nearby_info(size.tile(3, 4), 0x11, false), 0x0302_0401);
        assert_eq!(map.nearby_info(size.tile(3, 4), 0x00, false), 0);
    }
}
