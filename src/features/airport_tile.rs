//! Airport tiles.
//!
//! The parent of an airport tile is its airport, which owns the persistent
//! array; tiles themselves have only animation state and random bits.

use serde::{Deserialize, Serialize};

use super::tile::{TileIndex, TileMap};
use super::{read_lazily, store_lazily, Feature, ResolverContext};
use crate::group::VarScope;
use crate::resolver::{NullScope, Resolver, VariableProvider};
use crate::storage::{EntityRef, PersistentStorage, StorageError, TemporaryStorage, DEFAULT_PERSISTENT_SLOTS};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Airport {
    /// Index of the station the airport belongs to
    pub station: u32,
    pub airport_type: u8,
    pub layout: u8,
    pub location: TileIndex,
    #[serde(default)]
    pub grfid: u32,
    #[serde(default)]
    pub psa: Option<PersistentStorage>,
}

impl Airport {
    pub fn entity(&self) -> EntityRef {
        EntityRef::new(Feature::Airports, self.station)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AirportTile {
    pub tile: TileIndex,
    pub gfx: u8,
    pub animation_frame: u8,
    pub random_bits: u8,
}

/// Self scope of an airport tile.
#[derive(Debug)]
pub struct AirportTileScope<'a> {
    tile: &'a mut AirportTile,
    airport_location: TileIndex,
    map: &'a TileMap,
}

impl VariableProvider for AirportTileScope<'_> {
    fn get_variable(&self, variable: u8, parameter: u32) -> Option<u32> {
        let size = self.map.size;
        let value = match variable {
            0x41 => u32::from(self.map.info(self.tile.tile).terrain),
            // Position relative to the northern tile of the airport
            0x43 => {
                let dx = size.x(self.tile.tile).wrapping_sub(size.x(self.airport_location)) & 0xFF;
                let dy = size.y(self.tile.tile).wrapping_sub(size.y(self.airport_location)) & 0xFF;
                dy << 8 | dx
            }
            0x44 => u32::from(self.tile.animation_frame),
            0x60 => self.map.nearby_info(self.tile.tile, parameter as u8, false),
            _ => return None,
        };
        Some(value)
    }

    fn random_bits(&self) -> u32 {
        u32::from(self.tile.random_bits)
    }

    fn set_random_bits(&mut self, bits: u32) {
        self.tile.random_bits = bits as u8;
    }
}

/// Parent scope: the airport with its storage.
#[derive(Debug)]
pub struct AirportScope<'a> {
    airport: &'a mut Airport,
}

impl VariableProvider for AirportScope<'_> {
    fn get_variable(&self, variable: u8, _parameter: u32) -> Option<u32> {
        let value = match variable {
            0x40 => u32::from(self.airport.layout),
            0x41 => u32::from(self.airport.airport_type),
            0x80 => self.airport.location.0,
            _ => return None,
        };
        Some(value)
    }

    fn read_persistent(&self, index: u32) -> Result<u32, StorageError> {
        read_lazily(self.airport.psa.as_ref(), index)
    }

    fn store_persistent(&mut self, index: u32, value: u32) -> Result<(), StorageError> {
        let owner = self.airport.entity();
        let grfid = self.airport.grfid;
        store_lazily(&mut self.airport.psa, owner, grfid, DEFAULT_PERSISTENT_SLOTS, index, value)
    }
}

#[derive(Debug)]
pub struct AirportTileResolver<'a> {
    tile: AirportTileScope<'a>,
    airport: AirportScope<'a>,
    null: NullScope,
}

impl<'a> AirportTileResolver<'a> {
    pub fn new(tile: &'a mut AirportTile, airport: &'a mut Airport, map: &'a TileMap) -> Self {
        let airport_location = airport.location;
        Self {
            tile: AirportTileScope { tile, airport_location, map },
            airport: AirportScope { airport },
            null: NullScope,
        }
    }
}

impl Resolver for AirportTileResolver<'_> {
    fn scope(
        &mut self,
        scope: VarScope,
        _relative: u8,
        _temp: &TemporaryStorage,
    ) -> &mut dyn VariableProvider {
        match scope {
            VarScope::Object => &mut self.tile,
            VarScope::Parent => &mut self.airport,
            VarScope::Relative => &mut self.null,
        }
    }

    fn feature(&self) -> Feature {
        Feature::AirportTiles
    }

    fn context(&self) -> ResolverContext {
        ResolverContext::AirportTile { tile: self.tile.tile.tile, airport: self.airport.airport.station }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tile::MapSize;

    #[test]
    fn test_tile_and_airport_scopes() {
        let map = TileMap::new(MapSize::new(6, 6));
        let mut airport = Airport {
            station: 2,
            airport_type: 3,
            layout: 1,
            location: map.size.tile(10, 10),
            grfid: 0xCC,
            psa: None,
        };
        let mut tile = AirportTile { tile: map.size.tile(12, 11), gfx: 4, animation_frame: 6, random_bits: 0x9 };
        let temp = TemporaryStorage::new();
        {
            let mut resolver = AirportTileResolver::new(&mut tile, &mut airport, &map);
            let scope = resolver.scope(VarScope::Object, 0, &temp);
            assert_eq!(scope.get_variable(0x43, 0), Some(0x0102));
            assert_eq!(scope.get_variable(0x44, 0), Some(6));
            assert_eq!(scope.random_bits(), 0x9);

            let parent = resolver.scope(VarScope::Parent, 0, &temp);
            assert_eq!(parent.get_variable(0x41, 0), Some(3));
            parent.store_persistent(0, 0).unwrap();
            parent.store_persistent(3, 77).unwrap();
            assert_eq!(parent.read_persistent(3), Ok(77));
            assert_eq!(
                resolver.context(),
                ResolverContext::AirportTile { tile: map.size.tile(12, 11), airport: 2 }
            );
        }
        let psa = airport.psa.unwrap();
        assert_eq!(psa.owner, EntityRef::new(Feature::Airports, 2));
        assert_eq!(psa.grfid, 0xCC);
    }
}
