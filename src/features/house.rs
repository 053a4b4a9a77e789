//! House tiles.
//!
//! A house can be resolved before it exists, while the game checks whether
//! it may be built. In that state it answers with the random bits chosen for
//! the construction attempt, has no triggers and may not touch town storage.

use serde::{Deserialize, Serialize};

use super::tile::{tile_hash, TileIndex, TileMap};
use super::town::TownScope;
use super::{Feature, ResolverContext};
use crate::group::VarScope;
use crate::resolver::{NullScope, Resolver, VariableProvider};
use crate::storage::TemporaryStorage;

/// Per-tile state of a built house.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HouseTile {
    pub house_id: u16,
    pub tile: TileIndex,
    /// 0..=3, 3 means completed
    pub construction_stage: u8,
    pub age: u8,
    pub animation_frame: u8,
    pub random_bits: u8,
    pub triggers: u8,
    /// Town zone the tile lies in
    #[serde(default)]
    pub town_zone: u8,
    /// Houses with the same id in the town
    #[serde(default)]
    pub same_id_count: u16,
}

/// Self scope of a house tile.
#[derive(Debug)]
pub struct HouseScope<'a> {
    house: &'a mut HouseTile,
    map: &'a TileMap,
    not_yet_constructed: bool,
    initial_random_bits: u8,
}

impl<'a> HouseScope<'a> {
    pub fn built(house: &'a mut HouseTile, map: &'a TileMap) -> Self {
        Self { house, map, not_yet_constructed: false, initial_random_bits: 0 }
    }

    /// Scope of a house that is being checked for construction.
    pub fn planned(house: &'a mut HouseTile, map: &'a TileMap, initial_random_bits: u8) -> Self {
        Self { house, map, not_yet_constructed: true, initial_random_bits }
    }

    pub fn is_constructed(&self) -> bool {
        !self.not_yet_constructed
    }

    /// Construction stage used to pick sprites of a tile layout.
    pub fn construction_stage(&self) -> u8 {
        if self.not_yet_constructed {
            0
        } else {
            self.house.construction_stage
        }
    }
}

impl VariableProvider for HouseScope<'_> {
    fn get_variable(&self, variable: u8, parameter: u32) -> Option<u32> {
        let house = &*self.house;
        let size = self.map.size;
        let (x, y) = (size.x(house.tile), size.y(house.tile));
        let built = !self.not_yet_constructed;
        let value = match variable {
            0x40 => u32::from(self.construction_stage()) | (tile_hash(x, y) & 3) << 2,
            0x41 if built => u32::from(house.age),
            0x41 => 0,
            0x42 => u32::from(house.town_zone),
            0x43 => u32::from(self.map.info(house.tile).terrain),
            0x44 => u32::from(house.same_id_count),
            0x46 if built => u32::from(house.animation_frame),
            0x46 => 0,
            0x47 => y << 16 | x,
            0x62 => self.map.nearby_info(house.tile, parameter as u8, false),
            _ => return None,
        };
        Some(value)
    }

    fn random_bits(&self) -> u32 {
        if self.not_yet_constructed {
            u32::from(self.initial_random_bits)
        } else {
            u32::from(self.house.random_bits)
        }
    }

    fn random_triggers(&self) -> u32 {
        if self.not_yet_constructed {
            0
        } else {
            u32::from(self.house.triggers)
        }
    }

    fn set_random_bits(&mut self, bits: u32) {
        if !self.not_yet_constructed {
            self.house.random_bits = bits as u8;
        }
    }

    fn set_random_triggers(&mut self, triggers: u32) {
        if !self.not_yet_constructed {
            self.house.triggers = triggers as u8;
        }
    }
}

/// Resolver for a house tile with its town as parent.
#[derive(Debug)]
pub struct HouseResolver<'a> {
    house: HouseScope<'a>,
    town: TownScope<'a>,
    null: NullScope,
}

impl<'a> HouseResolver<'a> {
    /// Town storage is read-only while the house is not yet built.
    pub fn new(house: HouseScope<'a>, town: TownScope<'a>) -> Self {
        let readonly = !house.is_constructed();
        Self { house, town: town.readonly(readonly), null: NullScope }
    }

    pub fn house(&self) -> &HouseScope<'a> {
        &self.house
    }
}

impl Resolver for HouseResolver<'_> {
    fn scope(
        &mut self,
        scope: VarScope,
        _relative: u8,
        _temp: &TemporaryStorage,
    ) -> &mut dyn VariableProvider {
        match scope {
            VarScope::Object => &mut self.house,
            VarScope::Parent => &mut self.town,
            VarScope::Relative => &mut self.null,
        }
    }

    fn feature(&self) -> Feature {
        Feature::Houses
    }

    fn context(&self) -> ResolverContext {
        ResolverContext::House {
            tile: self.house.house.tile,
            town: self.town.town.index,
            house_id: self.house.house.house_id,
            not_yet_constructed: self.house.not_yet_constructed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tile::{MapSize, TileInfo};
    use crate::features::town::Town;
    use crate::storage::PersistentStorageMap;

    fn house(map: &TileMap) -> HouseTile {
        HouseTile {
            house_id: 12,
            tile: map.size.tile(20, 5),
            construction_stage: 2,
            age: 40,
            animation_frame: 3,
            random_bits: 0xA5,
            triggers: 0x02,
            town_zone: 1,
            same_id_count: 4,
        }
    }

    #[test]
    fn test_built_house_variables() {
        let mut map = TileMap::new(MapSize::new(6, 6));
        map.insert(map.size.tile(21, 5), TileInfo { class: 3, height: 1, terrain: 0, slope: 0 });
        let mut tile = house(&map);
        let scope = HouseScope::built(&mut tile, &map);
        let hash_bits = (tile_hash(20, 5) & 3) << 2;
        assert_eq!(scope.get_variable(0x40, 0), Some(2 | hash_bits));
        assert_eq!(scope.get_variable(0x41, 0), Some(40));
        assert_eq!(scope.get_variable(0x46, 0), Some(3));
        assert_eq!(scope.get_variable(0x47, 0), Some(5 << 16 | 20));
        assert_eq!(scope.get_variable(0x62, 0x01), Some(0x0301_0000));
        assert_eq!(scope.random_bits(), 0xA5);
        assert_eq!(scope.random_triggers(), 0x02);
        assert_eq!(scope.get_variable(0x90, 0), None);
    }

    #[test]
    fn test_planned_house_uses_initial_bits() {
        let map = TileMap::new(MapSize::new(6, 6));
        let mut tile = house(&map);
        let mut scope = HouseScope::planned(&mut tile, &map, 0x3C);
        assert_eq!(scope.random_bits(), 0x3C);
        assert_eq!(scope.random_triggers(), 0);
        assert_eq!(scope.get_variable(0x41, 0), Some(0));
        assert_eq!(scope.construction_stage(), 0);
        scope.set_random_bits(0);
        scope.set_random_triggers(0);
        assert_eq!(tile.random_bits, 0xA5);
        assert_eq!(tile.triggers, 0x02);
    }

    #[test]
    fn test_planned_house_cannot_write_town_storage() {
        let map = TileMap::new(MapSize::new(6, 6));
        let town = Town { index: 1, ..Town::default() };
        let mut storage = PersistentStorageMap::new();
        let mut tile = house(&map);
        let temp = TemporaryStorage::new();
        {
            let scope = HouseScope::planned(&mut tile, &map, 0);
            let mut resolver =
                HouseResolver::new(scope, TownScope::new(&town).with_storage(&mut storage, 5));
            resolver.scope(VarScope::Parent, 0, &temp).store_persistent(0, 1).unwrap();
            assert!(matches!(
                resolver.context(),
                ResolverContext::House { not_yet_constructed: true, house_id: 12, .. }
            ));
        }
        assert!(storage.is_empty());
    }
}
