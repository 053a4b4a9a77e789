//! Stations.
//!
//! Real groups of stations pick their sprites by the amount of cargo
//! waiting, compared against the threshold of the station class. A station
//! preview in the build menu has no station and always shows the first
//! loading set.

use serde::{Deserialize, Serialize};

use super::tile::{TileIndex, TileMap};
use super::town::TownScope;
use super::{Feature, ResolverContext};
use crate::eval::CargoThreshold;
use crate::group::{RealGroup, VarScope};
use crate::pool::NodeRef;
use crate::resolver::{NullScope, Resolver, VariableProvider};
use crate::storage::TemporaryStorage;

/// Rating reported for cargo that never visited the station.
const NO_RATING: u32 = 0xFFFF_FFFF;

/// Cargo waiting at a station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StationCargo {
    pub cargo: u8,
    pub waiting: u32,
    /// None until a vehicle tried to load this cargo
    pub rating: Option<u8>,
    pub days_since_pickup: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub index: u32,
    pub owner: u8,
    /// Bit set of rail, lorry, bus, airport and dock facilities
    pub facilities: u8,
    pub random: u16,
    #[serde(default)]
    pub cargo: Vec<StationCargo>,
}

impl Station {
    pub fn cargo(&self, cargo: u8) -> Option<&StationCargo> {
        self.cargo.iter().find(|entry| entry.cargo == cargo)
    }

    pub fn total_waiting(&self) -> u32 {
        self.cargo.iter().map(|entry| entry.waiting).sum()
    }
}

/// Which cargo amount drives real group selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CargoSelector {
    /// Graph without a cargo-specific entry: no cargo
    #[default]
    None,
    /// Default graph of a station: all cargo together
    Total,
    Cargo(u8),
}

/// Self scope of a station tile.
#[derive(Debug)]
pub struct StationScope<'a> {
    station: Option<&'a mut Station>,
    tile: Option<TileIndex>,
    /// Per-tile random bits, four of them
    tile_random: u8,
    map: &'a TileMap,
}

impl<'a> StationScope<'a> {
    pub fn new(station: &'a mut Station, tile: TileIndex, tile_random: u8, map: &'a TileMap) -> Self {
        Self { station: Some(station), tile: Some(tile), tile_random: tile_random & 0x0F, map }
    }

    /// Scope of the build menu preview.
    pub fn preview(map: &'a TileMap) -> Self {
        Self { station: None, tile: None, tile_random: 0, map }
    }

    pub fn station(&self) -> Option<&Station> {
        self.station.as_deref()
    }
}

impl VariableProvider for StationScope<'_> {
    fn get_variable(&self, variable: u8, parameter: u32) -> Option<u32> {
        let Some(station) = self.station.as_deref() else {
            // The preview answers the platform layout variables with 0.
            return match variable {
                0x40 | 0x41 | 0x42 => Some(0),
                _ => None,
            };
        };
        let cargo = station.cargo(parameter as u8);
        let value = match variable {
            0x43 => u32::from(station.owner),
            0x60 => cargo.map_or(0, |entry| entry.waiting.min(0xFFFF)),
            0x61 => cargo.map_or(0, |entry| u32::from(entry.days_since_pickup)),
            0x62 => cargo.and_then(|entry| entry.rating).map_or(NO_RATING, u32::from),
            0x67 => match self.tile {
                Some(tile) => self.map.nearby_info(tile, parameter as u8, false),
                None => return None,
            },
            0xF0 => u32::from(station.facilities),
            _ => return None,
        };
        Some(value)
    }

    fn random_bits(&self) -> u32 {
        let station = self.station.as_deref().map_or(0, |station| u32::from(station.random));
        station | u32::from(self.tile_random) << 16
    }

    fn set_random_bits(&mut self, bits: u32) {
        if let Some(station) = self.station.as_deref_mut() {
            station.random = bits as u16;
        }
        self.tile_random = ((bits >> 16) & 0x0F) as u8;
    }
}

/// Resolver for a station tile with the station's town as parent.
#[derive(Debug)]
pub struct StationResolver<'a> {
    station: StationScope<'a>,
    town: Option<TownScope<'a>>,
    null: NullScope,
    cargo: CargoSelector,
    threshold: u32,
}

impl<'a> StationResolver<'a> {
    pub fn new(station: StationScope<'a>) -> Self {
        Self { station, town: None, null: NullScope, cargo: CargoSelector::None, threshold: 0 }
    }

    pub fn with_town(mut self, town: TownScope<'a>) -> Self {
        self.town = Some(town);
        self
    }

    /// Cargo and class threshold used by real groups.
    pub fn with_cargo(mut self, cargo: CargoSelector, threshold: u32) -> Self {
        self.cargo = cargo;
        self.threshold = threshold;
        self
    }

    pub fn station_scope(&self) -> &StationScope<'a> {
        &self.station
    }

    /// Tile random bits after a rerandomisation, to be written back to the map.
    pub fn tile_random(&self) -> u8 {
        self.station.tile_random
    }

    fn cargo_amount(&self, station: &Station) -> u32 {
        match self.cargo {
            CargoSelector::None => 0,
            CargoSelector::Total => station.total_waiting(),
            CargoSelector::Cargo(cargo) => station.cargo(cargo).map_or(0, |entry| entry.waiting),
        }
    }
}

impl Resolver for StationResolver<'_> {
    fn scope(
        &mut self,
        scope: VarScope,
        _relative: u8,
        _temp: &TemporaryStorage,
    ) -> &mut dyn VariableProvider {
        match scope {
            VarScope::Object => &mut self.station,
            VarScope::Parent => match &mut self.town {
                Some(town) => town,
                None => &mut self.null,
            },
            VarScope::Relative => &mut self.null,
        }
    }

    fn resolve_real(&self, group: &RealGroup) -> Option<NodeRef> {
        match self.station.station() {
            Some(station) => {
                CargoThreshold::new(self.cargo_amount(station), self.threshold).select(group)
            }
            None => group.first_loading(),
        }
    }

    fn feature(&self) -> Feature {
        Feature::Stations
    }

    fn context(&self) -> ResolverContext {
        ResolverContext::Station {
            tile: self.station.tile,
            station: self.station.station().map(|station| station.index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tile::MapSize;
    use crate::features::town::Town;

    fn station() -> Station {
        Station {
            index: 4,
            owner: 1,
            facilities: 0b0_0011,
            random: 0x1234,
            cargo: vec![
                StationCargo { cargo: 0, waiting: 70_000, rating: Some(170), days_since_pickup: 3 },
                StationCargo { cargo: 2, waiting: 300, rating: None, days_since_pickup: 0 },
            ],
        }
    }

    fn refs(start: u32, n: u32) -> Vec<NodeRef> {
        (start..start + n).map(NodeRef).collect()
    }

    #[test]
    fn test_variables() {
        let map = TileMap::new(MapSize::default());
        let mut st = station();
        let scope = StationScope::new(&mut st, TileIndex(9), 0x1F, &map);
        assert_eq!(scope.get_variable(0x43, 0), Some(1));
        assert_eq!(scope.get_variable(0x60, 0), Some(0xFFFF));
        assert_eq!(scope.get_variable(0x60, 2), Some(300));
        assert_eq!(scope.get_variable(0x61, 0), Some(3));
        assert_eq!(scope.get_variable(0x62, 0), Some(170));
        assert_eq!(scope.get_variable(0x62, 2), Some(NO_RATING));
        assert_eq!(scope.get_variable(0xF0, 0), Some(3));
        assert_eq!(scope.random_bits(), 0x000F_1234);
    }

    #[test]
    fn test_rerandomised_bits_split() {
        let map = TileMap::new(MapSize::default());
        let mut st = station();
        {
            let mut scope = StationScope::new(&mut st, TileIndex(9), 0, &map);
            scope.set_random_bits(0x0005_ABCD);
            assert_eq!(scope.random_bits(), 0x0005_ABCD);
        }
        assert_eq!(st.random, 0xABCD);
    }

    #[test]
    fn test_real_selection_by_cargo() {
        let map = TileMap::new(MapSize::default());
        let group = RealGroup::new(refs(0, 2), refs(10, 4));
        let mut st = station();
        let resolver = StationResolver::new(StationScope::new(&mut st, TileIndex(9), 0, &map))
            .with_cargo(CargoSelector::Cargo(2), 100);
        // 300 - 100 = 200 of 3996, over 4 sets
        assert_eq!(resolver.resolve_real(&group), Some(NodeRef(10)));

        let resolver = StationResolver::new(StationScope::new(&mut st, TileIndex(9), 0, &map))
            .with_cargo(CargoSelector::Total, 100);
        assert_eq!(resolver.resolve_real(&group), Some(NodeRef(13)));

        let resolver = StationResolver::new(StationScope::new(&mut st, TileIndex(9), 0, &map));
        assert_eq!(resolver.resolve_real(&group), Some(NodeRef(0)));
    }

    #[test]
    fn test_preview() {
        let map = TileMap::new(MapSize::default());
        let group = RealGroup::new(refs(0, 2), refs(10, 4));
        let resolver = StationResolver::new(StationScope::preview(&map));
        assert_eq!(resolver.resolve_real(&group), Some(NodeRef(10)));
        assert_eq!(resolver.context(), ResolverContext::Station { tile: None, station: None });
    }

    #[test]
    fn test_town_parent() {
        let map = TileMap::new(MapSize::default());
        let town = Town { index: 8, ..Town::default() };
        let mut st = station();
        let mut resolver = StationResolver::new(StationScope::new(&mut st, TileIndex(9), 0, &map))
            .with_town(TownScope::new(&town));
        let temp = TemporaryStorage::new();
        assert_eq!(resolver.scope(VarScope::Parent, 0, &temp).get_variable(0x41, 0), Some(8));
    }
}
