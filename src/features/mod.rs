//! Feature adapters.
//!
//! Every game object kind that owns sprite group graphs gets a resolver
//! here. The adapters only answer the generic questions of `Resolver` and
//! `VariableProvider`; each documents the small variable set it exposes.
//!
//! - `generic`: table-driven provider used by the CLI and tests
//! - `town`, `house`, `industry`, `station`, `airport_tile`, `railtype`,
//!   `vehicle`: one resolver per object kind
//! - `tile`: map coordinates and nearby-tile parameter decoding

pub mod airport_tile;
pub mod generic;
pub mod house;
pub mod industry;
pub mod railtype;
pub mod station;
pub mod tile;
pub mod town;
pub mod vehicle;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::storage::{EntityRef, PersistentStorage, StorageError};
use tile::TileIndex;

/// Object kind a sprite group graph belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Trains,
    RoadVehicles,
    Ships,
    Aircraft,
    Stations,
    Houses,
    IndustryTiles,
    Industries,
    Airports,
    Objects,
    RailTypes,
    AirportTiles,
    /// Towns have no graphs of their own; they are the parent of houses,
    /// industries and stations
    Towns,
}

impl Feature {
    /// Feature byte used by data files; towns have none.
    pub fn code(self) -> Option<u8> {
        let code = match self {
            Feature::Trains => 0x00,
            Feature::RoadVehicles => 0x01,
            Feature::Ships => 0x02,
            Feature::Aircraft => 0x03,
            Feature::Stations => 0x04,
            Feature::Houses => 0x07,
            Feature::IndustryTiles => 0x09,
            Feature::Industries => 0x0A,
            Feature::Airports => 0x0D,
            Feature::Objects => 0x0F,
            Feature::RailTypes => 0x10,
            Feature::AirportTiles => 0x11,
            Feature::Towns => return None,
        };
        Some(code)
    }

    pub fn from_code(code: u8) -> Option<Feature> {
        const ALL: [Feature; 12] = [
            Feature::Trains,
            Feature::RoadVehicles,
            Feature::Ships,
            Feature::Aircraft,
            Feature::Stations,
            Feature::Houses,
            Feature::IndustryTiles,
            Feature::Industries,
            Feature::Airports,
            Feature::Objects,
            Feature::RailTypes,
            Feature::AirportTiles,
        ];
        ALL.into_iter().find(|feature| feature.code() == Some(code))
    }

    pub fn is_vehicle(self) -> bool {
        matches!(
            self,
            Feature::Trains | Feature::RoadVehicles | Feature::Ships | Feature::Aircraft
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            Feature::Trains => "trains",
            Feature::RoadVehicles => "road_vehicles",
            Feature::Ships => "ships",
            Feature::Aircraft => "aircraft",
            Feature::Stations => "stations",
            Feature::Houses => "houses",
            Feature::IndustryTiles => "industry_tiles",
            Feature::Industries => "industries",
            Feature::Airports => "airports",
            Feature::Objects => "objects",
            Feature::RailTypes => "rail_types",
            Feature::AirportTiles => "airport_tiles",
            Feature::Towns => "towns",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a resolver is bound to, as plain data for logs and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolverContext {
    House { tile: TileIndex, town: u32, house_id: u16, not_yet_constructed: bool },
    Industry { tile: TileIndex, industry: Option<u32>, industry_type: u16 },
    Station { tile: Option<TileIndex>, station: Option<u32> },
    RailType { tile: Option<TileIndex>, rail_type: u8 },
    AirportTile { tile: TileIndex, airport: u32 },
    Vehicle { vehicle: Option<u32>, engine: u16, position: usize },
    Town { town: u32 },
    Generic { feature: Feature },
}

impl fmt::Display for ResolverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolverContext::House { tile, house_id, .. } => {
                write!(f, "house {} at {}", house_id, tile)
            }
            ResolverContext::Industry { tile, industry: Some(index), .. } => {
                write!(f, "industry {} at {}", index, tile)
            }
            ResolverContext::Industry { tile, industry: None, industry_type } => {
                write!(f, "prospective industry type {} at {}", industry_type, tile)
            }
            ResolverContext::Station { station: Some(index), .. } => write!(f, "station {}", index),
            ResolverContext::Station { station: None, .. } => write!(f, "station preview"),
            ResolverContext::RailType { rail_type, .. } => write!(f, "rail type {}", rail_type),
            ResolverContext::AirportTile { tile, airport } => {
                write!(f, "airport {} tile {}", airport, tile)
            }
            ResolverContext::Vehicle { vehicle: Some(index), position, .. } => {
                write!(f, "vehicle {} (consist position {})", index, position)
            }
            ResolverContext::Vehicle { vehicle: None, engine, .. } => {
                write!(f, "engine {} preview", engine)
            }
            ResolverContext::Town { town } => write!(f, "town {}", town),
            ResolverContext::Generic { feature } => write!(f, "generic {}", feature),
        }
    }
}

/// Write to storage that is only created once something non-zero is stored.
///
/// Returns without creating the array for zero writes, so objects that never
/// store anything carry no storage.
pub(crate) fn store_lazily(
    storage: &mut Option<PersistentStorage>,
    owner: EntityRef,
    grfid: u32,
    capacity: usize,
    index: u32,
    value: u32,
) -> Result<(), StorageError> {
    match storage {
        Some(storage) => storage.try_set(index, value as i32),
        None if value == 0 => Ok(()),
        None => {
            let mut created = PersistentStorage::new(owner, grfid, capacity);
            created.try_set(index, value as i32)?;
            *storage = Some(created);
            Ok(())
        }
    }
}

/// Read storage that may not exist yet; missing storage reads 0.
pub(crate) fn read_lazily(
    storage: Option<&PersistentStorage>,
    index: u32,
) -> Result<u32, StorageError> {
    storage.map_or(Ok(0), |storage| storage.try_get(index).map(|value| value as u32))
}
