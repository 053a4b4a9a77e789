//! Rail types.
//!
//! Rail type graphs draw track, signals and menu icons. They are resolved
//! either for a map tile or without one (build menus), and have no parent.
//! Real groups prefer the first loading set.

use serde::{Deserialize, Serialize};

use super::tile::TileIndex;
use super::{Feature, ResolverContext};
use crate::group::{RealGroup, VarScope};
use crate::pool::NodeRef;
use crate::resolver::{NullScope, Resolver, VariableProvider};
use crate::storage::TemporaryStorage;

/// Track tile state read by rail type graphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RailTile {
    pub tile: TileIndex,
    pub terrain: u8,
    /// Level crossing with barriers down
    #[serde(default)]
    pub crossing_barred: bool,
    /// Build date of a depot tile, in days
    #[serde(default)]
    pub build_date: Option<u32>,
    #[serde(default)]
    pub town_zone: Option<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RailTypeScope {
    tile: Option<RailTile>,
    current_date: u32,
}

impl RailTypeScope {
    pub fn new(tile: Option<RailTile>, current_date: u32) -> Self {
        Self { tile, current_date }
    }
}

impl VariableProvider for RailTypeScope {
    fn get_variable(&self, variable: u8, _parameter: u32) -> Option<u32> {
        let Some(tile) = &self.tile else {
            return match variable {
                0x40..=0x42 | 0x44 => Some(0),
                0x43 => Some(self.current_date),
                _ => None,
            };
        };
        let value = match variable {
            0x40 => u32::from(tile.terrain),
            0x41 => 0,
            0x42 => u32::from(tile.crossing_barred),
            0x43 => tile.build_date.unwrap_or(self.current_date),
            0x44 => u32::from(tile.town_zone.unwrap_or(0)),
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone)]
pub struct RailTypeResolver {
    rail_type: u8,
    scope: RailTypeScope,
    null: NullScope,
}

impl RailTypeResolver {
    pub fn new(rail_type: u8, scope: RailTypeScope) -> Self {
        Self { rail_type, scope, null: NullScope }
    }
}

impl Resolver for RailTypeResolver {
    fn scope(
        &mut self,
        scope: VarScope,
        _relative: u8,
        _temp: &TemporaryStorage,
    ) -> &mut dyn VariableProvider {
        match scope {
            VarScope::Object => &mut self.scope,
            _ => &mut self.null,
        }
    }

    fn resolve_real(&self, group: &RealGroup) -> Option<NodeRef> {
        group.first_loading().or_else(|| group.first_loaded())
    }

    fn feature(&self) -> Feature {
        Feature::RailTypes
    }

    fn context(&self) -> ResolverContext {
        ResolverContext::RailType { tile: self.scope.tile.map(|tile| tile.tile), rail_type: self.rail_type }
    }
}
