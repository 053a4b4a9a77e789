//! Vehicles and consists.
//!
//! A consist is a slice of vehicles, engine first. The parent scope of every
//! vehicle is the engine; the relative scope is another vehicle of the
//! consist picked by the group's relative selector:
//!
//! - bits 0..4: how far to move, 0 means "read register 0x100"
//! - bits 6..8: where to start and which way to move
//!   - 0: from this vehicle, away from the engine
//!   - 1: from this vehicle, towards the engine
//!   - 2: from the engine, away from it
//!   - 3: from the first vehicle of the run of vehicles with this engine
//!     type that ends at this vehicle, away from the engine
//!
//! Moving past either end of the consist selects no vehicle.

use serde::{Deserialize, Serialize};

use super::{Feature, ResolverContext};
use crate::eval::LoadProgress;
use crate::group::{RealGroup, VarScope};
use crate::pool::NodeRef;
use crate::resolver::{Resolver, VariableProvider};
use crate::storage::TemporaryStorage;

/// Register holding the distance of relative selectors with a zero count.
pub const RELATIVE_COUNT_REGISTER: u32 = 0x100;

/// One vehicle of a consist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub index: u32,
    /// Engine type
    pub engine: u16,
    pub unit_number: u16,
    /// Age in days
    pub age: u32,
    pub max_age: u32,
    pub cur_speed: u16,
    pub cargo_type: u8,
    pub cargo_capacity: u16,
    pub cargo_stored: u32,
    pub random_bits: u8,
    pub waiting_triggers: u8,
    /// The consist is loading or unloading at a station
    #[serde(default)]
    pub loading: bool,
}

/// Position of `index` in its consist, as variables 0x40 and 0x41 report it.
///
/// With `same_engine` only the run of vehicles with the same engine type
/// around `index` counts.
fn position_info(vehicles: &[Vehicle], index: usize, same_engine: bool) -> u32 {
    let engine = vehicles[index].engine;
    let mut before: u32 = 0;
    for vehicle in &vehicles[..index] {
        before += 1;
        if same_engine && vehicle.engine != engine {
            before = 0;
        }
    }
    let after = vehicles[index + 1..]
        .iter()
        .take_while(|vehicle| !same_engine || vehicle.engine == engine)
        .count() as u32;
    let before = before & 0xFF;
    let after = after & 0xFF;
    before | after << 8 | ((before + after + u32::from(same_engine)) & 0xFF) << 16
}

/// A view of the consist pointed at one vehicle, or at none.
#[derive(Debug)]
pub struct ConsistScope<'a> {
    vehicles: &'a mut [Vehicle],
    selected: Option<usize>,
}

impl<'a> ConsistScope<'a> {
    pub fn new(vehicles: &'a mut [Vehicle]) -> Self {
        Self { vehicles, selected: None }
    }

    pub fn selected(&self) -> Option<&Vehicle> {
        self.selected.and_then(|index| self.vehicles.get(index))
    }

    fn selected_mut(&mut self) -> Option<&mut Vehicle> {
        match self.selected {
            Some(index) => self.vehicles.get_mut(index),
            None => None,
        }
    }

    fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|index| *index < self.vehicles.len());
    }
}

impl VariableProvider for ConsistScope<'_> {
    fn get_variable(&self, variable: u8, _parameter: u32) -> Option<u32> {
        let index = self.selected?;
        let vehicle = self.vehicles.get(index)?;
        let stored = vehicle.cargo_stored.min(0xFFFF);
        let value = match variable {
            0x40 => position_info(self.vehicles, index, false),
            0x41 => position_info(self.vehicles, index, true),
            0x84 => vehicle.index & 0xFF,
            0x85 => (vehicle.index >> 8) & 0xFF,
            0xB4 => u32::from(vehicle.cur_speed),
            0xB5 => u32::from(vehicle.cur_speed >> 8),
            0xB9 => u32::from(vehicle.cargo_type),
            0xBA => u32::from(vehicle.cargo_capacity),
            0xBB => u32::from(vehicle.cargo_capacity >> 8),
            0xBC => stored,
            0xBD => stored >> 8,
            0xC0 => vehicle.age.min(0xFFFF),
            0xC1 => vehicle.age.min(0xFFFF) >> 8,
            0xC2 => vehicle.max_age.min(0xFFFF),
            0xC5 => u32::from(vehicle.unit_number),
            0xC6 => u32::from(vehicle.engine),
            0xC7 => u32::from(vehicle.engine >> 8),
            0xFA => u32::from(vehicle.random_bits),
            0xFB => u32::from(vehicle.waiting_triggers),
            _ => return None,
        };
        Some(value)
    }

    fn random_bits(&self) -> u32 {
        self.selected().map_or(0, |vehicle| u32::from(vehicle.random_bits))
    }

    fn random_triggers(&self) -> u32 {
        self.selected().map_or(0, |vehicle| u32::from(vehicle.waiting_triggers))
    }

    fn set_random_bits(&mut self, bits: u32) {
        if let Some(vehicle) = self.selected_mut() {
            vehicle.random_bits = bits as u8;
        }
    }

    fn set_random_triggers(&mut self, triggers: u32) {
        if let Some(vehicle) = self.selected_mut() {
            vehicle.waiting_triggers = triggers as u8;
        }
    }
}

/// Resolver for one vehicle of a consist, or for an engine type without a
/// vehicle (purchase lists).
#[derive(Debug)]
pub struct VehicleResolver<'a> {
    feature: Feature,
    engine: u16,
    consist: ConsistScope<'a>,
    position: Option<usize>,
}

impl<'a> VehicleResolver<'a> {
    /// Resolver for `consist[position]`.
    pub fn new(feature: Feature, consist: &'a mut [Vehicle], position: usize) -> Self {
        let engine = consist.get(position).map_or(0, |vehicle| vehicle.engine);
        let position = (position < consist.len()).then_some(position);
        Self { feature, engine, consist: ConsistScope::new(consist), position }
    }

    /// Resolver for an engine type that has no vehicle.
    pub fn preview(feature: Feature, engine: u16) -> Self {
        Self { feature, engine, consist: ConsistScope::new(Default::default()), position: None }
    }

    /// Vehicle of the relative scope, as an index into the consist.
    fn relative_index(&self, relative: u8, temp: &TemporaryStorage) -> Option<usize> {
        let position = self.position?;
        let vehicles = &*self.consist.vehicles;
        let mut count = i64::from(relative & 0x0F);
        if count == 0 {
            count = i64::from(temp.get(RELATIVE_COUNT_REGISTER) as i32);
        }
        let start = match relative >> 6 {
            0 => position,
            1 => {
                count = -count;
                position
            }
            2 => 0,
            _ => {
                let engine = vehicles[position].engine;
                vehicles[..position]
                    .iter()
                    .rposition(|vehicle| vehicle.engine != engine)
                    .map_or(0, |different| different + 1)
            }
        };
        let target = start as i64 + count;
        usize::try_from(target).ok().filter(|target| *target < vehicles.len())
    }
}

impl Resolver for VehicleResolver<'_> {
    fn scope(
        &mut self,
        scope: VarScope,
        relative: u8,
        temp: &TemporaryStorage,
    ) -> &mut dyn VariableProvider {
        let selected = match scope {
            VarScope::Object => self.position,
            VarScope::Parent => self.position.map(|_| 0),
            VarScope::Relative => self.relative_index(relative, temp),
        };
        self.consist.select(selected);
        &mut self.consist
    }

    fn resolve_real(&self, group: &RealGroup) -> Option<NodeRef> {
        let Some(vehicle) = self.position.and_then(|index| self.consist.vehicles.get(index)) else {
            return group.first_loading();
        };
        let in_motion = !self.consist.vehicles.first().is_some_and(|engine| engine.loading);
        LoadProgress {
            stored: vehicle.cargo_stored,
            capacity: u32::from(vehicle.cargo_capacity),
            in_motion,
        }
        .select(group)
    }

    fn feature(&self) -> Feature {
        self.feature
    }

    fn context(&self) -> ResolverContext {
        ResolverContext::Vehicle {
            vehicle: self
                .position
                .and_then(|index| self.consist.vehicles.get(index))
                .map(|vehicle| vehicle.index),
            engine: self.engine,
            position: self.position.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consist(engines: &[u16]) -> Vec<Vehicle> {
        engines
            .iter()
            .enumerate()
            .map(|(i, engine)| Vehicle {
                index: 100 + i as u32,
                engine: *engine,
                random_bits: i as u8,
                ..Vehicle::default()
            })
            .collect()
    }

    fn relative_vehicle(resolver: &mut VehicleResolver<'_>, relative: u8, temp: &TemporaryStorage) -> Option<u32> {
        resolver.scope(VarScope::Relative, relative, temp).get_variable(0x84, 0)
    }

    #[test]
    fn test_position_info() {
        let vehicles = consist(&[1, 2, 2, 3, 2]);
        assert_eq!(position_info(&vehicles, 2, false), 2 | 2 << 8 | 4 << 16);
        assert_eq!(position_info(&vehicles, 2, true), 1 | 0 << 8 | 2 << 16);
        assert_eq!(position_info(&vehicles, 0, true), 0 | 0 << 8 | 1 << 16);
    }

    #[test]
    fn test_relative_modes() {
        let mut vehicles = consist(&[1, 2, 2, 3, 2, 2]);
        let mut resolver = VehicleResolver::new(Feature::Trains, &mut vehicles, 4);
        let temp = TemporaryStorage::new();
        // back from self
        assert_eq!(relative_vehicle(&mut resolver, 0x01, &temp), Some(105));
        assert_eq!(relative_vehicle(&mut resolver, 0x02, &temp), None);
        // forward from self
        assert_eq!(relative_vehicle(&mut resolver, 0x43, &temp), Some(101));
        assert_eq!(relative_vehicle(&mut resolver, 0x45, &temp), None);
        // from the engine
        assert_eq!(relative_vehicle(&mut resolver, 0x82, &temp), Some(102));
        // from the start of the run of engine 2 that ends at self
        assert_eq!(relative_vehicle(&mut resolver, 0xC1, &temp), Some(105));
        // self is back after a relative lookup
        assert_eq!(resolver.scope(VarScope::Object, 0, &temp).get_variable(0x84, 0), Some(104));
        assert_eq!(resolver.scope(VarScope::Parent, 0, &temp).get_variable(0x84, 0), Some(100));
    }

    #[test]
    fn test_zero_count_reads_register() {
        let mut vehicles = consist(&[1, 1, 1, 1]);
        let mut resolver = VehicleResolver::new(Feature::Trains, &mut vehicles, 0);
        let mut temp = TemporaryStorage::new();
        temp.set(RELATIVE_COUNT_REGISTER, 3);
        assert_eq!(relative_vehicle(&mut resolver, 0x00, &temp), Some(103));
    }

    #[test]
    fn test_negative_register_count() {
        let mut vehicles = consist(&[1, 2, 2, 2]);
        let mut resolver = VehicleResolver::new(Feature::Trains, &mut vehicles, 2);
        let mut temp = TemporaryStorage::new();
        temp.set(RELATIVE_COUNT_REGISTER, -1i32 as u32);
        // towards the engine from self
        assert_eq!(relative_vehicle(&mut resolver, 0x00, &temp), Some(101));
        // reversed direction: away from the engine
        assert_eq!(relative_vehicle(&mut resolver, 0x40, &temp), Some(103));
        // in front of the engine there is nothing
        assert_eq!(relative_vehicle(&mut resolver, 0x80, &temp), None);
        // in front of the run of engine 2 sits the engine
        assert_eq!(relative_vehicle(&mut resolver, 0xC0, &temp), Some(100));
    }

    #[test]
    fn test_random_bits_follow_selection() {
        let mut vehicles = consist(&[1, 1, 1]);
        let temp = TemporaryStorage::new();
        {
            let mut resolver = VehicleResolver::new(Feature::Trains, &mut vehicles, 1);
            assert_eq!(resolver.scope(VarScope::Object, 0, &temp).random_bits(), 1);
            resolver.scope(VarScope::Relative, 0x01, &temp).set_random_bits(0x77);
        }
        assert_eq!(vehicles[2].random_bits, 0x77);
        assert_eq!(vehicles[1].random_bits, 1);
    }

    #[test]
    fn test_real_selection() {
        let mut vehicles = consist(&[1]);
        vehicles[0].cargo_capacity = 40;
        vehicles[0].cargo_stored = 30;
        let group = RealGroup::new(
            vec![NodeRef(1), NodeRef(2)],
            vec![NodeRef(10), NodeRef(11), NodeRef(12), NodeRef(13)],
        );
        {
            let resolver = VehicleResolver::new(Feature::RoadVehicles, &mut vehicles, 0);
            assert_eq!(resolver.resolve_real(&group), Some(NodeRef(2)));
        }
        vehicles[0].loading = true;
        let resolver = VehicleResolver::new(Feature::RoadVehicles, &mut vehicles, 0);
        assert_eq!(resolver.resolve_real(&group), Some(NodeRef(13)));
    }

    #[test]
    fn test_preview() {
        let mut resolver = VehicleResolver::preview(Feature::Ships, 9);
        let temp = TemporaryStorage::new();
        assert_eq!(resolver.scope(VarScope::Object, 0, &temp).get_variable(0x84, 0), None);
        let group = RealGroup::new(vec![NodeRef(1)], vec![NodeRef(2)]);
        assert_eq!(resolver.resolve_real(&group), Some(NodeRef(2)));
        assert_eq!(
            resolver.context(),
            ResolverContext::Vehicle { vehicle: None, engine: 9, position: 0 }
        );
    }
}
