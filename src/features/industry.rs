//! Industries.
//!
//! An industry is resolved either as a built industry or as a prospective
//! one while its location is checked. A prospective industry only answers
//! the location variables, has no random bits and never gets storage.
//!
//! Built industries own one persistent array, created by the first non-zero
//! write so that industries whose graphs never store anything carry none.

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::tile::{TileIndex, TileMap};
use super::town::TownScope;
use super::{read_lazily, store_lazily, Feature, ResolverContext};
use crate::eval::Evaluator;
use crate::group::{IndustryProductionGroup, ProductionAmounts, VarScope};
use crate::pool::NodeRef;
use crate::resolver::{NullScope, Resolver, ResolverObject, VariableProvider};
use crate::storage::{
    EntityRef, PersistentStorage, StorageError, TemporaryStorage, DEFAULT_PERSISTENT_SLOTS,
};

/// Production steps allowed per production callback; the step counter is
/// passed to the data file in 16 bits.
pub const MAX_PRODUCTION_STEPS: u32 = 0x10000;

/// Industry state read and written by sprite groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Industry {
    pub index: u32,
    pub industry_type: u16,
    pub location: TileIndex,
    pub width: u8,
    pub height: u8,
    pub town: u32,
    pub selected_layout: u8,
    pub founder: u8,
    /// Days since year 0
    pub construction_date: u32,
    pub random: u16,
    pub prod_level: u8,
    #[serde(default)]
    pub accepts_cargo: Vec<u8>,
    #[serde(default)]
    pub incoming_waiting: Vec<u16>,
    #[serde(default)]
    pub produced_cargo: Vec<u8>,
    #[serde(default)]
    pub produced_waiting: Vec<u16>,
    /// Data file the industry type comes from
    #[serde(default)]
    pub grfid: u32,
    #[serde(default)]
    pub psa: Option<PersistentStorage>,
}

impl Industry {
    pub fn entity(&self) -> EntityRef {
        EntityRef::new(Feature::Industries, self.index)
    }

    pub fn accepted_index(&self, cargo: u8) -> Option<usize> {
        self.accepts_cargo.iter().position(|c| *c == cargo)
    }

    pub fn produced_index(&self, cargo: u8) -> Option<usize> {
        self.produced_cargo.iter().position(|c| *c == cargo)
    }
}

/// Location check data of an industry that is not built yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProspectiveIndustry {
    pub tile: TileIndex,
    pub industry_type: u16,
    pub town: u32,
    pub selected_layout: u8,
    /// Random bits of the construction attempt, variable 0x8F
    pub random_bits: u32,
}

#[derive(Debug)]
enum Target<'a> {
    Built(&'a mut Industry),
    Prospective(ProspectiveIndustry),
}

/// Self scope of an industry.
#[derive(Debug)]
pub struct IndustryScope<'a> {
    target: Target<'a>,
    map: &'a TileMap,
}

impl<'a> IndustryScope<'a> {
    pub fn built(industry: &'a mut Industry, map: &'a TileMap) -> Self {
        Self { target: Target::Built(industry), map }
    }

    pub fn prospective(industry: ProspectiveIndustry, map: &'a TileMap) -> Self {
        Self { target: Target::Prospective(industry), map }
    }

    pub fn industry(&self) -> Option<&Industry> {
        match &self.target {
            Target::Built(industry) => Some(industry),
            Target::Prospective(_) => None,
        }
    }

    pub fn industry_mut(&mut self) -> Option<&mut Industry> {
        match &mut self.target {
            Target::Built(industry) => Some(industry),
            Target::Prospective(_) => None,
        }
    }

    fn prospective_variable(&self, check: &ProspectiveIndustry, variable: u8) -> Option<u32> {
        let value = match variable {
            0x80 => check.tile.0,
            0x81 => (check.tile.0 >> 8) & 0xFF,
            0x82 => check.town,
            0x86 => u32::from(check.selected_layout),
            0x87 => u32::from(self.map.info(check.tile).terrain),
            0x8F => check.random_bits,
            _ => return None,
        };
        Some(value)
    }

    fn industry_variable(&self, industry: &Industry, variable: u8, parameter: u32) -> Option<u32> {
        let waiting = |slot: usize| u32::from(industry.incoming_waiting.get(slot).copied().unwrap_or(0));
        let value = match variable {
            0x40..=0x42 => waiting(usize::from(variable - 0x40)),
            0x44 => u32::from(industry.selected_layout),
            0x45 => u32::from(industry.founder),
            0x46 => industry.construction_date,
            0x62 => self.map.nearby_info(industry.location, parameter as u8, false),
            0x69 => match industry.produced_index(parameter as u8) {
                Some(slot) => u32::from(industry.produced_waiting.get(slot).copied().unwrap_or(0)),
                None => 0,
            },
            0x6F => match industry.accepted_index(parameter as u8) {
                Some(slot) => waiting(slot),
                None => 0,
            },
            0x80 => industry.location.0,
            0x81 => (industry.location.0 >> 8) & 0xFF,
            0x82 => industry.town,
            0x86 => u32::from(industry.width),
            0x87 => u32::from(industry.height),
            0x88 | 0x89 => {
                let slot = usize::from(variable - 0x88);
                u32::from(industry.produced_cargo.get(slot).copied().unwrap_or(0xFF))
            }
            0x8A => u32::from(industry.produced_waiting.first().copied().unwrap_or(0)),
            0x93 => u32::from(industry.prod_level),
            0xA6 => u32::from(industry.industry_type),
            0xA7 => u32::from(industry.founder),
            _ => return None,
        };
        Some(value)
    }
}

impl VariableProvider for IndustryScope<'_> {
    fn get_variable(&self, variable: u8, parameter: u32) -> Option<u32> {
        match &self.target {
            Target::Built(industry) => self.industry_variable(industry, variable, parameter),
            Target::Prospective(check) => self.prospective_variable(check, variable),
        }
    }

    fn random_bits(&self) -> u32 {
        self.industry().map_or(0, |industry| u32::from(industry.random))
    }

    fn set_random_bits(&mut self, bits: u32) {
        if let Some(industry) = self.industry_mut() {
            industry.random = bits as u16;
        }
    }

    fn read_persistent(&self, index: u32) -> Result<u32, StorageError> {
        read_lazily(self.industry().and_then(|industry| industry.psa.as_ref()), index)
    }

    fn store_persistent(&mut self, index: u32, value: u32) -> Result<(), StorageError> {
        let Some(industry) = self.industry_mut() else {
            return Ok(());
        };
        let owner = industry.entity();
        store_lazily(&mut industry.psa, owner, industry.grfid, DEFAULT_PERSISTENT_SLOTS, index, value)
    }
}

/// Resolver for an industry with its town as parent.
#[derive(Debug)]
pub struct IndustryResolver<'a> {
    industry: IndustryScope<'a>,
    town: TownScope<'a>,
    null: NullScope,
}

impl<'a> IndustryResolver<'a> {
    /// Town storage is read-only for prospective industries.
    pub fn new(industry: IndustryScope<'a>, town: TownScope<'a>) -> Self {
        let readonly = industry.industry().is_none();
        Self { industry, town: town.readonly(readonly), null: NullScope }
    }

    pub fn industry(&self) -> Option<&Industry> {
        self.industry.industry()
    }

    pub fn industry_mut(&mut self) -> Option<&mut Industry> {
        self.industry.industry_mut()
    }
}

impl Resolver for IndustryResolver<'_> {
    fn scope(
        &mut self,
        scope: VarScope,
        _relative: u8,
        _temp: &TemporaryStorage,
    ) -> &mut dyn VariableProvider {
        match scope {
            VarScope::Object => &mut self.industry,
            VarScope::Parent => &mut self.town,
            VarScope::Relative => &mut self.null,
        }
    }

    fn feature(&self) -> Feature {
        Feature::Industries
    }

    fn context(&self) -> ResolverContext {
        match &self.industry.target {
            Target::Built(industry) => ResolverContext::Industry {
                tile: industry.location,
                industry: Some(industry.index),
                industry_type: industry.industry_type,
            },
            Target::Prospective(check) => ResolverContext::Industry {
                tile: check.tile,
                industry: None,
                industry_type: check.industry_type,
            },
        }
    }
}

/// Why a production callback stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductionStop {
    /// The last step did not ask for another one
    Finished,
    /// The graph did not resolve to a production group
    NoProductionGroup,
    /// The reached group was rejected when loading
    InvalidGroup,
    /// A register number in the group was out of range
    RegisterFault,
    /// The step limit was reached
    StepLimit,
    /// The resolver is bound to a prospective industry
    NoIndustry,
}

/// Summary of one production callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductionRun {
    /// Steps whose amounts were applied
    pub steps: u32,
    pub stop: ProductionStop,
}

/// Run the production callback of an industry until it stops asking for
/// another step.
///
/// `reason` goes to the low byte of the second callback parameter, the step
/// counter to bits 8..24 and the last `again` value to the top byte. With
/// `multiplier` the amounts are scaled, as for industries that handle
/// production per production level.
pub fn run_production(
    evaluator: &Evaluator<'_>,
    root: NodeRef,
    object: &mut ResolverObject<'_, IndustryResolver<'_>>,
    reason: u8,
    multiplier: i32,
) -> ProductionRun {
    object.callback_param2 = u32::from(reason);
    let mut steps = 0;
    let stop = loop {
        if steps >= MAX_PRODUCTION_STEPS {
            warn!(steps, "production callback did not finish");
            break ProductionStop::StepLimit;
        }
        object.callback_param2 = (object.callback_param2 & !0x00FF_FF00) | (steps << 8);

        let Some(group) = evaluator.resolve_production(root, object) else {
            break ProductionStop::NoProductionGroup;
        };
        if group.is_invalid() {
            warn!(context = %object.provider.context(), "invalid production result");
            break ProductionStop::InvalidGroup;
        }
        let amounts = match group.amounts(object.temp) {
            Ok(amounts) => amounts,
            Err(e) => {
                error!(error = %e, "production amounts out of range");
                break ProductionStop::RegisterFault;
            }
        };
        let Some(industry) = object.provider.industry_mut() else {
            break ProductionStop::NoIndustry;
        };
        apply_production(industry, group, &amounts, multiplier);
        steps += 1;

        if !amounts.repeat() {
            break ProductionStop::Finished;
        }
        object.callback_param2 = (object.callback_param2 & 0x00FF_FFFF) | ((amounts.again as u32) << 24);
    };
    ProductionRun { steps, stop }
}

fn apply_production(
    industry: &mut Industry,
    group: &IndustryProductionGroup,
    amounts: &ProductionAmounts,
    multiplier: i32,
) {
    if !group.uses_cargo_labels() {
        amounts.apply(&mut industry.incoming_waiting, &mut industry.produced_waiting, multiplier);
        return;
    }
    // Labelled entries are moved to the slot of their cargo first.
    let mut by_slot = ProductionAmounts {
        subtract: vec![0; industry.incoming_waiting.len()],
        add: vec![0; industry.produced_waiting.len()],
        again: amounts.again,
    };
    for (input, amount) in group.inputs.iter().zip(&amounts.subtract) {
        if let Some(slot) = industry.accepted_index(input.cargo) {
            if let Some(entry) = by_slot.subtract.get_mut(slot) {
                *entry = *amount;
            }
        }
    }
    for (output, amount) in group.outputs.iter().zip(&amounts.add) {
        if let Some(slot) = industry.produced_index(output.cargo) {
            if let Some(entry) = by_slot.add.get_mut(slot) {
                *entry = *amount;
            }
        }
    }
    by_slot.apply(&mut industry.incoming_waiting, &mut industry.produced_waiting, multiplier);
}
