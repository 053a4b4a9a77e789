//! Randomized groups.

use serde::{Deserialize, Serialize};

use super::{GroupError, VarScope};
use crate::pool::NodeRef;

/// How a randomized group's trigger mask is matched against waiting triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Any of the group's triggers is waiting
    #[default]
    Any,
    /// All of the group's triggers are waiting
    All,
}

/// Group choosing a candidate by a slice of the object's random bits.
#[derive(Debug, Clone, PartialEq)]
pub struct RandomizedGroup {
    pub scope: VarScope,
    pub mode: TriggerMode,
    pub triggers: u8,
    pub lowest_randbit: u8,
    /// Relative-scope selector (vehicles only)
    pub count: u8,
    groups: Vec<NodeRef>,
}

impl RandomizedGroup {
    /// Build a group; the candidate count must be a non-zero power of two.
    pub fn new(
        scope: VarScope,
        mode: TriggerMode,
        triggers: u8,
        lowest_randbit: u8,
        groups: Vec<NodeRef>,
    ) -> Result<Self, GroupError> {
        if groups.is_empty() {
            return Err(GroupError::NoCandidates);
        }
        if !groups.len().is_power_of_two() {
            return Err(GroupError::NotPowerOfTwo(groups.len()));
        }
        Ok(Self { scope, mode, triggers: triggers & 0x7F, lowest_randbit, count: 0, groups })
    }

    pub fn with_count(mut self, count: u8) -> Self {
        self.count = count;
        self
    }

    pub fn groups(&self) -> &[NodeRef] {
        &self.groups
    }

    /// Random bits this group reads, in place.
    pub fn mask(&self) -> u32 {
        ((self.groups.len() - 1) as u32).checked_shl(self.lowest_randbit as u32).unwrap_or(0)
    }

    /// Candidate index for the given random bits.
    pub fn index(&self, random_bits: u32) -> usize {
        ((random_bits & self.mask()).checked_shr(self.lowest_randbit as u32).unwrap_or(0)) as usize
    }

    /// Candidate for the given random bits.
    pub fn select(&self, random_bits: u32) -> NodeRef {
        self.groups[self.index(random_bits)]
    }

    /// Triggers consumed by this group when `waiting` triggers are pending,
    /// or `None` when the group does not fire.
    pub fn matched_triggers(&self, waiting: u32) -> Option<u32> {
        let triggers = self.triggers as u32;
        let matched = triggers & waiting;
        let fires = match self.mode {
            TriggerMode::Any => matched != 0,
            TriggerMode::All => matched == triggers,
        };
        fires.then_some(matched)
    }
}
