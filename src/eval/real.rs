//! Candidate selection inside real groups.

use crate::group::RealGroup;
use crate::pool::NodeRef;

/// Largest cargo amount the threshold formula distinguishes.
pub const CARGO_AMOUNT_MAX: u32 = 0xFFF;

/// Station-style selection by waiting cargo amount.
///
/// Amounts above the threshold index the loading list, the others index the
/// loaded list, each proportionally over its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CargoThreshold {
    pub amount: u32,
    pub threshold: u32,
}

impl CargoThreshold {
    /// Both values are clamped to 0..=0xFFF.
    pub fn new(amount: u32, threshold: u32) -> Self {
        Self { amount: amount.min(CARGO_AMOUNT_MAX), threshold: threshold.min(CARGO_AMOUNT_MAX) }
    }

    pub fn select(&self, group: &RealGroup) -> Option<NodeRef> {
        let (amount, threshold) = (self.amount as u64, self.threshold as u64);
        if amount > threshold {
            proportional(&group.loading, amount - threshold, 4096 - threshold)
                .or_else(|| group.loaded.first().copied())
        } else {
            proportional(&group.loaded, amount, threshold + 1)
                .or_else(|| group.loading.first().copied())
        }
    }
}

/// Vehicle-style selection by how full the vehicle is.
///
/// Moving vehicles use the loaded list, vehicles loading at a station the
/// loading list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadProgress {
    pub stored: u32,
    pub capacity: u32,
    pub in_motion: bool,
}

impl LoadProgress {
    pub fn select(&self, group: &RealGroup) -> Option<NodeRef> {
        let (list, other) = if self.in_motion {
            (&group.loaded, &group.loading)
        } else {
            (&group.loading, &group.loaded)
        };
        proportional(list, self.stored as u64, self.capacity.max(1) as u64)
            .or_else(|| other.first().copied())
    }
}

/// `list[value * len / range]`, clamped to the last entry.
fn proportional(list: &[NodeRef], value: u64, range: u64) -> Option<NodeRef> {
    let len = list.len() as u64;
    if len == 0 {
        return None;
    }
    let index = (value * len / range.max(1)).min(len - 1);
    list.get(index as usize).copied()
}
