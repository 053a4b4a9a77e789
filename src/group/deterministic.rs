//! Deterministic (variational) groups.

use serde::{Deserialize, Serialize};

use super::adjust::Adjust;
use super::{GroupSize, VarScope};
use crate::pool::NodeRef;

/// Inclusive value range selecting a target group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRange {
    pub low: u32,
    pub high: u32,
    pub group: NodeRef,
}

impl GroupRange {
    pub fn new(low: u32, high: u32, group: NodeRef) -> Self {
        Self { low, high, group }
    }

    pub fn contains(&self, value: u32) -> bool {
        self.low <= value && value <= self.high
    }
}

/// Ranges above this count are searched by bisection.
const LINEAR_SEARCH_LIMIT: usize = 4;

/// Group that computes a value from variables and branches on it.
///
/// Ranges are normalised on construction: they are sorted, overlaps are
/// resolved in favour of the range listed first, and ranges that only select
/// the default group are dropped. Selection therefore matches a first-match
/// scan of the ranges as written.
#[derive(Debug, Clone, PartialEq)]
pub struct DeterministicGroup {
    pub scope: VarScope,
    /// Relative-scope selector (vehicles only)
    pub count: u8,
    pub size: GroupSize,
    pub adjusts: Vec<Adjust>,
    pub default: Option<NodeRef>,
    ranges: Vec<GroupRange>,
    calculated_result: bool,
}

impl DeterministicGroup {
    pub fn new(
        scope: VarScope,
        size: GroupSize,
        adjusts: Vec<Adjust>,
        ranges: Vec<GroupRange>,
        default: Option<NodeRef>,
    ) -> Self {
        let ranges = normalize_ranges(&ranges, default);
        Self { scope, count: 0, size, adjusts, default, ranges, calculated_result: false }
    }

    /// Group without ranges whose accumulator becomes a 15-bit callback
    /// result.
    pub fn calculated(scope: VarScope, size: GroupSize, adjusts: Vec<Adjust>) -> Self {
        Self {
            scope,
            count: 0,
            size,
            adjusts,
            default: None,
            ranges: Vec::new(),
            calculated_result: true,
        }
    }

    pub fn with_count(mut self, count: u8) -> Self {
        self.count = count;
        self
    }

    pub fn ranges(&self) -> &[GroupRange] {
        &self.ranges
    }

    pub fn is_calculated(&self) -> bool {
        self.calculated_result
    }

    /// Target for an accumulator value: the containing range's group, or the
    /// default group.
    pub fn select(&self, value: u32) -> Option<NodeRef> {
        let found = if self.ranges.len() > LINEAR_SEARCH_LIMIT {
            let idx = self.ranges.partition_point(|r| r.high < value);
            self.ranges.get(idx).filter(|r| r.low <= value)
        } else {
            self.ranges.iter().find(|r| r.contains(value))
        };
        found.map(|r| r.group).or(self.default)
    }
}

/// Split possibly overlapping ranges at every boundary, pick the first listed
/// range for each piece, and merge neighbours with the same target.
fn normalize_ranges(ranges: &[GroupRange], default: Option<NodeRef>) -> Vec<GroupRange> {
    let mut bounds: Vec<u32> = Vec::with_capacity(ranges.len() * 2);
    for range in ranges {
        bounds.push(range.low);
        if range.high != u32::MAX {
            bounds.push(range.high + 1);
        }
    }
    bounds.sort_unstable();
    bounds.dedup();

    let targets: Vec<Option<NodeRef>> = bounds
        .iter()
        .map(|&bound| {
            ranges
                .iter()
                .find(|r| r.contains(bound))
                .map(|r| r.group)
                .filter(|g| Some(*g) != default)
        })
        .collect();

    let mut result = Vec::new();
    let mut j = 0;
    while j < bounds.len() {
        let Some(group) = targets[j] else {
            j += 1;
            continue;
        };
        let low = bounds[j];
        while j < bounds.len() && targets[j] == Some(group) {
            j += 1;
        }
        let high = if j < bounds.len() { bounds[j] - 1 } else { u32::MAX };
        result.push(GroupRange { low, high, group });
    }
    result
}
