//! Sprite group node types.
//!
//! This module provides:
//! - `SpriteGroup`, the tagged node stored in a `SpriteGroupPool`
//! - Branching nodes: `RealGroup`, `DeterministicGroup`, `RandomizedGroup`
//! - Terminal nodes: `CallbackResultGroup`, `ResultGroup`, `TileLayoutGroup`,
//!   `IndustryProductionGroup`
//! - `Adjust`, one step of a deterministic group's expression chain
//!
//! Groups are immutable once built. All child links are `NodeRef`s into the
//! owning pool.

mod adjust;
mod deterministic;
mod layout;
mod production;
mod randomized;
mod real;
mod terminal;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pool::NodeRef;

pub use adjust::{
    Adjust, AdjustKind, AdjustOp, VAR_CONSTANT, VAR_PERSISTENT, VAR_PROCEDURE, VAR_REGISTER,
};
pub use deterministic::{DeterministicGroup, GroupRange};
pub use layout::{LayoutSprite, SpriteLayout, TileLayoutGroup};
pub use production::{
    IndustryProductionGroup, ProductionAmounts, ProductionInput, ProductionOutput,
    INVALID_PRODUCTION_VERSION, MAX_PRODUCTION_CARGOES,
};
pub use randomized::{RandomizedGroup, TriggerMode};
pub use real::RealGroup;
pub use terminal::{CallbackResultGroup, ResultGroup, CALLBACK_FAILED};

/// Error when constructing a group from data-file values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum GroupError {
    /// Randomized group without candidates
    #[error("randomized group has no candidate groups")]
    NoCandidates,
    /// Randomized group candidate count is not a power of two
    #[error("randomized group has {0} candidates, expected a power of two")]
    NotPowerOfTwo(usize),
    /// Production group version outside 0..=2
    #[error("unsupported industry production version {0}")]
    UnsupportedProductionVersion(u8),
    /// Production group lists more cargoes than an industry has slots
    #[error("industry production group lists {count} cargoes (max {max})")]
    TooManyCargoes { count: usize, max: usize },
}

/// Which object a variable group reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarScope {
    /// The resolved object itself
    #[default]
    #[serde(rename = "self")]
    Object,
    /// The related object (town of a house, engine of a wagon, ...)
    Parent,
    /// Another vehicle of the same consist
    Relative,
}

impl VarScope {
    /// Number of scopes; sizes the per-scope reseed table.
    pub const COUNT: usize = 3;

    pub const ALL: [VarScope; VarScope::COUNT] =
        [VarScope::Object, VarScope::Parent, VarScope::Relative];

    pub fn index(self) -> usize {
        match self {
            VarScope::Object => 0,
            VarScope::Parent => 1,
            VarScope::Relative => 2,
        }
    }
}

impl fmt::Display for VarScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarScope::Object => write!(f, "self"),
            VarScope::Parent => write!(f, "parent"),
            VarScope::Relative => write!(f, "relative"),
        }
    }
}

/// Width of a deterministic group's arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupSize {
    Byte,
    Word,
    #[default]
    Dword,
}

impl GroupSize {
    pub fn bits(self) -> u32 {
        match self {
            GroupSize::Byte => 8,
            GroupSize::Word => 16,
            GroupSize::Dword => 32,
        }
    }

    /// Keep only the low `bits()` bits.
    pub fn truncate(self, value: u32) -> u32 {
        match self {
            GroupSize::Byte => value & 0xFF,
            GroupSize::Word => value & 0xFFFF,
            GroupSize::Dword => value,
        }
    }

    /// Interpret the low `bits()` bits as a signed number.
    pub fn sign_extend(self, value: u32) -> i32 {
        match self {
            GroupSize::Byte => value as u8 as i8 as i32,
            GroupSize::Word => value as u16 as i16 as i32,
            GroupSize::Dword => value as i32,
        }
    }
}

/// Discriminant of a `SpriteGroup`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    Real,
    Deterministic,
    Randomized,
    Callback,
    Result,
    TileLayout,
    IndustryProduction,
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GroupKind::Real => "real",
            GroupKind::Deterministic => "deterministic",
            GroupKind::Randomized => "randomized",
            GroupKind::Callback => "callback",
            GroupKind::Result => "result",
            GroupKind::TileLayout => "tile_layout",
            GroupKind::IndustryProduction => "industry_production",
        };
        write!(f, "{}", name)
    }
}

/// A node of the sprite group graph.
#[derive(Debug, Clone, PartialEq)]
pub enum SpriteGroup {
    Real(RealGroup),
    Deterministic(DeterministicGroup),
    Randomized(RandomizedGroup),
    Callback(CallbackResultGroup),
    Result(ResultGroup),
    TileLayout(TileLayoutGroup),
    IndustryProduction(IndustryProductionGroup),
}

impl SpriteGroup {
    pub fn kind(&self) -> GroupKind {
        match self {
            SpriteGroup::Real(_) => GroupKind::Real,
            SpriteGroup::Deterministic(_) => GroupKind::Deterministic,
            SpriteGroup::Randomized(_) => GroupKind::Randomized,
            SpriteGroup::Callback(_) => GroupKind::Callback,
            SpriteGroup::Result(_) => GroupKind::Result,
            SpriteGroup::TileLayout(_) => GroupKind::TileLayout,
            SpriteGroup::IndustryProduction(_) => GroupKind::IndustryProduction,
        }
    }

    /// True for groups that end a resolution.
    pub fn is_terminal(&self) -> bool {
        !matches!(
            self,
            SpriteGroup::Real(_) | SpriteGroup::Deterministic(_) | SpriteGroup::Randomized(_)
        )
    }

    /// Every group this group can continue into, including procedure-call
    /// subroutines. Duplicates are kept.
    pub fn children(&self) -> Vec<NodeRef> {
        match self {
            SpriteGroup::Real(real) => {
                real.loaded.iter().chain(real.loading.iter()).copied().collect()
            }
            SpriteGroup::Deterministic(det) => det
                .adjusts
                .iter()
                .filter_map(|a| a.subroutine)
                .chain(det.ranges().iter().map(|r| r.group))
                .chain(det.default)
                .collect(),
            SpriteGroup::Randomized(rnd) => rnd.groups().to_vec(),
            _ => Vec::new(),
        }
    }
}

impl From<RealGroup> for SpriteGroup {
    fn from(group: RealGroup) -> Self {
        SpriteGroup::Real(group)
    }
}

impl From<DeterministicGroup> for SpriteGroup {
    fn from(group: DeterministicGroup) -> Self {
        SpriteGroup::Deterministic(group)
    }
}

impl From<RandomizedGroup> for SpriteGroup {
    fn from(group: RandomizedGroup) -> Self {
        SpriteGroup::Randomized(group)
    }
}

impl From<CallbackResultGroup> for SpriteGroup {
    fn from(group: CallbackResultGroup) -> Self {
        SpriteGroup::Callback(group)
    }
}

impl From<ResultGroup> for SpriteGroup {
    fn from(group: ResultGroup) -> Self {
        SpriteGroup::Result(group)
    }
}

impl From<TileLayoutGroup> for SpriteGroup {
    fn from(group: TileLayoutGroup) -> Self {
        SpriteGroup::TileLayout(group)
    }
}

impl From<IndustryProductionGroup> for SpriteGroup {
    fn from(group: IndustryProductionGroup) -> Self {
        SpriteGroup::IndustryProduction(group)
    }
}
