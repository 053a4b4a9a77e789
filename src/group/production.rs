//! Industry production groups.
//!
//! Version 0 carries the amounts directly. Versions 1 and 2 carry register
//! numbers and the amounts are read from the temporary registers after the
//! resolution that produced the group. Version 2 additionally names the
//! cargo of every entry instead of relying on slot order.

use serde::{Deserialize, Serialize};

use super::GroupError;
use crate::storage::{StorageError, TemporaryStorage};

/// Version marking a group that failed validation on load.
pub const INVALID_PRODUCTION_VERSION: u8 = 0xFF;

/// Cargo slots of an industry.
pub const MAX_PRODUCTION_CARGOES: usize = 16;

/// Largest amount of waiting cargo an industry slot holds.
const MAX_WAITING: i64 = 0xFFFF;

/// Amount of input cargo to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductionInput {
    #[serde(default)]
    pub cargo: u8,
    /// Signed amount, or a register number for versions 1 and 2
    pub amount: i16,
}

/// Amount of output cargo to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductionOutput {
    #[serde(default)]
    pub cargo: u8,
    /// Unsigned amount, or a register number for versions 1 and 2
    pub amount: u16,
}

/// Amounts of one production step after register indirection.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductionAmounts {
    pub subtract: Vec<i32>,
    pub add: Vec<i32>,
    /// Non-zero asks for another production step
    pub again: i32,
}

impl ProductionAmounts {
    /// Apply the step to slot-ordered waiting cargo, clamping every slot to
    /// 0..=0xFFFF. Negative outputs produce nothing.
    pub fn apply(&self, incoming: &mut [u16], produced: &mut [u16], multiplier: i32) {
        for (slot, amount) in incoming.iter_mut().zip(&self.subtract) {
            let value = *slot as i64 - *amount as i64 * multiplier as i64;
            *slot = value.clamp(0, MAX_WAITING) as u16;
        }
        for (slot, amount) in produced.iter_mut().zip(&self.add) {
            let value = *slot as i64 + (*amount).max(0) as i64 * multiplier as i64;
            *slot = value.clamp(0, MAX_WAITING) as u16;
        }
    }

    pub fn repeat(&self) -> bool {
        self.again != 0
    }
}

/// Terminal group returned by the industry production callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndustryProductionGroup {
    pub version: u8,
    pub inputs: Vec<ProductionInput>,
    pub outputs: Vec<ProductionOutput>,
    pub again: u8,
}

impl IndustryProductionGroup {
    pub fn new(
        version: u8,
        inputs: Vec<ProductionInput>,
        outputs: Vec<ProductionOutput>,
        again: u8,
    ) -> Result<Self, GroupError> {
        if version > 2 && version != INVALID_PRODUCTION_VERSION {
            return Err(GroupError::UnsupportedProductionVersion(version));
        }
        for count in [inputs.len(), outputs.len()] {
            if count > MAX_PRODUCTION_CARGOES {
                return Err(GroupError::TooManyCargoes { count, max: MAX_PRODUCTION_CARGOES });
            }
        }
        Ok(Self { version, inputs, outputs, again })
    }

    /// Placeholder for a group rejected while loading.
    pub fn invalid() -> Self {
        Self {
            version: INVALID_PRODUCTION_VERSION,
            inputs: Vec::new(),
            outputs: Vec::new(),
            again: 0,
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.version == INVALID_PRODUCTION_VERSION
    }

    /// True when entries name their cargo instead of a slot.
    pub fn uses_cargo_labels(&self) -> bool {
        self.version == 2
    }

    /// Read the amounts, dereferencing registers for versions 1 and 2.
    pub fn amounts(&self, temp: &TemporaryStorage) -> Result<ProductionAmounts, StorageError> {
        let indirect = self.version >= 1;
        let deref = |value: i32| -> Result<i32, StorageError> {
            if indirect {
                Ok(temp.try_get(value as u32)? as i32)
            } else {
                Ok(value)
            }
        };

        let subtract = self
            .inputs
            .iter()
            .map(|input| deref(if indirect { input.amount as u16 as i32 } else { input.amount as i32 }))
            .collect::<Result<Vec<_>, _>>()?;
        let add = self
            .outputs
            .iter()
            .map(|output| deref(output.amount as i32))
            .collect::<Result<Vec<_>, _>>()?;
        let again = deref(self.again as i32)?;

        Ok(ProductionAmounts { subtract, add, again })
    }
}
