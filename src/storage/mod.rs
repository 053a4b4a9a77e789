//! Register and persistent storage used while resolving sprite groups.
//!
//! This module provides:
//! - `TemporaryStorage`, the 0x110-entry register file written by `STO` and
//!   read through variable 0x7D
//! - `PersistentStorage`, the per-entity array written by `STOP` and read
//!   through variable 0x7C
//! - `PersistentStorageMap`, the `(entity, grfid)` lookup the save/load layer
//!   serializes
//!
//! Out-of-range indices are reported as `StorageError::IndexOutOfRange` by the
//! `try_*` accessors; the plain accessors treat them as a broken invariant.

mod persistent;
mod temporary;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use persistent::{EntityRef, PersistentStorage, PersistentStorageMap, DEFAULT_PERSISTENT_SLOTS};
pub use temporary::{TemporaryStorage, REGISTER_COUNT};

/// Error when accessing a storage slot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Slot index is outside the fixed capacity of the array
    #[error("storage index {index} out of range (capacity {capacity})")]
    IndexOutOfRange { index: u32, capacity: usize },
}

/// When the temporary registers are cleared.
///
/// Some NewGRF idioms pass values between callbacks of the same tick through
/// the registers, so clearing is a decision of the top-level call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ResetPolicy {
    /// Clear all registers before every top-level resolution
    #[default]
    PerResolve,
    /// Leave registers alone; the caller clears them when it sees fit
    Manual,
}

impl ResetPolicy {
    /// Apply the policy to a register file at the start of a resolution.
    pub fn apply(self, storage: &mut TemporaryStorage) {
        if self == ResetPolicy::PerResolve {
            storage.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_policy_per_resolve_clears() {
        let mut temp = TemporaryStorage::new();
        temp.set(3, 99);
        ResetPolicy::PerResolve.apply(&mut temp);
        assert_eq!(temp.get(3), 0);
    }

    #[test]
    fn test_reset_policy_manual_keeps_values() {
        let mut temp = TemporaryStorage::new();
        temp.set(3, 99);
        ResetPolicy::Manual.apply(&mut temp);
        assert_eq!(temp.get(3), 99);
    }

    #[test]
    fn test_reset_policy_serde_names() {
        let json = serde_json::to_string(&ResetPolicy::PerResolve).unwrap();
        assert_eq!(json, "\"per-resolve\"");
        let parsed: ResetPolicy = serde_json::from_str("\"manual\"").unwrap();
        assert_eq!(parsed, ResetPolicy::Manual);
    }

    #[test]
    fn test_error_display() {
        let err = StorageError::IndexOutOfRange { index: 300, capacity: 272 };
        assert_eq!(err.to_string(), "storage index 300 out of range (capacity 272)");
    }
}
