//! The seam between the evaluator and the game objects it reads.
//!
//! This module provides:
//! - `VariableProvider`, one object's variables, random bits and storage
//! - `Resolver`, a feature's way of picking the provider for a scope and of
//!   choosing inside real groups
//! - `ResolverObject`, the transient per-call state of one resolution
//! - `NullScope`, the provider for objects that do not exist
//!
//! # Example
//!
//! ```
//! use spritegroup::features::generic::GenericResolver;
//! use spritegroup::resolver::{CallbackId, ResolverObject};
//! use spritegroup::storage::TemporaryStorage;
//!
//! let mut temp = TemporaryStorage::new();
//! let object = ResolverObject::new(GenericResolver::default(), &mut temp)
//!     .with_callback(CallbackId::HOUSE_COLOUR, 1, 2);
//! assert_eq!(object.callback_param1, 1);
//! ```

mod callback;
mod grf;
mod object;

use crate::features::{Feature, ResolverContext};
use crate::group::{RealGroup, VarScope};
use crate::pool::NodeRef;
use crate::storage::{StorageError, TemporaryStorage};

pub use callback::CallbackId;
pub use grf::GrfFile;
pub use object::ResolverObject;

/// Variables and mutable state of one object in one scope.
///
/// Variables the evaluator handles itself (0x0C, 0x10, 0x18, 0x1A, 0x1C,
/// 0x5F, 0x7B..=0x7F) never reach `get_variable`.
pub trait VariableProvider {
    /// Value of `variable`, or `None` when the object does not have it.
    ///
    /// `parameter` is the adjust's parameter byte for 0x60..=0x7F, or the
    /// accumulator when called through variable 0x7B.
    fn get_variable(&self, variable: u8, parameter: u32) -> Option<u32>;

    fn random_bits(&self) -> u32 {
        0
    }

    fn random_triggers(&self) -> u32 {
        0
    }

    fn set_random_bits(&mut self, _bits: u32) {}

    fn set_random_triggers(&mut self, _triggers: u32) {}

    /// Persistent storage slot; objects without storage read 0.
    fn read_persistent(&self, _index: u32) -> Result<u32, StorageError> {
        Ok(0)
    }

    /// Write a persistent storage slot; objects without storage ignore it.
    fn store_persistent(&mut self, _index: u32, _value: u32) -> Result<(), StorageError> {
        Ok(())
    }
}

/// Feature-specific part of a resolution.
pub trait Resolver {
    /// Provider for a scope.
    ///
    /// `relative` is the randomized or deterministic group's relative
    /// selector; only vehicles use it. Registers are passed for selectors
    /// that read a register.
    fn scope(
        &mut self,
        scope: VarScope,
        relative: u8,
        temp: &TemporaryStorage,
    ) -> &mut dyn VariableProvider;

    /// Candidate of a real group. Defaults to the first loaded group, else
    /// the first loading group.
    fn resolve_real(&self, group: &RealGroup) -> Option<NodeRef> {
        group.first_loaded()
    }

    fn feature(&self) -> Feature;

    /// Plain-data description of the bound object.
    fn context(&self) -> ResolverContext;
}

/// Provider for a missing object: nothing is available and writes vanish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NullScope;

impl VariableProvider for NullScope {
    fn get_variable(&self, _variable: u8, _parameter: u32) -> Option<u32> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_scope() {
        let mut scope = NullScope;
        assert_eq!(scope.get_variable(0x40, 0), None);
        assert_eq!(scope.random_bits(), 0);
        scope.set_random_bits(0xFF);
        assert_eq!(scope.random_bits(), 0);
        assert_eq!(scope.read_persistent(3), Ok(0));
        assert_eq!(scope.store_persistent(3, 1), Ok(()));
    }
}
