//! Town scope.
//!
//! Towns are never resolved on their own; they answer the parent scope of
//! houses, industries and stations. Each data file gets its own persistent
//! array per town, created on the first write.

use serde::{Deserialize, Serialize};

use super::tile::TileIndex;
use super::{Feature, ResolverContext};
use crate::group::VarScope;
use crate::resolver::{NullScope, Resolver, VariableProvider};
use crate::storage::{
    EntityRef, PersistentStorage, PersistentStorageMap, StorageError, TemporaryStorage,
    DEFAULT_PERSISTENT_SLOTS,
};

/// Town state read by sprite groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Town {
    pub index: u32,
    pub xy: TileIndex,
    pub population: u32,
    pub num_houses: u16,
    #[serde(default)]
    pub is_capital: bool,
}

impl Town {
    pub fn entity(&self) -> EntityRef {
        EntityRef::new(Feature::Towns, self.index)
    }
}

/// A town seen from a sprite group of one data file.
#[derive(Debug)]
pub struct TownScope<'a> {
    pub town: &'a Town,
    storage: Option<&'a mut PersistentStorageMap>,
    grfid: u32,
    readonly: bool,
}

impl<'a> TownScope<'a> {
    /// Scope without storage: storage reads give 0 and writes vanish.
    pub fn new(town: &'a Town) -> Self {
        Self { town, storage: None, grfid: 0, readonly: false }
    }

    /// Scope reading and writing the array of `grfid` in `storage`.
    pub fn with_storage(mut self, storage: &'a mut PersistentStorageMap, grfid: u32) -> Self {
        self.storage = Some(storage);
        self.grfid = grfid;
        self
    }

    /// Ignore storage writes, as when the town is only previewed.
    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }
}

impl VariableProvider for TownScope<'_> {
    fn get_variable(&self, variable: u8, _parameter: u32) -> Option<u32> {
        let town = self.town;
        let population = town.population.min(0xFFFF);
        let value = match variable {
            0x40 => u32::from(town.is_capital),
            0x41 => town.index,
            0x80 => town.xy.0 & 0xFF,
            0x81 => (town.xy.0 >> 8) & 0xFF,
            0x82 => population & 0xFF,
            0x83 => population >> 8,
            0xB6 => u32::from(town.num_houses),
            _ => return None,
        };
        Some(value)
    }

    fn read_persistent(&self, index: u32) -> Result<u32, StorageError> {
        let Some(storage) = self.storage.as_deref() else {
            return Ok(0);
        };
        match storage.get(self.town.entity(), self.grfid) {
            Some(array) => array.try_get(index).map(|value| value as u32),
            None => Ok(0),
        }
    }

    fn store_persistent(&mut self, index: u32, value: u32) -> Result<(), StorageError> {
        if self.readonly {
            return Ok(());
        }
        let owner = self.town.entity();
        let grfid = self.grfid;
        let Some(storage) = self.storage.as_deref_mut() else {
            return Ok(());
        };
        match storage.get_mut(owner, grfid) {
            Some(array) => array.try_set(index, value as i32),
            None if value == 0 => Ok(()),
            None => {
                let mut created = PersistentStorage::new(owner, grfid, DEFAULT_PERSISTENT_SLOTS);
                created.try_set(index, value as i32)?;
                storage.insert(created);
                Ok(())
            }
        }
    }
}

/// Resolver for graphs evaluated directly against a town.
#[derive(Debug)]
pub struct TownResolver<'a> {
    town: TownScope<'a>,
    null: NullScope,
}

impl<'a> TownResolver<'a> {
    pub fn new(town: TownScope<'a>) -> Self {
        Self { town, null: NullScope }
    }
}

impl Resolver for TownResolver<'_> {
    fn scope(
        &mut self,
        scope: VarScope,
        _relative: u8,
        _temp: &TemporaryStorage,
    ) -> &mut dyn VariableProvider {
        match scope {
            VarScope::Object => &mut self.town,
            _ => &mut self.null,
        }
    }

    fn feature(&self) -> Feature {
        Feature::Towns
    }

    fn context(&self) -> ResolverContext {
        ResolverContext::Town { town: self.town.town.index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn town() -> Town {
        Town { index: 7, xy: TileIndex(0x1234), population: 70_000, num_houses: 300, is_capital: true }
    }

    #[test]
    fn test_variables() {
        let town = town();
        let scope = TownScope::new(&town);
        assert_eq!(scope.get_variable(0x40, 0), Some(1));
        assert_eq!(scope.get_variable(0x41, 0), Some(7));
        assert_eq!(scope.get_variable(0x80, 0), Some(0x34));
        assert_eq!(scope.get_variable(0x81, 0), Some(0x12));
        assert_eq!(scope.get_variable(0x82, 0), Some(0xFF));
        assert_eq!(scope.get_variable(0x83, 0), Some(0xFF));
        assert_eq!(scope.get_variable(0xB6, 0), Some(300));
        assert_eq!(scope.get_variable(0x42, 0), None);
    }

    #[test]
    fn test_storage_per_grf() {
        let town = town();
        let mut storage = PersistentStorageMap::new();
        {
            let mut scope = TownScope::new(&town).with_storage(&mut storage, 0xAA);
            scope.store_persistent(0, 0).unwrap();
        }
        assert!(storage.is_empty());
        {
            let mut scope = TownScope::new(&town).with_storage(&mut storage, 0xAA);
            scope.store_persistent(1, 42).unwrap();
            assert_eq!(scope.read_persistent(1), Ok(42));
        }
        let other = TownScope::new(&town).with_storage(&mut storage, 0xBB);
        assert_eq!(other.read_persistent(1), Ok(0));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_out_of_range_write_creates_no_storage() {
        let town = town();
        let mut storage = PersistentStorageMap::new();
        {
            let mut scope = TownScope::new(&town).with_storage(&mut storage, 0xAB);
            assert_eq!(
                scope.store_persistent(99, 5),
                Err(StorageError::IndexOutOfRange { index: 99, capacity: DEFAULT_PERSISTENT_SLOTS })
            );
        }
        assert!(storage.is_empty());
    }

    #[test]
    fn test_readonly_ignores_writes() {
        let town = town();
        let mut storage = PersistentStorageMap::new();
        let mut scope = TownScope::new(&town).with_storage(&mut storage, 1).readonly(true);
        scope.store_persistent(0, 9).unwrap();
        assert_eq!(scope.read_persistent(0), Ok(0));
    }

    #[test]
    fn test_resolver_context() {
        let town = town();
        let mut resolver = TownResolver::new(TownScope::new(&town));
        let temp = TemporaryStorage::new();
        assert_eq!(resolver.scope(VarScope::Object, 0, &temp).get_variable(0x41, 0), Some(7));
        assert_eq!(resolver.scope(VarScope::Parent, 0, &temp).get_variable(0x41, 0), None);
        assert_eq!(resolver.context(), ResolverContext::Town { town: 7 });
    }
}
