//! Persistent per-entity storage.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::StorageError;
use crate::features::Feature;

/// Slot count of the persistent arrays owned by industries, towns and airports.
pub const DEFAULT_PERSISTENT_SLOTS: usize = 16;

/// Identity of a long-lived game object that owns persistent storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub feature: Feature,
    pub index: u32,
}

impl EntityRef {
    pub fn new(feature: Feature, index: u32) -> Self {
        Self { feature, index }
    }
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.feature, self.index)
    }
}

/// Fixed-capacity array of signed 32-bit values that survives between
/// resolutions and is saved with the game.
///
/// Writes can be tracked so that the effects of a test-run (a command that is
/// only checked, not executed) are reverted with `clear_changes(false)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentStorage {
    /// Entity owning this array
    pub owner: EntityRef,
    /// Data file that wrote the array
    pub grfid: u32,
    values: Vec<i32>,
    #[serde(skip)]
    backup: Option<Vec<i32>>,
}

impl PersistentStorage {
    /// Create a zeroed array with `capacity` slots.
    pub fn new(owner: EntityRef, grfid: u32, capacity: usize) -> Self {
        Self { owner, grfid, values: vec![0; capacity], backup: None }
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Read a slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below the capacity.
    pub fn get(&self, index: u32) -> i32 {
        match self.try_get(index) {
            Ok(value) => value,
            Err(e) => panic!("{}", e),
        }
    }

    /// Write a slot.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below the capacity.
    pub fn set(&mut self, index: u32, value: i32) {
        if let Err(e) = self.try_set(index, value) {
            panic!("{}", e);
        }
    }

    pub fn try_get(&self, index: u32) -> Result<i32, StorageError> {
        self.values
            .get(index as usize)
            .copied()
            .ok_or(StorageError::IndexOutOfRange { index, capacity: self.values.len() })
    }

    pub fn try_set(&mut self, index: u32, value: i32) -> Result<(), StorageError> {
        let capacity = self.values.len();
        let current = *self
            .values
            .get(index as usize)
            .ok_or(StorageError::IndexOutOfRange { index, capacity })?;
        if current == value {
            return Ok(());
        }
        if self.backup.is_none() {
            self.backup = Some(self.values.clone());
        }
        self.values[index as usize] = value;
        Ok(())
    }

    /// True when a write happened since the last `clear_changes`.
    pub fn has_changes(&self) -> bool {
        self.backup.is_some()
    }

    /// Forget the change record, optionally reverting to the values from
    /// before the first tracked write.
    pub fn clear_changes(&mut self, keep_changes: bool) {
        if let Some(backup) = self.backup.take() {
            if !keep_changes {
                self.values = backup;
            }
        }
    }

    /// True when every slot is zero.
    pub fn is_zeroed(&self) -> bool {
        self.values.iter().all(|v| *v == 0)
    }

    pub fn values(&self) -> &[i32] {
        &self.values
    }
}

/// Lookup from `(entity, grfid)` to the persistent array the save/load layer
/// serializes.
///
/// Towns hold one array per data file; industries and airports hold a single
/// array tagged with the grfid of the data file defining them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PersistentStorage>", into = "Vec<PersistentStorage>")]
pub struct PersistentStorageMap {
    arrays: BTreeMap<(EntityRef, u32), PersistentStorage>,
}

impl PersistentStorageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, owner: EntityRef, grfid: u32) -> Option<&PersistentStorage> {
        self.arrays.get(&(owner, grfid))
    }

    pub fn get_mut(&mut self, owner: EntityRef, grfid: u32) -> Option<&mut PersistentStorage> {
        self.arrays.get_mut(&(owner, grfid))
    }

    /// Fetch the array for `(owner, grfid)`, creating a zeroed one with
    /// `capacity` slots on first use.
    pub fn get_or_create(
        &mut self,
        owner: EntityRef,
        grfid: u32,
        capacity: usize,
    ) -> &mut PersistentStorage {
        self.arrays
            .entry((owner, grfid))
            .or_insert_with(|| PersistentStorage::new(owner, grfid, capacity))
    }

    /// Add `storage` under its own owner and grfid, replacing any array
    /// already there.
    pub fn insert(&mut self, storage: PersistentStorage) -> Option<PersistentStorage> {
        self.arrays.insert((storage.owner, storage.grfid), storage)
    }

    /// Remove every array owned by `owner` (the entity was deleted).
    pub fn remove_owner(&mut self, owner: EntityRef) -> usize {
        let before = self.arrays.len();
        self.arrays.retain(|(o, _), _| *o != owner);
        before - self.arrays.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersistentStorage> {
        self.arrays.values()
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    /// Apply `clear_changes` to every array.
    pub fn clear_changes(&mut self, keep_changes: bool) {
        for storage in self.arrays.values_mut() {
            storage.clear_changes(keep_changes);
        }
    }
}

impl From<Vec<PersistentStorage>> for PersistentStorageMap {
    fn from(arrays: Vec<PersistentStorage>) -> Self {
        Self { arrays: arrays.into_iter().map(|s| ((s.owner, s.grfid), s)).collect() }
    }
}

impl From<PersistentStorageMap> for Vec<PersistentStorage> {
    fn from(map: PersistentStorageMap) -> Self {
        map.arrays.into_values().collect()
    }
}
