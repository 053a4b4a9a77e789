//! Temporary register file.

use super::StorageError;

/// Number of temporary registers available to a resolution chain.
pub const REGISTER_COUNT: usize = 0x110;

/// Scratch registers shared by every group visited in one resolution.
///
/// Registers 0x100.. carry values back out of callbacks (for example the
/// relative vehicle count or extra callback results), the rest are free for
/// NewGRF use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryStorage {
    values: Box<[u32; REGISTER_COUNT]>,
}

impl Default for TemporaryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TemporaryStorage {
    /// Create a register file with every register zeroed.
    pub fn new() -> Self {
        Self { values: Box::new([0; REGISTER_COUNT]) }
    }

    /// Number of registers.
    pub fn len(&self) -> usize {
        REGISTER_COUNT
    }

    /// Always false; the register file has a fixed size.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Read a register.
    ///
    /// # Panics
    ///
    /// Panics if `index >= REGISTER_COUNT`.
    pub fn get(&self, index: u32) -> u32 {
        match self.try_get(index) {
            Ok(value) => value,
            Err(e) => panic!("{}", e),
        }
    }

    /// Write a register.
    ///
    /// # Panics
    ///
    /// Panics if `index >= REGISTER_COUNT`.
    pub fn set(&mut self, index: u32, value: u32) {
        if let Err(e) = self.try_set(index, value) {
            panic!("{}", e);
        }
    }

    /// Read a register, reporting out-of-range indices.
    pub fn try_get(&self, index: u32) -> Result<u32, StorageError> {
        self.values
            .get(index as usize)
            .copied()
            .ok_or(StorageError::IndexOutOfRange { index, capacity: REGISTER_COUNT })
    }

    /// Write a register, reporting out-of-range indices.
    pub fn try_set(&mut self, index: u32, value: u32) -> Result<(), StorageError> {
        let slot = self
            .values
            .get_mut(index as usize)
            .ok_or(StorageError::IndexOutOfRange { index, capacity: REGISTER_COUNT })?;
        *slot = value;
        Ok(())
    }

    /// Zero every register.
    pub fn clear(&mut self) {
        self.values.fill(0);
    }

    /// Registers holding a non-zero value, in index order.
    pub fn non_zero(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .map(|(i, v)| (i as u32, *v))
    }
}
