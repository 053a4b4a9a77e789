//! Terminal groups carrying a callback value or a sprite set.

use serde::{Deserialize, Serialize};

/// Callback result value returned by a resolution that failed.
pub const CALLBACK_FAILED: u16 = 0xFFFF;

/// Group holding a 15-bit callback result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackResultGroup {
    value: u16,
}

impl CallbackResultGroup {
    /// Normalise a raw data-file value.
    ///
    /// `0xFFxx` is the old 8-bit form and yields `xx`; otherwise bit 15 is
    /// the callback marker and is cleared.
    pub fn new(raw: u16) -> Self {
        Self::with_grf_version(raw, 0)
    }

    /// Normalise a raw value for a data file of the given version; the 8-bit
    /// form only exists before version 8.
    pub fn with_grf_version(raw: u16, grf_version: u8) -> Self {
        let value = if grf_version < 8 && raw >> 8 == 0xFF { raw & 0x00FF } else { raw & 0x7FFF };
        Self { value }
    }

    pub fn value(&self) -> u16 {
        self.value
    }
}

/// Group naming a set of consecutive sprites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultGroup {
    /// First sprite of the set
    pub sprite: u32,
    /// Number of sprites in the set
    pub num_sprites: u8,
}

impl ResultGroup {
    pub fn new(sprite: u32, num_sprites: u8) -> Self {
        Self { sprite, num_sprites }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_high_byte() {
        assert_eq!(CallbackResultGroup::new(0xFF42).value(), 0x0042);
    }

    #[test]
    fn test_bit_15_marker() {
        assert_eq!(CallbackResultGroup::new(0x8037).value(), 0x0037);
        assert_eq!(CallbackResultGroup::new(0x0037).value(), 0x0037);
    }

    #[test]
    fn test_version_8_has_no_legacy_form() {
        assert_eq!(CallbackResultGroup::with_grf_version(0xFF42, 8).value(), 0x7F42);
        assert_eq!(CallbackResultGroup::with_grf_version(0xFF42, 7).value(), 0x0042);
    }
}
