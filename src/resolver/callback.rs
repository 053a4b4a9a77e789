//! Callback identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the callback being resolved, readable through variable 0x0C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallbackId(pub u16);

impl CallbackId {
    /// Plain sprite lookup
    pub const NO_CALLBACK: CallbackId = CallbackId(0x00);
    /// Rerandomisation pass; randomized groups collect their reseed bits
    pub const RANDOM_TRIGGER: CallbackId = CallbackId(0x01);
    pub const VEHICLE_VISUAL_EFFECT: CallbackId = CallbackId(0x10);
    pub const VEHICLE_LENGTH: CallbackId = CallbackId(0x11);
    pub const VEHICLE_LOAD_AMOUNT: CallbackId = CallbackId(0x12);
    pub const STATION_AVAILABILITY: CallbackId = CallbackId(0x13);
    pub const STATION_DRAW_TILE_LAYOUT: CallbackId = CallbackId(0x14);
    pub const VEHICLE_REFIT_CAPACITY: CallbackId = CallbackId(0x15);
    pub const HOUSE_ALLOW_CONSTRUCTION: CallbackId = CallbackId(0x17);
    pub const HOUSE_ANIMATION_NEXT_FRAME: CallbackId = CallbackId(0x1A);
    pub const HOUSE_CONSTRUCTION_STATE_CHANGE: CallbackId = CallbackId(0x1C);
    pub const HOUSE_COLOUR: CallbackId = CallbackId(0x1E);
    pub const INDUSTRY_PROBABILITY: CallbackId = CallbackId(0x22);
    pub const INDUSTRY_LOCATION: CallbackId = CallbackId(0x28);
    pub const INDUSTRY_PRODUCTION_CHANGE: CallbackId = CallbackId(0x29);
    pub const INDUSTRY_MONTHLYPROD_CHANGE: CallbackId = CallbackId(0x35);
    pub const STATION_ANIM_START_STOP: CallbackId = CallbackId(0x140);
    pub const STATION_ANIM_NEXT_FRAME: CallbackId = CallbackId(0x141);
    pub const HOUSE_DENY_DESTRUCTION: CallbackId = CallbackId(0x143);

    pub fn is_callback(self) -> bool {
        self != CallbackId::NO_CALLBACK
    }
}

impl From<u16> for CallbackId {
    fn from(id: u16) -> Self {
        CallbackId(id)
    }
}

impl fmt::Display for CallbackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}
