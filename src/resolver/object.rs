//! Per-call resolution state.

use super::{CallbackId, GrfFile, Resolver};
use crate::group::VarScope;
use crate::storage::TemporaryStorage;

/// State of one top-level resolution.
///
/// Created for a single draw request or callback and dropped afterwards.
/// The evaluator reads the callback fields through variables 0x0C, 0x10 and
/// 0x18, keeps the accumulator of the last deterministic group in
/// `last_value`, and collects rerandomisation bits in `reseed`.
pub struct ResolverObject<'a, R> {
    pub callback: CallbackId,
    pub callback_param1: u32,
    pub callback_param2: u32,
    /// Accumulator of the most recent deterministic group, procedure calls included
    pub last_value: u32,
    /// Bits to rerandomise, per scope
    pub reseed: [u32; VarScope::COUNT],
    pub grf: Option<&'a GrfFile>,
    pub temp: &'a mut TemporaryStorage,
    pub provider: R,
    waiting_triggers: u32,
    used_triggers: u32,
}

impl<'a, R: Resolver> ResolverObject<'a, R> {
    pub fn new(provider: R, temp: &'a mut TemporaryStorage) -> Self {
        Self {
            callback: CallbackId::NO_CALLBACK,
            callback_param1: 0,
            callback_param2: 0,
            last_value: 0,
            reseed: [0; VarScope::COUNT],
            grf: None,
            temp,
            provider,
            waiting_triggers: 0,
            used_triggers: 0,
        }
    }

    pub fn with_callback(mut self, callback: CallbackId, param1: u32, param2: u32) -> Self {
        self.callback = callback;
        self.callback_param1 = param1;
        self.callback_param2 = param2;
        self
    }

    pub fn with_grf(mut self, grf: &'a GrfFile) -> Self {
        self.grf = Some(grf);
        self
    }

    /// Clear the accumulator, triggers and reseed masks before a new pass.
    pub fn reset_state(&mut self) {
        self.last_value = 0;
        self.waiting_triggers = 0;
        self.used_triggers = 0;
        self.reseed = [0; VarScope::COUNT];
    }

    /// Parameter of the owning data file (variable 0x7F).
    pub fn grf_parameter(&self, index: u32) -> u32 {
        self.grf.map_or(0, |grf| grf.param(index))
    }

    pub fn grf_version(&self) -> u8 {
        self.grf.map_or(0, |grf| grf.grf_version)
    }

    pub fn waiting_triggers(&self) -> u32 {
        self.waiting_triggers
    }

    pub fn set_waiting_triggers(&mut self, triggers: u32) {
        self.waiting_triggers = triggers;
    }

    /// Subset of the waiting triggers that rerandomised some group.
    pub fn used_triggers(&self) -> u32 {
        self.used_triggers
    }

    pub(crate) fn add_used_triggers(&mut self, triggers: u32) {
        self.used_triggers |= triggers;
    }

    /// Reseed bits of all scopes combined.
    pub fn reseed_sum(&self) -> u32 {
        self.reseed.iter().fold(0, |sum, bits| sum | bits)
    }

    /// Destructure into the adapter, e.g. to inspect storage written during
    /// the resolution.
    pub fn into_provider(self) -> R {
        self.provider
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::generic::GenericResolver;

    #[test]
    fn test_grf_parameter_without_file() {
        let mut temp = TemporaryStorage::new();
        let object = ResolverObject::new(GenericResolver::default(), &mut temp);
        assert_eq!(object.grf_parameter(0), 0);
        assert_eq!(object.grf_version(), 0);
    }

    #[test]
    fn test_reseed_sum_and_reset() {
        let mut temp = TemporaryStorage::new();
        let grf = GrfFile::new(1).with_params(vec![5]);
        let mut object = ResolverObject::new(GenericResolver::default(), &mut temp).with_grf(&grf);
        assert_eq!(object.grf_parameter(0), 5);

        object.reseed = [0b0001, 0b0100, 0];
        object.set_waiting_triggers(3);
        object.add_used_triggers(1);
        object.last_value = 9;
        assert_eq!(object.reseed_sum(), 0b0101);
        assert_eq!(object.used_triggers(), 1);

        object.reset_state();
        assert_eq!(object.reseed_sum(), 0);
        assert_eq!(object.waiting_triggers(), 0);
        assert_eq!(object.used_triggers(), 0);
        assert_eq!(object.last_value, 0);
    }
}
