//! Table-driven provider.
//!
//! Variables are looked up in a map instead of being computed from game
//! state. The CLI resolves graphs against it and tests use it as the mock
//! object.

use std::collections::BTreeMap;

use super::{Feature, ResolverContext};
use crate::group::VarScope;
use crate::resolver::{NullScope, Resolver, VariableProvider};
use crate::storage::{PersistentStorage, StorageError, TemporaryStorage};

/// One object whose variables come from a table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericScope {
    variables: BTreeMap<u8, u32>,
    /// Values of parameterised variables, keyed by `(variable, parameter)`
    parameterised: BTreeMap<(u8, u32), u32>,
    pub random_bits: u32,
    pub random_triggers: u32,
    pub storage: Option<PersistentStorage>,
}

impl GenericScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `variable` with `value` for any parameter.
    pub fn with_variable(mut self, variable: u8, value: u32) -> Self {
        self.variables.insert(variable, value);
        self
    }

    /// Answer `variable` with `value` for one parameter only.
    ///
    /// Takes precedence over a value set with `with_variable`.
    pub fn with_parameterised(mut self, variable: u8, parameter: u32, value: u32) -> Self {
        self.parameterised.insert((variable, parameter), value);
        self
    }

    pub fn with_random(mut self, bits: u32, triggers: u32) -> Self {
        self.random_bits = bits;
        self.random_triggers = triggers;
        self
    }

    /// Attach persistent storage; without it reads give 0 and writes vanish.
    pub fn with_storage(mut self, storage: PersistentStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn set_variable(&mut self, variable: u8, value: u32) {
        self.variables.insert(variable, value);
    }

    pub fn variables(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.variables.iter().map(|(var, value)| (*var, *value))
    }
}

impl VariableProvider for GenericScope {
    fn get_variable(&self, variable: u8, parameter: u32) -> Option<u32> {
        self.parameterised
            .get(&(variable, parameter))
            .or_else(|| self.variables.get(&variable))
            .copied()
    }

    fn random_bits(&self) -> u32 {
        self.random_bits
    }

    fn random_triggers(&self) -> u32 {
        self.random_triggers
    }

    fn set_random_bits(&mut self, bits: u32) {
        self.random_bits = bits;
    }

    fn set_random_triggers(&mut self, triggers: u32) {
        self.random_triggers = triggers;
    }

    fn read_persistent(&self, index: u32) -> Result<u32, StorageError> {
        match &self.storage {
            Some(storage) => storage.try_get(index).map(|value| value as u32),
            None => Ok(0),
        }
    }

    fn store_persistent(&mut self, index: u32, value: u32) -> Result<(), StorageError> {
        match &mut self.storage {
            Some(storage) => storage.try_set(index, value as i32),
            None => Ok(()),
        }
    }
}

/// Resolver over a table-driven object and an optional table-driven parent.
///
/// The relative scope is always empty.
#[derive(Debug, Clone)]
pub struct GenericResolver {
    feature: Feature,
    object: GenericScope,
    parent: Option<GenericScope>,
    null: NullScope,
}

impl Default for GenericResolver {
    fn default() -> Self {
        Self::new(Feature::Objects)
    }
}

impl GenericResolver {
    pub fn new(feature: Feature) -> Self {
        Self { feature, object: GenericScope::new(), parent: None, null: NullScope }
    }

    pub fn with_object(mut self, object: GenericScope) -> Self {
        self.object = object;
        self
    }

    pub fn with_parent(mut self, parent: GenericScope) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn object(&self) -> &GenericScope {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut GenericScope {
        &mut self.object
    }

    pub fn parent(&self) -> Option<&GenericScope> {
        self.parent.as_ref()
    }
}

impl Resolver for GenericResolver {
    fn scope(
        &mut self,
        scope: VarScope,
        _relative: u8,
        _temp: &TemporaryStorage,
    ) -> &mut dyn VariableProvider {
        match scope {
            VarScope::Object => &mut self.object,
            VarScope::Parent => match &mut self.parent {
                Some(parent) => parent,
                None => &mut self.null,
            },
            VarScope::Relative => &mut self.null,
        }
    }

    fn feature(&self) -> Feature {
        self.feature
    }

    fn context(&self) -> ResolverContext {
        ResolverContext::Generic { feature: self.feature }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EntityRef;

    #[test]
    fn test_parameterised_overrides_plain() {
        let scope = GenericScope::new().with_variable(0x60, 1).with_parameterised(0x60, 0x12, 2);
        assert_eq!(scope.get_variable(0x60, 0x12), Some(2));
        assert_eq!(scope.get_variable(0x60, 0x13), Some(1));
        assert_eq!(scope.get_variable(0x61, 0), None);
    }

    #[test]
    fn test_storage_optional() {
        let mut scope = GenericScope::new();
        assert_eq!(scope.store_persistent(2, 5), Ok(()));
        assert_eq!(scope.read_persistent(2), Ok(0));

        let owner = EntityRef::new(Feature::Objects, 0);
        let mut scope = scope.with_storage(PersistentStorage::new(owner, 0, 4));
        scope.store_persistent(2, 5).unwrap();
        assert_eq!(scope.read_persistent(2), Ok(5));
        assert!(scope.store_persistent(4, 1).is_err());
    }

    #[test]
    fn test_scopes() {
        let temp = TemporaryStorage::new();
        let mut resolver = GenericResolver::new(Feature::Houses)
            .with_object(GenericScope::new().with_variable(0x40, 1))
            .with_parent(GenericScope::new().with_variable(0x40, 2));
        assert_eq!(resolver.scope(VarScope::Object, 0, &temp).get_variable(0x40, 0), Some(1));
        assert_eq!(resolver.scope(VarScope::Parent, 0, &temp).get_variable(0x40, 0), Some(2));
        assert_eq!(resolver.scope(VarScope::Relative, 3, &temp).get_variable(0x40, 0), None);
        assert_eq!(resolver.feature(), Feature::Houses);
        assert_eq!(resolver.context(), ResolverContext::Generic { feature: Feature::Houses });
    }
}
