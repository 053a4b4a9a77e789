//! Variables answered by the evaluator rather than the feature adapter.

use crate::group::{VarScope, VAR_CONSTANT, VAR_PERSISTENT, VAR_REGISTER};
use crate::resolver::{Resolver, ResolverObject};
use crate::storage::StorageError;

/// Callback identifier
pub const VAR_CALLBACK_ID: u8 = 0x0C;
/// First callback parameter
pub const VAR_CALLBACK_PARAM1: u8 = 0x10;
/// Second callback parameter
pub const VAR_CALLBACK_PARAM2: u8 = 0x18;
/// Accumulator of the previous deterministic group
pub const VAR_LAST_VALUE: u8 = 0x1C;
/// Random bits shifted left by 8, or'ed with the waiting triggers
pub const VAR_RANDOM: u8 = 0x5F;
/// Indirect access: the parameter names the variable, the accumulator is
/// its parameter
pub const VAR_INDIRECT: u8 = 0x7B;
/// Parameter of the owning data file
pub const VAR_GRF_PARAM: u8 = 0x7F;

/// Read `variable` for a group in `scope`.
///
/// `Ok(None)` means the variable is not available for the object.
pub(crate) fn read_variable<R: Resolver>(
    object: &mut ResolverObject<'_, R>,
    scope: VarScope,
    count: u8,
    variable: u8,
    parameter: u32,
) -> Result<Option<u32>, StorageError> {
    let value = match variable {
        VAR_CALLBACK_ID => object.callback.0 as u32,
        VAR_CALLBACK_PARAM1 => object.callback_param1,
        VAR_CALLBACK_PARAM2 => object.callback_param2,
        VAR_CONSTANT => u32::MAX,
        VAR_LAST_VALUE => object.last_value,
        VAR_RANDOM => {
            let provider = object.provider.scope(scope, count, object.temp);
            (provider.random_bits() << 8) | provider.random_triggers()
        }
        VAR_PERSISTENT => {
            object.provider.scope(scope, count, object.temp).read_persistent(parameter)?
        }
        VAR_REGISTER => object.temp.try_get(parameter)?,
        VAR_GRF_PARAM => object.grf_parameter(parameter),
        _ => {
            return Ok(object.provider.scope(scope, count, object.temp).get_variable(variable, parameter))
        }
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::generic::{GenericResolver, GenericScope};
    use crate::resolver::{CallbackId, GrfFile};
    use crate::storage::TemporaryStorage;

    fn resolver() -> GenericResolver {
        let scope = GenericScope::new().with_variable(0x40, 11).with_random(0x1234, 0x05);
        GenericResolver::default().with_object(scope)
    }

    #[test]
    fn test_callback_variables() {
        let mut temp = TemporaryStorage::new();
        let mut object = ResolverObject::new(resolver(), &mut temp)
            .with_callback(CallbackId::HOUSE_COLOUR, 7, 9);
        object.last_value = 3;
        fn read(object: &mut ResolverObject<'_, GenericResolver>, var: u8) -> Option<u32> {
            read_variable(object, VarScope::Object, 0, var, 0).unwrap()
        }
        assert_eq!(read(&mut object, VAR_CALLBACK_ID), Some(0x1E));
        assert_eq!(read(&mut object, VAR_CALLBACK_PARAM1), Some(7));
        assert_eq!(read(&mut object, VAR_CALLBACK_PARAM2), Some(9));
        assert_eq!(read(&mut object, VAR_CONSTANT), Some(u32::MAX));
        assert_eq!(read(&mut object, VAR_LAST_VALUE), Some(3));
        assert_eq!(read(&mut object, VAR_RANDOM), Some(0x0012_3405));
        assert_eq!(read(&mut object, 0x40), Some(11));
        assert_eq!(read(&mut object, 0x41), None);
    }

    #[test]
    fn test_register_and_grf_param() {
        let mut temp = TemporaryStorage::new();
        temp.set(0x20, 500);
        let grf = GrfFile::new(0xABCD).with_params(vec![1, 2, 3]);
        let mut object = ResolverObject::new(resolver(), &mut temp).with_grf(&grf);
        assert_eq!(read_variable(&mut object, VarScope::Object, 0, VAR_REGISTER, 0x20), Ok(Some(500)));
        assert_eq!(read_variable(&mut object, VarScope::Object, 0, VAR_GRF_PARAM, 2), Ok(Some(3)));
        assert_eq!(read_variable(&mut object, VarScope::Object, 0, VAR_GRF_PARAM, 9), Ok(Some(0)));
        assert!(read_variable(&mut object, VarScope::Object, 0, VAR_REGISTER, 0x110).is_err());
    }

    #[test]
    fn test_parent_scope_without_parent() {
        let mut temp = TemporaryStorage::new();
        let mut object = ResolverObject::new(resolver(), &mut temp);
        assert_eq!(read_variable(&mut object, VarScope::Parent, 0, 0x40, 0), Ok(None));
        assert_eq!(read_variable(&mut object, VarScope::Parent, 0, VAR_RANDOM, 0), Ok(Some(0)));
    }
}
