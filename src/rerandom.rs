//! Random-trigger rerandomisation.
//!
//! A trigger pass resolves the graph with the `RANDOM_TRIGGER` callback.
//! Randomized groups whose triggers match the waiting triggers add the bits
//! they read to the reseed mask. Afterwards those bits of the object's
//! random bits are replaced and the consumed triggers are cleared.

use rand::Rng;
use tracing::{debug, trace};

use crate::eval::Evaluator;
use crate::group::VarScope;
use crate::pool::NodeRef;
use crate::resolver::{CallbackId, Resolver, ResolverObject};

/// What a trigger pass changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rerandomisation {
    /// Random bits that were replaced
    pub reseed: u32,
    /// Triggers that fired some group
    pub used_triggers: u32,
    /// Random bits after the pass
    pub random_bits: u32,
    /// Triggers still waiting after the pass
    pub remaining_triggers: u32,
}

/// Run a trigger pass with fresh bits from `rng`.
pub fn rerandomise<R, G>(
    evaluator: &Evaluator<'_>,
    root: NodeRef,
    object: &mut ResolverObject<'_, R>,
    triggers: u32,
    rng: &mut G,
) -> Rerandomisation
where
    R: Resolver,
    G: Rng + ?Sized,
{
    let new_bits: u32 = rng.gen();
    rerandomise_with_bits(evaluator, root, object, triggers, new_bits)
}

/// Run a trigger pass, taking replacement bits from `new_bits`.
///
/// Passing the same `new_bits` to several objects gives them matching
/// random bits, as wagons of one consist share cargo appearance.
pub fn rerandomise_with_bits<R: Resolver>(
    evaluator: &Evaluator<'_>,
    root: NodeRef,
    object: &mut ResolverObject<'_, R>,
    triggers: u32,
    new_bits: u32,
) -> Rerandomisation {
    let saved_callback = object.callback;
    object.callback = CallbackId::RANDOM_TRIGGER;
    object.reset_state();

    let scope = object.provider.scope(VarScope::Object, 0, object.temp);
    let waiting = scope.random_triggers() | triggers;
    // Stored first so variable 0x5F sees the new triggers during the pass.
    scope.set_random_triggers(waiting);
    object.set_waiting_triggers(waiting);

    let pass = evaluator.resolve(root, object);
    trace!(root = %root, result = ?pass, "random trigger pass");

    // Bits of every scope are reseeded on the object itself.
    let reseed = object.reseed_sum();
    let used = object.used_triggers();
    let remaining = waiting & !used;

    let scope = object.provider.scope(VarScope::Object, 0, object.temp);
    scope.set_random_triggers(remaining);
    let random_bits = (scope.random_bits() & !reseed) | (new_bits & reseed);
    scope.set_random_bits(random_bits);

    object.callback = saved_callback;
    debug!(
        root = %root,
        triggers,
        reseed = format_args!("{:#x}", reseed),
        used = format_args!("{:#x}", used),
        "rerandomised"
    );

    Rerandomisation { reseed, used_triggers: used, random_bits, remaining_triggers: remaining }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::generic::{GenericResolver, GenericScope};
    use crate::group::{RandomizedGroup, ResultGroup, TriggerMode};
    use crate::pool::SpriteGroupPool;
    use crate::storage::TemporaryStorage;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn graph(mode: TriggerMode, triggers: u8) -> (SpriteGroupPool, NodeRef) {
        let mut pool = SpriteGroupPool::new();
        let leaves: Vec<NodeRef> =
            (0..4).map(|i| pool.allocate(ResultGroup::new(i, 1).into()).unwrap()).collect();
        let rnd = RandomizedGroup::new(VarScope::Object, mode, triggers, 4, leaves).unwrap();
        let root = pool.allocate(rnd.into()).unwrap();
        (pool, root)
    }

    #[test]
    fn test_matching_trigger_reseeds_group_bits() {
        let (pool, root) = graph(TriggerMode::Any, 0b10);
        let scope = GenericScope::new().with_random(0xFFFF_FFFF, 0);
        let mut temp = TemporaryStorage::new();
        let mut object = ResolverObject::new(GenericResolver::default().with_object(scope), &mut temp);

        let outcome = rerandomise_with_bits(&Evaluator::new(&pool), root, &mut object, 0b10, 0);
        assert_eq!(outcome.reseed, 0b11_0000);
        assert_eq!(outcome.used_triggers, 0b10);
        assert_eq!(outcome.random_bits, 0xFFFF_FFCF);
        assert_eq!(outcome.remaining_triggers, 0);
        assert_eq!(object.callback, CallbackId::NO_CALLBACK);

        let provider = object.into_provider();
        assert_eq!(provider.object().random_bits, 0xFFFF_FFCF);
        assert_eq!(provider.object().random_triggers, 0);
    }

    #[test]
    fn test_all_mode_waits_for_every_trigger() {
        let (pool, root) = graph(TriggerMode::All, 0b11);
        let evaluator = Evaluator::new(&pool);
        let mut temp = TemporaryStorage::new();
        let mut object = ResolverObject::new(GenericResolver::default(), &mut temp);

        let first = rerandomise_with_bits(&evaluator, root, &mut object, 0b01, 0);
        assert_eq!(first.reseed, 0);
        assert_eq!(first.remaining_triggers, 0b01);

        let second = rerandomise_with_bits(&evaluator, root, &mut object, 0b10, u32::MAX);
        assert_eq!(second.reseed, 0b11_0000);
        assert_eq!(second.remaining_triggers, 0);
        assert_eq!(second.random_bits, 0b11_0000);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let (pool, root) = graph(TriggerMode::Any, 0b1);
        let evaluator = Evaluator::new(&pool);
        let run = |seed: u64| {
            let mut temp = TemporaryStorage::new();
            let mut object = ResolverObject::new(GenericResolver::default(), &mut temp);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            rerandomise(&evaluator, root, &mut object, 1, &mut rng).random_bits
        };
        assert_eq!(run(7), run(7));
        assert_eq!(run(7) & !0b11_0000, 0);
    }
}
