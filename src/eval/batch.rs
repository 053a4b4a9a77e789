//! Parallel resolution of many objects against one pool.

use rayon::prelude::*;

use super::{Evaluator, ResolverResult};
use crate::pool::NodeRef;
use crate::resolver::{CallbackId, GrfFile, Resolver, ResolverObject};
use crate::storage::TemporaryStorage;

/// One resolution request of a batch.
#[derive(Debug, Clone)]
pub struct ResolveJob<R> {
    pub root: NodeRef,
    pub provider: R,
    pub callback: CallbackId,
    pub callback_param1: u32,
    pub callback_param2: u32,
}

impl<R> ResolveJob<R> {
    pub fn new(root: NodeRef, provider: R) -> Self {
        Self {
            root,
            provider,
            callback: CallbackId::NO_CALLBACK,
            callback_param1: 0,
            callback_param2: 0,
        }
    }

    pub fn with_callback(mut self, callback: CallbackId, param1: u32, param2: u32) -> Self {
        self.callback = callback;
        self.callback_param1 = param1;
        self.callback_param2 = param2;
        self
    }
}

/// Result of one job, with the adapter handed back.
#[derive(Debug, Clone)]
pub struct BatchOutcome<R> {
    pub result: ResolverResult,
    pub last_value: u32,
    pub provider: R,
}

impl<'p> Evaluator<'p> {
    /// Resolve every job on the rayon pool.
    ///
    /// Each worker owns one register file, cleared before every job, so
    /// results do not depend on how jobs are spread over threads. Outcomes
    /// keep the order of `jobs`.
    pub fn par_resolve<R>(
        &self,
        jobs: Vec<ResolveJob<R>>,
        grf: Option<&GrfFile>,
    ) -> Vec<BatchOutcome<R>>
    where
        R: Resolver + Send,
    {
        jobs.into_par_iter()
            .map_init(TemporaryStorage::new, |temp, job| {
                temp.clear();
                let mut object = ResolverObject::new(job.provider, temp).with_callback(
                    job.callback,
                    job.callback_param1,
                    job.callback_param2,
                );
                if let Some(grf) = grf {
                    object = object.with_grf(grf);
                }
                let result = self.resolve(job.root, &mut object);
                BatchOutcome { result, last_value: object.last_value, provider: object.into_provider() }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::generic::{GenericResolver, GenericScope};
    use crate::group::{Adjust, AdjustOp, DeterministicGroup, GroupRange, GroupSize, ResultGroup, VarScope};
    use crate::pool::SpriteGroupPool;

    #[test]
    fn test_par_resolve_keeps_order() {
        let mut pool = SpriteGroupPool::new();
        let low = pool.allocate(ResultGroup::new(100, 1).into()).unwrap();
        let high = pool.allocate(ResultGroup::new(200, 1).into()).unwrap();
        let det = DeterministicGroup::new(
            VarScope::Object,
            GroupSize::Dword,
            vec![
                Adjust::register(0).op(AdjustOp::Add),
                Adjust::var(0x40).op(AdjustOp::Add),
                Adjust::constant(0).op(AdjustOp::Sto),
            ],
            vec![GroupRange::new(0, 9, low)],
            Some(high),
        );
        let root = pool.allocate(det.into()).unwrap();

        let jobs: Vec<_> = (0..64u32)
            .map(|i| {
                let scope = GenericScope::new().with_variable(0x40, i % 20);
                ResolveJob::new(root, GenericResolver::default().with_object(scope))
            })
            .collect();

        let evaluator = Evaluator::new(&pool);
        let outcomes = evaluator.par_resolve(jobs, None);
        assert_eq!(outcomes.len(), 64);
        for (i, outcome) in outcomes.iter().enumerate() {
            let expected = if (i as u32 % 20) < 10 { low } else { high };
            assert_eq!(outcome.result, ResolverResult::Group(expected), "job {}", i);
            assert_eq!(outcome.last_value, i as u32 % 20);
        }
    }
}
