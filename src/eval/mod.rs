//! Sprite group evaluation.
//!
//! `Evaluator` walks a `SpriteGroupPool` from a root node, asking a
//! `ResolverObject` for variables, random bits and storage, until it reaches
//! a terminal node or a calculated callback result.
//!
//! Evaluation never fails loudly: `resolve` maps every error to
//! `ResolverResult::Failed` and logs it. `try_resolve` exposes the error.

mod adjust;
mod batch;
mod real;
mod variables;

use thiserror::Error;
use tracing::{debug, error, trace, warn};

use crate::group::{
    Adjust, DeterministicGroup, IndustryProductionGroup, RandomizedGroup, ResultGroup,
    SpriteGroup, TileLayoutGroup, CALLBACK_FAILED, VAR_PROCEDURE,
};
use crate::pool::{NodeRef, SpriteGroupPool};
use crate::resolver::{CallbackId, Resolver, ResolverObject};
use crate::storage::{ResetPolicy, StorageError};

pub use adjust::{apply_op, eval_adjust, prepare_operand, AdjustOutcome, StoreEffect};
pub use batch::{BatchOutcome, ResolveJob};
pub use real::{CargoThreshold, LoadProgress, CARGO_AMOUNT_MAX};
pub use variables::{
    VAR_CALLBACK_ID, VAR_CALLBACK_PARAM1, VAR_CALLBACK_PARAM2, VAR_GRF_PARAM, VAR_INDIRECT,
    VAR_LAST_VALUE, VAR_RANDOM,
};

use variables::read_variable;

/// Nesting limit used when none is configured.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Outcome of a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverResult {
    /// No group could be chosen
    Failed,
    /// Value computed by a calculated deterministic group
    Callback(u16),
    /// Terminal node reached
    Group(NodeRef),
}

impl ResolverResult {
    pub fn is_failed(&self) -> bool {
        matches!(self, ResolverResult::Failed)
    }

    pub fn group(self) -> Option<NodeRef> {
        match self {
            ResolverResult::Group(node) => Some(node),
            _ => None,
        }
    }
}

/// Why a resolution failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ResolveError {
    /// A node reference does not exist in the pool
    #[error("invalid sprite group reference {0}")]
    InvalidReference(NodeRef),
    /// Nesting exceeded the configured limit, usually a cycle
    #[error("sprite group nesting exceeds {limit} levels at {node}")]
    RecursionTooDeep { node: NodeRef, limit: usize },
    /// A register or persistent slot index was out of range
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Walks sprite group graphs of one pool.
///
/// The pool is only read, so one evaluator can be shared between threads as
/// long as every thread brings its own `TemporaryStorage`.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'p> {
    pool: &'p SpriteGroupPool,
    max_depth: usize,
    reset: ResetPolicy,
}

impl<'p> Evaluator<'p> {
    /// Evaluator with the default nesting limit that leaves registers alone.
    pub fn new(pool: &'p SpriteGroupPool) -> Self {
        Self { pool, max_depth: DEFAULT_MAX_DEPTH, reset: ResetPolicy::Manual }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.max(1);
        self
    }

    /// Choose whether registers are cleared at the start of every resolution.
    pub fn with_reset_policy(mut self, reset: ResetPolicy) -> Self {
        self.reset = reset;
        self
    }

    pub fn pool(&self) -> &'p SpriteGroupPool {
        self.pool
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn reset_policy(&self) -> ResetPolicy {
        self.reset
    }

    /// Resolve `root`, mapping every error to `ResolverResult::Failed`.
    pub fn resolve<R: Resolver>(
        &self,
        root: NodeRef,
        object: &mut ResolverObject<'_, R>,
    ) -> ResolverResult {
        match self.try_resolve(root, object) {
            Ok(result) => result,
            Err(err @ ResolveError::InvalidReference(_)) => {
                debug!(root = %root, error = %err, "resolution failed");
                ResolverResult::Failed
            }
            Err(err @ ResolveError::RecursionTooDeep { .. }) => {
                warn!(root = %root, error = %err, "resolution aborted");
                ResolverResult::Failed
            }
            Err(err) => {
                error!(root = %root, error = %err, "resolution aborted");
                ResolverResult::Failed
            }
        }
    }

    /// Resolve `root`, reporting why it failed.
    pub fn try_resolve<R: Resolver>(
        &self,
        root: NodeRef,
        object: &mut ResolverObject<'_, R>,
    ) -> Result<ResolverResult, ResolveError> {
        self.reset.apply(object.temp);
        trace!(
            root = %root,
            feature = %object.provider.feature(),
            callback = %object.callback,
            "resolving"
        );
        self.resolve_node(root, object, 0)
    }

    /// Resolve a callback: the computed value or the value of a reached
    /// callback node, otherwise `CALLBACK_FAILED`.
    pub fn resolve_callback<R: Resolver>(
        &self,
        root: NodeRef,
        object: &mut ResolverObject<'_, R>,
    ) -> u16 {
        let result = self.resolve(root, object);
        self.callback_value(result).unwrap_or(CALLBACK_FAILED)
    }

    /// Resolve to a sprite set.
    pub fn resolve_sprite<R: Resolver>(
        &self,
        root: NodeRef,
        object: &mut ResolverObject<'_, R>,
    ) -> Option<ResultGroup> {
        match self.terminal(self.resolve(root, object))? {
            SpriteGroup::Result(result) => Some(*result),
            _ => None,
        }
    }

    /// Resolve to a tile layout.
    pub fn resolve_tile_layout<R: Resolver>(
        &self,
        root: NodeRef,
        object: &mut ResolverObject<'_, R>,
    ) -> Option<&'p TileLayoutGroup> {
        match self.terminal(self.resolve(root, object))? {
            SpriteGroup::TileLayout(layout) => Some(layout),
            _ => None,
        }
    }

    /// Resolve to an industry production step.
    pub fn resolve_production<R: Resolver>(
        &self,
        root: NodeRef,
        object: &mut ResolverObject<'_, R>,
    ) -> Option<&'p IndustryProductionGroup> {
        match self.terminal(self.resolve(root, object))? {
            SpriteGroup::IndustryProduction(production) => Some(production),
            _ => None,
        }
    }

    fn terminal(&self, result: ResolverResult) -> Option<&'p SpriteGroup> {
        result.group().and_then(|node| self.pool.get(node).ok())
    }

    fn callback_value(&self, result: ResolverResult) -> Option<u16> {
        match result {
            ResolverResult::Callback(value) => Some(value),
            ResolverResult::Group(_) => match self.terminal(result)? {
                SpriteGroup::Callback(callback) => Some(callback.value()),
                _ => None,
            },
            ResolverResult::Failed => None,
        }
    }

    fn resolve_node<R: Resolver>(
        &self,
        node: NodeRef,
        object: &mut ResolverObject<'_, R>,
        depth: usize,
    ) -> Result<ResolverResult, ResolveError> {
        if depth >= self.max_depth {
            return Err(ResolveError::RecursionTooDeep { node, limit: self.max_depth });
        }
        let group = self.pool.get(node).map_err(|_| ResolveError::InvalidReference(node))?;

        match group {
            SpriteGroup::Real(real) => match object.provider.resolve_real(real) {
                Some(next) => self.resolve_node(next, object, depth + 1),
                None => {
                    trace!(node = %node, "real group has no candidate");
                    Ok(ResolverResult::Failed)
                }
            },
            SpriteGroup::Deterministic(det) => self.resolve_deterministic(det, object, depth),
            SpriteGroup::Randomized(rnd) => self.resolve_randomized(rnd, object, depth),
            _ => Ok(ResolverResult::Group(node)),
        }
    }

    fn resolve_deterministic<R: Resolver>(
        &self,
        det: &'p DeterministicGroup,
        object: &mut ResolverObject<'_, R>,
        depth: usize,
    ) -> Result<ResolverResult, ResolveError> {
        let mut last = 0u32;

        for adjust in &det.adjusts {
            let raw = match adjust.variable {
                VAR_PROCEDURE => Some(self.call_procedure(adjust, object, depth)?),
                VAR_INDIRECT => read_variable(object, det.scope, det.count, adjust.parameter, last)?,
                variable => {
                    read_variable(object, det.scope, det.count, variable, adjust.parameter as u32)?
                }
            };

            let Some(raw) = raw else {
                debug!(
                    variable = format_args!("0x{:02X}", adjust.variable),
                    parameter = adjust.parameter,
                    scope = %det.scope,
                    "variable unavailable, using default group"
                );
                return match det.default {
                    Some(default) => self.resolve_node(default, object, depth + 1),
                    None => Ok(ResolverResult::Failed),
                };
            };

            let outcome = eval_adjust(adjust, det.size, last, raw);
            if let Some(effect) = outcome.store {
                self.apply_store(effect, det, object)?;
            }
            last = outcome.value;
        }

        object.last_value = last;

        if det.is_calculated() {
            let value = if last == CALLBACK_FAILED as u32 { CALLBACK_FAILED } else { (last & 0x7FFF) as u16 };
            return Ok(ResolverResult::Callback(value));
        }

        match det.select(last) {
            Some(next) => self.resolve_node(next, object, depth + 1),
            None => Ok(ResolverResult::Failed),
        }
    }

    /// Value of a variable 0x7E operand: the subroutine's callback value, or
    /// `CALLBACK_FAILED` when it yields none.
    fn call_procedure<R: Resolver>(
        &self,
        adjust: &Adjust,
        object: &mut ResolverObject<'_, R>,
        depth: usize,
    ) -> Result<u32, ResolveError> {
        let Some(subroutine) = adjust.subroutine else {
            return Ok(CALLBACK_FAILED as u32);
        };
        let result = match self.resolve_node(subroutine, object, depth + 1) {
            Ok(result) => result,
            Err(ResolveError::InvalidReference(node)) => {
                debug!(node = %node, "procedure call into invalid reference");
                ResolverResult::Failed
            }
            Err(err) => return Err(err),
        };
        Ok(self.callback_value(result).unwrap_or(CALLBACK_FAILED) as u32)
    }

    fn apply_store<R: Resolver>(
        &self,
        effect: StoreEffect,
        det: &DeterministicGroup,
        object: &mut ResolverObject<'_, R>,
    ) -> Result<(), StorageError> {
        match effect {
            StoreEffect::Register { index, value } => object.temp.try_set(index, value),
            StoreEffect::Persistent { index, value } => object
                .provider
                .scope(det.scope, det.count, object.temp)
                .store_persistent(index, value),
        }
    }

    fn resolve_randomized<R: Resolver>(
        &self,
        rnd: &'p RandomizedGroup,
        object: &mut ResolverObject<'_, R>,
        depth: usize,
    ) -> Result<ResolverResult, ResolveError> {
        if object.callback == CallbackId::RANDOM_TRIGGER {
            if let Some(matched) = rnd.matched_triggers(object.waiting_triggers()) {
                object.add_used_triggers(matched);
                object.reseed[rnd.scope.index()] |= rnd.mask();
            }
        }

        let bits = object.provider.scope(rnd.scope, rnd.count, object.temp).random_bits();
        let next = rnd.select(bits);
        trace!(scope = %rnd.scope, bits, index = rnd.index(bits), "randomized choice");
        self.resolve_node(next, object, depth + 1)
    }
}
