//! Arena owning every sprite group.
//!
//! Groups are allocated once while data files load and referenced afterwards
//! through `NodeRef` indices. Child links inside groups are `NodeRef`s too, so
//! the graph has no ownership cycles and can be shared read-only between
//! threads while it is being resolved.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::group::{CallbackResultGroup, SpriteGroup};

/// Upper bound on the number of groups a pool may hold.
pub const MAX_POOL_CAPACITY: usize = 1 << 30;

/// Stable reference to a group inside a `SpriteGroupPool`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeRef(pub u32);

impl NodeRef {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for NodeRef {
    fn from(index: u32) -> Self {
        NodeRef(index)
    }
}

/// Error from pool allocation or lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Capacity reached while loading data
    #[error("sprite group pool exhausted (capacity {capacity})")]
    Exhausted { capacity: usize },
    /// Reference does not name an allocated group
    #[error("invalid sprite group reference {0}")]
    InvalidReference(NodeRef),
}

/// Arena of sprite groups addressed by `NodeRef`.
#[derive(Debug, Clone)]
pub struct SpriteGroupPool {
    groups: Vec<SpriteGroup>,
    capacity: usize,
    callback_cache: BTreeMap<u16, NodeRef>,
}

impl Default for SpriteGroupPool {
    fn default() -> Self {
        Self::new()
    }
}

impl SpriteGroupPool {
    /// Create an empty pool with the maximum capacity.
    pub fn new() -> Self {
        Self::with_capacity(MAX_POOL_CAPACITY)
    }

    /// Create an empty pool that refuses allocations past `capacity` groups.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            groups: Vec::new(),
            capacity: capacity.min(MAX_POOL_CAPACITY),
            callback_cache: BTreeMap::new(),
        }
    }

    /// Store a group and return its reference.
    pub fn allocate(&mut self, group: SpriteGroup) -> Result<NodeRef, PoolError> {
        if self.groups.len() >= self.capacity {
            return Err(PoolError::Exhausted { capacity: self.capacity });
        }
        let node = NodeRef(self.groups.len() as u32);
        self.groups.push(group);
        Ok(node)
    }

    /// Look up a group.
    pub fn get(&self, node: NodeRef) -> Result<&SpriteGroup, PoolError> {
        self.groups.get(node.index()).ok_or(PoolError::InvalidReference(node))
    }

    /// True when `node` names an allocated group.
    pub fn contains(&self, node: NodeRef) -> bool {
        node.index() < self.groups.len()
    }

    /// Reference to the shared callback-result group for a raw data-file
    /// value, allocating it on first use.
    ///
    /// The raw value is normalised first, so `0xFF42` and `0x8042` share one
    /// group.
    pub fn callback_result(&mut self, raw: u16) -> Result<NodeRef, PoolError> {
        let group = CallbackResultGroup::new(raw);
        if let Some(node) = self.callback_cache.get(&group.value()) {
            return Ok(*node);
        }
        let node = self.allocate(SpriteGroup::Callback(group))?;
        self.callback_cache.insert(group.value(), node);
        Ok(node)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Iterate over every group with its reference, in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeRef, &SpriteGroup)> {
        self.groups.iter().enumerate().map(|(i, g)| (NodeRef(i as u32), g))
    }

    /// Drop every group; references handed out before become invalid.
    pub fn clear(&mut self) {
        self.groups.clear();
        self.callback_cache.clear();
    }
}
