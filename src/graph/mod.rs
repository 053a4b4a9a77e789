//! JSON sprite group documents.
//!
//! A document lists the groups of one data file in allocation order, so the
//! position of a group in `groups` is its `NodeRef`:
//!
//! ```json
//! {
//!   "grf": { "grfid": 1, "params": [5] },
//!   "root": 1,
//!   "groups": [
//!     { "type": "result", "sprite": 100 },
//!     { "type": "deterministic", "size": "byte",
//!       "adjusts": [{ "variable": 69 }],
//!       "ranges": [{ "low": 0, "high": 0, "group": 0 }] }
//!   ]
//! }
//! ```
//!
//! Loading checks references and cycles; `check_graph` reports every issue
//! for the `validate` command.

mod check;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::group::{
    Adjust, CallbackResultGroup, DeterministicGroup, GroupError, GroupRange, GroupSize,
    IndustryProductionGroup, ProductionInput, ProductionOutput, RandomizedGroup, RealGroup,
    ResultGroup, SpriteGroup, SpriteLayout, TileLayoutGroup, TriggerMode, VarScope,
};
use crate::pool::{NodeRef, PoolError, SpriteGroupPool, MAX_POOL_CAPACITY};
use crate::resolver::GrfFile;

pub use check::{check_graph, GraphIssue, IssueKind, Severity};

/// Error loading a graph document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GraphError {
    #[error("failed to read graph: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse graph: {0}")]
    Json(#[from] serde_json::Error),
    /// A group's fields do not form a valid group
    #[error("group {node}: {source}")]
    Group {
        node: NodeRef,
        #[source]
        source: GroupError,
    },
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("document has no groups")]
    Empty,
    #[error("root {0} is not a group of the document")]
    InvalidRoot(NodeRef),
    #[error("group {from} references missing group {to}")]
    DanglingReference { from: NodeRef, to: NodeRef },
    #[error("cycle through groups {}", format_path(.0))]
    Cycle(Vec<NodeRef>),
}

pub(crate) fn format_path(path: &[NodeRef]) -> String {
    path.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(" -> ")
}

/// One group as written in a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GroupDef {
    Real {
        #[serde(default)]
        loaded: Vec<NodeRef>,
        #[serde(default)]
        loading: Vec<NodeRef>,
    },
    Deterministic {
        #[serde(default)]
        scope: VarScope,
        #[serde(default)]
        size: GroupSize,
        #[serde(default)]
        count: u8,
        adjusts: Vec<Adjust>,
        #[serde(default)]
        ranges: Vec<GroupRange>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        default: Option<NodeRef>,
        /// Return the accumulator as a callback result instead of branching
        #[serde(default)]
        calculated: bool,
    },
    Randomized {
        #[serde(default)]
        scope: VarScope,
        #[serde(default)]
        mode: TriggerMode,
        #[serde(default)]
        triggers: u8,
        #[serde(default)]
        lowest_randbit: u8,
        #[serde(default)]
        count: u8,
        groups: Vec<NodeRef>,
    },
    Callback {
        value: u16,
    },
    Result {
        sprite: u32,
        #[serde(default = "one")]
        num_sprites: u8,
    },
    TileLayout {
        layout: SpriteLayout,
        #[serde(default)]
        num_sprites: u8,
    },
    IndustryProduction {
        #[serde(default)]
        version: u8,
        #[serde(default)]
        inputs: Vec<ProductionInput>,
        #[serde(default)]
        outputs: Vec<ProductionOutput>,
        #[serde(default)]
        again: u8,
    },
}

fn one() -> u8 {
    1
}

impl GroupDef {
    /// Build the pool group; callback values are read with the rules of
    /// `grf_version`.
    pub fn to_group(&self, grf_version: u8) -> Result<SpriteGroup, GroupError> {
        let group = match self {
            GroupDef::Real { loaded, loading } => {
                RealGroup::new(loaded.clone(), loading.clone()).into()
            }
            GroupDef::Deterministic { scope, size, count, adjusts, ranges, default, calculated } => {
                let group = if *calculated {
                    DeterministicGroup::calculated(*scope, *size, adjusts.clone())
                } else {
                    DeterministicGroup::new(*scope, *size, adjusts.clone(), ranges.clone(), *default)
                };
                group.with_count(*count).into()
            }
            GroupDef::Randomized { scope, mode, triggers, lowest_randbit, count, groups } => {
                RandomizedGroup::new(*scope, *mode, *triggers, *lowest_randbit, groups.clone())?
                    .with_count(*count)
                    .into()
            }
            GroupDef::Callback { value } => {
                CallbackResultGroup::with_grf_version(*value, grf_version).into()
            }
            GroupDef::Result { sprite, num_sprites } => {
                ResultGroup::new(*sprite, *num_sprites).into()
            }
            GroupDef::TileLayout { layout, num_sprites } => {
                TileLayoutGroup::new(layout.clone(), *num_sprites).into()
            }
            GroupDef::IndustryProduction { version, inputs, outputs, again } => {
                IndustryProductionGroup::new(*version, inputs.clone(), outputs.clone(), *again)?
                    .into()
            }
        };
        Ok(group)
    }
}

/// Parsed document, before any group is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub grf: GrfFile,
    /// Group resolved by default; the last group when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<NodeRef>,
    pub groups: Vec<GroupDef>,
}

impl GraphDocument {
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read(path: &Path) -> Result<Self, GraphError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Root group, defaulting to the last group of the document.
    pub fn root(&self) -> Option<NodeRef> {
        self.root.or_else(|| self.groups.len().checked_sub(1).map(|last| NodeRef(last as u32)))
    }

    /// Allocate every group into a fresh pool without checking references.
    pub fn build_pool(&self, capacity: usize) -> Result<SpriteGroupPool, GraphError> {
        let mut pool = SpriteGroupPool::with_capacity(capacity);
        for (index, def) in self.groups.iter().enumerate() {
            let node = NodeRef(index as u32);
            let group = def
                .to_group(self.grf.grf_version)
                .map_err(|source| GraphError::Group { node, source })?;
            pool.allocate(group)?;
        }
        Ok(pool)
    }
}

/// A loaded graph: checked pool plus the data file and root it came with.
#[derive(Debug, Clone)]
pub struct Graph {
    pub grf: GrfFile,
    pub root: NodeRef,
    pub pool: SpriteGroupPool,
}

impl Graph {
    /// Build and check a document. Unreachable groups are allowed; missing
    /// references and cycles are not.
    pub fn from_document(document: &GraphDocument, capacity: usize) -> Result<Self, GraphError> {
        let root = document.root().ok_or(GraphError::Empty)?;
        let pool = document.build_pool(capacity)?;

        for issue in check_graph(&pool, root) {
            match issue.kind {
                IssueKind::InvalidRoot(node) => return Err(GraphError::InvalidRoot(node)),
                IssueKind::DanglingReference { from, to } => {
                    return Err(GraphError::DanglingReference { from, to })
                }
                IssueKind::Cycle(path) => return Err(GraphError::Cycle(path)),
                _ => debug!(issue = %issue, "graph warning"),
            }
        }

        debug!(groups = pool.len(), root = %root, grf = %document.grf, "graph loaded");
        Ok(Self { grf: document.grf.clone(), root, pool })
    }

    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        Self::from_document(&GraphDocument::from_json(json)?, MAX_POOL_CAPACITY)
    }

    pub fn load(path: &Path, capacity: usize) -> Result<Self, GraphError> {
        Self::from_document(&GraphDocument::read(path)?, capacity)
    }
}
