//! Data file a sprite group graph was loaded from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity and parameters of the data file owning a graph.
///
/// Parameters are readable through variable 0x7F; persistent storage of
/// towns is keyed by `grfid`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrfFile {
    pub grfid: u32,
    #[serde(default = "default_version")]
    pub grf_version: u8,
    #[serde(default)]
    pub params: Vec<u32>,
}

fn default_version() -> u8 {
    8
}

impl GrfFile {
    pub fn new(grfid: u32) -> Self {
        Self { grfid, grf_version: default_version(), params: Vec::new() }
    }

    pub fn with_params(mut self, params: Vec<u32>) -> Self {
        self.params = params;
        self
    }

    /// Parameter `index`, 0 when the file does not set it.
    pub fn param(&self, index: u32) -> u32 {
        self.params.get(index as usize).copied().unwrap_or(0)
    }
}

impl fmt::Display for GrfFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Stored little-endian; printed the way data files write them.
        write!(f, "{:08X}", self.grfid.swap_bytes())
    }
}
