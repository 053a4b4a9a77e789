//! Real groups (loading-stage sprite sets).

use crate::pool::NodeRef;

/// Group with two candidate lists selected by load progress.
///
/// For vehicles `loaded` is used while moving and `loading` while at a
/// station. For stations `loaded` covers small cargo amounts and `loading`
/// large ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RealGroup {
    pub loaded: Vec<NodeRef>,
    pub loading: Vec<NodeRef>,
}

impl RealGroup {
    pub fn new(loaded: Vec<NodeRef>, loading: Vec<NodeRef>) -> Self {
        Self { loaded, loading }
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.loading.is_empty()
    }

    /// First loaded group, else first loading group.
    pub fn first_loaded(&self) -> Option<NodeRef> {
        self.loaded.first().or_else(|| self.loading.first()).copied()
    }

    /// First loading group, else first loaded group.
    pub fn first_loading(&self) -> Option<NodeRef> {
        self.loading.first().or_else(|| self.loaded.first()).copied()
    }
}
