//! Structural checks of a built sprite group pool.

use std::collections::VecDeque;
use std::fmt;

use crate::group::SpriteGroup;
use crate::pool::{NodeRef, SpriteGroupPool};

use super::format_path;

/// Severity of a graph issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// What is wrong with the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The root is not a group of the pool
    InvalidRoot(NodeRef),
    /// A group links to a group that was never allocated
    DanglingReference { from: NodeRef, to: NodeRef },
    /// Groups that reach themselves; the first group is repeated at the end
    Cycle(Vec<NodeRef>),
    /// No path from the root reaches the group
    Unreachable(NodeRef),
    /// A branching group with nothing to branch to
    NeverSelects(NodeRef),
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            IssueKind::InvalidRoot(_) | IssueKind::DanglingReference { .. } | IssueKind::Cycle(_) => {
                Severity::Error
            }
            IssueKind::Unreachable(_) | IssueKind::NeverSelects(_) => Severity::Warning,
        }
    }

    /// Short machine-readable name
    pub fn code(&self) -> &'static str {
        match self {
            IssueKind::InvalidRoot(_) => "invalid_root",
            IssueKind::DanglingReference { .. } => "dangling_reference",
            IssueKind::Cycle(_) => "cycle",
            IssueKind::Unreachable(_) => "unreachable",
            IssueKind::NeverSelects(_) => "never_selects",
        }
    }
}

/// An issue found by `check_graph`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphIssue {
    pub severity: Severity,
    pub kind: IssueKind,
}

impl From<IssueKind> for GraphIssue {
    fn from(kind: IssueKind) -> Self {
        Self { severity: kind.severity(), kind }
    }
}

impl fmt::Display for GraphIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::InvalidRoot(node) => write!(f, "root {} is not a group", node),
            IssueKind::DanglingReference { from, to } => {
                write!(f, "group {} references missing group {}", from, to)
            }
            IssueKind::Cycle(path) => write!(f, "cycle through groups {}", format_path(path)),
            IssueKind::Unreachable(node) => write!(f, "group {} is unreachable from the root", node),
            IssueKind::NeverSelects(node) => {
                write!(f, "group {} has no target and always fails", node)
            }
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    New,
    Active,
    Done,
}

/// Check references, cycles and reachability of every group in `pool`.
///
/// Errors come first in pool order, followed by warnings.
pub fn check_graph(pool: &SpriteGroupPool, root: NodeRef) -> Vec<GraphIssue> {
    let mut issues: Vec<GraphIssue> = Vec::new();

    if !pool.contains(root) {
        issues.push(IssueKind::InvalidRoot(root).into());
    }

    let children: Vec<Vec<NodeRef>> = pool.iter().map(|(_, group)| group.children()).collect();

    for (index, targets) in children.iter().enumerate() {
        let from = NodeRef(index as u32);
        let mut reported = Vec::new();
        for &to in targets {
            if !pool.contains(to) && !reported.contains(&to) {
                reported.push(to);
                issues.push(IssueKind::DanglingReference { from, to }.into());
            }
        }
    }

    for cycle in find_cycles(&children) {
        issues.push(IssueKind::Cycle(cycle).into());
    }

    if pool.contains(root) {
        let reachable = reachable_from(&children, root);
        for (index, seen) in reachable.iter().enumerate() {
            if !seen {
                issues.push(IssueKind::Unreachable(NodeRef(index as u32)).into());
            }
        }
    }

    for (node, group) in pool.iter() {
        let never = match group {
            SpriteGroup::Real(real) => real.is_empty(),
            SpriteGroup::Deterministic(det) => {
                !det.is_calculated() && det.ranges().is_empty() && det.default.is_none()
            }
            _ => false,
        };
        if never {
            issues.push(IssueKind::NeverSelects(node).into());
        }
    }

    issues.sort_by_key(|issue| issue.severity == Severity::Warning);
    issues
}

/// Every cycle closed by a back edge of a depth-first walk over all groups.
fn find_cycles(children: &[Vec<NodeRef>]) -> Vec<Vec<NodeRef>> {
    let mut marks = vec![Mark::New; children.len()];
    let mut cycles = Vec::new();

    for start in 0..children.len() {
        if marks[start] != Mark::New {
            continue;
        }
        // (node, next child position)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        marks[start] = Mark::Active;

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let Some(child) = children[node].get(top.1).copied() else {
                marks[node] = Mark::Done;
                stack.pop();
                continue;
            };
            top.1 += 1;

            let child_index = child.index();
            match marks.get(child_index) {
                Some(Mark::New) => {
                    marks[child_index] = Mark::Active;
                    stack.push((child_index, 0));
                }
                Some(Mark::Active) => {
                    let from = stack.iter().position(|&(n, _)| n == child_index).unwrap_or(0);
                    let mut path: Vec<NodeRef> =
                        stack[from..].iter().map(|&(n, _)| NodeRef(n as u32)).collect();
                    path.push(child);
                    cycles.push(path);
                }
                // Finished groups and dangling references.
                _ => {}
            }
        }
    }

    cycles
}

fn reachable_from(children: &[Vec<NodeRef>], root: NodeRef) -> Vec<bool> {
    let mut seen = vec![false; children.len()];
    let mut queue = VecDeque::from([root.index()]);
    seen[root.index()] = true;

    while let Some(node) = queue.pop_front() {
        for child in &children[node] {
            if let Some(flag) = seen.get_mut(child.index()) {
                if !*flag {
                    *flag = true;
                    queue.push_back(child.index());
                }
            }
        }
    }

    seen
}
