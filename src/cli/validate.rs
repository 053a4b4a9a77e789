//! Validate command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::SgrConfig;
use crate::graph::{check_graph, GraphDocument, GraphError, Severity};

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// Execute the validate command
pub fn run_validate(path: &Path, strict: bool, config: &SgrConfig) -> ExitCode {
    let document = match GraphDocument::read(path) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("ERROR: {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let Some(root) = document.root() else {
        eprintln!("ERROR: {}: {}", path.display(), GraphError::Empty);
        return ExitCode::from(EXIT_ERROR);
    };
    let pool = match document.build_pool(config.engine.pool_capacity) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("ERROR: {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    let issues = check_graph(&pool, root);
    let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();
    let warnings = issues.len() - errors;

    for issue in &issues {
        println!("{}: {} [{}]", issue.severity, issue, issue.kind.code());
    }

    if issues.is_empty() {
        println!("OK: {} ({} groups, root {})", path.display(), pool.len(), root);
    } else {
        println!("{}: {} error(s), {} warning(s)", path.display(), errors, warnings);
    }

    if errors > 0 || (strict && warnings > 0) {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
