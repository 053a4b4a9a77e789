//! Configuration schema types for `sgr.toml`
//!
//! Defines the structure and validation rules for the resolver settings.

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use crate::eval::{Evaluator, DEFAULT_MAX_DEPTH};
use crate::pool::{SpriteGroupPool, MAX_POOL_CAPACITY};
use crate::storage::{ResetPolicy, DEFAULT_PERSISTENT_SLOTS};

/// Deepest recursion a configuration may allow
pub const MAX_RECURSION_LIMIT: usize = 1024;

/// Largest persistent array a configuration may ask for
pub const MAX_PERSISTENT_SLOTS: usize = 256;

/// Evaluation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Nesting depth after which a resolution fails
    #[serde(default = "default_max_depth")]
    pub max_recursion_depth: usize,
    /// Whether registers are cleared before each resolution
    #[serde(default)]
    pub register_reset: ResetPolicy,
    /// Most nodes a loaded graph may hold
    #[serde(default = "default_pool_capacity")]
    pub pool_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: default_max_depth(),
            register_reset: ResetPolicy::default(),
            pool_capacity: default_pool_capacity(),
        }
    }
}

impl EngineConfig {
    /// Evaluator over `pool` with these settings.
    pub fn evaluator<'p>(&self, pool: &'p SpriteGroupPool) -> Evaluator<'p> {
        Evaluator::new(pool)
            .with_max_depth(self.max_recursion_depth)
            .with_reset_policy(self.register_reset)
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_pool_capacity() -> usize {
    MAX_POOL_CAPACITY
}

/// Persistent storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Slots of the persistent array given to resolved objects
    #[serde(default = "default_persistent_slots")]
    pub persistent_slots: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { persistent_slots: default_persistent_slots() }
    }
}

fn default_persistent_slots() -> usize {
    DEFAULT_PERSISTENT_SLOTS
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directives, used when `RUST_LOG` is unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// Root `sgr.toml` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SgrConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "engine.max_recursion_depth")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sgr.toml: '{}' {}", self.field, self.message)
    }
}

impl SgrConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        let depth = self.engine.max_recursion_depth;
        if !(1..=MAX_RECURSION_LIMIT).contains(&depth) {
            errors.push(ConfigValidationError {
                field: "engine.max_recursion_depth".to_string(),
                message: format!("must be between 1 and {}", MAX_RECURSION_LIMIT),
            });
        }

        let capacity = self.engine.pool_capacity;
        if !(1..=MAX_POOL_CAPACITY).contains(&capacity) {
            errors.push(ConfigValidationError {
                field: "engine.pool_capacity".to_string(),
                message: format!("must be between 1 and {}", MAX_POOL_CAPACITY),
            });
        }

        let slots = self.storage.persistent_slots;
        if !(1..=MAX_PERSISTENT_SLOTS).contains(&slots) {
            errors.push(ConfigValidationError {
                field: "storage.persistent_slots".to_string(),
                message: format!("must be between 1 and {}", MAX_PERSISTENT_SLOTS),
            });
        }

        if let Some(filter) = &self.logging.filter {
            if let Err(e) = EnvFilter::try_new(filter) {
                errors.push(ConfigValidationError {
                    field: "logging.filter".to_string(),
                    message: format!("is not a valid filter: {}", e),
                });
            }
        }

        errors
    }
}
