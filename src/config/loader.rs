//! Discovery and loading of `sgr.toml`
//!
//! A project file found by walking up from the working directory wins over
//! the user file under `$XDG_CONFIG_HOME/spritegroup/`. Without either, the
//! defaults apply.

use super::schema::SgrConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "sgr.toml";

/// Directory under the XDG config home holding the user file
const XDG_APP_DIR: &str = "spritegroup";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse sgr.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Every problem `SgrConfig::validate` found
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// Command-line flags that take precedence over the file
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub max_depth: Option<usize>,
}

/// Locate the config file for the current working directory.
pub fn find_config() -> Option<PathBuf> {
    env::current_dir().ok().and_then(find_config_from).or_else(find_xdg_config)
}

/// `$XDG_CONFIG_HOME/spritegroup/sgr.toml`, falling back to `~/.config`.
pub fn find_xdg_config() -> Option<PathBuf> {
    let base = match env::var_os("XDG_CONFIG_HOME") {
        Some(dir) => PathBuf::from(dir),
        None => PathBuf::from(env::var_os("HOME")?).join(".config"),
    };
    let path = base.join(XDG_APP_DIR).join(CONFIG_FILE_NAME);
    path.is_file().then_some(path)
}

/// Nearest `sgr.toml` in `start` or one of its ancestors.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    start.ancestors().map(|dir| dir.join(CONFIG_FILE_NAME)).find(|path| path.is_file())
}

/// Load the config at `path`, or the discovered one when `path` is `None`.
///
/// An explicit path that does not exist is an error; finding nothing during
/// discovery is not.
///
/// ```ignore
/// let config = load_config(None)?;
/// let evaluator = config.engine.evaluator(&pool);
/// ```
pub fn load_config(path: Option<&Path>) -> Result<SgrConfig, ConfigError> {
    let Some(path) = path.map(Path::to_path_buf).or_else(find_config) else {
        debug!("no {} found, using defaults", CONFIG_FILE_NAME);
        return Ok(SgrConfig::default());
    };
    let config = read_config(&path)?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

fn read_config(path: &Path) -> Result<SgrConfig, ConfigError> {
    let config: SgrConfig = toml::from_str(&fs::read_to_string(path)?)?;
    let errors = config.validate();
    if errors.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation(errors.iter().map(ToString::to_string).collect()))
    }
}

/// Apply command-line overrides on top of a loaded config.
pub fn merge_cli_overrides(config: &mut SgrConfig, overrides: &CliOverrides) {
    if let Some(max_depth) = overrides.max_depth {
        config.engine.max_recursion_depth = max_depth;
    }
}
