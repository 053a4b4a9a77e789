//! `sgr.toml` discovery and loading.
//!
//! Tests that touch the working directory or `XDG_CONFIG_HOME` run serially.

use std::env;
use std::fs;
use std::path::Path;

use serial_test::serial;
use spritegroup::config::{find_config, load_config, ConfigError, SgrConfig, CONFIG_FILE_NAME};
use spritegroup::pool::SpriteGroupPool;
use spritegroup::storage::ResetPolicy;
use tempfile::TempDir;

/// Run `f` with the working directory and `XDG_CONFIG_HOME` pointed at
/// `cwd` and `xdg`, restoring both afterwards.
fn with_env<T>(cwd: &Path, xdg: &Path, f: impl FnOnce() -> T) -> T {
    let original_dir = env::current_dir().unwrap();
    let original_xdg = env::var_os("XDG_CONFIG_HOME");
    env::set_current_dir(cwd).unwrap();
    env::set_var("XDG_CONFIG_HOME", xdg);

    let result = f();

    env::set_current_dir(original_dir).unwrap();
    match original_xdg {
        Some(value) => env::set_var("XDG_CONFIG_HOME", value),
        None => env::remove_var("XDG_CONFIG_HOME"),
    }
    result
}

#[test]
#[serial]
fn test_project_config_found_from_subdirectory() {
    let project = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    fs::write(project.path().join(CONFIG_FILE_NAME), "[engine]\nmax_recursion_depth = 9\n")
        .unwrap();
    let graphs = project.path().join("graphs");
    fs::create_dir_all(&graphs).unwrap();

    let config = with_env(&graphs, xdg.path(), || load_config(None)).unwrap();
    assert_eq!(config.engine.max_recursion_depth, 9);
}

#[test]
#[serial]
fn test_xdg_config_used_without_project_config() {
    let project = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    let dir = xdg.path().join("spritegroup");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(CONFIG_FILE_NAME), "[engine]\nregister_reset = \"manual\"\n").unwrap();

    let (found, config) =
        with_env(project.path(), xdg.path(), || (find_config(), load_config(None)));
    assert_eq!(found, Some(dir.join(CONFIG_FILE_NAME)));
    assert_eq!(config.unwrap().engine.register_reset, ResetPolicy::Manual);
}

#[test]
#[serial]
fn test_project_config_wins_over_xdg() {
    let project = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();
    let dir = xdg.path().join("spritegroup");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(CONFIG_FILE_NAME), "[storage]\npersistent_slots = 8\n").unwrap();
    fs::write(project.path().join(CONFIG_FILE_NAME), "[storage]\npersistent_slots = 32\n")
        .unwrap();

    let config = with_env(project.path(), xdg.path(), || load_config(None)).unwrap();
    assert_eq!(config.storage.persistent_slots, 32);
}

#[test]
#[serial]
fn test_defaults_without_any_config() {
    let project = TempDir::new().unwrap();
    let xdg = TempDir::new().unwrap();

    let config = with_env(project.path(), xdg.path(), || load_config(None)).unwrap();
    assert_eq!(config, SgrConfig::default());
}

#[test]
fn test_config_drives_evaluator() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        "[engine]\nmax_recursion_depth = 4\nregister_reset = \"per-resolve\"\n\n[logging]\nfilter = \"spritegroup=debug\"\n",
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.logging.filter.as_deref(), Some("spritegroup=debug"));

    let pool = SpriteGroupPool::new();
    let evaluator = config.engine.evaluator(&pool);
    assert_eq!(evaluator.max_depth(), 4);
    assert_eq!(evaluator.reset_policy(), ResetPolicy::PerResolve);
}

#[test]
fn test_invalid_config_lists_every_problem() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join(CONFIG_FILE_NAME);
    fs::write(
        &path,
        "[engine]\nmax_recursion_depth = 5000\n\n[storage]\npersistent_slots = 0\n",
    )
    .unwrap();

    match load_config(Some(&path)) {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 2, "{:?}", errors);
            assert!(errors[0].contains("engine.max_recursion_depth"));
            assert!(errors[1].contains("storage.persistent_slots"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}
