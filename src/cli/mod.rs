//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod inspect;
mod resolve;
mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::config::{load_config, merge_cli_overrides, CliOverrides, SgrConfig};
use crate::features::Feature;

/// Exit codes shared by every command
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Filter used when neither `RUST_LOG` nor the config sets one
const DEFAULT_LOG_FILTER: &str = "warn";

/// sgr - Inspect, validate and resolve sprite group graphs
#[derive(Parser)]
#[command(name = "sgr")]
#[command(about = "Inspect, validate and resolve sprite group graphs (.json)")]
#[command(version)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file to use instead of the discovered sgr.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override engine.max_recursion_depth
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..=1024))]
    pub max_depth: Option<u16>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the groups of a graph
    Inspect {
        /// Graph document
        graph: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a graph for missing references, cycles and unreachable groups
    Validate {
        /// Graph document
        graph: PathBuf,

        /// Strict mode: treat warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Resolve a graph against a table of variables
    Resolve {
        /// Graph document
        graph: PathBuf,

        /// Group to start from (default: the document's root)
        #[arg(long, value_parser = parse_number)]
        root: Option<u32>,

        /// Feature of the resolved object (e.g. objects, houses, stations)
        #[arg(long, default_value = "objects", value_parser = parse_feature)]
        feature: Feature,

        /// Variable of the object: VAR=VALUE or VAR:PARAM=VALUE (repeatable)
        #[arg(long = "var", value_parser = parse_variable)]
        vars: Vec<VariableArg>,

        /// Variable of the parent object, same syntax as --var
        #[arg(long = "parent-var", value_parser = parse_variable)]
        parent_vars: Vec<VariableArg>,

        /// Random bits of the object
        #[arg(long, default_value = "0", value_parser = parse_number)]
        random_bits: u32,

        /// Waiting random triggers of the object
        #[arg(long, default_value = "0", value_parser = parse_number)]
        triggers: u32,

        /// Callback to resolve (default: plain sprite lookup)
        #[arg(long, default_value = "0", value_parser = parse_number)]
        callback: u32,

        /// First callback parameter (variable 0x10)
        #[arg(long, default_value = "0", value_parser = parse_number)]
        param1: u32,

        /// Second callback parameter (variable 0x18)
        #[arg(long, default_value = "0", value_parser = parse_number)]
        param2: u32,

        /// Preset temporary register: INDEX=VALUE (repeatable)
        #[arg(long = "register", value_parser = parse_assignment)]
        registers: Vec<(u32, u32)>,

        /// Preset persistent storage slot: INDEX=VALUE (repeatable)
        #[arg(long = "persistent", value_parser = parse_assignment)]
        persistent: Vec<(u32, u32)>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// `--var` value: a variable, an optional parameter and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariableArg {
    pub variable: u8,
    pub parameter: Option<u32>,
    pub value: u32,
}

/// Parse a decimal or `0x`-prefixed hexadecimal number.
pub fn parse_number(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed.map_err(|e| format!("invalid number '{}': {}", s, e))
}

/// Parse `INDEX=VALUE`.
pub fn parse_assignment(s: &str) -> Result<(u32, u32), String> {
    let (index, value) =
        s.split_once('=').ok_or_else(|| format!("expected INDEX=VALUE, got '{}'", s))?;
    Ok((parse_number(index)?, parse_number(value)?))
}

/// Parse `VAR=VALUE` or `VAR:PARAM=VALUE`.
pub fn parse_variable(s: &str) -> Result<VariableArg, String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected VAR=VALUE, got '{}'", s))?;
    let (variable, parameter) = match key.split_once(':') {
        Some((variable, parameter)) => (variable, Some(parse_number(parameter)?)),
        None => (key, None),
    };
    let variable = parse_number(variable)?;
    let variable =
        u8::try_from(variable).map_err(|_| format!("variable {:#x} is not a byte", variable))?;
    Ok(VariableArg { variable, parameter, value: parse_number(value)? })
}

/// Parse a feature by name (`houses`) or data-file byte (`0x07`).
pub fn parse_feature(s: &str) -> Result<Feature, String> {
    let by_code = || parse_number(s).ok().and_then(|c| u8::try_from(c).ok()).and_then(Feature::from_code);
    (0u8..=0x11)
        .filter_map(Feature::from_code)
        .find(|feature| feature.name() == s)
        .or_else(by_code)
        .ok_or_else(|| format!("unknown feature '{}'", s))
}

/// Install the stderr log subscriber.
///
/// `-v` forces debug output; otherwise `RUST_LOG` wins over the config's
/// `[logging] filter`.
fn init_logging(config: &SgrConfig, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .ok()
            .or_else(|| config.logging.filter.as_deref().and_then(|f| EnvFilter::try_new(f).ok()))
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
    };
    // A subscriber may already be installed when run from tests.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

/// Entry point for the CLI
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };
    let overrides = CliOverrides { max_depth: cli.max_depth.map(usize::from) };
    merge_cli_overrides(&mut config, &overrides);
    init_logging(&config, cli.verbose);

    match cli.command {
        Commands::Inspect { graph, json } => inspect::run_inspect(&graph, json, &config),
        Commands::Validate { graph, strict } => validate::run_validate(&graph, strict, &config),
        Commands::Resolve {
            graph,
            root,
            feature,
            vars,
            parent_vars,
            random_bits,
            triggers,
            callback,
            param1,
            param2,
            registers,
            persistent,
            json,
        } => resolve::run_resolve(
            &graph,
            &resolve::ResolveArgs {
                root,
                feature,
                vars,
                parent_vars,
                random_bits,
                triggers,
                callback,
                param1,
                param2,
                registers,
                persistent,
                json,
            },
            &config,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Ok(42));
        assert_eq!(parse_number("0x45"), Ok(0x45));
        assert_eq!(parse_number("0XFF"), Ok(0xFF));
        assert!(parse_number("0xZZ").is_err());
        assert!(parse_number("-1").is_err());
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(parse_assignment("0x10=5"), Ok((0x10, 5)));
        assert!(parse_assignment("16").is_err());
    }

    #[test]
    fn test_parse_variable() {
        assert_eq!(
            parse_variable("0x45=0"),
            Ok(VariableArg { variable: 0x45, parameter: None, value: 0 })
        );
        assert_eq!(
            parse_variable("0x60:3=0x10"),
            Ok(VariableArg { variable: 0x60, parameter: Some(3), value: 0x10 })
        );
        assert!(parse_variable("0x145=1").is_err());
    }

    #[test]
    fn test_parse_feature() {
        assert_eq!(parse_feature("houses"), Ok(Feature::Houses));
        assert_eq!(parse_feature("0x04"), Ok(Feature::Stations));
        assert!(parse_feature("towns").is_err());
        assert!(parse_feature("boats").is_err());
    }

    #[test]
    fn test_resolve_arguments() {
        let cli = Cli::try_parse_from([
            "sgr",
            "resolve",
            "graph.json",
            "--var",
            "0x45=1",
            "--register",
            "0x10=7",
            "--callback",
            "0x1E",
            "--max-depth",
            "8",
        ])
        .unwrap();
        assert_eq!(cli.max_depth, Some(8));
        let Commands::Resolve { vars, registers, callback, feature, .. } = cli.command else {
            panic!("expected resolve command");
        };
        assert_eq!(vars.len(), 1);
        assert_eq!(registers, vec![(0x10, 7)]);
        assert_eq!(callback, 0x1E);
        assert_eq!(feature, Feature::Objects);
    }
}
