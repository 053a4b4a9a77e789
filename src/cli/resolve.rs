//! Resolve command implementation

use std::path::Path;
use std::process::ExitCode;

use tracing::debug;

use crate::config::SgrConfig;
use crate::eval::ResolverResult;
use crate::features::generic::{GenericResolver, GenericScope};
use crate::features::Feature;
use crate::graph::Graph;
use crate::pool::NodeRef;
use crate::resolver::{CallbackId, ResolverObject};
use crate::storage::{EntityRef, PersistentStorage, ResetPolicy, TemporaryStorage};

use super::inspect::describe;
use super::{VariableArg, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS};

/// Arguments of the resolve command
#[derive(Debug, Clone)]
pub struct ResolveArgs {
    pub root: Option<u32>,
    pub feature: Feature,
    pub vars: Vec<VariableArg>,
    pub parent_vars: Vec<VariableArg>,
    pub random_bits: u32,
    pub triggers: u32,
    pub callback: u32,
    pub param1: u32,
    pub param2: u32,
    pub registers: Vec<(u32, u32)>,
    pub persistent: Vec<(u32, u32)>,
    pub json: bool,
}

fn scope_with(vars: &[VariableArg]) -> GenericScope {
    vars.iter().fold(GenericScope::new(), |scope, var| match var.parameter {
        Some(parameter) => scope.with_parameterised(var.variable, parameter, var.value),
        None => scope.with_variable(var.variable, var.value),
    })
}

/// Execute the resolve command
///
/// Registers are reset according to `engine.register_reset` before the
/// `--register` presets are written, so presets always survive into the
/// resolution.
pub fn run_resolve(path: &Path, args: &ResolveArgs, config: &SgrConfig) -> ExitCode {
    let graph = match Graph::load(path, config.engine.pool_capacity) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Error: {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let root = args.root.map(NodeRef).unwrap_or(graph.root);
    if !graph.pool.contains(root) {
        eprintln!("Error: --root {} is not a group of {}", root, path.display());
        return ExitCode::from(EXIT_INVALID_ARGS);
    }
    let Ok(callback) = u16::try_from(args.callback) else {
        eprintln!("Error: --callback {:#x} does not fit in 16 bits", args.callback);
        return ExitCode::from(EXIT_INVALID_ARGS);
    };

    let owner = EntityRef::new(args.feature, 0);
    let mut storage =
        PersistentStorage::new(owner, graph.grf.grfid, config.storage.persistent_slots);
    for &(index, value) in &args.persistent {
        if let Err(e) = storage.try_set(index, value as i32) {
            eprintln!("Error: --persistent {}: {}", index, e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    }
    storage.clear_changes(true);

    let object_scope =
        scope_with(&args.vars).with_random(args.random_bits, args.triggers).with_storage(storage);
    let mut resolver = GenericResolver::new(args.feature).with_object(object_scope);
    if !args.parent_vars.is_empty() {
        resolver = resolver.with_parent(scope_with(&args.parent_vars));
    }

    let mut temp = TemporaryStorage::new();
    config.engine.register_reset.apply(&mut temp);
    for &(index, value) in &args.registers {
        if let Err(e) = temp.try_set(index, value) {
            eprintln!("Error: --register {:#x}: {}", index, e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    }

    let evaluator = config.engine.evaluator(&graph.pool).with_reset_policy(ResetPolicy::Manual);
    let mut object = ResolverObject::new(resolver, &mut temp)
        .with_callback(CallbackId(callback), args.param1, args.param2)
        .with_grf(&graph.grf);
    let result = evaluator.resolve(root, &mut object);
    let last_value = object.last_value;
    let resolver = object.into_provider();
    debug!(root = %root, result = ?result, "resolved");

    let storage = resolver.object().storage.as_ref();
    let changed = storage.is_some_and(|s| s.has_changes());
    let slots: Vec<(usize, i32)> = storage
        .map(|s| s.values().iter().copied().enumerate().filter(|&(_, v)| v != 0).collect())
        .unwrap_or_default();
    let registers: Vec<(u32, u32)> = temp.non_zero().collect();

    if args.json {
        let result_json = match result {
            ResolverResult::Failed => serde_json::json!({ "kind": "failed" }),
            ResolverResult::Callback(value) => {
                serde_json::json!({ "kind": "callback", "value": value })
            }
            ResolverResult::Group(node) => {
                let group = graph.pool.get(node).ok();
                serde_json::json!({
                    "kind": "group",
                    "node": node.0,
                    "group": group.map(|g| g.kind().to_string()),
                    "summary": group.map(describe),
                })
            }
        };
        let report = serde_json::json!({
            "root": root.0,
            "result": result_json,
            "last_value": last_value,
            "registers": registers
                .iter()
                .map(|&(index, value)| serde_json::json!({ "index": index, "value": value }))
                .collect::<Vec<_>>(),
            "persistent": slots
                .iter()
                .map(|&(index, value)| serde_json::json!({ "index": index, "value": value }))
                .collect::<Vec<_>>(),
            "persistent_changed": changed,
        });
        println!("{}", report);
    } else {
        match result {
            ResolverResult::Failed => println!("result: failed"),
            ResolverResult::Callback(value) => println!("result: callback {:#x}", value),
            ResolverResult::Group(node) => match graph.pool.get(node) {
                Ok(group) => println!("result: {} {} {}", node, group.kind(), describe(group)),
                Err(_) => println!("result: {}", node),
            },
        }
        println!("last value: {:#x}", last_value);
        if !registers.is_empty() {
            println!("registers:");
            for (index, value) in &registers {
                println!("  {:#05x} = {:#x}", index, value);
            }
        }
        if !slots.is_empty() {
            let note = if changed { " (written)" } else { "" };
            println!("persistent storage{}:", note);
            for (index, value) in &slots {
                println!("  [{}] = {}", index, value);
            }
        }
    }

    if result.is_failed() {
        ExitCode::from(EXIT_ERROR)
    } else {
        ExitCode::from(EXIT_SUCCESS)
    }
}
