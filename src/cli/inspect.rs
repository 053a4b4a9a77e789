//! Inspect command implementation

use std::path::Path;
use std::process::ExitCode;

use crate::config::SgrConfig;
use crate::graph::GraphDocument;
use crate::group::SpriteGroup;
use crate::pool::NodeRef;

use super::{EXIT_ERROR, EXIT_SUCCESS};

/// One-line summary of a group.
pub(crate) fn describe(group: &SpriteGroup) -> String {
    let refs = |nodes: &[NodeRef]| nodes.iter().map(|n| n.to_string()).collect::<Vec<_>>().join(",");
    match group {
        SpriteGroup::Real(real) => {
            format!("loaded=[{}] loading=[{}]", refs(&real.loaded), refs(&real.loading))
        }
        SpriteGroup::Deterministic(det) => {
            let mut text = format!("{} {:?} adjusts={}", det.scope, det.size, det.adjusts.len());
            if det.is_calculated() {
                text.push_str(" calculated");
            } else {
                for range in det.ranges() {
                    text.push_str(&format!(" {:#x}..{:#x}->{}", range.low, range.high, range.group));
                }
                if let Some(default) = det.default {
                    text.push_str(&format!(" default->{}", default));
                }
            }
            text.to_lowercase()
        }
        SpriteGroup::Randomized(rnd) => format!(
            "{} {:?} triggers={:#x} bits={}+ [{}]",
            rnd.scope,
            rnd.mode,
            rnd.triggers,
            rnd.lowest_randbit,
            refs(rnd.groups())
        )
        .to_lowercase(),
        SpriteGroup::Callback(cb) => format!("value={:#x}", cb.value()),
        SpriteGroup::Result(result) => {
            format!("sprite={} num_sprites={}", result.sprite, result.num_sprites)
        }
        SpriteGroup::TileLayout(layout) => format!(
            "ground={} sprites={} num_sprites={}",
            layout.layout.ground.sprite,
            layout.layout.sprites.len(),
            layout.num_sprites
        ),
        SpriteGroup::IndustryProduction(prod) => format!(
            "version={} inputs={} outputs={} again={}",
            prod.version,
            prod.inputs.len(),
            prod.outputs.len(),
            prod.again
        ),
    }
}

/// Execute the inspect command
pub fn run_inspect(path: &Path, json: bool, config: &SgrConfig) -> ExitCode {
    let document = match GraphDocument::read(path) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("Error: {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let pool = match document.build_pool(config.engine.pool_capacity) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Error: {}: {}", path.display(), e);
            return ExitCode::from(EXIT_ERROR);
        }
    };
    let root = document.root();

    if json {
        let groups: Vec<_> = pool
            .iter()
            .map(|(node, group)| {
                serde_json::json!({
                    "node": node.0,
                    "kind": group.kind().to_string(),
                    "terminal": group.is_terminal(),
                    "children": group.children().iter().map(|c| c.0).collect::<Vec<_>>(),
                    "summary": describe(group),
                })
            })
            .collect();
        let report = serde_json::json!({
            "grf": document.grf,
            "root": root.map(|r| r.0),
            "groups": groups,
        });
        println!("{}", report);
        return ExitCode::from(EXIT_SUCCESS);
    }

    println!("grf {} (version {})", document.grf, document.grf.grf_version);
    match root {
        Some(root) => println!("root {}", root),
        None => println!("root none"),
    }
    println!("{} groups", pool.len());
    for (node, group) in pool.iter() {
        let marker = if Some(node) == root { "*" } else { " " };
        println!("{}{:>5}  {:<19} {}", marker, node.to_string(), group.kind().to_string(), describe(group));
    }

    ExitCode::from(EXIT_SUCCESS)
}
