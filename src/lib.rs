//! spritegroup - Sprite group resolution engine
//!
//! This library provides functionality to:
//! - Hold NewGRF-style sprite group graphs in an arena (`pool`, `group`)
//! - Resolve them against game objects to sprites, tile layouts, production
//!   steps or callback results (`eval`, `resolver`, `features`)
//! - Keep the registers and persistent arrays graphs write to (`storage`)
//! - Reseed random bits on random triggers (`rerandom`)
//! - Load graphs from JSON documents and check them (`graph`)

pub mod cli;
pub mod config;
pub mod eval;
pub mod features;
pub mod graph;
pub mod group;
pub mod pool;
pub mod rerandom;
pub mod resolver;
pub mod storage;
