//! Configuration module for the sprite group resolver
//!
//! Provides types and parsing for `sgr.toml` configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
