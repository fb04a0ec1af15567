//! Small helpers shared across workspace crates.

pub mod config;
pub mod env;
