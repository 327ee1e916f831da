//! rmdlconv library
//!
//! Exposes the CLI structure and command implementations so integration
//! tests can drive the dispatch layer directly.

pub mod cli;
pub mod commands;
