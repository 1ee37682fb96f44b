//! codex-lens CLI library.
//!
//! This crate wires the core history reader and path formatter to a
//! command-line host: argument parsing, configuration, logging, and clipboard.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
