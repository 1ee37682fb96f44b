//! CLI subcommand implementations.

pub mod copy_path;
pub mod sessions;
