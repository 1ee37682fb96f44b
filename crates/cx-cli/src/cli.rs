//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cx_core::Selection;

/// Browse Codex CLI session history and copy project file references.
///
/// Session output is JSON on stdout; logs go to stderr.
#[derive(Debug, Parser)]
#[command(name = "cx", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List all Codex sessions, newest first.
    Sessions {
        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Print every record of one session.
    Session {
        /// Session ID or a prefix of the session file name.
        id: String,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },

    /// Copy `@project/path#Lstart-end` for a file to the clipboard.
    CopyPath {
        /// File to reference.
        file: PathBuf,

        /// Selected character range as START:END (e.g., 120:348).
        #[arg(short, long)]
        selection: Option<Selection>,

        /// Project root the path is made relative to (defaults to config, then cwd).
        #[arg(long)]
        project_root: Option<PathBuf>,

        /// Project name prefix (defaults to the root directory name).
        #[arg(long)]
        project_name: Option<String>,

        /// Print the reference instead of copying it.
        #[arg(long)]
        print: bool,
    },
}
