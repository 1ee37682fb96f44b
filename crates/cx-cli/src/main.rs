use std::io::stdout;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cx_cli::commands::{copy_path, sessions};
use cx_cli::{Cli, Commands, Config};
use cx_core::CodexHistory;

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support; stdout is reserved for JSON output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    match cli.command {
        Some(Commands::Sessions { pretty }) => {
            let config = load_config(cli.config.as_deref())?;
            let history = CodexHistory::new(config.sessions_dir);
            sessions::list(&mut stdout().lock(), &history, pretty)?;
        }
        Some(Commands::Session { id, pretty }) => {
            let config = load_config(cli.config.as_deref())?;
            let history = CodexHistory::new(config.sessions_dir);
            sessions::show(&mut stdout().lock(), &history, &id, pretty)?;
        }
        Some(Commands::CopyPath {
            file,
            selection,
            project_root,
            project_name,
            print,
        }) => {
            let config = load_config(cli.config.as_deref())?;
            let project_root = match project_root.or(config.project_root) {
                Some(root) => root,
                None => std::env::current_dir().context("failed to get current directory")?,
            };
            let request = copy_path::Request {
                file,
                selection,
                project_root,
                project_name: project_name.or(config.project_name),
            };
            let output = if print {
                copy_path::Output::Stdout
            } else {
                copy_path::Output::Clipboard
            };
            copy_path::run(request, output)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
