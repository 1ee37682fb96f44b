//! Implementation of the `cx copy-path` command.
//!
//! The file is read and the reference built on a worker thread; the result is
//! handed back to the main thread, which owns the clipboard. Any failure is
//! logged as a warning and the command still exits successfully.

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{Context, Result, anyhow};

use cx_core::{Document, ProjectFile, Selection, reference_for};

/// Where the finished reference goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Clipboard,
    Stdout,
}

/// Inputs for building a reference.
#[derive(Debug, Clone)]
pub struct Request {
    pub file: PathBuf,
    pub selection: Option<Selection>,
    pub project_root: PathBuf,
    pub project_name: Option<String>,
}

/// Run the copy-path command.
pub fn run(request: Request, output: Output) -> Result<()> {
    let worker = thread::Builder::new()
        .name("cx-copy-path".to_string())
        .spawn(move || resolve_reference(&request))
        .context("failed to spawn reader thread")?;

    let reference = match worker.join() {
        Ok(Ok(reference)) => reference,
        Ok(Err(e)) => {
            tracing::warn!(error = %format!("{e:#}"), "could not build path reference");
            return Ok(());
        }
        Err(_) => {
            tracing::warn!("reader thread panicked");
            return Ok(());
        }
    };

    match output {
        Output::Stdout => println!("{reference}"),
        Output::Clipboard => match copy_to_clipboard(&reference) {
            Ok(()) => tracing::info!(%reference, "copied to clipboard"),
            Err(e) => tracing::warn!(error = %e, "failed to copy to clipboard"),
        },
    }

    Ok(())
}

/// Build the reference string for a request.
///
/// The file is only read when there is a selection to map to lines.
pub fn resolve_reference(request: &Request) -> Result<String> {
    let root = fs::canonicalize(&request.project_root).with_context(|| {
        format!(
            "failed to resolve project root: {}",
            request.project_root.display()
        )
    })?;
    let file = fs::canonicalize(&request.file)
        .with_context(|| format!("failed to resolve file: {}", request.file.display()))?;
    if !file.is_file() {
        anyhow::bail!("not a file: {}", file.display());
    }

    let project_name = match &request.project_name {
        Some(name) => name.clone(),
        None => project_name_for(&root)
            .ok_or_else(|| anyhow!("cannot derive project name from {}", root.display()))?,
    };

    let doc = match request.selection {
        Some(_) => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            Document::new(text)
        }
        None => Document::new(String::new()),
    };

    let project_file = ProjectFile::new(project_name, root, file);
    Ok(reference_for(&project_file, &doc, request.selection)?)
}

/// Project name is the root directory's name.
fn project_name_for(root: &Path) -> Option<String> {
    root.file_name().map(|n| n.to_string_lossy().into_owned())
}

fn copy_to_clipboard(text: &str) -> Result<(), arboard::Error> {
    let mut clipboard = arboard::Clipboard::new()?;
    clipboard.set_text(text)
}
