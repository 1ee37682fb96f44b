//! Core domain logic for codex-lens.
//!
//! This crate contains:
//! - History: summarizing and replaying Codex CLI session transcripts
//! - Records: the typed view over individual transcript lines
//! - Path references: `@project/path#L1-2` strings for a file and selection

pub mod history;
pub mod path_ref;
pub mod record;

pub use history::{CodexHistory, HistoryError, SessionInfo, SessionsEnvelope};
pub use path_ref::{Document, LineRange, PathRefError, ProjectFile, Selection, reference_for};
pub use record::{SessionEvent, SessionLine};
