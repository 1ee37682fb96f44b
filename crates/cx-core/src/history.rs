//! Codex CLI session history.
//!
//! Codex stores one transcript per session as
//! `~/.codex/sessions/YYYY/MM/DD/rollout-{timestamp}-{uuid}.jsonl`. Every request
//! walks the whole directory; nothing is cached between calls.

use std::cmp::Reverse;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use chrono::DateTime;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use walkdir::WalkDir;

use crate::record::{EventMsg, SessionEvent, SessionLine};

/// Buffer size for `BufReader` (64KB for optimal performance on large files)
const BUFFER_SIZE: usize = 64 * 1024;

/// Suffix of Codex session transcript files.
const SESSION_FILE_SUFFIX: &str = ".jsonl";

/// Maximum title length in characters, before the ellipsis.
pub const MAX_TITLE_CHARS: usize = 45;

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sessions directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("not a session file: {}", .0.display())]
    InvalidFileName(PathBuf),
}

/// Summary of one Codex session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Number of `response_item` lines.
    pub message_count: usize,
    /// Epoch milliseconds; 0 when no timestamp parsed.
    pub last_timestamp: i64,
    /// Epoch milliseconds of the session metadata; 0 when absent.
    pub first_timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

impl SessionInfo {
    /// Sessions without a title or without any response items are not listed.
    pub fn is_valid(&self) -> bool {
        self.title.as_deref().is_some_and(|t| !t.is_empty()) && self.message_count >= 1
    }
}

/// JSON envelope returned to callers listing all sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SessionsEnvelope {
    Loaded {
        success: bool,
        sessions: Vec<SessionInfo>,
        /// Sum of message counts across sessions.
        total: usize,
        #[serde(rename = "sessionCount")]
        session_count: usize,
    },
    Failed {
        success: bool,
        error: String,
    },
}

impl SessionsEnvelope {
    pub fn loaded(sessions: Vec<SessionInfo>) -> Self {
        let total = sessions.iter().map(|s| s.message_count).sum();
        let session_count = sessions.len();
        Self::Loaded {
            success: true,
            sessions,
            total,
            session_count,
        }
    }

    pub fn failed(error: &HistoryError) -> Self {
        Self::Failed {
            success: false,
            error: format!("failed to read Codex sessions: {error}"),
        }
    }
}

/// Parse an RFC 3339 timestamp into epoch milliseconds, or 0 if it doesn't parse.
pub fn parse_timestamp(timestamp: &str) -> i64 {
    DateTime::parse_from_rfc3339(timestamp).map_or(0, |dt| dt.timestamp_millis())
}

/// Build a session title from a user message.
///
/// Newlines collapse to spaces and anything past [`MAX_TITLE_CHARS`] is cut
/// and marked with `...`. A whitespace-only message gives an empty title.
pub fn make_title(message: &str) -> String {
    let collapsed = message.replace(['\r', '\n'], " ");
    let trimmed = collapsed.trim();

    match trimmed.char_indices().nth(MAX_TITLE_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

/// Title from the first non-empty user message in file order.
///
/// Later messages are never consulted, so a first message of only whitespace
/// leaves the session with an empty title.
pub fn derive_title<'a>(lines: impl IntoIterator<Item = &'a SessionLine>) -> Option<String> {
    lines.into_iter().find_map(|line| match line.event() {
        SessionEvent::Event(EventMsg::UserMessage {
            message: Some(message),
        }) if !message.is_empty() => Some(make_title(&message)),
        _ => None,
    })
}

/// Session ID is the file name without the `.jsonl` suffix.
fn session_id_from_path(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let id = name.strip_suffix(SESSION_FILE_SUFFIX)?;
    (!id.is_empty()).then(|| id.to_string())
}

fn is_session_file_name(name: &OsStr) -> bool {
    name.to_str()
        .is_some_and(|n| n.ends_with(SESSION_FILE_SUFFIX))
}

/// Parse a single session line, logging and discarding malformed ones.
///
/// Lines are raw bytes so that invalid UTF-8 (e.g. a character cut off
/// mid-write) fails here like any other bad JSON.
fn parse_line(path: &Path, line_num: usize, line: &[u8]) -> Option<SessionLine> {
    if line.trim_ascii().is_empty() {
        return None;
    }

    match serde_json::from_slice(line) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::debug!(
                path = %path.display(),
                line = line_num + 1,
                error = %e,
                "skipping malformed session line"
            );
            None
        }
    }
}

/// Every parsable line of a session file, in file order.
fn read_lines(path: &Path) -> Result<Vec<SessionLine>, HistoryError> {
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(BUFFER_SIZE, file);

    let mut lines = Vec::new();
    for (line_num, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        if let Some(record) = parse_line(path, line_num, &line) {
            lines.push(record);
        }
    }
    Ok(lines)
}

/// Summarize a Codex session JSONL file.
pub fn parse_session_file(path: &Path) -> Result<SessionInfo, HistoryError> {
    let session_id =
        session_id_from_path(path).ok_or_else(|| HistoryError::InvalidFileName(path.into()))?;

    let lines = read_lines(path)?;

    let mut message_count = 0usize;
    let mut first_timestamp: Option<i64> = None;
    let mut last_timestamp = 0i64;
    let mut cwd: Option<String> = None;

    for record in &lines {
        if let Some(ts) = record.timestamp.as_deref() {
            last_timestamp = last_timestamp.max(parse_timestamp(ts));
        }

        if record.is_response_item() {
            message_count = message_count.saturating_add(1);
        }

        if let SessionEvent::Meta(meta) = record.event() {
            if cwd.is_none() {
                cwd = meta.cwd;
            }
            if let Some(ts) = meta.timestamp.as_deref() {
                let ts = parse_timestamp(ts);
                first_timestamp.get_or_insert(ts);
                last_timestamp = last_timestamp.max(ts);
            }
        }
    }

    Ok(SessionInfo {
        session_id,
        title: derive_title(&lines),
        message_count,
        last_timestamp,
        first_timestamp: first_timestamp.unwrap_or(0),
        cwd,
    })
}

/// Read every parsable line of a session, relabeling read-only shell calls.
pub fn read_session_lines(path: &Path) -> Result<Vec<SessionLine>, HistoryError> {
    let mut lines = read_lines(path)?;
    for record in &mut lines {
        record.relabel_file_viewing_call();
    }
    Ok(lines)
}

/// Serialize a value as compact or pretty JSON.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
}

/// Reader over a Codex sessions directory.
#[derive(Debug, Clone)]
pub struct CodexHistory {
    sessions_dir: PathBuf,
}

impl CodexHistory {
    pub fn new(sessions_dir: impl Into<PathBuf>) -> Self {
        Self {
            sessions_dir: sessions_dir.into(),
        }
    }

    pub fn sessions_dir(&self) -> &Path {
        &self.sessions_dir
    }

    fn walk(&self) -> WalkDir {
        WalkDir::new(&self.sessions_dir)
            .follow_links(true)
            .sort_by_file_name()
    }

    /// Collect non-empty `*.jsonl` files under the sessions directory.
    ///
    /// Failing to read the root is an error; unreadable nested entries are skipped.
    fn session_files(&self) -> Result<Vec<PathBuf>, HistoryError> {
        let mut files = Vec::new();

        for entry in self.walk() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry in sessions directory");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !is_session_file_name(entry.file_name()) {
                continue;
            }

            match entry.metadata() {
                Ok(meta) if meta.len() > 0 => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(path = ?entry.path(), error = %e, "skipping unreadable session file");
                }
            }
        }

        Ok(files)
    }

    /// Summarize every valid session, newest first.
    pub fn read_all_sessions(&self) -> Result<Vec<SessionInfo>, HistoryError> {
        if !self.sessions_dir.is_dir() {
            tracing::info!(dir = %self.sessions_dir.display(), "Codex sessions directory not found");
            return Err(HistoryError::DirectoryNotFound(self.sessions_dir.clone()));
        }

        let files = self.session_files()?;
        tracing::info!(count = files.len(), "found Codex session files");

        let mut sessions: Vec<SessionInfo> = files
            .par_iter()
            .filter_map(|path| match parse_session_file(path) {
                Ok(session) if session.is_valid() => Some(session),
                Ok(session) => {
                    tracing::debug!(
                        session_id = %session.session_id,
                        "skipping session without title or messages"
                    );
                    None
                }
                Err(e) => {
                    tracing::warn!(path = ?path, error = %e, "failed to parse session file");
                    None
                }
            })
            .collect();

        // Stable sort: ties keep walk order.
        sessions.sort_by_key(|s| Reverse(s.last_timestamp));

        tracing::info!(count = sessions.len(), "loaded valid Codex sessions");
        Ok(sessions)
    }

    /// All sessions wrapped in a success or failure envelope. Never fails.
    pub fn all_sessions_envelope(&self) -> SessionsEnvelope {
        match self.read_all_sessions() {
            Ok(sessions) => SessionsEnvelope::loaded(sessions),
            Err(e) => {
                tracing::error!(error = %e, "failed to read Codex sessions");
                SessionsEnvelope::failed(&e)
            }
        }
    }

    /// JSON form of [`Self::all_sessions_envelope`].
    pub fn all_sessions_json(&self, pretty: bool) -> String {
        to_json(&self.all_sessions_envelope(), pretty).unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to serialize sessions envelope");
            let envelope = SessionsEnvelope::failed(&HistoryError::Json(e));
            serde_json::to_string(&envelope).unwrap_or_default()
        })
    }

    /// Locate the first session file whose name starts with `session_id`.
    pub fn find_session_file(&self, session_id: &str) -> Result<Option<PathBuf>, HistoryError> {
        if session_id.is_empty() || !self.sessions_dir.exists() {
            return Ok(None);
        }

        for entry in self.walk() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry in sessions directory");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let matches = entry
                .file_name()
                .to_str()
                .is_some_and(|n| n.starts_with(session_id) && n.ends_with(SESSION_FILE_SUFFIX));
            if matches {
                return Ok(Some(entry.into_path()));
            }
        }

        Ok(None)
    }

    /// All records of one session in file order. Unknown sessions yield an empty list.
    pub fn session_messages(&self, session_id: &str) -> Result<Vec<SessionLine>, HistoryError> {
        let Some(path) = self.find_session_file(session_id)? else {
            tracing::warn!(session_id, "session file not found");
            return Ok(Vec::new());
        };
        read_session_lines(&path)
    }

    /// JSON array of [`Self::session_messages`]; `[]` on any failure.
    pub fn session_messages_json(&self, session_id: &str, pretty: bool) -> String {
        let messages = self.session_messages(session_id).unwrap_or_else(|e| {
            tracing::error!(session_id, error = %e, "failed to read session messages");
            Vec::new()
        });

        to_json(&messages, pretty).unwrap_or_else(|e| {
            tracing::error!(session_id, error = %e, "failed to serialize session messages");
            "[]".to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const META: &str = r#"{"timestamp":"2025-10-01T10:00:00.500Z","type":"session_meta","payload":{"id":"0199","timestamp":"2025-10-01T10:00:00.000Z","cwd":"/home/dev/project","originator":"codex_cli_rs"}}"#;

    fn user_message(ts: &str, text: &str) -> String {
        serde_json::json!({
            "timestamp": ts,
            "type": "event_msg",
            "payload": { "type": "user_message", "message": text, "images": [] },
        })
        .to_string()
    }

    fn response_item(ts: &str) -> String {
        serde_json::json!({
            "timestamp": ts,
            "type": "response_item",
            "payload": { "type": "message", "role": "assistant", "content": [] },
        })
        .to_string()
    }

    fn write_session(dir: &Path, relative: &str, lines: &[String]) -> PathBuf {
        let path = dir.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    fn basic_session(last_ts: &str, title: &str) -> Vec<String> {
        vec![
            META.to_string(),
            user_message("2025-10-01T10:00:01.000Z", title),
            response_item(last_ts),
        ]
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1970-01-01T00:00:01.500Z"), 1500);
        assert_eq!(parse_timestamp("1970-01-01T01:00:00+01:00"), 0);
        assert_eq!(parse_timestamp("not-a-timestamp"), 0);
        assert_eq!(parse_timestamp(""), 0);
    }

    #[test]
    fn test_make_title_short_message_unchanged() {
        assert_eq!(make_title("fix the build"), "fix the build");
    }

    #[test]
    fn test_make_title_collapses_newlines() {
        assert_eq!(make_title("first line\nsecond line\n"), "first line second line");
    }

    #[test]
    fn test_make_title_truncates_to_45_chars() {
        let message = "a".repeat(60);
        let title = make_title(&message);
        assert_eq!(title, format!("{}...", "a".repeat(45)));
        assert_eq!(title.chars().count(), 48);

        let exact = "b".repeat(45);
        assert_eq!(make_title(&exact), exact);
    }

    #[test]
    fn test_make_title_truncates_on_char_boundary() {
        let message = "日本語".repeat(20);
        let title = make_title(&message);
        assert!(title.ends_with("..."));
        assert_eq!(title.trim_end_matches("...").chars().count(), 45);
    }

    #[test]
    fn test_make_title_blank_is_empty() {
        assert_eq!(make_title(""), "");
        assert_eq!(make_title(" \n "), "");
    }

    #[test]
    fn test_derive_title_uses_first_user_message() {
        let lines: Vec<SessionLine> = [
            META.to_string(),
            response_item("2025-10-01T10:00:02.000Z"),
            user_message("2025-10-01T10:00:03.000Z", ""),
            user_message("2025-10-01T10:00:04.000Z", "first real prompt"),
            user_message("2025-10-01T10:00:05.000Z", "second prompt"),
        ]
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

        assert_eq!(derive_title(&lines).as_deref(), Some("first real prompt"));
        assert_eq!(derive_title(&lines[..2]), None);
    }

    #[test]
    fn test_derive_title_stops_at_whitespace_only_message() {
        let lines: Vec<SessionLine> = [
            user_message("2025-10-01T10:00:03.000Z", "   "),
            user_message("2025-10-01T10:00:04.000Z", "second"),
        ]
        .iter()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();

        assert_eq!(derive_title(&lines).as_deref(), Some(""));
    }

    #[test]
    fn test_parse_session_file_whitespace_first_message_is_invalid() {
        let temp = TempDir::new().unwrap();
        let path = write_session(
            temp.path(),
            "blank-title.jsonl",
            &[
                user_message("2025-10-01T10:00:01.000Z", "   "),
                user_message("2025-10-01T10:00:02.000Z", "second"),
                response_item("2025-10-01T10:00:03.000Z"),
            ],
        );

        let session = parse_session_file(&path).unwrap();
        assert_eq!(session.title.as_deref(), Some(""));
        assert!(!session.is_valid());
    }

    #[test]
    fn test_parse_session_file_extracts_summary() {
        let temp = TempDir::new().unwrap();
        let path = write_session(
            temp.path(),
            "2025/10/01/rollout-2025-10-01T10-00-00-0199.jsonl",
            &[
                META.to_string(),
                user_message("2025-10-01T10:00:01.000Z", "explain the parser"),
                response_item("2025-10-01T10:00:02.000Z"),
                response_item("2025-10-01T10:05:00.000Z"),
                r#"{"timestamp":"2025-10-01T10:06:00.000Z","type":"event_msg","payload":{"type":"token_count"}}"#.to_string(),
            ],
        );

        let session = parse_session_file(&path).unwrap();

        assert_eq!(session.session_id, "rollout-2025-10-01T10-00-00-0199");
        assert_eq!(session.title.as_deref(), Some("explain the parser"));
        assert_eq!(session.message_count, 2);
        assert_eq!(session.first_timestamp, parse_timestamp("2025-10-01T10:00:00.000Z"));
        assert_eq!(session.last_timestamp, parse_timestamp("2025-10-01T10:06:00.000Z"));
        assert_eq!(session.cwd.as_deref(), Some("/home/dev/project"));
        assert!(session.is_valid());
    }

    #[test]
    fn test_parse_session_file_skips_malformed_lines() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, "{META}").unwrap();
        writeln!(file, "not json at all").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "{}", user_message("2025-10-01T10:00:01.000Z", "hello")).unwrap();
        writeln!(file, "{}", response_item("2025-10-01T10:00:02.000Z")).unwrap();
        // Incomplete trailing line, as if Codex were still writing
        write!(file, r#"{{"type":"response_item","payload":{{"type":"mess"#).unwrap();
        file.flush().unwrap();

        let session = parse_session_file(file.path()).unwrap();
        assert_eq!(session.message_count, 1);
        assert_eq!(session.title.as_deref(), Some("hello"));
    }

    #[test]
    fn test_parse_session_file_skips_invalid_utf8_line() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, "{META}").unwrap();
        writeln!(file, "{}", user_message("2025-10-01T10:00:01.000Z", "hello")).unwrap();
        writeln!(file, "{}", response_item("2025-10-01T10:00:02.000Z")).unwrap();
        // Multibyte character cut off mid-write
        file.write_all(b"{\"type\":\"event_msg\",\"payload\":{\"message\":\"\xe6\x97\"}}\n").unwrap();
        writeln!(file, "{}", response_item("2025-10-01T10:00:03.000Z")).unwrap();
        file.flush().unwrap();

        let session = parse_session_file(file.path()).unwrap();
        assert_eq!(session.message_count, 2);
        assert_eq!(session.title.as_deref(), Some("hello"));
        assert!(session.is_valid());

        let lines = read_session_lines(file.path()).unwrap();
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_parse_session_file_bad_timestamps_default_to_zero() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(
            file,
            r#"{{"timestamp":"yesterday","type":"session_meta","payload":{{"cwd":"/x","timestamp":"garbage"}}}}"#
        )
        .unwrap();
        writeln!(file, r#"{{"type":"response_item","payload":{{"type":"message"}}}}"#).unwrap();
        file.flush().unwrap();

        let session = parse_session_file(file.path()).unwrap();
        assert_eq!(session.first_timestamp, 0);
        assert_eq!(session.last_timestamp, 0);
        assert_eq!(session.message_count, 1);
        assert_eq!(session.title, None);
        assert!(!session.is_valid());
    }

    #[test]
    fn test_parse_session_file_keeps_first_cwd() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(file, r#"{{"type":"session_meta","payload":{{"cwd":"/first"}}}}"#).unwrap();
        writeln!(file, r#"{{"type":"session_meta","payload":{{"cwd":"/second"}}}}"#).unwrap();
        file.flush().unwrap();

        let session = parse_session_file(file.path()).unwrap();
        assert_eq!(session.cwd.as_deref(), Some("/first"));
    }

    #[test]
    fn test_parse_session_file_meta_timestamp_counts_toward_last() {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        writeln!(
            file,
            r#"{{"timestamp":"2025-10-01T09:00:00Z","type":"session_meta","payload":{{"timestamp":"2025-10-01T11:00:00Z"}}}}"#
        )
        .unwrap();
        file.flush().unwrap();

        let session = parse_session_file(file.path()).unwrap();
        assert_eq!(session.last_timestamp, parse_timestamp("2025-10-01T11:00:00Z"));
        assert_eq!(session.first_timestamp, session.last_timestamp);
    }

    #[test]
    fn test_parse_session_file_rejects_non_session_name() {
        let file = NamedTempFile::new().unwrap();
        let result = parse_session_file(file.path());
        assert!(matches!(result, Err(HistoryError::InvalidFileName(_))));
    }

    #[test]
    fn test_read_all_sessions_excludes_sessions_without_response_items() {
        let temp = TempDir::new().unwrap();
        write_session(
            temp.path(),
            "2025/10/01/no-responses.jsonl",
            &[META.to_string(), user_message("2025-10-01T10:00:01.000Z", "hi")],
        );
        write_session(
            temp.path(),
            "2025/10/01/no-title.jsonl",
            &[META.to_string(), response_item("2025-10-01T10:00:02.000Z")],
        );
        write_session(
            temp.path(),
            "2025/10/01/valid.jsonl",
            &basic_session("2025-10-01T10:00:02.000Z", "hi"),
        );

        let sessions = CodexHistory::new(temp.path()).read_all_sessions().unwrap();

        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, "valid");
    }

    #[test]
    fn test_read_all_sessions_sorted_newest_first() {
        let temp = TempDir::new().unwrap();
        write_session(temp.path(), "2025/10/01/a.jsonl", &basic_session("2025-10-01T12:00:00Z", "a"));
        write_session(temp.path(), "2025/10/02/b.jsonl", &basic_session("2025-10-02T08:00:00Z", "b"));
        write_session(temp.path(), "2025/09/30/c.jsonl", &basic_session("2025-10-01T11:00:00Z", "c"));

        let sessions = CodexHistory::new(temp.path()).read_all_sessions().unwrap();
        let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();

        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_read_all_sessions_ties_keep_walk_order() {
        let temp = TempDir::new().unwrap();
        write_session(temp.path(), "2025/10/01/b.jsonl", &basic_session("2025-10-01T12:00:00Z", "b"));
        write_session(temp.path(), "2025/10/01/a.jsonl", &basic_session("2025-10-01T12:00:00Z", "a"));
        write_session(temp.path(), "2025/10/01/d.jsonl", &basic_session("2025-10-01T13:00:00Z", "d"));
        write_session(temp.path(), "2025/10/01/c.jsonl", &basic_session("2025-10-01T12:00:00Z", "c"));

        let sessions = CodexHistory::new(temp.path()).read_all_sessions().unwrap();
        let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();

        assert_eq!(ids, vec!["d", "a", "b", "c"]);
    }

    #[test]
    fn test_read_all_sessions_ignores_empty_and_foreign_files() {
        let temp = TempDir::new().unwrap();
        write_session(temp.path(), "2025/10/01/empty.jsonl", &[]);
        write_session(temp.path(), "2025/10/01/notes.txt", &basic_session("2025-10-01T12:00:00Z", "x"));
        write_session(temp.path(), "2025/10/01/real.jsonl", &basic_session("2025-10-01T12:00:00Z", "x"));

        let sessions = CodexHistory::new(temp.path()).read_all_sessions().unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session_id, "real");
    }

    #[test]
    fn test_read_all_sessions_missing_directory() {
        let history = CodexHistory::new("/nonexistent/codex/sessions");
        let result = history.read_all_sessions();
        assert!(matches!(result, Err(HistoryError::DirectoryNotFound(_))));
    }

    #[test]
    fn test_envelope_totals() {
        let temp = TempDir::new().unwrap();
        write_session(temp.path(), "a.jsonl", &basic_session("2025-10-01T12:00:00Z", "a"));
        let mut two = basic_session("2025-10-01T13:00:00Z", "b");
        two.push(response_item("2025-10-01T13:00:01Z"));
        write_session(temp.path(), "b.jsonl", &two);

        let envelope = CodexHistory::new(temp.path()).all_sessions_envelope();
        let SessionsEnvelope::Loaded {
            success,
            sessions,
            total,
            session_count,
        } = envelope
        else {
            panic!("expected loaded envelope");
        };

        assert!(success);
        assert_eq!(total, 3);
        assert_eq!(session_count, 2);
        assert_eq!(sessions[0].session_id, "b");
    }

    #[test]
    fn test_envelope_json_shape() {
        let envelope = SessionsEnvelope::loaded(vec![SessionInfo {
            session_id: "abc".to_string(),
            title: Some("hello".to_string()),
            message_count: 2,
            last_timestamp: 2000,
            first_timestamp: 1000,
            cwd: None,
        }]);

        insta::assert_snapshot!(
            serde_json::to_string(&envelope).unwrap(),
            @r#"{"success":true,"sessions":[{"sessionId":"abc","title":"hello","messageCount":2,"lastTimestamp":2000,"firstTimestamp":1000}],"total":2,"sessionCount":1}"#
        );
    }

    #[test]
    fn test_failure_envelope_for_missing_directory() {
        let json = CodexHistory::new("/nonexistent/codex/sessions").all_sessions_json(false);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["success"], false);
        assert!(
            value["error"]
                .as_str()
                .unwrap()
                .starts_with("failed to read Codex sessions: sessions directory not found")
        );
        assert!(value.get("sessions").is_none());
    }

    #[test]
    fn test_find_session_file_by_prefix() {
        let temp = TempDir::new().unwrap();
        write_session(temp.path(), "2025/10/01/rollout-abc-123.jsonl", &basic_session("2025-10-01T12:00:00Z", "x"));
        write_session(temp.path(), "2025/10/01/rollout-abc-123.txt", &[]);

        let history = CodexHistory::new(temp.path());
        let found = history.find_session_file("rollout-abc").unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "rollout-abc-123.jsonl");

        assert!(history.find_session_file("rollout-xyz").unwrap().is_none());
        assert!(history.find_session_file("").unwrap().is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_find_session_file_skips_unreadable_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        write_session(temp.path(), "2025/10/02/rollout-def.jsonl", &basic_session("2025-10-02T12:00:00Z", "x"));
        let locked = temp.path().join("2025/10/01");
        std::fs::create_dir_all(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let history = CodexHistory::new(temp.path());
        let found = history.find_session_file("rollout-def");
        let listed = history.read_all_sessions();

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        let found = found.unwrap().unwrap();
        assert_eq!(found.file_name().unwrap(), "rollout-def.jsonl");
        assert_eq!(listed.unwrap().len(), 1);
    }

    #[test]
    fn test_session_messages_relabels_file_viewing_calls() {
        let temp = TempDir::new().unwrap();
        let call = |command: &str| {
            serde_json::json!({
                "timestamp": "2025-10-01T10:00:03.000Z",
                "type": "response_item",
                "payload": {
                    "type": "function_call",
                    "name": "shell_command",
                    "arguments": serde_json::json!({ "command": command }).to_string(),
                },
            })
            .to_string()
        };
        write_session(
            temp.path(),
            "2025/10/01/sess-1.jsonl",
            &[META.to_string(), "{broken".to_string(), call("cat file.txt"), call("rm file.txt")],
        );

        let history = CodexHistory::new(temp.path());
        let messages = history.session_messages("sess-1").unwrap();

        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].kind.as_deref(), Some("session_meta"));
        assert_eq!(messages[1].payload.as_ref().unwrap()["name"], "read");
        assert_eq!(messages[2].payload.as_ref().unwrap()["name"], "shell_command");
    }

    #[test]
    fn test_session_messages_json_unknown_session_is_empty_array() {
        let temp = TempDir::new().unwrap();
        let history = CodexHistory::new(temp.path());
        assert_eq!(history.session_messages_json("missing", false), "[]");

        let missing_dir = CodexHistory::new("/nonexistent/codex/sessions");
        assert_eq!(missing_dir.session_messages_json("missing", false), "[]");
    }
}
