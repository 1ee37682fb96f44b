//! Codex session transcript records.
//!
//! Each line of a Codex rollout file is a JSON object with a `type` tag, an
//! optional `timestamp`, and an opaque `payload`. [`SessionLine`] keeps the raw
//! shape so it can be written back out unchanged; [`SessionEvent`] is the typed
//! view used for summarizing.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Line type carrying session metadata (cwd, start timestamp).
pub const SESSION_META: &str = "session_meta";
/// Line type counted toward a session's message count.
pub const RESPONSE_ITEM: &str = "response_item";
/// Line type for UI-level events such as user messages.
pub const EVENT_MSG: &str = "event_msg";

/// Tool name Codex uses for shell invocations.
const SHELL_COMMAND_TOOL: &str = "shell_command";
/// Tool name shell invocations are relabeled to when they only inspect files.
pub const READ_TOOL: &str = "read";

/// Read-only file inspection commands: pwd, ls, cat, head, tail, tree, file, stat, `sed -n`.
static FILE_VIEWING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:pwd|ls|cat|head|tail|tree|file|stat)\b|sed\s+-n\s+)")
        .expect("file viewing pattern is valid")
});

/// A raw session line, as written by Codex.
///
/// Unknown top-level keys are dropped; absent fields are omitted on output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// Typed view of a [`SessionLine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Meta(SessionMeta),
    Response(ResponseItem),
    Event(EventMsg),
    /// Any other line type, or a known type whose payload has an unexpected shape.
    Unknown,
}

/// Payload of a `session_meta` line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionMeta {
    pub cwd: Option<String>,
    pub timestamp: Option<String>,
}

/// Payload of a `response_item` line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseItem {
    FunctionCall {
        name: String,
        /// JSON-encoded tool arguments.
        arguments: Option<String>,
    },
    #[serde(other)]
    Other,
}

/// Payload of an `event_msg` line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventMsg {
    UserMessage { message: Option<String> },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ShellCommandArgs {
    command: String,
}

impl SessionLine {
    /// Whether this line counts toward the session's message count.
    pub fn is_response_item(&self) -> bool {
        self.kind.as_deref() == Some(RESPONSE_ITEM)
    }

    /// Decode the payload into one of the known record shapes.
    pub fn event(&self) -> SessionEvent {
        let Some(payload) = self.payload.as_ref() else {
            return SessionEvent::Unknown;
        };

        let decoded = match self.kind.as_deref() {
            Some(SESSION_META) => SessionMeta::deserialize(payload).map(SessionEvent::Meta),
            Some(RESPONSE_ITEM) => ResponseItem::deserialize(payload).map(SessionEvent::Response),
            Some(EVENT_MSG) => EventMsg::deserialize(payload).map(SessionEvent::Event),
            _ => return SessionEvent::Unknown,
        };

        decoded.unwrap_or_else(|e| {
            tracing::trace!(kind = ?self.kind, error = %e, "unrecognized payload shape");
            SessionEvent::Unknown
        })
    }

    /// Relabel a `shell_command` call as a `read` when its command only inspects files.
    ///
    /// Returns `true` if the payload was rewritten.
    pub fn relabel_file_viewing_call(&mut self) -> bool {
        let SessionEvent::Response(ResponseItem::FunctionCall {
            name,
            arguments: Some(arguments),
        }) = self.event()
        else {
            return false;
        };

        if name != SHELL_COMMAND_TOOL {
            return false;
        }

        let command = match serde_json::from_str::<ShellCommandArgs>(&arguments) {
            Ok(args) => args.command,
            Err(e) => {
                tracing::debug!(error = %e, "failed to parse shell_command arguments");
                return false;
            }
        };

        if !is_file_viewing_command(&command) {
            return false;
        }

        let Some(Value::Object(payload)) = self.payload.as_mut() else {
            return false;
        };
        payload.insert("name".to_string(), Value::String(READ_TOOL.to_string()));
        tracing::debug!(%command, "relabeled shell_command as read");
        true
    }
}

/// Check whether a shell command only views files or directories.
pub fn is_file_viewing_command(command: &str) -> bool {
    let trimmed = command.trim();
    !trimmed.is_empty() && FILE_VIEWING_RE.is_match(trimmed)
}
