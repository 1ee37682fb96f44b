//! `cx sessions` and `cx session <ID>`: Codex history as JSON.
//!
//! Both commands always print valid JSON. Failures are reported inside the
//! output (a failure envelope, or an empty array) and logged to stderr.

use std::io::Write;

use anyhow::Result;

use cx_core::CodexHistory;

/// Print the envelope listing every valid session.
pub fn list<W: Write>(writer: &mut W, history: &CodexHistory, pretty: bool) -> Result<()> {
    writeln!(writer, "{}", history.all_sessions_json(pretty))?;
    Ok(())
}

/// Print all records of the session matching `session_id`.
pub fn show<W: Write>(
    writer: &mut W,
    history: &CodexHistory,
    session_id: &str,
    pretty: bool,
) -> Result<()> {
    writeln!(writer, "{}", history.session_messages_json(session_id, pretty))?;
    Ok(())
}
