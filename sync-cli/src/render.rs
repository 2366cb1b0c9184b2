//! Terminal rendering and line parsing.

use picochat_client::Input;
use picochat_core::MessageHistory;
use picochat_types::SyncStatus;

/// What a typed line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineCommand {
    /// Feed this to the session.
    Input(Input),
    /// Leave the loop.
    Quit,
}

/// Interpret one line from stdin.
///
/// `/quit` exits. `/retry` resends a draft whose send failed and `/cancel`
/// discards it. A blank line is ignored; anything else is sent.
pub fn parse_line(line: &str) -> Option<LineCommand> {
    let line = line.trim_end_matches(['\r', '\n']);
    match line.trim() {
        "" => None,
        "/quit" => Some(LineCommand::Quit),
        "/retry" => Some(LineCommand::Input(Input::Commit)),
        "/cancel" => Some(LineCommand::Input(Input::Cancel)),
        _ => Some(LineCommand::Input(Input::Line(line.to_string()))),
    }
}

/// History oldest first, one message per line.
pub fn format_history(history: &MessageHistory) -> String {
    let mut out = String::new();
    for message in history {
        out.push_str(message.sender());
        out.push_str(": ");
        out.push_str(message.body());
        out.push('\n');
    }
    out
}

/// One-line status indicator.
pub fn format_status(status: SyncStatus) -> String {
    format!("[{}]", status.label())
}
