//! In-band command parsing
//!
//! Parses a slash-prefixed input line into a typed [`Command`]. Parsing
//! is pure; execution happens in the session handler (local replies) and
//! the registry actor (anything touching other sessions).

use crate::protocol;

/// A parsed client command
///
/// Command tokens are case-sensitive. `/msg` and `/except` take a
/// comma-separated name list followed by the message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Close this session
    Exit,
    /// Request the connected-clients roster
    List,
    /// Request the banned-phrase list
    Banned,
    /// Request the command summary
    Help,
    /// Private message to the named recipients
    Msg {
        recipients: Vec<String>,
        message: String,
    },
    /// Broadcast excluding the named users (and the sender)
    Except {
        excluded: Vec<String>,
        message: String,
    },
    /// Syntactically invalid /msg or /except; reply with usage
    Malformed { usage: &'static str },
    /// Unrecognized command token
    Unknown,
}

/// Parse a slash-prefixed line into a [`Command`].
///
/// The caller guarantees `line` starts with `/`.
pub fn parse(line: &str) -> Command {
    match line {
        "/exit" => Command::Exit,
        "/list" => Command::List,
        "/banned" => Command::Banned,
        "/help" => Command::Help,
        _ if is_command(line, "/msg") => parse_targeted(line)
            .map(|(recipients, message)| Command::Msg {
                recipients,
                message,
            })
            .unwrap_or(Command::Malformed {
                usage: protocol::MSG_USAGE,
            }),
        _ if is_command(line, "/except") => parse_targeted(line)
            .map(|(excluded, message)| Command::Except { excluded, message })
            .unwrap_or(Command::Malformed {
                usage: protocol::EXCEPT_USAGE,
            }),
        _ => Command::Unknown,
    }
}

/// True if `line` is exactly `token` or starts with `token` + space
fn is_command(line: &str, token: &str) -> bool {
    line == token || line.starts_with(&format!("{token} "))
}

/// Split `/cmd names message` into a name list and the message text.
///
/// Returns None when fewer than two segments follow the command token.
fn parse_targeted(line: &str) -> Option<(Vec<String>, String)> {
    let mut parts = line.splitn(3, ' ');
    parts.next()?;
    let names = parts.next()?;
    let message = parts.next()?;

    let names = split_names(names);
    if names.is_empty() {
        return None;
    }

    Some((names, message.to_string()))
}

/// Split a comma-separated name list: trimmed, empties dropped,
/// deduplicated preserving first occurrence.
fn split_names(list: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in list.split(',') {
        let name = name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse("/exit"), Command::Exit);
        assert_eq!(parse("/list"), Command::List);
        assert_eq!(parse("/banned"), Command::Banned);
        assert_eq!(parse("/help"), Command::Help);
    }

    #[test]
    fn test_commands_are_case_sensitive() {
        assert_eq!(parse("/EXIT"), Command::Unknown);
        assert_eq!(parse("/List"), Command::Unknown);
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(parse("/dance"), Command::Unknown);
        assert_eq!(parse("/"), Command::Unknown);
    }

    #[test]
    fn test_msg_single_recipient() {
        assert_eq!(
            parse("/msg alice hello there"),
            Command::Msg {
                recipients: vec!["alice".to_string()],
                message: "hello there".to_string(),
            }
        );
    }

    #[test]
    fn test_msg_multiple_recipients_trimmed() {
        assert_eq!(
            parse("/msg alice, bob ,carol hi"),
            Command::Msg {
                recipients: vec![
                    "alice".to_string(),
                    "bob".to_string(),
                    "carol".to_string()
                ],
                message: "hi".to_string(),
            }
        );
    }

    #[test]
    fn test_msg_duplicate_recipients_collapsed() {
        assert_eq!(
            parse("/msg bob,bob hi"),
            Command::Msg {
                recipients: vec!["bob".to_string()],
                message: "hi".to_string(),
            }
        );
    }

    #[test]
    fn test_msg_malformed() {
        let usage = crate::protocol::MSG_USAGE;
        assert_eq!(parse("/msg"), Command::Malformed { usage });
        assert_eq!(parse("/msg alice"), Command::Malformed { usage });
        // A list of only empty names is as malformed as no list.
        assert_eq!(parse("/msg , hi"), Command::Malformed { usage });
    }

    #[test]
    fn test_msg_empty_message_allowed() {
        assert_eq!(
            parse("/msg alice "),
            Command::Msg {
                recipients: vec!["alice".to_string()],
                message: String::new(),
            }
        );
    }

    #[test]
    fn test_except_parses_like_msg() {
        assert_eq!(
            parse("/except carol dont tell"),
            Command::Except {
                excluded: vec!["carol".to_string()],
                message: "dont tell".to_string(),
            }
        );
        assert_eq!(
            parse("/except"),
            Command::Malformed {
                usage: crate::protocol::EXCEPT_USAGE
            }
        );
    }

    #[test]
    fn test_message_keeps_interior_spaces() {
        assert_eq!(
            parse("/msg a  double  spaced"),
            Command::Msg {
                recipients: vec!["a".to_string()],
                message: " double  spaced".to_string(),
            }
        );
    }
}
