//! Wire protocol line formats
//!
//! Every server-to-client line is produced here: handshake tokens,
//! join/leave notices, message prefixes, and the fixed reply texts for
//! the command surface. The transport is newline-terminated UTF-8, so
//! each value is a single line (the help text is the one deliberate
//! multi-line reply).

/// Literal acceptance token concluding a successful handshake
pub const ACCEPTED: &str = "ACCEPTED";

/// Handshake rejection for an empty or already-registered name
pub const NAME_REJECTED: &str = "Name is empty or already taken. Try again.";

/// Private notice replacing a message that matched the phrase filter
pub const BANNED_MESSAGE: &str = "Message contains banned phrases and will not be sent.";

/// Reply to an unrecognized slash command
pub const UNKNOWN_COMMAND: &str = "Unknown command. Type /help for the list of available commands.";

/// Usage string for a malformed /msg
pub const MSG_USAGE: &str = "Usage: /msg [user1,user2...] [message]";

/// Usage string for a malformed /except
pub const EXCEPT_USAGE: &str = "Usage: /except [user1,user2,...] [message]";

/// Fixed /help reply
pub const HELP: &str = "Available commands:\n\
    /list - Show list of connected clients.\n\
    /banned - Show list of banned phrases.\n\
    /msg [username1,username2] [message] - Send a private message.\n\
    /except [user1,user2,...] [message] - Broadcast message excluding specified users.\n\
    /help - Show available commands.\n\
    /exit - Exit from chat.";

/// Unprefixed notice broadcast when a client registers
pub fn join_notice(name: &str) -> String {
    format!("{name} has joined the chat")
}

/// Unprefixed notice broadcast when a registered client leaves
pub fn leave_notice(name: &str) -> String {
    format!("{name} has left the chat")
}

/// Roster reply sent after the handshake and for /list
pub fn roster(names: &[String]) -> String {
    format!("Connected clients: {}", names.join(", "))
}

/// Plain broadcast line, prefixed with the sender's name
pub fn chat(sender: &str, message: &str) -> String {
    format!("{sender}: {message}")
}

/// Targeted /msg delivery line
pub fn private(sender: &str, message: &str) -> String {
    format!("{sender} (private): {message}")
}

/// Exclusion broadcast line; the excluded list renders bracketed
pub fn except(sender: &str, excluded: &[String], message: &str) -> String {
    format!(
        "{sender} (to everyone, except [{}]): {message}",
        excluded.join(", ")
    )
}

/// Private reply for an unresolvable /msg recipient
pub fn user_not_found(name: &str) -> String {
    format!("User {name} not found.")
}

/// /banned reply listing the configured phrases
pub fn banned_list(phrases: &[String]) -> String {
    format!("Banned phrases: {}", phrases.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices() {
        assert_eq!(join_notice("alice"), "alice has joined the chat");
        assert_eq!(leave_notice("alice"), "alice has left the chat");
    }

    #[test]
    fn test_roster() {
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(roster(&names), "Connected clients: a, b, c");
    }

    #[test]
    fn test_message_prefixes() {
        assert_eq!(chat("a", "hello"), "a: hello");
        assert_eq!(private("a", "psst"), "a (private): psst");
    }

    #[test]
    fn test_except_renders_bracketed_list() {
        let excluded = vec!["c".to_string()];
        assert_eq!(
            except("b", &excluded, "bye"),
            "b (to everyone, except [c]): bye"
        );

        let excluded = vec!["c".to_string(), "d".to_string()];
        assert_eq!(
            except("b", &excluded, "bye"),
            "b (to everyone, except [c, d]): bye"
        );
    }

    #[test]
    fn test_user_not_found() {
        assert_eq!(user_not_found("ghost"), "User ghost not found.");
    }

    #[test]
    fn test_banned_list() {
        let phrases = vec!["bad".to_string(), "worse".to_string()];
        assert_eq!(banned_list(&phrases), "Banned phrases: bad, worse");
    }
}
