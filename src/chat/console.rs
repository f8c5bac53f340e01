//! Line-oriented console transport.
//!
//! Incoming lines look like `alice: hello` or `alice[moderator,vip]: hello`.
//! The login doubles as the user id.

use super::{ChatClient, ChatMessage, Sender};

/// Writes bot output to stdout.
#[derive(Debug, Clone)]
pub struct ConsoleChat {
    bot_name: String,
}

impl ConsoleChat {
    /// Creates a console client that prints as `bot_name`.
    #[must_use]
    pub fn new(bot_name: impl Into<String>) -> Self {
        Self {
            bot_name: bot_name.into(),
        }
    }
}

impl ChatClient for ConsoleChat {
    fn say(&self, channel: &str, message: &str) {
        println!("{channel} <{}>: {message}", self.bot_name);
    }
}

/// Parses `login[badge,...]: text`. Returns `None` for anything else.
#[must_use]
pub fn parse_console_line(line: &str) -> Option<ChatMessage> {
    let (head, text) = line.split_once(':')?;
    let head = head.trim();
    let text = text.trim();

    let (login, badges) = match head.split_once('[') {
        Some((login, rest)) => {
            let badges = rest.strip_suffix(']')?;
            (login.trim(), Some(badges))
        }
        None => (head, None),
    };

    if login.is_empty() || login.contains(char::is_whitespace) || text.is_empty() {
        return None;
    }

    let login = login.to_lowercase();
    let mut sender = Sender::new(login.clone(), login);
    if let Some(badges) = badges {
        sender = sender.with_badges(
            badges
                .split(',')
                .map(str::trim)
                .filter(|b| !b.is_empty()),
        );
    }

    Some(ChatMessage::new(sender, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_line() {
        let message = parse_console_line("Alice: hello there").unwrap();
        assert_eq!(message.sender.username, "alice");
        assert_eq!(message.sender.id, "alice");
        assert!(message.sender.badges.is_empty());
        assert_eq!(message.text, "hello there");
    }

    #[test]
    fn test_parse_badges() {
        let message = parse_console_line("streamer[broadcaster, vip]: !nuke buh 5 m").unwrap();
        assert!(message.sender.has_badge("broadcaster"));
        assert!(message.sender.has_badge("vip"));
        assert_eq!(message.text, "!nuke buh 5 m");
    }

    #[test]
    fn test_text_may_contain_colons() {
        let message = parse_console_line("bob: time is 12:30").unwrap();
        assert_eq!(message.text, "time is 12:30");
    }

    #[test]
    fn test_rejects_malformed_lines() {
        assert!(parse_console_line("no separator").is_none());
        assert!(parse_console_line(": text").is_none());
        assert!(parse_console_line("bob:").is_none());
        assert!(parse_console_line("bob[vip: hi").is_none());
        assert!(parse_console_line("two words: hi").is_none());
    }
}
