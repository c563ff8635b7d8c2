//! Decode `sup`-prefixed commands out of channel chatter.

use regex::Regex;

/// Commands users can address to the bot by prefixing a message with `sup `.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    /// Summarise today's activity in the channel the command was given in.
    ReportToday,
}

/// Attempt to decode a command from message text. Ordinary chatter decodes
/// to nothing.
pub fn decode_command(text: &str) -> Option<Command> {
    Regex::new(r"^sup\s+(?P<cmd>\S+)")
        .ok()
        .and_then(|re| re.captures(text))
        .and_then(|cs| cs.name("cmd"))
        .and_then(|m| match m.as_str() {
            "report" => Some(Command::ReportToday),
            _ => None,
        })
}
