use std::fmt;

/// Sum type representing every operational failure a bot operation can
/// surface. Each variant carries the underlying cause and is rendered
/// alongside the name of the operation that failed.
///
/// None of these should ever take the process down; the router either shows
/// them to the user or logs and drops them.
#[derive(Debug)]
pub enum BotError {
    OAuth(String),
    SayHello(String),
    HistoryFetch(String),
}

impl BotError {
    /// The name of the operation that failed.
    pub fn unit(&self) -> &'static str {
        match self {
            BotError::OAuth(_) => "oauth",
            BotError::SayHello(_) => "say_hello",
            BotError::HistoryFetch(_) => "fetch_history",
        }
    }

    /// The underlying cause.
    pub fn message(&self) -> &str {
        match self {
            BotError::OAuth(e) | BotError::SayHello(e) | BotError::HistoryFetch(e) => e,
        }
    }
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed due to: {}", self.unit(), self.message())
    }
}
