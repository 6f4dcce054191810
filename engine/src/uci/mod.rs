pub mod parser;

pub use parser::{parse_uci_message, UciMessage};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UciError {
    #[error("Malformed UCI message: {0}")]
    MalformedMessage(String),
    #[error("Unknown UCI message: {0}")]
    UnknownMessage(String),
    #[error("Invalid move in {line:?}: {source}")]
    InvalidMove {
        line: String,
        #[source]
        source: chess::UciMoveError,
    },
}

impl UciError {
    /// The engine line that failed to parse.
    pub fn line(&self) -> &str {
        match self {
            UciError::MalformedMessage(line) | UciError::UnknownMessage(line) => line,
            UciError::InvalidMove { line, .. } => line,
        }
    }

    /// A `bestmove` that could not be parsed still ends the search.
    pub fn is_bestmove(&self) -> bool {
        self.line().split_whitespace().next() == Some("bestmove")
    }
}
