use chess::{Move, Piece, Square};
use tokio::sync::{broadcast, oneshot};

use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Illegal move: {0}")]
    IllegalMove(Move),
    #[error("No square selected")]
    NoSelection,
    #[error("No piece of the side to move on {0}")]
    InvalidSelection(Square),
    #[error("Game is over")]
    GameOver,
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A piece picked up and waiting for its destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub square: Square,
    pub piece: Piece,
    /// Squares the piece can legally move to.
    pub targets: Vec<Square>,
}

/// A move accepted by the session.
#[derive(Debug, Clone)]
pub struct Applied {
    pub mv: Move,
    pub san: String,
    pub snapshot: SessionSnapshot,
}

/// What a single click did.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum ClickOutcome {
    Selected(Selection),
    Moved(Applied),
    /// Nothing to pick up on that square.
    Ignored,
}

/// Commands sent to the session actor. Each embeds a oneshot for the reply.
pub enum SessionCommand {
    SelectSquare {
        square: Square,
        reply: oneshot::Sender<Result<Selection, SessionError>>,
    },
    MoveTo {
        square: Square,
        reply: oneshot::Sender<Result<Applied, SessionError>>,
    },
    Click {
        square: Square,
        reply: oneshot::Sender<Result<ClickOutcome, SessionError>>,
    },
    MakeMove {
        mv: Move,
        reply: oneshot::Sender<Result<Applied, SessionError>>,
    },
    GetSnapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    Subscribe {
        reply: oneshot::Sender<(SessionSnapshot, broadcast::Receiver<SessionEvent>)>,
    },
    /// Answered once the engine process has been released.
    Shutdown { reply: oneshot::Sender<()> },
}
