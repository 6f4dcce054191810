use chess::{BoardView, GameStatus, Move, PieceColor, Plan, PositionId, Square};

/// Complete, immutable snapshot of session state.
/// Sent to subscribers on every state change and on subscribe.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub position_id: PositionId,
    pub fen: String,
    pub board: BoardView,
    pub side_to_move: PieceColor,
    pub human: PieceColor,
    pub status: GameStatus,
    pub selected: Option<Square>,
    pub last_move: Option<Move>,
    /// SAN of every move played so far.
    pub history: Vec<String>,
    /// Current status-bar text.
    pub message: String,
    /// Plan for the current position, once one has arrived.
    pub plan: Option<Plan>,
    pub engine: EngineState,
    pub analysis_pending: bool,
}

/// What the session knows about its engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    Starting,
    Ready { name: String, pid: Option<u32> },
    Unavailable { reason: String },
}
