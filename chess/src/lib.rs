pub mod board;
pub mod fen;
pub mod game;
pub mod plan;
pub mod san;
pub mod types;
pub mod uci;
pub mod validator;

pub use board::{Board, BoardError, BoardView, CastlingRights, GameStatus, START_FEN};
pub use fen::FenError;
pub use game::{Game, HistoryEntry, PositionId, StartPosition};
pub use plan::{format_plan, Plan, PlanError, PlannedMove, DEFAULT_PLAN_LENGTH};
pub use san::{format_san, parse_san, SanError};
pub use types::{Move, ParseSquareError, Piece, PieceColor, PieceKind, Square};
pub use uci::{format_uci_move, parse_uci_move, UciMoveError};
pub use validator::{is_legal, resolve_move};
