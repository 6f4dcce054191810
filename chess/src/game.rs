use crate::board::{Board, BoardError, GameStatus};
use crate::san::format_san;
use crate::types::{Move, Piece, PieceColor};

/// Identity of a position within one game: bumped on every applied move.
///
/// Two boards can repeat a position (e.g. knights shuffling back and forth),
/// so a content hash is not enough to tell a stale analysis from a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct PositionId(u64);

impl PositionId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for PositionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Main game state wrapper around [`Board`]
///
/// The side to move lives only in the board; there is no separate turn flag.
#[derive(Debug, Clone)]
pub struct Game {
    position: Board,
    history: Vec<HistoryEntry>,
    version: u64,
    start_position: StartPosition,
}

/// A move as it was played
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub mv: Move,
    pub piece: Piece,
    pub captured: Option<Piece>,
    pub san: String,
    pub fen: String,
}

/// Starting position of the game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartPosition {
    Standard,
    Fen(String),
}

impl Game {
    /// Create a new game from the standard starting position
    pub fn new() -> Self {
        Self {
            position: Board::new(),
            history: Vec::new(),
            version: 0,
            start_position: StartPosition::Standard,
        }
    }

    /// Create a game from a FEN string
    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let position = Board::from_fen(fen)?;
        Ok(Self {
            position,
            history: Vec::new(),
            version: 0,
            start_position: StartPosition::Fen(fen.to_string()),
        })
    }

    /// Get the current board position
    pub fn position(&self) -> &Board {
        &self.position
    }

    pub fn position_id(&self) -> PositionId {
        PositionId(self.version)
    }

    pub fn start_position(&self) -> &StartPosition {
        &self.start_position
    }

    /// Get the move history
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Make a move on the board
    pub fn make_move(&mut self, mv: Move) -> Result<HistoryEntry, BoardError> {
        let piece = self
            .position
            .piece_at(mv.from)
            .ok_or(BoardError::IllegalMove(mv))?;
        let captured = if self.position.is_castling(mv) {
            None
        } else {
            self.position.piece_at(mv.to)
        };

        // SAN must be generated before the move is played
        let san = format_san(&self.position, mv).map_err(|_| BoardError::IllegalMove(mv))?;

        self.position.apply_move(mv)?;
        self.version += 1;

        let entry = HistoryEntry {
            mv,
            piece,
            captured,
            san,
            fen: self.position.to_fen(),
        };
        self.history.push(entry.clone());

        Ok(entry)
    }

    /// Get all legal moves for the current position
    pub fn legal_moves(&self) -> Vec<Move> {
        self.position.legal_moves()
    }

    /// Get the current game status
    pub fn status(&self) -> GameStatus {
        self.position.status()
    }

    /// Get the side to move
    pub fn side_to_move(&self) -> PieceColor {
        self.position.side_to_move()
    }

    /// Export position to FEN string
    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PieceKind;
    use crate::uci::parse_uci_move;

    fn play(game: &mut Game, uci: &str) -> HistoryEntry {
        game.make_move(parse_uci_move(uci).unwrap()).unwrap()
    }

    #[test]
    fn test_turn_follows_the_board() {
        let mut game = Game::new();
        assert_eq!(game.side_to_move(), PieceColor::White);
        play(&mut game, "e2e4");
        assert_eq!(game.side_to_move(), PieceColor::Black);
        play(&mut game, "e7e5");
        assert_eq!(game.side_to_move(), PieceColor::White);
        assert_eq!(game.history().len(), 2);
    }

    #[test]
    fn test_position_id_bumps_only_on_success() {
        let mut game = Game::new();
        let start = game.position_id();
        assert!(game.make_move(parse_uci_move("e2e5").unwrap()).is_err());
        assert_eq!(game.position_id(), start);

        play(&mut game, "g1f3");
        play(&mut game, "g8f6");
        play(&mut game, "f3g1");
        play(&mut game, "f6g8");
        // Same placement as the start, but a later position in the game.
        assert!(game.position_id() > start);
        assert_eq!(game.position_id().value(), 4);
    }

    #[test]
    fn test_history_records_san_and_capture() {
        let mut game = Game::new();
        play(&mut game, "e2e4");
        play(&mut game, "d7d5");
        let entry = play(&mut game, "e4d5");
        assert_eq!(entry.san, "exd5");
        assert_eq!(entry.piece.kind, PieceKind::Pawn);
        assert_eq!(entry.captured.map(|p| p.kind), Some(PieceKind::Pawn));
        assert_eq!(entry.fen, game.to_fen());
    }

    #[test]
    fn test_fools_mate_ends_game() {
        let mut game = Game::new();
        play(&mut game, "f2f3");
        play(&mut game, "e7e5");
        play(&mut game, "g2g4");
        let entry = play(&mut game, "d8h4");
        assert_eq!(entry.san, "Qh4#");
        assert_eq!(
            game.status(),
            GameStatus::Checkmate {
                winner: PieceColor::Black
            }
        );
        assert!(game.legal_moves().is_empty());
    }

    #[test]
    fn test_from_fen_records_start_position() {
        let fen = "4k3/8/8/8/8/8/8/4K2R w K - 0 1";
        let game = Game::from_fen(fen).unwrap();
        assert_eq!(game.start_position(), &StartPosition::Fen(fen.to_string()));
        assert_eq!(game.to_fen(), fen);
        assert!(Game::from_fen("garbage").is_err());
    }
}
