//! Rules-correct board model backed by cozy-chess.
//!
//! cozy-chess encodes castling as "king captures own rook" (`e1h1`). The
//! public API speaks only the UCI form (`e1g1`) and translates at this
//! boundary, so callers never see the library's convention.

use std::fmt;

use crate::types::{Move, Piece, PieceColor, PieceKind, Square};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Full position: occupancy, side to move, castling rights, en-passant
/// target and move counters.
#[derive(Debug, Clone)]
pub struct Board {
    inner: cozy_chess::Board,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CastlingRights {
    pub white_short: bool,
    pub white_long: bool,
    pub black_short: bool,
    pub black_long: bool,
}

/// Outcome of the position for the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Ongoing,
    Checkmate { winner: PieceColor },
    Stalemate,
}

impl GameStatus {
    pub fn is_over(self) -> bool {
        !matches!(self, GameStatus::Ongoing)
    }
}

/// Read-only picture of the board for output adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub squares: [Option<Piece>; 64],
    pub side_to_move: PieceColor,
    pub in_check: bool,
}

impl BoardView {
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index() as usize]
    }
}

impl Board {
    /// Standard starting position.
    pub fn new() -> Self {
        Self {
            inner: cozy_chess::Board::default(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, BoardError> {
        let inner = crate::fen::parse_fen(fen)?;
        Ok(Self { inner })
    }

    pub fn to_fen(&self) -> String {
        crate::fen::format_fen(&self.inner)
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let sq = square.to_cozy();
        let kind = self.inner.piece_on(sq)?;
        let color = self.inner.color_on(sq)?;
        Some(Piece::new(kind.into(), color.into()))
    }

    pub fn side_to_move(&self) -> PieceColor {
        self.inner.side_to_move().into()
    }

    pub fn castling_rights(&self) -> CastlingRights {
        let white = self.inner.castle_rights(cozy_chess::Color::White);
        let black = self.inner.castle_rights(cozy_chess::Color::Black);
        CastlingRights {
            white_short: white.short.is_some(),
            white_long: white.long.is_some(),
            black_short: black.short.is_some(),
            black_long: black.long.is_some(),
        }
    }

    /// Square a pawn may capture onto en passant, if any.
    pub fn en_passant(&self) -> Option<Square> {
        let file = self.inner.en_passant()? as u8;
        let rank = match self.side_to_move() {
            PieceColor::White => 5,
            PieceColor::Black => 2,
        };
        Square::new(file, rank)
    }

    pub fn halfmove_clock(&self) -> u8 {
        self.inner.halfmove_clock()
    }

    pub fn fullmove_number(&self) -> u16 {
        self.inner.fullmove_number()
    }

    pub fn in_check(&self) -> bool {
        !self.inner.checkers().is_empty()
    }

    /// Every legal move for the side to move.
    pub fn legal_moves(&self) -> Vec<Move> {
        let mut moves = Vec::new();
        self.inner.generate_moves(|mvs| {
            moves.extend(mvs.into_iter().map(|mv| self.from_cozy_move(mv)));
            false
        });
        moves
    }

    /// Play `mv` if it is in [`Board::legal_moves`]. The board is left
    /// untouched on error.
    pub fn apply_move(&mut self, mv: Move) -> Result<(), BoardError> {
        if !self.legal_moves().contains(&mv) {
            return Err(BoardError::IllegalMove(mv));
        }
        let cozy = self.to_cozy_move(mv);
        self.inner.play_unchecked(cozy);
        Ok(())
    }

    /// The fifty-move rule only entitles a player to claim a draw, so a
    /// position with legal moves stays [`GameStatus::Ongoing`] however high
    /// the halfmove clock; see [`Board::can_claim_fifty_move_draw`].
    pub fn status(&self) -> GameStatus {
        match self.inner.status() {
            cozy_chess::GameStatus::Won => GameStatus::Checkmate {
                winner: self.side_to_move().opposite(),
            },
            cozy_chess::GameStatus::Drawn if !self.has_legal_move() => GameStatus::Stalemate,
            cozy_chess::GameStatus::Ongoing | cozy_chess::GameStatus::Drawn => GameStatus::Ongoing,
        }
    }

    /// Fifty moves by each side without a capture or pawn move.
    pub fn can_claim_fifty_move_draw(&self) -> bool {
        self.halfmove_clock() >= 100 && self.has_legal_move()
    }

    pub fn view(&self) -> BoardView {
        let mut squares = [None; 64];
        for sq in Square::all() {
            squares[sq.index() as usize] = self.piece_at(sq);
        }
        BoardView {
            squares,
            side_to_move: self.side_to_move(),
            in_check: self.in_check(),
        }
    }

    /// Whether `mv` is a king's two-file castling step.
    pub fn is_castling(&self, mv: Move) -> bool {
        self.piece_at(mv.from).is_some_and(|p| p.kind == PieceKind::King)
            && mv.from.rank() == mv.to.rank()
            && mv.from.file().abs_diff(mv.to.file()) == 2
    }

    /// Whether `mv` captures, including en passant.
    pub fn is_capture(&self, mv: Move) -> bool {
        if self.is_castling(mv) {
            return false;
        }
        if self.piece_at(mv.to).is_some() {
            return true;
        }
        self.piece_at(mv.from)
            .is_some_and(|p| p.kind == PieceKind::Pawn)
            && mv.from.file() != mv.to.file()
    }

    fn has_legal_move(&self) -> bool {
        self.inner.generate_moves(|_| true)
    }

    /// `e1g1` -> `e1h1` (or wherever the castling rook stands).
    fn to_cozy_move(&self, mv: Move) -> cozy_chess::Move {
        let from = mv.from.to_cozy();
        let mut to = mv.to.to_cozy();

        let own = self.inner.side_to_move();
        let is_own_king = self.inner.piece_on(from) == Some(cozy_chess::Piece::King)
            && self.inner.color_on(from) == Some(own);
        let two_files = mv.from.rank() == mv.to.rank() && mv.from.file().abs_diff(mv.to.file()) == 2;

        if is_own_king && two_files && mv.promotion.is_none() {
            let rights = self.inner.castle_rights(own);
            let rook_file = if mv.to.file() > mv.from.file() {
                rights.short
            } else {
                rights.long
            };
            if let Some(file) = rook_file {
                to = cozy_chess::Square::new(file, from.rank());
            }
        }

        cozy_chess::Move {
            from,
            to,
            promotion: mv.promotion.map(Into::into),
        }
    }

    /// `e1h1` -> `e1g1`.
    fn from_cozy_move(&self, mv: cozy_chess::Move) -> Move {
        let from = Square::from_cozy(mv.from);
        let mut to = Square::from_cozy(mv.to);

        let own = self.inner.side_to_move();
        if self.inner.piece_on(mv.from) == Some(cozy_chess::Piece::King)
            && self.inner.color_on(mv.to) == Some(own)
        {
            let file = if to.file() > from.file() { 6 } else { 2 };
            if let Some(sq) = Square::new(file, from.rank()) {
                to = sq;
            }
        }

        Move {
            from,
            to,
            promotion: mv.promotion.map(Into::into),
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.to_fen() == other.to_fen()
    }
}

impl Eq for Board {}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_fen())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("Illegal move: {0}")]
    IllegalMove(Move),
    #[error("FEN parse error: {0}")]
    InvalidFen(#[from] crate::fen::FenError),
}
