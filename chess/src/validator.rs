//! Pure legality checks used by the input path and by plan replay.

use crate::board::Board;
use crate::types::{Move, PieceKind, Square};

/// Whether `mv` is in the legal-move set of `board`.
pub fn is_legal(board: &Board, mv: Move) -> bool {
    board.legal_moves().contains(&mv)
}

/// Turn a `(from, to)` click pair into a legal move.
///
/// A pawn reaching the last rank promotes to a queen, since a click pair
/// carries no promotion choice.
pub fn resolve_move(board: &Board, from: Square, to: Square) -> Option<Move> {
    let legal = board.legal_moves();
    let plain = Move::new(from, to);
    if legal.contains(&plain) {
        return Some(plain);
    }
    let queen = Move::with_promotion(from, to, PieceKind::Queen);
    legal.contains(&queen).then_some(queen)
}
