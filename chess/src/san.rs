//! Standard Algebraic Notation.

use crate::board::{Board, GameStatus};
use crate::types::{Move, PieceKind};

/// Format a legal move as SAN ("Nf3", "exd5", "O-O", "e8=Q#").
pub fn format_san(board: &Board, mv: Move) -> Result<String, SanError> {
    let legal = board.legal_moves();
    if !legal.contains(&mv) {
        return Err(SanError::IllegalMove(mv.to_string()));
    }
    let piece = board
        .piece_at(mv.from)
        .ok_or_else(|| SanError::IllegalMove(mv.to_string()))?;

    let mut san = String::new();

    if board.is_castling(mv) {
        san.push_str(if mv.to.file() > mv.from.file() {
            "O-O"
        } else {
            "O-O-O"
        });
    } else {
        let capture = board.is_capture(mv);

        if piece.kind == PieceKind::Pawn {
            if capture {
                san.push(mv.from.file_char());
            }
        } else {
            san.push(piece.kind.to_char_upper());
            san.push_str(&disambiguation(board, &legal, mv, piece.kind));
        }

        if capture {
            san.push('x');
        }
        san.push_str(&mv.to.to_string());

        if let Some(promo) = mv.promotion {
            san.push('=');
            san.push(promo.to_char_upper());
        }
    }

    let mut after = board.clone();
    after
        .apply_move(mv)
        .map_err(|_| SanError::IllegalMove(mv.to_string()))?;
    match after.status() {
        GameStatus::Checkmate { .. } => san.push('#'),
        _ if after.in_check() => san.push('+'),
        _ => {}
    }

    Ok(san)
}

/// Origin hint needed when another piece of the same kind can reach the
/// same square: file if that is enough, else rank, else both.
fn disambiguation(board: &Board, legal: &[Move], mv: Move, kind: PieceKind) -> String {
    let rivals: Vec<Move> = legal
        .iter()
        .copied()
        .filter(|other| {
            other.to == mv.to
                && other.from != mv.from
                && board.piece_at(other.from).map(|p| p.kind) == Some(kind)
        })
        .collect();

    if rivals.is_empty() {
        return String::new();
    }
    if rivals.iter().all(|r| r.from.file() != mv.from.file()) {
        return mv.from.file_char().to_string();
    }
    if rivals.iter().all(|r| r.from.rank() != mv.from.rank()) {
        return mv.from.rank_char().to_string();
    }
    mv.from.to_string()
}

/// Parse a SAN move against `board`.
///
/// Matches the input against the SAN of every legal move, ignoring check
/// marks and annotation glyphs, so anything [`format_san`] emits parses back.
pub fn parse_san(board: &Board, san: &str) -> Result<Move, SanError> {
    let wanted = normalize(san);
    if wanted.is_empty() {
        return Err(SanError::InvalidFormat(san.to_string()));
    }

    let mut found = None;
    for mv in board.legal_moves() {
        let candidate = format_san(board, mv)?;
        if normalize(&candidate) == wanted {
            if found.is_some() {
                return Err(SanError::AmbiguousMove(san.to_string()));
            }
            found = Some(mv);
        }
    }

    found.ok_or_else(|| SanError::NoLegalMove(san.to_string()))
}

fn normalize(san: &str) -> String {
    san.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .replace('0', "O")
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanError {
    #[error("Move is not legal here: {0}")]
    IllegalMove(String),
    #[error("No legal move found for: {0}")]
    NoLegalMove(String),
    #[error("Ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}
