//! UCI (Universal Chess Interface) move notation

use crate::types::{Move, PieceKind, Square};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UciMoveError {
    #[error("Invalid move: {0}")]
    InvalidMove(String),
    #[error("Invalid square: {0}")]
    InvalidSquare(String),
    #[error("Invalid promotion: {0}")]
    InvalidPromotion(String),
}

/// Format a move in UCI notation (e.g., "e2e4", "e7e8q")
pub fn format_uci_move(mv: Move) -> String {
    let mut s = format!("{}{}", mv.from, mv.to);
    if let Some(promo) = mv.promotion {
        s.push(promo.to_char_lower());
    }
    s
}

/// Parse UCI move format (e2e4, e7e8q).
///
/// Only the notation is checked here; legality is the board's business.
pub fn parse_uci_move(s: &str) -> Result<Move, UciMoveError> {
    if !s.is_ascii() || !(4..=5).contains(&s.len()) {
        return Err(UciMoveError::InvalidMove(s.to_string()));
    }

    let from: Square = s[0..2]
        .parse()
        .map_err(|_| UciMoveError::InvalidSquare(s[0..2].to_string()))?;
    let to: Square = s[2..4]
        .parse()
        .map_err(|_| UciMoveError::InvalidSquare(s[2..4].to_string()))?;

    let promotion = match s.chars().nth(4) {
        None => None,
        Some(c) => match PieceKind::from_char(c) {
            Some(kind @ (PieceKind::Queen | PieceKind::Rook | PieceKind::Bishop | PieceKind::Knight))
                if c.is_ascii_lowercase() =>
            {
                Some(kind)
            }
            _ => return Err(UciMoveError::InvalidPromotion(s.to_string())),
        },
    };

    Ok(Move {
        from,
        to,
        promotion,
    })
}
