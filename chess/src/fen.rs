use cozy_chess::Board;

/// Parse a FEN string into a cozy-chess board.
///
/// cozy-chess validates the position while parsing: one king per side, no
/// pawns on the back ranks, consistent castling and en-passant fields.
pub(crate) fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let fen = fen.trim();
    if fen.split_whitespace().count() != 6 {
        return Err(FenError::InvalidFormat(fen.to_string()));
    }

    fen.parse()
        .map_err(|_| FenError::InvalidBoardLayout(fen.to_string()))
}

/// Format a board as a FEN string.
pub(crate) fn format_fen(board: &Board) -> String {
    board.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FenError {
    #[error("Invalid FEN format: {0}")]
    InvalidFormat(String),
    #[error("Invalid board layout: {0}")]
    InvalidBoardLayout(String),
}
