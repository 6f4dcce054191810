//! Turns an engine's principal variation into a human-readable plan.

use std::fmt;

use crate::board::Board;
use crate::san::format_san;
use crate::types::Move;

/// Number of plies shown by default.
pub const DEFAULT_PLAN_LENGTH: usize = 5;

/// One ply of a plan, with its SAN in the position it is played from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub mv: Move,
    pub san: String,
}

/// A notated prefix of a principal variation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub moves: Vec<PlannedMove>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// The move suggested for right now.
    pub fn first(&self) -> Option<&PlannedMove> {
        self.moves.first()
    }

    pub fn sans(&self) -> impl Iterator<Item = &str> {
        self.moves.iter().map(|m| m.san.as_str())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.first() else {
            return f.write_str("No clear winning plan.");
        };
        let line: Vec<&str> = self.sans().collect();
        write!(
            f,
            "Next move: {} to {} | Plan: {}",
            first.mv.from,
            first.mv.to,
            line.join(" → ")
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    /// The line stops being legal at this zero-based ply, typically because
    /// it was computed for a position the board has since left.
    #[error("Engine line is not playable from ply {ply}")]
    InvalidPlan { ply: usize },
}

/// Notate up to `max_moves` plies of `pv`, replayed on a copy of `board`.
///
/// Every move is re-validated against the replayed position; the live board
/// is never touched.
pub fn format_plan(board: &Board, pv: &[Move], max_moves: usize) -> Result<Plan, PlanError> {
    let mut preview = board.clone();
    let mut moves = Vec::with_capacity(pv.len().min(max_moves));

    for (ply, &mv) in pv.iter().take(max_moves).enumerate() {
        let san = format_san(&preview, mv).map_err(|_| PlanError::InvalidPlan { ply })?;
        preview
            .apply_move(mv)
            .map_err(|_| PlanError::InvalidPlan { ply })?;
        moves.push(PlannedMove { mv, san });
    }

    Ok(Plan { moves })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::san::parse_san;
    use crate::uci::parse_uci_move;

    fn line(uci: &[&str]) -> Vec<Move> {
        uci.iter().map(|s| parse_uci_move(s).unwrap()).collect()
    }

    #[test]
    fn test_format_plan_from_start() {
        let board = Board::new();
        let pv = line(&["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "a7a6", "b5a4"]);
        let plan = format_plan(&board, &pv, DEFAULT_PLAN_LENGTH).unwrap();
        assert_eq!(plan.sans().collect::<Vec<_>>(), ["e4", "e5", "Nf3", "Nc6", "Bb5"]);
        assert_eq!(
            plan.to_string(),
            "Next move: e2 to e4 | Plan: e4 → e5 → Nf3 → Nc6 → Bb5"
        );
        assert_eq!(board, Board::new(), "live board must not change");
    }

    #[test]
    fn test_empty_pv_is_an_empty_plan() {
        let plan = format_plan(&Board::new(), &[], DEFAULT_PLAN_LENGTH).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.to_string(), "No clear winning plan.");
    }

    #[test]
    fn test_illegal_ply_reports_invalid_plan() {
        let board = Board::new();
        // Second ply is White again: illegal for Black to move.
        let pv = line(&["e2e4", "d2d4"]);
        assert_eq!(
            format_plan(&board, &pv, DEFAULT_PLAN_LENGTH),
            Err(PlanError::InvalidPlan { ply: 1 })
        );
    }

    #[test]
    fn test_stale_line_is_rejected() {
        // Line computed for the start position, replayed after 1. e4.
        let mut board = Board::new();
        board.apply_move(parse_uci_move("e2e4").unwrap()).unwrap();
        let pv = line(&["e2e4", "e7e5"]);
        assert_eq!(
            format_plan(&board, &pv, DEFAULT_PLAN_LENGTH),
            Err(PlanError::InvalidPlan { ply: 0 })
        );
    }

    #[test]
    fn test_illegal_move_past_the_limit_is_ignored() {
        let pv = line(&["e2e4", "e7e5", "a1a8"]);
        let plan = format_plan(&Board::new(), &pv, 2).unwrap();
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_plan_round_trips_through_san() {
        let board =
            Board::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4")
                .unwrap();
        let pv = line(&["h5f7"]);
        let plan = format_plan(&board, &pv, DEFAULT_PLAN_LENGTH).unwrap();
        assert_eq!(plan.sans().collect::<Vec<_>>(), ["Qxf7#"]);

        let pv = line(&["e1g1", "f6e4", "h5e5"]);
        let board =
            Board::from_fen("r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K2R w KQkq - 4 4")
                .unwrap();
        let plan = format_plan(&board, &pv, DEFAULT_PLAN_LENGTH).unwrap();

        let mut direct = board.clone();
        let mut replay = board.clone();
        for (planned, mv) in plan.moves.iter().zip(&pv) {
            let parsed = parse_san(&replay, &planned.san).unwrap();
            assert_eq!(parsed, *mv);
            replay.apply_move(parsed).unwrap();
            direct.apply_move(*mv).unwrap();
            assert_eq!(replay, direct);
        }
    }
}
