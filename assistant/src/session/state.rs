use chess::{
    format_plan, resolve_move, Game, GameStatus, Move, PieceColor, Plan, PositionId, Square,
};
use engine::{AnalysisResult, EngineError};

use super::analyst::AnalysisRequest;
use super::commands::{Applied, Selection, SessionError};
use super::snapshot::{EngineState, SessionSnapshot};
use crate::AssistantConfig;

pub(crate) const ILLEGAL_MOVE: &str = "Illegal move. Try again.";
pub(crate) const NO_PLAN: &str = "No clear winning plan.";
pub(crate) const INVALID_LINE: &str = "Engine suggested an invalid line. Plan not available.";
const FIFTY_MOVE_CLAIM: &str = ". A draw may be claimed under the fifty-move rule.";

/// Internal mutable state, owned entirely by the session actor. No locks.
pub(crate) struct SessionState {
    pub game: Game,
    pub human: PieceColor,
    pub depth: u32,
    pub plan_length: usize,
    pub selection: Option<Square>,
    pub message: String,
    pub plan: Option<Plan>,
    pub engine: EngineState,
    /// Position the outstanding analysis request was issued for.
    pub pending: Option<PositionId>,
}

impl SessionState {
    pub fn new(game: Game, config: &AssistantConfig) -> Self {
        let mut state = Self {
            game,
            human: config.human,
            depth: config.depth.max(1),
            plan_length: config.plan_length,
            selection: None,
            message: String::new(),
            plan: None,
            engine: EngineState::Starting,
            pending: None,
        };
        state.message = state.turn_message();
        state
    }

    /// Build a full snapshot of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let position = self.game.position();
        SessionSnapshot {
            position_id: self.game.position_id(),
            fen: self.game.to_fen(),
            board: position.view(),
            side_to_move: self.game.side_to_move(),
            human: self.human,
            status: self.game.status(),
            selected: self.selection,
            last_move: self.game.history().last().map(|entry| entry.mv),
            history: self
                .game
                .history()
                .iter()
                .map(|entry| entry.san.clone())
                .collect(),
            message: self.message.clone(),
            plan: self.plan.clone(),
            engine: self.engine.clone(),
            analysis_pending: self.pending.is_some(),
        }
    }

    /// Pick up the piece on `square` if it belongs to the side to move.
    pub fn select(&mut self, square: Square) -> Result<Selection, SessionError> {
        self.ensure_ongoing()?;
        let piece = self
            .game
            .position()
            .piece_at(square)
            .filter(|piece| piece.color == self.game.side_to_move())
            .ok_or(SessionError::InvalidSelection(square))?;

        let targets = self
            .game
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.from == square)
            .map(|mv| mv.to)
            .fold(Vec::new(), |mut acc, to| {
                if !acc.contains(&to) {
                    acc.push(to);
                }
                acc
            });

        self.selection = Some(square);
        self.message = format!("Selected {}. Click destination square.", square);
        Ok(Selection {
            square,
            piece,
            targets,
        })
    }

    /// Move the selected piece to `square`. The selection is consumed either way.
    pub fn move_selected(&mut self, square: Square) -> Result<Applied, SessionError> {
        self.ensure_ongoing()?;
        let from = self.selection.take().ok_or(SessionError::NoSelection)?;
        let mv = resolve_move(self.game.position(), from, square)
            .ok_or_else(|| self.reject(Move::new(from, square)))?;
        self.apply(mv)
    }

    /// Play a fully specified move, as typed in long algebraic form.
    pub fn play(&mut self, mv: Move) -> Result<Applied, SessionError> {
        self.ensure_ongoing()?;
        self.selection = None;
        let mv = if mv.promotion.is_none() {
            resolve_move(self.game.position(), mv.from, mv.to).unwrap_or(mv)
        } else {
            mv
        };
        self.apply(mv)
    }

    fn apply(&mut self, mv: Move) -> Result<Applied, SessionError> {
        let entry = match self.game.make_move(mv) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Rejected {}: {}", mv, e);
                return Err(self.reject(mv));
            }
        };
        tracing::info!("Played {} ({})", entry.san, mv);

        self.plan = None;
        self.message = self.turn_message();
        Ok(Applied {
            mv,
            san: entry.san,
            snapshot: self.snapshot(),
        })
    }

    fn reject(&mut self, mv: Move) -> SessionError {
        self.selection = None;
        self.message = ILLEGAL_MOVE.to_string();
        SessionError::IllegalMove(mv)
    }

    fn ensure_ongoing(&self) -> Result<(), SessionError> {
        if self.game.status().is_over() {
            return Err(SessionError::GameOver);
        }
        Ok(())
    }

    /// Whether the position now calls for a suggestion.
    pub fn wants_analysis(&self) -> bool {
        matches!(self.engine, EngineState::Starting | EngineState::Ready { .. })
            && self.game.side_to_move() == self.human
            && !self.game.status().is_over()
    }

    /// Record a new outstanding request for the live position.
    pub fn analysis_request(&mut self) -> AnalysisRequest {
        let position_id = self.game.position_id();
        self.pending = Some(position_id);
        AnalysisRequest {
            position_id,
            position: self.game.position().clone(),
            depth: self.depth,
        }
    }

    /// Whether a reply tagged `position_id` still describes the live board.
    pub fn is_current(&self, position_id: PositionId) -> bool {
        self.pending == Some(position_id) && self.game.position_id() == position_id
    }

    /// Turn an engine reply for the live position into a plan or a status line.
    pub fn accept_analysis(
        &mut self,
        result: Result<AnalysisResult, EngineError>,
    ) -> Option<Plan> {
        self.pending = None;
        let analysis = match result {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::warn!("Analysis failed: {}", e);
                self.message = format!("No plan available: {}", e);
                return None;
            }
        };

        match format_plan(
            self.game.position(),
            &analysis.principal_variation,
            self.plan_length,
        ) {
            Ok(plan) if plan.is_empty() => {
                self.message = NO_PLAN.to_string();
                None
            }
            Ok(plan) => {
                tracing::info!(
                    "Plan at depth {:?} ({}): {}",
                    analysis.depth,
                    analysis
                        .score
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "no score".to_string()),
                    plan
                );
                self.message = plan.to_string();
                self.plan = Some(plan.clone());
                Some(plan)
            }
            Err(e) => {
                tracing::warn!("Discarding engine line: {}", e);
                self.message = INVALID_LINE.to_string();
                None
            }
        }
    }

    pub fn engine_unavailable(&mut self, reason: String) {
        self.pending = None;
        self.message = format!(
            "Engine unavailable: {}. Playing without suggestions.",
            reason
        );
        self.engine = EngineState::Unavailable { reason };
    }

    fn turn_message(&self) -> String {
        match self.game.status() {
            GameStatus::Checkmate { winner } => {
                format!("Checkmate. {} wins.", color_name(winner))
            }
            GameStatus::Stalemate => "Stalemate.".to_string(),
            GameStatus::Ongoing => {
                let side = self.game.side_to_move();
                let mut message = if side == self.human {
                    format!("Your move ({})", color_name(side))
                } else {
                    format!("{}'s move (your friend's move)", color_name(side))
                };
                if self.game.position().can_claim_fifty_move_draw() {
                    message.push_str(FIFTY_MOVE_CLAIM);
                }
                message
            }
        }
    }
}

fn color_name(color: PieceColor) -> &'static str {
    match color {
        PieceColor::White => "White",
        PieceColor::Black => "Black",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess::{parse_uci_move, PieceKind};

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn state() -> SessionState {
        SessionState::new(Game::new(), &AssistantConfig::default())
    }

    fn line(uci: &[&str]) -> AnalysisResult {
        AnalysisResult {
            principal_variation: uci.iter().map(|m| parse_uci_move(m).unwrap()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_initial_message() {
        let state = state();
        assert_eq!(state.message, "Your move (White)");
        assert!(state.wants_analysis());
        assert!(state.pending.is_none());
    }

    #[test]
    fn test_select_own_piece_lists_targets() {
        let mut state = state();
        let selection = state.select(sq("g1")).unwrap();
        assert_eq!(selection.piece.kind, PieceKind::Knight);
        assert_eq!(selection.targets.len(), 2);
        assert!(selection.targets.contains(&sq("f3")));
        assert!(selection.targets.contains(&sq("h3")));
        assert_eq!(state.selection, Some(sq("g1")));
        assert_eq!(state.message, "Selected g1. Click destination square.");
    }

    #[test]
    fn test_select_rejects_empty_and_opponent_squares() {
        let mut state = state();
        assert_eq!(
            state.select(sq("e4")),
            Err(SessionError::InvalidSelection(sq("e4")))
        );
        assert_eq!(
            state.select(sq("e7")),
            Err(SessionError::InvalidSelection(sq("e7")))
        );
        assert!(state.selection.is_none());
    }

    #[test]
    fn test_illegal_destination_clears_selection() {
        let mut state = state();
        state.select(sq("e2")).unwrap();
        assert_eq!(
            state.move_selected(sq("e5")).unwrap_err(),
            SessionError::IllegalMove(Move::new(sq("e2"), sq("e5")))
        );
        assert!(state.selection.is_none());
        assert_eq!(state.message, ILLEGAL_MOVE);
        assert_eq!(state.move_selected(sq("e4")).unwrap_err(), SessionError::NoSelection);
    }

    #[test]
    fn test_move_flips_turn_and_message() {
        let mut state = state();
        state.select(sq("e2")).unwrap();
        let applied = state.move_selected(sq("e4")).unwrap();
        assert_eq!(applied.san, "e4");
        assert_eq!(applied.snapshot.side_to_move, PieceColor::Black);
        assert_eq!(state.message, "Black's move (your friend's move)");
        assert!(!state.wants_analysis());

        state.play(parse_uci_move("e7e5").unwrap()).unwrap();
        assert_eq!(state.message, "Your move (White)");
        assert!(state.wants_analysis());
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let game = Game::from_fen("8/P7/8/8/8/8/8/4K2k w - - 0 1").unwrap();
        let mut state = SessionState::new(game, &AssistantConfig::default());
        state.select(sq("a7")).unwrap();
        let applied = state.move_selected(sq("a8")).unwrap();
        assert_eq!(applied.mv.promotion, Some(PieceKind::Queen));
        assert_eq!(applied.san, "a8=Q");
    }

    #[test]
    fn test_game_over_rejects_input() {
        let game =
            Game::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        let mut state = SessionState::new(game, &AssistantConfig::default());
        assert_eq!(state.message, "Checkmate. Black wins.");
        assert!(!state.wants_analysis());
        assert_eq!(state.select(sq("e2")), Err(SessionError::GameOver));
        assert!(matches!(
            state.play(parse_uci_move("a2a3").unwrap()),
            Err(SessionError::GameOver)
        ));
    }

    #[test]
    fn test_fifty_move_rule_keeps_game_playable() {
        let game = Game::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 100 80").unwrap();
        let mut state = SessionState::new(game, &AssistantConfig::default());
        assert_eq!(
            state.message,
            "Your move (White). A draw may be claimed under the fifty-move rule."
        );
        assert!(state.wants_analysis());

        let applied = state.play(parse_uci_move("a1a7").unwrap()).unwrap();
        assert_eq!(applied.snapshot.status, GameStatus::Ongoing);
        assert_eq!(
            state.message,
            "Black's move (your friend's move). A draw may be claimed under the fifty-move rule."
        );
        state.select(sq("e8")).unwrap();
        state.move_selected(sq("f8")).unwrap();
        assert!(state.wants_analysis());
    }

    #[test]
    fn test_stale_tag_is_not_current() {
        let mut state = state();
        let request = state.analysis_request();
        assert!(state.is_current(request.position_id));

        state.play(parse_uci_move("e2e4").unwrap()).unwrap();
        assert!(!state.is_current(request.position_id));
    }

    #[test]
    fn test_accept_analysis_formats_plan() {
        let mut state = state();
        state.analysis_request();
        let plan = state
            .accept_analysis(Ok(line(&["e2e4", "e7e5", "g1f3"])))
            .unwrap();
        assert_eq!(plan.sans().collect::<Vec<_>>(), ["e4", "e5", "Nf3"]);
        assert_eq!(state.message, "Next move: e2 to e4 | Plan: e4 → e5 → Nf3");
        assert!(state.pending.is_none());
        assert_eq!(state.plan, Some(plan));
    }

    #[test]
    fn test_accept_analysis_status_lines() {
        let mut state = state();
        assert!(state.accept_analysis(Ok(line(&[]))).is_none());
        assert_eq!(state.message, NO_PLAN);

        assert!(state.accept_analysis(Ok(line(&["e7e5"]))).is_none());
        assert_eq!(state.message, INVALID_LINE);

        let timeout = std::time::Duration::from_secs(30);
        assert!(state
            .accept_analysis(Err(EngineError::Timeout(timeout)))
            .is_none());
        assert!(state.message.starts_with("No plan available: "));
    }

    #[test]
    fn test_unavailable_engine_stops_requests() {
        let mut state = state();
        state.engine_unavailable("no engine path configured".to_string());
        assert!(!state.wants_analysis());
        assert_eq!(
            state.message,
            "Engine unavailable: no engine path configured. Playing without suggestions."
        );
    }
}
