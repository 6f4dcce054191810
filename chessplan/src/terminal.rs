//! Text front-end: typed squares in, ASCII board and status lines out.

use assistant::SessionSnapshot;
use chess::{parse_uci_move, BoardView, Move, Plan, Square};

pub const HELP: &str = "\
Commands:
  e2        select the piece on e2, or move the selected piece there
  e2e4      play a move directly (e7e8q to under-promote)
  e2 e4     same as e2e4
  fen       print the current position
  help      show this message
  quit      leave the game";

/// One line of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input {
    Empty,
    Square(Square),
    Move(Move),
    Fen,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Unrecognised input '{0}'. Type 'help' for commands.")]
    Unrecognised(String),
}

pub fn parse_input(line: &str) -> Result<Input, InputError> {
    let line = line.trim().to_ascii_lowercase();
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.as_slice() {
        [] => Ok(Input::Empty),
        ["quit" | "exit" | "q"] => Ok(Input::Quit),
        ["help" | "?"] => Ok(Input::Help),
        ["fen"] => Ok(Input::Fen),
        [square] if square.len() == 2 => square
            .parse()
            .map(Input::Square)
            .map_err(|_| InputError::Unrecognised(line.clone())),
        [mv] => parse_uci_move(mv)
            .map(Input::Move)
            .map_err(|_| InputError::Unrecognised(line.clone())),
        [from, to] => parse_uci_move(&format!("{}{}", from, to))
            .map(Input::Move)
            .map_err(|_| InputError::Unrecognised(line.clone())),
        _ => Err(InputError::Unrecognised(line.clone())),
    }
}

/// Draw the board with White at the bottom. The selected square is bracketed
/// and the squares of the last move are marked with parentheses.
pub fn render_board(view: &BoardView, selected: Option<Square>, last_move: Option<Move>) -> String {
    let mut out = String::new();
    for rank in (0..8u8).rev() {
        out.push_str(&format!("{} ", rank + 1));
        for file in 0..8u8 {
            let Some(square) = Square::new(file, rank) else {
                continue;
            };
            let symbol = view.piece_at(square).map_or('.', |piece| piece.symbol());
            let (open, close) = if selected == Some(square) {
                ('[', ']')
            } else if last_move.is_some_and(|mv| mv.from == square || mv.to == square) {
                ('(', ')')
            } else {
                (' ', ' ')
            };
            out.push(open);
            out.push(symbol);
            out.push(close);
        }
        out.push('\n');
    }
    out.push_str("   a  b  c  d  e  f  g  h\n");
    out
}

/// Numbered SAN list for the console, one move per line.
pub fn render_plan(plan: &Plan) -> String {
    let mut out = String::from("Plan:\n");
    for (i, san) in plan.sans().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, san));
    }
    out
}

/// Board, move list and check warning. Status lines arrive as their own
/// events, so a redraw leaves them out.
pub fn render_frame(snapshot: &SessionSnapshot) -> String {
    let mut out = render_board(&snapshot.board, snapshot.selected, snapshot.last_move);
    if !snapshot.history.is_empty() {
        out.push_str(&format!("Moves: {}\n", render_history(&snapshot.history)));
    }
    if snapshot.board.in_check && !snapshot.status.is_over() {
        out.push_str("Check!\n");
    }
    out
}

/// [`render_frame`] followed by the status line.
pub fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut out = render_frame(snapshot);
    out.push_str(&format!("» {}\n", snapshot.message));
    out
}

/// Move list with move numbers: `1. e4 e5 2. Nf3`.
fn render_history(history: &[String]) -> String {
    history
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| format!("{}. {}", i + 1, pair.join(" ")))
        .collect::<Vec<_>>()
        .join(" ")
}
