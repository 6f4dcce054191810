//! UCI engine process management.
//!
//! [`EngineSession`] owns one analysis process for its whole lifetime and
//! exposes a request/response view of the UCI stream: set a position, search
//! to a depth, get the principal variation back.

pub mod session;
pub mod uci;

pub use session::{EngineConfig, EngineError, EngineSession};
pub use uci::{parse_uci_message, UciError, UciMessage};

use chess::Move;
use std::fmt;

/// Commands sent to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Uci,
    IsReady,
    SetOption { name: String, value: Option<String> },
    SetPosition { fen: String, moves: Vec<Move> },
    Go(GoParams),
    Stop,
    Quit,
}

impl EngineCommand {
    /// The command as one UCI line, without the trailing newline.
    pub fn to_uci(&self) -> String {
        match self {
            EngineCommand::Uci => "uci".to_string(),
            EngineCommand::IsReady => "isready".to_string(),
            EngineCommand::SetOption { name, value } => match value {
                Some(val) => format!("setoption name {} value {}", name, val),
                None => format!("setoption name {}", name),
            },
            EngineCommand::SetPosition { fen, moves } => {
                let mut position_cmd = format!("position fen {}", fen);
                if !moves.is_empty() {
                    position_cmd.push_str(" moves");
                    for mv in moves {
                        position_cmd.push_str(&format!(" {}", mv));
                    }
                }
                position_cmd
            }
            EngineCommand::Go(params) => {
                let mut go_cmd = "go".to_string();
                if let Some(depth) = params.depth {
                    go_cmd.push_str(&format!(" depth {}", depth));
                }
                if let Some(movetime) = params.movetime {
                    go_cmd.push_str(&format!(" movetime {}", movetime));
                }
                if params.infinite {
                    go_cmd.push_str(" infinite");
                }
                go_cmd
            }
            EngineCommand::Stop => "stop".to_string(),
            EngineCommand::Quit => "quit".to_string(),
        }
    }
}

/// Parameters for the "go" command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub depth: Option<u32>,
    pub movetime: Option<u64>, // Move time in milliseconds
    pub infinite: bool,        // Search until "stop"
}

/// One "info" line of engine analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineInfo {
    pub depth: Option<u32>,
    pub seldepth: Option<u32>,
    pub time_ms: Option<u64>,
    pub nodes: Option<u64>,
    pub score: Option<Score>,
    pub pv: Vec<Move>, // Principal variation
    pub multipv: Option<u32>,
    pub hashfull: Option<u16>,
    pub nps: Option<u64>,
}

/// Engine evaluation score.
///
/// Centipawns: positive = side-to-move is better.
/// Mate: positive N = side-to-move mates in N moves,
/// negative N = side-to-move gets mated in N moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Centipawns(cp) => write!(f, "{:+.2}", *cp as f64 / 100.0),
            Self::Mate(m) if *m > 0 => write!(f, "+M{}", m),
            Self::Mate(m) => write!(f, "-M{}", m.abs()),
        }
    }
}

/// What the engine found for one position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult {
    /// Best line, first move first. Empty when the engine found no move.
    pub principal_variation: Vec<Move>,
    pub depth: Option<u32>,
    pub score: Option<Score>,
}
