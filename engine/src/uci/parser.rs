use crate::{EngineInfo, Score, UciError};
use chess::{parse_uci_move, Move};

/// Incoming message from UCI engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UciMessage {
    Id { name: String, value: String },
    UciOk,
    ReadyOk,
    /// `mv` is `None` for `bestmove (none)`: no legal move in the position.
    BestMove { mv: Option<Move>, ponder: Option<Move> },
    Info(EngineInfo),
    /// `option name ...` declarations; only the raw text is kept.
    Option(String),
}

/// Parse a UCI message line
pub fn parse_uci_message(line: &str) -> Result<UciMessage, UciError> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    match tokens.first() {
        Some(&"uciok") => Ok(UciMessage::UciOk),
        Some(&"readyok") => Ok(UciMessage::ReadyOk),

        Some(&"id") => {
            if tokens.len() < 3 {
                return Err(UciError::MalformedMessage(line.to_string()));
            }
            let name = tokens[1].to_string();
            let value = tokens[2..].join(" ");
            Ok(UciMessage::Id { name, value })
        }

        Some(&"option") => Ok(UciMessage::Option(tokens[1..].join(" "))),

        Some(&"bestmove") => {
            let Some(&best) = tokens.get(1) else {
                return Err(UciError::MalformedMessage(line.to_string()));
            };
            let mv = match best {
                "(none)" | "0000" => None,
                _ => Some(parse_move(best, line)?),
            };
            let ponder = match (tokens.get(2), tokens.get(3)) {
                (Some(&"ponder"), Some(p)) => parse_move(p, line).ok(),
                _ => None,
            };
            Ok(UciMessage::BestMove { mv, ponder })
        }

        Some(&"info") => Ok(UciMessage::Info(parse_info_line(&tokens[1..], line)?)),

        _ => Err(UciError::UnknownMessage(line.to_string())),
    }
}

fn parse_move(token: &str, line: &str) -> Result<Move, UciError> {
    parse_uci_move(token).map_err(|source| UciError::InvalidMove {
        line: line.to_string(),
        source,
    })
}

/// Parse an "info" line from the engine
fn parse_info_line(tokens: &[&str], line: &str) -> Result<EngineInfo, UciError> {
    let mut info = EngineInfo::default();
    let mut i = 0;

    while i < tokens.len() {
        match tokens[i] {
            "depth" => {
                i += 1;
                info.depth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "seldepth" => {
                i += 1;
                info.seldepth = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "time" => {
                i += 1;
                info.time_ms = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nodes" => {
                i += 1;
                info.nodes = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "nps" => {
                i += 1;
                info.nps = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "score" => {
                i += 1;
                if let Some(&score_type) = tokens.get(i) {
                    i += 1;
                    if let Some(value_str) = tokens.get(i) {
                        info.score = match score_type {
                            "cp" => value_str.parse().ok().map(Score::Centipawns),
                            "mate" => value_str.parse().ok().map(Score::Mate),
                            _ => None,
                        };
                    }
                }
            }
            "pv" => {
                // Collect all moves until next keyword
                i += 1;
                while i < tokens.len() && !is_keyword(tokens[i]) {
                    info.pv.push(parse_move(tokens[i], line)?);
                    i += 1;
                }
                continue; // Don't increment i again
            }
            "multipv" => {
                i += 1;
                info.multipv = tokens.get(i).and_then(|s| s.parse().ok());
            }
            "hashfull" => {
                i += 1;
                info.hashfull = tokens.get(i).and_then(|s| s.parse().ok());
            }
            // Free text runs to the end of the line
            "string" => break,
            _ => {
                // Unknown keyword, skip
            }
        }
        i += 1;
    }

    Ok(info)
}

fn is_keyword(token: &str) -> bool {
    matches!(
        token,
        "depth"
            | "seldepth"
            | "time"
            | "nodes"
            | "score"
            | "pv"
            | "multipv"
            | "currmove"
            | "currmovenumber"
            | "hashfull"
            | "nps"
            | "tbhits"
            | "sbhits"
            | "cpuload"
            | "string"
            | "refutation"
            | "currline"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(s: &str) -> Move {
        parse_uci_move(s).unwrap()
    }

    #[test]
    fn test_parse_bestmove() {
        let msg = parse_uci_message("bestmove e2e4 ponder e7e5").unwrap();
        assert_eq!(
            msg,
            UciMessage::BestMove {
                mv: Some(mv("e2e4")),
                ponder: Some(mv("e7e5")),
            }
        );
    }

    #[test]
    fn test_parse_bestmove_none() {
        let msg = parse_uci_message("bestmove (none)").unwrap();
        assert_eq!(msg, UciMessage::BestMove { mv: None, ponder: None });
    }

    #[test]
    fn test_parse_bestmove_malformed() {
        assert!(matches!(
            parse_uci_message("bestmove"),
            Err(UciError::MalformedMessage(_))
        ));
        assert!(matches!(
            parse_uci_message("bestmove zz99"),
            Err(UciError::InvalidMove { .. })
        ));
        assert!(parse_uci_message("bestmove").unwrap_err().is_bestmove());
        let err = parse_uci_message("bestmove zz99").unwrap_err();
        assert!(err.is_bestmove());
        assert_eq!(err.line(), "bestmove zz99");
        assert!(!parse_uci_message("info depth 3 pv e2e4 banana")
            .unwrap_err()
            .is_bestmove());
    }

    #[test]
    fn test_parse_info() {
        let msg = parse_uci_message(
            "info depth 12 seldepth 18 multipv 1 score cp 35 nodes 15234 nps 901000 hashfull 3 tbhits 0 time 17 pv e2e4 e7e5 g1f3",
        )
        .unwrap();
        let UciMessage::Info(info) = msg else {
            panic!("Wrong message type");
        };
        assert_eq!(info.depth, Some(12));
        assert_eq!(info.seldepth, Some(18));
        assert_eq!(info.multipv, Some(1));
        assert_eq!(info.score, Some(Score::Centipawns(35)));
        assert_eq!(info.nodes, Some(15234));
        assert_eq!(info.time_ms, Some(17));
        assert_eq!(info.pv, vec![mv("e2e4"), mv("e7e5"), mv("g1f3")]);
    }

    #[test]
    fn test_parse_info_mate_with_bound() {
        let UciMessage::Info(info) =
            parse_uci_message("info depth 5 score mate -2 upperbound pv h7h6").unwrap()
        else {
            panic!("Wrong message type");
        };
        assert_eq!(info.score, Some(Score::Mate(-2)));
        assert_eq!(info.pv, vec![mv("h7h6")]);
    }

    #[test]
    fn test_parse_info_string_is_ignored() {
        let UciMessage::Info(info) =
            parse_uci_message("info string NNUE evaluation using nn-abc.nnue depth 3").unwrap()
        else {
            panic!("Wrong message type");
        };
        assert_eq!(info, EngineInfo::default());
    }

    #[test]
    fn test_parse_info_bad_pv_move() {
        assert!(matches!(
            parse_uci_message("info depth 3 pv e2e4 banana"),
            Err(UciError::InvalidMove { .. })
        ));
    }

    #[test]
    fn test_parse_handshake_lines() {
        assert_eq!(parse_uci_message("uciok").unwrap(), UciMessage::UciOk);
        assert_eq!(parse_uci_message("readyok").unwrap(), UciMessage::ReadyOk);
        assert_eq!(
            parse_uci_message("id name Stockfish 16").unwrap(),
            UciMessage::Id {
                name: "name".to_string(),
                value: "Stockfish 16".to_string()
            }
        );
        assert!(matches!(
            parse_uci_message("Stockfish 16 by the Stockfish developers"),
            Err(UciError::UnknownMessage(_))
        ));
    }
}
