//! Runtime tunables for chessplan.
//!
//! Every value has a compile-time default and can be overridden with an
//! environment variable. Command-line flags take precedence over both.

use std::path::PathBuf;
use std::str::FromStr;

/// Default search depth for suggestions.
const DEFAULT_DEPTH: u32 = assistant::config::DEFAULT_DEPTH;

/// Default number of plies shown in a plan.
const DEFAULT_PLAN_LENGTH: usize = chess::DEFAULT_PLAN_LENGTH;

/// Default upper bound on one analysis (in seconds).
const DEFAULT_ANALYSIS_TIMEOUT_SECS: u64 = 30;

/// Default directory for the rolling log file.
const DEFAULT_LOG_DIR: &str = "logs";

/// Get the engine executable.
///
/// Priority:
/// 1. `CHESSPLAN_ENGINE_PATH` env variable if set and non-empty
/// 2. none: the game runs without suggestions
pub fn get_engine_path() -> Option<PathBuf> {
    std::env::var("CHESSPLAN_ENGINE_PATH")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from)
}

/// Get the search depth.
///
/// Priority:
/// 1. `CHESSPLAN_DEPTH` env variable if set (falls back to the default if it
///    is not a positive integer)
/// 2. `15` as fallback
pub fn get_depth() -> u32 {
    let depth = parse_or(std::env::var("CHESSPLAN_DEPTH").ok(), DEFAULT_DEPTH);
    if depth == 0 {
        DEFAULT_DEPTH
    } else {
        depth
    }
}

/// Get the number of plies shown per plan.
///
/// Priority:
/// 1. `CHESSPLAN_PLAN_LENGTH` env variable if set
/// 2. `5` as fallback
pub fn get_plan_length() -> usize {
    parse_or(
        std::env::var("CHESSPLAN_PLAN_LENGTH").ok(),
        DEFAULT_PLAN_LENGTH,
    )
}

/// Get the analysis timeout in seconds.
///
/// Priority:
/// 1. `CHESSPLAN_ANALYSIS_TIMEOUT_SECS` env variable if set
/// 2. `30` seconds as fallback
pub fn get_analysis_timeout_secs() -> u64 {
    parse_or(
        std::env::var("CHESSPLAN_ANALYSIS_TIMEOUT_SECS").ok(),
        DEFAULT_ANALYSIS_TIMEOUT_SECS,
    )
}

/// Get the directory for log files.
///
/// Priority:
/// 1. `CHESSPLAN_LOG_DIR` env variable if set
/// 2. `logs` as fallback
pub fn get_log_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CHESSPLAN_LOG_DIR") {
        return PathBuf::from(dir);
    }

    PathBuf::from(DEFAULT_LOG_DIR)
}

/// Parse `value`, keeping `default` when it is missing or malformed.
fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
