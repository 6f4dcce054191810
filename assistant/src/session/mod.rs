pub mod actor;
pub mod analyst;
pub mod commands;
pub mod events;
pub mod handle;
pub mod snapshot;
pub mod state;

use chess::Game;
use tokio::sync::{broadcast, mpsc, watch};

use crate::AssistantConfig;
use actor::{run_session_actor, AnalystLink};
use analyst::run_analyst;
pub use analyst::AnalysisRequest;
pub use commands::{Applied, ClickOutcome, Selection, SessionError};
pub use events::SessionEvent;
pub use handle::SessionHandle;
pub use snapshot::{EngineState, SessionSnapshot};
use state::SessionState;

/// Start a session for `game`: the actor task plus its analyst, which starts
/// the engine in the background. Must be called inside a tokio runtime.
pub fn spawn_session(game: Game, config: AssistantConfig) -> SessionHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (event_tx, _) = broadcast::channel(100);
    let (request_tx, request_rx) = watch::channel(None);
    let (reply_tx, reply_rx) = mpsc::channel(8);

    let state = SessionState::new(game, &config);
    let task = tokio::spawn(run_analyst(config.engine, request_rx, reply_tx));
    let analyst = AnalystLink {
        requests: request_tx,
        replies: reply_rx,
        task,
    };
    tokio::spawn(run_session_actor(state, cmd_rx, event_tx, analyst));

    SessionHandle::new(cmd_tx)
}

#[cfg(test)]
pub(crate) mod testing {
    use engine::EngineConfig;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    /// A scripted UCI engine run by `/bin/sh` that logs every line it
    /// receives to `engine.log` in `dir`. `on_line` handles anything other
    /// than `uci`, `isready` and `quit`, with the input in `$line`.
    pub(crate) fn fake_engine(dir: &Path, on_line: &str) -> EngineConfig {
        let log = dir.join("engine.log");
        let script = format!(
            r#"n=0
while read -r line; do
  echo "$line" >> "{log}"
  case "$line" in
    uci) echo "id name FakeFish 1.0"; echo "uciok" ;;
    isready) echo "readyok" ;;
    quit) exit 0 ;;
    *) {on_line} ;;
  esac
done
"#,
            log = log.display(),
        );
        let path = dir.join("engine.sh");
        std::fs::write(&path, script).unwrap();
        EngineConfig {
            path: Some(PathBuf::from("/bin/sh")),
            args: vec![path.display().to_string()],
            handshake_timeout: Duration::from_secs(5),
            analysis_timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    /// Lines the fake engine has received so far.
    pub(crate) fn engine_log(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("engine.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
