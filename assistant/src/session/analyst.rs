use chess::{Board, PositionId};
use engine::{AnalysisResult, EngineConfig, EngineError, EngineSession};
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

/// A position to analyse, tagged with the position it belongs to.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub position_id: PositionId,
    pub position: Board,
    pub depth: u32,
}

/// Messages from the analyst back to the session actor.
#[derive(Debug)]
pub(crate) enum AnalystReply {
    Ready {
        name: String,
        pid: Option<u32>,
    },
    Unavailable(String),
    Analysis {
        position_id: PositionId,
        result: Result<AnalysisResult, EngineError>,
    },
}

/// Owns the engine for the lifetime of a session.
///
/// Only the newest request in `requests` matters: a request that is replaced
/// mid-search is abandoned and never answered. A `None` request cancels the
/// current search. When the sender is dropped the engine is closed and the
/// task ends.
pub(crate) async fn run_analyst(
    config: EngineConfig,
    requests: watch::Receiver<Option<AnalysisRequest>>,
    replies: mpsc::Sender<AnalystReply>,
) {
    run_analyst_inner(config, requests, replies)
        .instrument(tracing::info_span!("analyst"))
        .await;
}

async fn run_analyst_inner(
    config: EngineConfig,
    mut requests: watch::Receiver<Option<AnalysisRequest>>,
    replies: mpsc::Sender<AnalystReply>,
) {
    let opened = tokio::select! {
        opened = EngineSession::open(config) => opened,
        _ = requests_closed(&mut requests) => {
            tracing::debug!("Session closed while the engine was starting");
            return;
        }
    };

    let mut session = match opened {
        Ok(session) => session,
        Err(e) => {
            let reason = match e {
                EngineError::Unavailable(reason) => reason,
                other => other.to_string(),
            };
            tracing::warn!("Playing without an engine: {}", reason);
            let _ = replies.send(AnalystReply::Unavailable(reason)).await;
            return;
        }
    };

    let _ = replies
        .send(AnalystReply::Ready {
            name: session.id().unwrap_or("UCI engine").to_string(),
            pid: session.pid(),
        })
        .await;

    loop {
        let request = requests.borrow_and_update().clone();

        if let Some(request) = request {
            tracing::debug!(
                "Analysing position {} to depth {}",
                request.position_id,
                request.depth
            );
            tokio::select! {
                result = session.analyze(&request.position, request.depth) => {
                    let dead = matches!(result, Err(EngineError::Closed));
                    let reply = if dead {
                        AnalystReply::Unavailable("engine process exited".to_string())
                    } else {
                        AnalystReply::Analysis { position_id: request.position_id, result }
                    };
                    if replies.send(reply).await.is_err() || dead {
                        break;
                    }
                }
                changed = requests.changed() => {
                    if changed.is_err() {
                        tracing::debug!("Abandoning search for position {}", request.position_id);
                        break;
                    }
                    tracing::debug!("Search for position {} superseded", request.position_id);
                    continue;
                }
            }
        }

        if requests.changed().await.is_err() {
            break;
        }
    }

    session.close().await;
    tracing::debug!("Analyst exited");
}

/// Resolves once the request sender is gone.
async fn requests_closed(requests: &mut watch::Receiver<Option<AnalysisRequest>>) {
    while requests.changed().await.is_ok() {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::testing::fake_engine;
    use chess::{parse_uci_move, Game};
    use std::time::Duration;
    use tokio::time::timeout;

    fn request(game: &Game) -> AnalysisRequest {
        AnalysisRequest {
            position_id: game.position_id(),
            position: game.position().clone(),
            depth: 15,
        }
    }

    fn spawn(
        config: EngineConfig,
    ) -> (
        watch::Sender<Option<AnalysisRequest>>,
        mpsc::Receiver<AnalystReply>,
        tokio::task::JoinHandle<()>,
    ) {
        let (request_tx, request_rx) = watch::channel(None);
        let (reply_tx, reply_rx) = mpsc::channel(8);
        let task = tokio::spawn(run_analyst(config, request_rx, reply_tx));
        (request_tx, reply_rx, task)
    }

    async fn next(replies: &mut mpsc::Receiver<AnalystReply>) -> AnalystReply {
        timeout(Duration::from_secs(5), replies.recv())
            .await
            .unwrap()
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_engine_reports_unavailable() {
        let (_request_tx, mut replies, task) = spawn(EngineConfig::default());
        assert!(matches!(next(&mut replies).await, AnalystReply::Unavailable(_)));
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_answers_with_position_tag() {
        let dir = tempfile::tempdir().unwrap();
        let config = fake_engine(
            dir.path(),
            r#"case "$line" in go*) echo "info depth 3 pv e2e4 e7e5"; echo "bestmove e2e4" ;; esac"#,
        );
        let (request_tx, mut replies, task) = spawn(config);
        let game = Game::new();
        request_tx.send_replace(Some(request(&game)));

        assert!(matches!(next(&mut replies).await, AnalystReply::Ready { .. }));
        match next(&mut replies).await {
            AnalystReply::Analysis {
                position_id,
                result,
            } => {
                assert_eq!(position_id, game.position_id());
                assert_eq!(result.unwrap().principal_variation.len(), 2);
            }
            other => panic!("unexpected reply: {:?}", other),
        }

        drop(request_tx);
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_superseded_request_is_never_answered() {
        let dir = tempfile::tempdir().unwrap();
        let config = fake_engine(
            dir.path(),
            r#"case "$line" in
      go*) n=$((n+1))
           if [ "$n" -gt 1 ]; then echo "info depth 3 pv g8f6"; echo "bestmove g8f6"; fi ;;
      stop) ( sleep 0.2; echo "info depth 9 pv a2a3"; echo "bestmove a2a3" ) & ;;
    esac"#,
        );
        let (request_tx, mut replies, task) = spawn(config);
        assert!(matches!(next(&mut replies).await, AnalystReply::Ready { .. }));

        let mut game = Game::new();
        let first = game.position_id();
        request_tx.send_replace(Some(request(&game)));
        tokio::time::sleep(Duration::from_millis(200)).await;

        game.make_move(parse_uci_move("e2e4").unwrap()).unwrap();
        request_tx.send_replace(Some(request(&game)));

        match next(&mut replies).await {
            AnalystReply::Analysis {
                position_id,
                result,
            } => {
                assert_ne!(position_id, first);
                assert_eq!(position_id, game.position_id());
                assert_eq!(
                    result.unwrap().principal_variation,
                    vec![parse_uci_move("g8f6").unwrap()]
                );
            }
            other => panic!("unexpected reply: {:?}", other),
        }

        drop(request_tx);
        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert!(replies.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_closing_mid_search_releases_engine() {
        let dir = tempfile::tempdir().unwrap();
        let config = fake_engine(dir.path(), ":");
        let (request_tx, mut replies, task) = spawn(config);
        let pid = match next(&mut replies).await {
            AnalystReply::Ready { pid, .. } => pid.unwrap(),
            other => panic!("unexpected reply: {:?}", other),
        };

        request_tx.send_replace(Some(request(&Game::new())));
        tokio::time::sleep(Duration::from_millis(100)).await;
        drop(request_tx);

        timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
        assert!(replies.recv().await.is_none());
        #[cfg(target_os = "linux")]
        assert!(!std::path::Path::new(&format!("/proc/{}", pid)).exists());
        let _ = pid;
    }
}
