use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::Instrument;

use super::analyst::{AnalysisRequest, AnalystReply};
use super::commands::{ClickOutcome, SessionCommand, SessionError};
use super::events::SessionEvent;
use super::snapshot::EngineState;
use super::state::SessionState;

/// The actor's end of the analyst task.
pub(crate) struct AnalystLink {
    pub requests: watch::Sender<Option<AnalysisRequest>>,
    pub replies: mpsc::Receiver<AnalystReply>,
    pub task: JoinHandle<()>,
}

/// The main session actor loop.
/// Owns all mutable state. Processes commands and analyst replies sequentially.
pub(crate) async fn run_session_actor(
    state: SessionState,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
    analyst: AnalystLink,
) {
    run_session_actor_inner(state, cmd_rx, event_tx, analyst)
        .instrument(tracing::info_span!("session"))
        .await;
}

async fn run_session_actor_inner(
    mut state: SessionState,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
    analyst: AnalystLink,
) {
    tracing::info!("Session actor started");
    let AnalystLink {
        requests,
        mut replies,
        task,
    } = analyst;

    let shutdown_reply = loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Shutdown { reply }) => break Some(reply),
                    None => break None,
                    Some(cmd) => handle_command(&mut state, cmd, &event_tx, &requests),
                }
            }

            Some(reply) = replies.recv() => {
                handle_analyst_reply(&mut state, reply, &event_tx);
            }
        }
    };

    tracing::info!("Session actor shutting down");
    // Nothing reaches subscribers from here on; the analyst sees the closed
    // request channel, abandons its search and closes the engine.
    drop(event_tx);
    drop(requests);
    drop(replies);
    if let Err(e) = task.await {
        tracing::error!("Analyst task failed: {}", e);
    }
    if let Some(reply) = shutdown_reply {
        let _ = reply.send(());
    }

    tracing::info!("Session actor exited");
}

fn handle_command(
    state: &mut SessionState,
    cmd: SessionCommand,
    event_tx: &broadcast::Sender<SessionEvent>,
    requests: &watch::Sender<Option<AnalysisRequest>>,
) {
    match cmd {
        SessionCommand::SelectSquare { square, reply } => {
            let result = state.select(square);
            if result.is_ok() {
                publish(state, event_tx);
            }
            let _ = reply.send(result);
        }
        SessionCommand::MoveTo { square, reply } => {
            let result = state.move_selected(square);
            let moved = result.is_ok();
            publish_unless_rejected(state, event_tx, &result);
            let _ = reply.send(result);
            if moved {
                update_analysis(state, requests);
            }
        }
        SessionCommand::Click { square, reply } => {
            let result = match state.selection {
                None => match state.select(square) {
                    Ok(selection) => Ok(ClickOutcome::Selected(selection)),
                    Err(SessionError::InvalidSelection(_)) => Ok(ClickOutcome::Ignored),
                    Err(e) => Err(e),
                },
                Some(_) => state.move_selected(square).map(ClickOutcome::Moved),
            };
            let moved = matches!(result, Ok(ClickOutcome::Moved(_)));
            if !matches!(result, Ok(ClickOutcome::Ignored)) {
                publish_unless_rejected(state, event_tx, &result);
            }
            let _ = reply.send(result);
            if moved {
                update_analysis(state, requests);
            }
        }
        SessionCommand::MakeMove { mv, reply } => {
            let result = state.play(mv);
            let moved = result.is_ok();
            publish_unless_rejected(state, event_tx, &result);
            let _ = reply.send(result);
            if moved {
                update_analysis(state, requests);
            }
        }
        SessionCommand::GetSnapshot { reply } => {
            let _ = reply.send(state.snapshot());
        }
        SessionCommand::Subscribe { reply } => {
            let snapshot = state.snapshot();
            let rx = event_tx.subscribe();
            let _ = reply.send((snapshot, rx));
        }
        SessionCommand::Shutdown { .. } => unreachable!(),
    }
}

/// Broadcast the new state, except when the input changed nothing.
fn publish_unless_rejected<T>(
    state: &SessionState,
    event_tx: &broadcast::Sender<SessionEvent>,
    result: &Result<T, SessionError>,
) {
    match result {
        Ok(_) | Err(SessionError::IllegalMove(_)) => publish(state, event_tx),
        Err(_) => {}
    }
}

fn publish(state: &SessionState, event_tx: &broadcast::Sender<SessionEvent>) {
    let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
    let _ = event_tx.send(SessionEvent::Status(state.message.clone()));
}

/// Ask for a plan when the human is to move, and cancel any request that no
/// longer applies otherwise.
fn update_analysis(state: &mut SessionState, requests: &watch::Sender<Option<AnalysisRequest>>) {
    if state.wants_analysis() {
        if state.pending == Some(state.game.position_id()) {
            return;
        }
        let request = state.analysis_request();
        tracing::debug!("Requesting analysis for position {}", request.position_id);
        requests.send_replace(Some(request));
    } else if let Some(abandoned) = state.pending.take() {
        tracing::debug!("Cancelling analysis for position {}", abandoned);
        requests.send_replace(None);
    }
}

fn handle_analyst_reply(
    state: &mut SessionState,
    reply: AnalystReply,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    match reply {
        AnalystReply::Ready { name, pid } => {
            tracing::info!("Engine ready: {}", name);
            state.engine = EngineState::Ready { name, pid };
            let _ = event_tx.send(SessionEvent::StateChanged(state.snapshot()));
        }
        AnalystReply::Unavailable(reason) => {
            tracing::warn!("Engine unavailable: {}", reason);
            state.engine_unavailable(reason);
            publish(state, event_tx);
        }
        AnalystReply::Analysis {
            position_id,
            result,
        } => {
            if !state.is_current(position_id) {
                tracing::debug!(
                    "Dropping stale analysis for position {} (live position {})",
                    position_id,
                    state.game.position_id()
                );
                return;
            }
            if let Some(plan) = state.accept_analysis(result) {
                let _ = event_tx.send(SessionEvent::PlanReady(plan));
            }
            publish(state, event_tx);
        }
    }
}
