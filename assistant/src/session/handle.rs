use chess::{Move, Square};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::*;
use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;

/// Cheap, cloneable handle to a session actor.
#[derive(Clone)]
pub struct SessionHandle {
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(cmd_tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { cmd_tx }
    }

    /// Pick up the piece of the side to move on `square`.
    pub async fn select_square(&self, square: Square) -> Result<Selection, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::SelectSquare { square, reply: tx })
            .await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))?
    }

    /// Move the selected piece to `square`.
    pub async fn move_to(&self, square: Square) -> Result<Applied, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::MoveTo { square, reply: tx })
            .await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))?
    }

    /// Select when nothing is selected, otherwise try to move there.
    pub async fn click(&self, square: Square) -> Result<ClickOutcome, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Click { square, reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))?
    }

    pub async fn make_move(&self, mv: Move) -> Result<Applied, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::MakeMove { mv, reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))?
    }

    pub async fn get_snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::GetSnapshot { reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }

    pub async fn subscribe(
        &self,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SessionEvent>), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Subscribe { reply: tx }).await?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }

    /// Stop the session. Returns once the engine process has been released.
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self.send(SessionCommand::Shutdown { reply: tx }).await.is_ok() {
            let _ = rx.await;
        }
    }

    async fn send(&self, cmd: SessionCommand) -> Result<(), SessionError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| SessionError::Internal("Session actor closed".into()))
    }
}
