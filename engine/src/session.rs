use crate::uci::{parse_uci_message, UciError, UciMessage};
use crate::{AnalysisResult, EngineCommand, GoParams};
use chess::Board;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

/// Default time allowed for `uci`/`uciok` and `isready`/`readyok` exchanges.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default upper bound on a single depth-limited search.
pub const DEFAULT_ANALYSIS_TIMEOUT: Duration = Duration::from_secs(30);

/// Default grace period between `quit` and killing the process.
pub const DEFAULT_QUIT_TIMEOUT: Duration = Duration::from_secs(1);

/// How to launch and talk to the engine process.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Engine executable. `None` means analysis is unavailable.
    pub path: Option<PathBuf>,
    pub args: Vec<String>,
    pub handshake_timeout: Duration,
    pub analysis_timeout: Duration,
    pub quit_timeout: Duration,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: None,
            args: Vec::new(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            analysis_timeout: DEFAULT_ANALYSIS_TIMEOUT,
            quit_timeout: DEFAULT_QUIT_TIMEOUT,
            threads: None,
            hash_mb: None,
        }
    }
}

impl EngineConfig {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The process could not be launched or did not finish the handshake.
    #[error("Engine unavailable: {0}")]
    Unavailable(String),
    /// No answer within the allowed time.
    #[error("Engine timed out after {0:?}")]
    Timeout(Duration),
    /// The engine said something unusable, or stopped talking altogether.
    #[error("Engine protocol error: {0}")]
    Protocol(String),
    /// The engine process has exited.
    #[error("Engine session is closed")]
    Closed,
}

/// One UCI engine process, driven one request at a time.
///
/// The child is spawned with `kill_on_drop`, so dropping a session without
/// [`EngineSession::close`] still terminates the process.
pub struct EngineSession {
    process: Child,
    stdin: Option<ChildStdin>,
    messages: mpsc::Receiver<Result<UciMessage, UciError>>,
    config: EngineConfig,
    name: Option<String>,
    /// A search may still be running: a previous request was abandoned or
    /// failed before its `bestmove` arrived.
    searching: bool,
    exited: bool,
}

impl EngineSession {
    /// Spawn the engine and complete the UCI handshake.
    #[tracing::instrument(level = "info", skip_all, fields(path = ?config.path))]
    pub async fn open(config: EngineConfig) -> Result<Self, EngineError> {
        let path = config
            .path
            .clone()
            .ok_or_else(|| EngineError::Unavailable("no engine path configured".to_string()))?;
        tracing::info!("Starting engine at {}", path.display());

        let mut process = tokio::process::Command::new(&path)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn engine: {}", e);
                EngineError::Unavailable(format!("failed to spawn {}: {}", path.display(), e))
            })?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine has no stdin".to_string()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine has no stdout".to_string()))?;

        let (message_tx, message_rx) = mpsc::channel(256);
        tokio::spawn(read_engine_output(stdout, message_tx));

        let mut session = Self {
            process,
            stdin: Some(stdin),
            messages: message_rx,
            config,
            name: None,
            searching: false,
            exited: false,
        };

        let handshake = session.handshake().await;
        if let Err(e) = handshake {
            tracing::error!("Engine handshake failed: {}", e);
            session.kill().await;
            return Err(match e {
                EngineError::Unavailable(_) => e,
                other => EngineError::Unavailable(other.to_string()),
            });
        }

        tracing::info!(
            "Engine ready: {}",
            session.name.as_deref().unwrap_or("unnamed engine")
        );
        Ok(session)
    }

    /// The engine's `id name`, if it sent one.
    pub fn id(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn pid(&self) -> Option<u32> {
        self.process.id()
    }

    /// Search `board` to `depth` plies and return the best line.
    ///
    /// Dropping the returned future mid-search is safe: the next call stops
    /// the abandoned search and resynchronises before sending its position.
    pub async fn analyze(
        &mut self,
        board: &Board,
        depth: u32,
    ) -> Result<AnalysisResult, EngineError> {
        if self.exited {
            return Err(EngineError::Closed);
        }
        let depth = depth.max(1);

        self.synchronize().await?;

        self.searching = true;
        self.send(EngineCommand::SetPosition {
            fen: board.to_fen(),
            moves: Vec::new(),
        })
        .await?;
        self.send(EngineCommand::Go(GoParams {
            depth: Some(depth),
            ..Default::default()
        }))
        .await?;
        tracing::debug!("Analysing to depth {}", depth);

        let limit = self.config.analysis_timeout;
        let outcome = time::timeout(limit, self.collect_line()).await;
        match outcome {
            Ok(Ok(result)) => {
                self.searching = false;
                tracing::debug!(
                    "Engine line at depth {:?}: {} plies",
                    result.depth,
                    result.principal_variation.len()
                );
                Ok(result)
            }
            Ok(Err(e)) => {
                tracing::warn!("Analysis failed: {}", e);
                Err(e)
            }
            Err(_) => {
                tracing::warn!("Analysis timed out after {:?}, stopping search", limit);
                if let Err(e) = self.stop_search().await {
                    tracing::warn!("Engine did not acknowledge stop: {}", e);
                }
                Err(EngineError::Timeout(limit))
            }
        }
    }

    /// Send `quit`, give the process a moment to exit, then kill and reap it.
    pub async fn close(mut self) {
        tracing::info!("Closing engine session");
        if !self.exited {
            let _ = self.send(EngineCommand::Quit).await;
        }
        // Closing stdin also tells a well-behaved engine to exit.
        self.stdin = None;

        let exited = time::timeout(self.config.quit_timeout, self.process.wait()).await;
        match exited {
            Ok(Ok(status)) => tracing::debug!("Engine exited with {}", status),
            Ok(Err(e)) => {
                tracing::warn!("Failed to wait for engine: {}", e);
                self.kill().await;
            }
            Err(_) => {
                tracing::warn!("Engine ignored quit, killing it");
                self.kill().await;
            }
        }
    }

    async fn kill(&mut self) {
        if let Err(e) = self.process.kill().await {
            tracing::warn!("Failed to kill engine: {}", e);
        }
    }

    async fn handshake(&mut self) -> Result<(), EngineError> {
        let deadline = Instant::now() + self.config.handshake_timeout;

        self.send(EngineCommand::Uci).await?;
        loop {
            match self.next_message(deadline).await? {
                Ok(UciMessage::UciOk) => break,
                Ok(UciMessage::Id { name, value }) if name == "name" => self.name = Some(value),
                _ => {}
            }
        }

        if let Some(threads) = self.config.threads {
            let threads = threads.clamp(1, 512);
            tracing::info!("Setting Threads to {}", threads);
            self.send(EngineCommand::SetOption {
                name: "Threads".to_string(),
                value: Some(threads.to_string()),
            })
            .await?;
        }
        if let Some(hash_mb) = self.config.hash_mb {
            let hash_mb = hash_mb.clamp(1, 33_554_432);
            tracing::info!("Setting Hash to {} MB", hash_mb);
            self.send(EngineCommand::SetOption {
                name: "Hash".to_string(),
                value: Some(hash_mb.to_string()),
            })
            .await?;
        }

        self.send(EngineCommand::IsReady).await?;
        self.wait_ready(deadline).await
    }

    /// Bring the engine to an idle, known state before a new request.
    ///
    /// Engines answer `isready` even while searching, so `readyok` alone does
    /// not mean an abandoned search has ended. Its `bestmove` is drained first.
    async fn synchronize(&mut self) -> Result<(), EngineError> {
        if self.searching {
            tracing::debug!("Stopping abandoned search");
            match self.stop_search().await {
                Ok(()) => {}
                Err(EngineError::Timeout(limit)) => {
                    tracing::warn!("No bestmove within {:?} of stop, resynchronising anyway", limit);
                    self.searching = false;
                }
                Err(e) => return Err(e),
            }
        }
        let deadline = Instant::now() + self.config.handshake_timeout;
        self.send(EngineCommand::IsReady).await?;
        self.wait_ready(deadline).await
    }

    /// Send `stop` and discard output up to and including the `bestmove`.
    async fn stop_search(&mut self) -> Result<(), EngineError> {
        let deadline = Instant::now() + self.config.handshake_timeout;
        self.send(EngineCommand::Stop).await?;
        loop {
            let message = self.next_message(deadline).await?;
            let ended = match message {
                Ok(UciMessage::BestMove { .. }) => true,
                Ok(_) => false,
                Err(e) => e.is_bestmove(),
            };
            if ended {
                self.searching = false;
                return Ok(());
            }
        }
    }

    async fn wait_ready(&mut self, deadline: Instant) -> Result<(), EngineError> {
        loop {
            if let Ok(UciMessage::ReadyOk) = self.next_message(deadline).await? {
                return Ok(());
            }
        }
    }

    /// Read `info` lines until `bestmove`, keeping the deepest main line.
    async fn collect_line(&mut self) -> Result<AnalysisResult, EngineError> {
        let mut result = AnalysisResult::default();

        loop {
            let received = self.messages.recv().await;
            let parsed = received.ok_or_else(|| self.mark_exited())?;
            let message = match parsed {
                Ok(message) => message,
                Err(e) => {
                    if e.is_bestmove() {
                        self.searching = false;
                    }
                    return Err(EngineError::Protocol(e.to_string()));
                }
            };

            match message {
                UciMessage::Info(info) => {
                    if info.pv.is_empty() || info.multipv.is_some_and(|n| n != 1) {
                        continue;
                    }
                    if info.depth >= result.depth {
                        result.depth = info.depth;
                        result.score = info.score;
                        result.principal_variation = info.pv;
                    }
                }
                UciMessage::BestMove { mv, .. } => {
                    match mv {
                        None => result.principal_variation.clear(),
                        Some(best) if result.principal_variation.first() != Some(&best) => {
                            result.principal_variation = vec![best];
                        }
                        Some(_) => {}
                    }
                    return Ok(result);
                }
                other => tracing::trace!("Ignoring UCI message during search: {:?}", other),
            }
        }
    }

    async fn next_message(
        &mut self,
        deadline: Instant,
    ) -> Result<Result<UciMessage, UciError>, EngineError> {
        let received = time::timeout_at(deadline, self.messages.recv()).await;
        match received {
            Ok(Some(message)) => Ok(message),
            Ok(None) => Err(self.mark_exited()),
            Err(_) => Err(EngineError::Timeout(self.config.handshake_timeout)),
        }
    }

    fn mark_exited(&mut self) -> EngineError {
        tracing::warn!("Engine output closed");
        self.exited = true;
        EngineError::Protocol("engine process exited".to_string())
    }

    async fn send(&mut self, cmd: EngineCommand) -> Result<(), EngineError> {
        let stdin = self.stdin.as_mut().ok_or(EngineError::Closed)?;
        let line = cmd.to_uci();
        tracing::trace!("UCI >> {}", line);
        stdin
            .write_all(format!("{}\n", line).as_bytes())
            .await
            .map_err(|e| EngineError::Protocol(format!("failed to write to engine: {}", e)))?;
        stdin
            .flush()
            .await
            .map_err(|e| EngineError::Protocol(format!("failed to flush engine stdin: {}", e)))
    }
}

/// Forward parsed engine output until the stream ends.
async fn read_engine_output(
    stdout: ChildStdout,
    message_tx: mpsc::Sender<Result<UciMessage, UciError>>,
) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                tracing::trace!("UCI << {}", trimmed);

                let parsed = parse_uci_message(trimmed);
                if let Err(UciError::UnknownMessage(_)) = parsed {
                    continue;
                }
                if message_tx.send(parsed).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                tracing::debug!("Engine stdout EOF");
                break;
            }
            Err(e) => {
                tracing::error!("Error reading engine stdout: {}", e);
                break;
            }
        }
    }
    tracing::debug!("Output reader task exiting");
}
