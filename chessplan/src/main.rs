//! chessplan: two players share one board while a UCI engine suggests a plan
//! for White whenever it is White's move.
//!
//! Input is read line by line from the terminal (see [`terminal::HELP`]);
//! logs go to a daily rolling file so they never interleave with the board.
//! Runtime tunables are described in [`config`].

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use assistant::{spawn_session, AssistantConfig, SessionError, SessionEvent, SessionHandle};
use chess::Game;
use clap::Parser;
use engine::EngineConfig;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod terminal;

use terminal::Input;

/// Command-line arguments. Each flag overrides its environment variable.
#[derive(Parser, Debug)]
#[command(
    name = "chessplan",
    about = "Chess board for two players with engine plan suggestions"
)]
struct Cli {
    /// UCI engine executable [env: CHESSPLAN_ENGINE_PATH]
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Extra argument passed to the engine (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Search depth for suggestions [env: CHESSPLAN_DEPTH]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    depth: Option<u32>,

    /// Number of plies shown in a plan [env: CHESSPLAN_PLAN_LENGTH]
    #[arg(long)]
    plan_length: Option<usize>,

    /// Engine threads
    #[arg(long)]
    threads: Option<u32>,

    /// Engine hash size in MB
    #[arg(long)]
    hash: Option<u32>,

    /// Start from this position instead of the initial one
    #[arg(long)]
    fen: Option<String>,

    /// Directory for log files [env: CHESSPLAN_LOG_DIR]
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn assistant_config(&self) -> AssistantConfig {
        AssistantConfig {
            depth: self.depth.unwrap_or_else(config::get_depth),
            plan_length: self.plan_length.unwrap_or_else(config::get_plan_length),
            engine: EngineConfig {
                path: self.engine.clone().or_else(config::get_engine_path),
                args: self.engine_args.clone(),
                analysis_timeout: Duration::from_secs(config::get_analysis_timeout_secs()),
                threads: self.threads,
                hash_mb: self.hash,
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_dir = cli.log_dir.clone().unwrap_or_else(config::get_log_dir);
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, "chessplan");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("chessplan starting up");

    let game = match &cli.fen {
        Some(fen) => Game::from_fen(fen).with_context(|| format!("invalid FEN '{}'", fen))?,
        None => Game::new(),
    };
    let assistant_config = cli.assistant_config();
    if assistant_config.engine.path.is_none() {
        println!("No engine configured (--engine or CHESSPLAN_ENGINE_PATH).");
    }

    println!("chessplan - you play White, your friend plays Black.");
    println!("Type 'help' for commands. Logs: {}", log_dir.display());
    println!();

    let handle = spawn_session(game, assistant_config);
    let result = run(&handle).await;

    // Releases the engine even when the loop failed.
    handle.shutdown().await;
    tracing::info!("chessplan shutting down");
    result
}

async fn run(handle: &SessionHandle) -> anyhow::Result<()> {
    let (snapshot, mut events) = handle.subscribe().await?;
    print!("{}", terminal::render_snapshot(&snapshot));
    let mut rendered = (snapshot.position_id, snapshot.selected);
    let mut lines = spawn_stdin_reader();

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else {
                    tracing::info!("End of input");
                    break;
                };
                if !handle_input(handle, &line).await? {
                    break;
                }
            }

            event = events.recv() => {
                match event {
                    Ok(SessionEvent::StateChanged(snapshot)) => {
                        if (snapshot.position_id, snapshot.selected) != rendered {
                            rendered = (snapshot.position_id, snapshot.selected);
                            print!("{}", terminal::render_frame(&snapshot));
                        }
                    }
                    Ok(SessionEvent::Status(message)) => println!("» {}", message),
                    Ok(SessionEvent::PlanReady(plan)) => print!("{}", terminal::render_plan(&plan)),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("Terminal fell behind by {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                println!();
                break;
            }
        }
    }

    Ok(())
}

/// Returns `false` when the user asked to leave.
async fn handle_input(handle: &SessionHandle, line: &str) -> anyhow::Result<bool> {
    match terminal::parse_input(line) {
        Ok(Input::Quit) => return Ok(false),
        Ok(Input::Empty) => {}
        Ok(Input::Help) => println!("{}", terminal::HELP),
        Ok(Input::Fen) => println!("{}", handle.get_snapshot().await?.fen),
        Ok(Input::Square(square)) => report(handle.click(square).await.map(|_| ()))?,
        Ok(Input::Move(mv)) => report(handle.make_move(mv).await.map(|_| ()))?,
        Err(e) => println!("{}", e),
    }
    Ok(true)
}

/// Rejections are shown to the player; only a dead session is an error.
fn report(result: Result<(), SessionError>) -> anyhow::Result<()> {
    match result {
        Ok(()) | Err(SessionError::IllegalMove(_)) => Ok(()),
        Err(e @ SessionError::Internal(_)) => Err(e.into()),
        Err(e) => {
            println!("{}", e);
            Ok(())
        }
    }
}

/// Read stdin on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}
