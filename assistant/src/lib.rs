//! Turn-gated analysis for a two-player board.
//!
//! A session actor owns the [`chess::Game`] and serialises every move. When
//! the move hands the turn to the human side, it asks a background analyst
//! task (the sole owner of the [`engine::EngineSession`]) for a line and
//! publishes the formatted plan, unless the board has moved on since.

pub mod config;
pub mod session;

pub use config::AssistantConfig;
pub use session::{
    spawn_session, Applied, ClickOutcome, EngineState, Selection, SessionError, SessionEvent,
    SessionHandle, SessionSnapshot,
};
