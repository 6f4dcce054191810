use chess::Plan;

use super::snapshot::SessionSnapshot;

/// Events broadcast from the session actor to all subscribers.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum SessionEvent {
    /// Full state snapshot after any mutation.
    StateChanged(SessionSnapshot),
    /// One-line message for the status bar.
    Status(String),
    /// A fresh plan for the current position.
    PlanReady(Plan),
}
