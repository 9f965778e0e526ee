/*
[INPUT]:  Public API exports for taskdeck-tracker crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod board;
pub mod config;
pub mod format;
pub mod notice;
pub mod session;
pub mod timer;
pub mod timestamp;

// Re-export main types for convenience
pub use board::{Board, BoardCard, BoardError, BoardSession, MoveKind, MoveRejection, MoveRequest, Stage};
pub use config::TrackerConfig;
pub use format::{format_elapsed, format_seconds, parse_elapsed};
pub use notice::{Notice, NoticeLevel, Notifier};
pub use session::{SessionError, SessionSettings, TimerSession};
pub use timer::{TaskTimer, TimerError, TimerState};
pub use timestamp::StartedAt;
