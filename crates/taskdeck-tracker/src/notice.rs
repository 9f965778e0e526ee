/*
[INPUT]:  Failure and status messages from session and board operations
[OUTPUT]: `Notice` values on an unbounded channel, mirrored to tracing
[POS]:    Notification layer - user-visible toasts
[UPDATE]: When adding notice levels or changing delivery
*/

use std::fmt;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl fmt::Display for NoticeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        f.write_str(label)
    }
}

/// A message meant for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Sender side of the notice channel.
///
/// Every notice is logged; delivery to a receiver is best effort, a dropped
/// receiver never fails the operation that raised the notice.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<Notice>>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// Log only
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message.into());
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Warning, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message.into());
    }

    fn push(&self, level: NoticeLevel, message: String) {
        match level {
            NoticeLevel::Info => info!(notice = %message),
            NoticeLevel::Warning => warn!(notice = %message),
            NoticeLevel::Error => error!(notice = %message),
        }
        if let Some(tx) = &self.tx {
            let _ = tx.send(Notice { level, message });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notices_arrive_in_order() {
        let (notifier, mut rx) = Notifier::channel();
        notifier.warning("Tasks can only move forward");
        notifier.error("Failed to load tasks");

        let first = rx.recv().await.unwrap();
        assert_eq!(first.level, NoticeLevel::Warning);
        assert_eq!(first.message, "Tasks can only move forward");
        assert_eq!(rx.recv().await.unwrap().level, NoticeLevel::Error);
    }

    #[test]
    fn test_dropped_receiver_is_ignored() {
        let (notifier, rx) = Notifier::channel();
        drop(rx);
        notifier.info("still fine");
        Notifier::silent().error("nobody listening");
    }
}
