//! Transient user notifications (toasts)

use std::time::Duration;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// A dismissible message that does not replace displayed content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// `None` keeps the presentation layer's default
    pub auto_close: Option<Duration>,
}

#[derive(Clone)]
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
}

impl Notifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn error(&self, message: impl Into<String>) {
        self.publish(Notification {
            level: NotificationLevel::Error,
            message: message.into(),
            auto_close: None,
        });
    }

    pub fn info(&self, message: impl Into<String>, auto_close: Duration) {
        self.publish(Notification {
            level: NotificationLevel::Info,
            message: message.into(),
            auto_close: Some(auto_close),
        });
    }

    fn publish(&self, notification: Notification) {
        tracing::debug!("Notify {:?}: {}", notification.level, notification.message);
        // Nobody listening is fine
        let _ = self.sender.send(notification);
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
