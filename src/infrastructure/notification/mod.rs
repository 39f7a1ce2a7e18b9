use crate::application::ports::notifier::{Notification, NotificationLevel, Notifier};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Writes notifications to the log; used when no UI is attached.
#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => {
                info!(title = %notification.title, "{}", notification.description)
            }
            NotificationLevel::Error => {
                warn!(title = %notification.title, "{}", notification.description)
            }
        }
    }
}

/// Forwards notifications to a front end over a channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn notify(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            warn!("notification receiver dropped");
        }
    }
}
