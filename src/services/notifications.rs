use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::models::{
    notification::{Notification, Severity, ToastId},
    users::CurrentUser,
};

/// Fire-and-forget, user-visible status messages.
///
/// Passing the id of an earlier message as `replace` updates it in place
/// instead of stacking a new one.
pub trait Notifier: Send + Sync {
    fn show(&self, severity: Severity, message: &str, replace: Option<ToastId>) -> ToastId;

    fn loading(&self, message: &str) -> ToastId {
        self.show(Severity::Loading, message, None)
    }

    fn success(&self, message: &str, replace: Option<ToastId>) -> ToastId {
        self.show(Severity::Success, message, replace)
    }

    fn error(&self, message: &str, replace: Option<ToastId>) -> ToastId {
        self.show(Severity::Error, message, replace)
    }
}

/// Process-wide notification fan-out. Each socket filters by recipient.
#[derive(Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<Notification>,
}

impl NotificationHub {
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn for_user(&self, user: &CurrentUser) -> Arc<dyn Notifier> {
        Arc::new(UserNotifier {
            recipient: user.username.clone(),
            sender: self.sender.clone(),
        })
    }
}

struct UserNotifier {
    recipient: String,
    sender: broadcast::Sender<Notification>,
}

impl Notifier for UserNotifier {
    fn show(&self, severity: Severity, message: &str, replace: Option<ToastId>) -> ToastId {
        let id = replace.unwrap_or_default();

        match severity {
            Severity::Error => error!(recipient = %self.recipient, toast = %id, "{}", message),
            _ => info!(recipient = %self.recipient, toast = %id, ?severity, "{}", message),
        }

        let notification = Notification {
            id,
            severity,
            message: message.to_string(),
            recipient: self.recipient.clone(),
        };
        if self.sender.send(notification).is_err() {
            debug!(toast = %id, "no notification listeners");
        }

        id
    }
}
