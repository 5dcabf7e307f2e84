use async_trait::async_trait;
use logger_redacted::redact;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EmailConfig;
use crate::notification::{Notification, NotificationOutcome};
use crate::transport::{MailTransport, OutgoingEmail, SmtpTransport};

/// Fire-and-forget notification sink
///
/// Implementations never fail: problems are reported in the outcome and
/// never undo the state change that triggered the notification.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: Notification) -> NotificationOutcome;
}

pub struct EmailNotifier {
    config: EmailConfig,
    transport: Arc<dyn MailTransport>,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig, transport: Arc<dyn MailTransport>) -> Self {
        Self { config, transport }
    }

    /// Notifier delivering through SMTP as configured
    pub fn smtp(config: EmailConfig) -> Self {
        let transport = Arc::new(SmtpTransport::from_config(&config));
        Self::new(config, transport)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, notification: Notification) -> NotificationOutcome {
        let kind = notification.kind();
        if !self.config.enabled {
            return NotificationOutcome::disabled();
        }

        let (subject, html_body) = notification.render();
        let email = OutgoingEmail {
            from_name: self.config.from_name.clone(),
            from_address: self.config.from_address.clone(),
            to: notification.recipient().to_string(),
            subject,
            html_body,
        };

        match self.transport.send(email).await {
            Ok(message_id) => {
                info!(%kind, recipient = %redact(notification.recipient()), "Notification sent");
                NotificationOutcome::sent(message_id)
            }
            Err(e) => {
                warn!(
                    %kind,
                    recipient = %redact(notification.recipient()),
                    error = %e,
                    "Notification failed"
                );
                NotificationOutcome::failed(e.to_string())
            }
        }
    }
}
