use async_trait::async_trait;
use mail_builder::MessageBuilder;
use mail_send::SmtpClientBuilder;
use tracing::debug;
use uuid::Uuid;

use crate::config::EmailConfig;
use crate::error::{EmailError, EmailResult};

/// A fully rendered message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub from_name: String,
    pub from_address: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Delivery channel; returns the message id on success
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> EmailResult<String>;
}

/// SMTP delivery via mail-send, one connection per message
#[derive(Debug, Clone)]
pub struct SmtpTransport {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    implicit_tls: bool,
}

impl SmtpTransport {
    pub fn from_config(config: &EmailConfig) -> Self {
        Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            credentials: config
                .smtp_username
                .clone()
                .zip(config.smtp_password.clone()),
            implicit_tls: config.use_tls,
        }
    }
}

#[async_trait]
impl MailTransport for SmtpTransport {
    async fn send(&self, email: OutgoingEmail) -> EmailResult<String> {
        if !email.to.contains('@') {
            return Err(EmailError::InvalidRecipient(email.to));
        }

        let message_id = format!("{}@carehub", Uuid::new_v4());
        let message = build_message(&email, &message_id);

        let mut builder =
            SmtpClientBuilder::new(self.host.as_str(), self.port).implicit_tls(self.implicit_tls);
        if let Some((ref user, ref pass)) = self.credentials {
            builder = builder.credentials((user.as_str(), pass.as_str()));
        }

        let mut client = builder
            .connect()
            .await
            .map_err(|e| EmailError::ConnectionFailed(e.to_string()))?;
        client
            .send(message)
            .await
            .map_err(|e| EmailError::SendFailed(e.to_string()))?;

        debug!(provider = "smtp", message_id = %message_id, "Email sent");
        Ok(message_id)
    }
}

/// The id reported to callers is the one carried in the Message-ID header
fn build_message<'x>(email: &'x OutgoingEmail, message_id: &'x str) -> MessageBuilder<'x> {
    MessageBuilder::new()
        .message_id(message_id)
        .from((email.from_name.as_str(), email.from_address.as_str()))
        .to(email.to.as_str())
        .subject(email.subject.as_str())
        .html_body(email.html_body.as_str())
}
