use serde::{Deserialize, Serialize};

/// Outbound mail settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    /// When false, notifications succeed without sending anything
    pub enabled: bool,
    pub from_address: String,
    pub from_name: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// Implicit TLS (SMTPS); otherwise STARTTLS is negotiated
    pub use_tls: bool,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            from_address: "noreply@carehub.local".to_string(),
            from_name: "CareHub".to_string(),
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            use_tls: false,
        }
    }
}
