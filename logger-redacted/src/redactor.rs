use base64::{engine::general_purpose, Engine as _};
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

lazy_static! {
    static ref EMAIL_REGEX: Option<Regex> =
        Regex::new(r"\b([A-Za-z0-9._%+-])[A-Za-z0-9._%+-]*@([A-Za-z0-9.-]+\.[A-Za-z]{2,})\b").ok();
    static ref CARD_REGEX: Option<Regex> =
        Regex::new(r"\b\d{4}[-\s]?\d{4}[-\s]?\d{4}[-\s]?(\d{4})\b").ok();
    static ref PHONE_REGEX: Option<Regex> =
        Regex::new(r"(?:\+\d{1,3}[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{2}(\d{2})\b").ok();
}

/// Which kinds of PII to scrub and how
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionConfig {
    pub redact_emails: bool,
    pub redact_phones: bool,
    pub redact_cards: bool,
    /// Replace values with a short stable hash instead of a partial mask
    pub hash_for_correlation: bool,
}

impl Default for RedactionConfig {
    fn default() -> Self {
        Self {
            redact_emails: true,
            redact_phones: true,
            redact_cards: true,
            hash_for_correlation: false,
        }
    }
}

/// PII redactor for log messages
#[derive(Debug, Clone, Default)]
pub struct PiiRedactor {
    config: RedactionConfig,
}

impl PiiRedactor {
    pub fn new(config: RedactionConfig) -> Self {
        Self { config }
    }

    pub fn redact(&self, text: &str) -> String {
        let mut result = text.to_string();

        // Cards before phones: a card number contains phone-shaped runs.
        if self.config.redact_cards {
            result = self.replace(&CARD_REGEX, &result, "CARD", |caps| {
                format!("****-****-****-{}", caps.get(1).map_or("", |m| m.as_str()))
            });
        }

        if self.config.redact_emails {
            result = self.replace(&EMAIL_REGEX, &result, "EMAIL", |caps| {
                format!(
                    "{}***@{}",
                    caps.get(1).map_or("", |m| m.as_str()),
                    caps.get(2).map_or("", |m| m.as_str())
                )
            });
        }

        if self.config.redact_phones {
            result = self.replace(&PHONE_REGEX, &result, "PHONE", |caps| {
                format!("***-***-**{}", caps.get(1).map_or("", |m| m.as_str()))
            });
        }

        result
    }

    fn replace<F>(&self, pattern: &Option<Regex>, text: &str, tag: &str, mask: F) -> String
    where
        F: Fn(&Captures) -> String,
    {
        let Some(regex) = pattern else {
            return text.to_string();
        };

        regex
            .replace_all(text, |caps: &Captures| {
                if self.config.hash_for_correlation {
                    let matched = caps.get(0).map_or("", |m| m.as_str());
                    format!("{}[{}]", tag, hash_value(matched))
                } else {
                    mask(caps)
                }
            })
            .into_owned()
    }
}

fn hash_value(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    general_purpose::URL_SAFE_NO_PAD.encode(digest.get(..6).unwrap_or_default())
}
