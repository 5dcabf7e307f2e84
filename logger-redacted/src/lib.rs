//! PII redaction for log output
//!
//! Patient emails, phone numbers and card numbers routinely pass through the
//! appointment and billing flows. Anything that is about to be written to a
//! log line should go through [`redact`] (or a configured [`PiiRedactor`])
//! first.
//!
//! | Data            | Masked form              | Correlation form |
//! |-----------------|--------------------------|------------------|
//! | `jane@site.org` | `j***@site.org`          | `EMAIL[..]`      |
//! | `+1 555 123 4567` | `***-***-**67`         | `PHONE[..]`      |
//! | `4111 1111 1111 1111` | `****-****-****-1111` | `CARD[..]`   |
//!
//! ```rust
//! let line = logger_redacted::redact("reminder sent to jane@site.org");
//! assert_eq!(line, "reminder sent to j***@site.org");
//! ```

pub mod redactor;

pub use redactor::*;

use lazy_static::lazy_static;

lazy_static! {
    static ref DEFAULT_REDACTOR: PiiRedactor = PiiRedactor::default();
}

/// Redact `text` with the default masking configuration
pub fn redact(text: &str) -> String {
    DEFAULT_REDACTOR.redact(text)
}
