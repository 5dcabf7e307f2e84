//! Patient notifications for CareHub Engine
//!
//! Lifecycle events (booking, reminder, cancellation, payment) are turned
//! into [`Notification`]s and handed to a [`Notifier`]. The email notifier
//! renders a plain HTML body and delivers it through a [`MailTransport`];
//! the SMTP transport is built on Stalwart Labs' `mail-send` and
//! `mail-builder`.
//!
//! Delivery is best-effort. A failed send produces a
//! [`NotificationOutcome`] with `success: false` and never an error.

pub mod config;
pub mod error;
pub mod notification;
pub mod notifier;
pub mod transport;

pub use config::EmailConfig;
pub use error::*;
pub use notification::*;
pub use notifier::*;
pub use transport::*;
