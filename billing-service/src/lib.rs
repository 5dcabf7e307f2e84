//! Payment processing for CareHub Engine
//!
//! Provides:
//! - Checkout with a per-method status rule (cash and government settle
//!   immediately, insurance waits for review, cards and wallets go through
//!   a [`PaymentGateway`])
//! - Fee reconciliation into the linked appointment on completion
//! - Lazily numbered receipts (`RCP000001`)
//! - Full and partial refunds

pub mod error;
pub mod gateway;
pub mod models;
pub mod service;

pub use error::*;
pub use gateway::*;
pub use models::*;
pub use service::*;
