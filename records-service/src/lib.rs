//! Medical records for CareHub Engine
//!
//! A record is authored by one healthcare professional for one patient at
//! one hospital. Each record carries its own access log: opening, editing
//! and deleting a record each append one entry. Deletion is soft.

pub mod error;
pub mod models;
pub mod service;

pub use error::*;
pub use models::*;
pub use service::*;
