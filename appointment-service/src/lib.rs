//! Appointment lifecycle for CareHub Engine
//!
//! Appointments link a patient, a doctor and a hospital. Identifiers
//! (`APT000042`) come from an atomic counter in the document store, so
//! concurrent bookings never collide. The two fee sub-records are only ever
//! marked paid through [`AppointmentService::apply_fee_payment`], which the
//! billing service calls once a linked payment completes.

pub mod error;
pub mod models;
pub mod service;

pub use error::*;
pub use models::*;
pub use service::*;
