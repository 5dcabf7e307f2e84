use appointment_service::AppointmentError;
use auth_identity::IdentityError;
use database_layer::DatabaseError;
use hospital_directory::error::DirectoryError;
use thiserror::Error;

use appointment_service::FeeKind;

use crate::models::PaymentStatus;

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("Payment not found")]
    PaymentNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Hospital not found")]
    HospitalNotFound,

    #[error("You do not have access to this payment")]
    AccessDenied,

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Receipt can only be generated for completed payments")]
    ReceiptRequiresCompleted,

    #[error("Only completed payments can be refunded")]
    RefundRequiresCompleted,

    #[error("Refund amount cannot exceed the payment amount")]
    RefundExceedsAmount,

    #[error("Cannot pay for a cancelled appointment")]
    AppointmentCancelled,

    #[error("The {0} fee for this appointment is already paid")]
    FeeAlreadyPaid(FeeKind),

    #[error("Use the refund endpoint to refund a payment")]
    RefundThroughUpdate,

    #[error("Cannot change the status of a {0} payment")]
    StatusLocked(PaymentStatus),

    #[error("Appointment error: {0}")]
    Appointment(#[from] AppointmentError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl BillingError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type BillingResult<T> = Result<T, BillingError>;
