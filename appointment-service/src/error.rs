use auth_identity::IdentityError;
use database_layer::DatabaseError;
use hospital_directory::error::DirectoryError;
use thiserror::Error;

use crate::models::AppointmentStatus;

#[derive(Error, Debug)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Hospital not found")]
    HospitalNotFound,

    #[error("You do not have access to this appointment")]
    AccessDenied,

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Cannot cancel a completed appointment")]
    AlreadyCompleted,

    #[error("Appointment is already cancelled")]
    AlreadyCancelled,

    #[error("Use the cancel endpoint to cancel an appointment")]
    CancelThroughUpdate,

    #[error("Cannot change the status of a {0} appointment")]
    TerminalStatus(AppointmentStatus),

    #[error("Appointment numbers exhausted at sequence {0}")]
    NumbersExhausted(u64),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl AppointmentError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type AppointmentResult<T> = Result<T, AppointmentError>;
