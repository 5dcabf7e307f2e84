use appointment_service::AppointmentError;
use auth_identity::IdentityError;
use database_layer::DatabaseError;
use hospital_directory::error::DirectoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Medical record not found")]
    RecordNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Hospital not found")]
    HospitalNotFound,

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("You do not have access to this medical record")]
    AccessDenied,

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Appointment error: {0}")]
    Appointment(#[from] AppointmentError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl RecordError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type RecordResult<T> = Result<T, RecordError>;
