use appointment_service::AppointmentError;
use auth_identity::IdentityError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use billing_service::BillingError;
use database_layer::DatabaseError;
use email_service::NotificationOutcome;
use error_common::codes;
use hospital_directory::DirectoryError;
use records_service::RecordError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Whether 500 responses carry the underlying message (development only)
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

const GENERIC_INTERNAL_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

/// Standard API error body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub success: bool,
    pub message: String,
    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<HashMap<String, Vec<String>>>,
    pub error_type: String,
    pub error_code: String,
    /// Correlates the response with the server log line
    pub error_id: String,
}

/// Standard API success response wrapper
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification: Option<NotificationOutcome>,
}

impl<T> ApiResponse<T> {
    pub fn with_notification(mut self, outcome: Option<NotificationOutcome>) -> Self {
        self.notification = outcome;
        self
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<PaginationInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationInfo {
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: Option<HashMap<String, Vec<String>>>,
    },

    #[error("{message}")]
    Authentication { message: String, code: &'static str },

    #[error("{message}")]
    Authorization { message: String, code: &'static str },

    #[error("{resource_type} not found")]
    NotFound { resource_type: String },

    /// A well-formed request that breaks a lifecycle rule
    #[error("{message}")]
    BusinessRule { message: String, code: &'static str },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field_errors: None,
        }
    }

    /// Validation error naming the offending field
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        let message = message.into();
        let mut field_errors = HashMap::new();
        field_errors.insert(field.into(), vec![message.clone()]);
        Self::Validation {
            message,
            field_errors: Some(field_errors),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            code: codes::authentication::SESSION_INVALID,
        }
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
            code: codes::authorization::ACCESS_DENIED,
        }
    }

    pub fn forbidden_role() -> Self {
        Self::Authorization {
            message: "Your role is not permitted to perform this action".to_string(),
            code: codes::authorization::ROLE_NOT_PERMITTED,
        }
    }

    pub fn not_found(resource_type: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
        }
    }

    pub fn business_rule(message: impl Into<String>) -> Self {
        Self::BusinessRule {
            message: message.into(),
            code: codes::business::RULE_VIOLATION,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::BusinessRule { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Authorization { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Database(DatabaseError::ConnectionFailed(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Database(_) | ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation_error",
            ApiError::Authentication { .. } => "authentication_error",
            ApiError::Authorization { .. } => "authorization_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::BusinessRule { .. } => "business_rule_violation",
            ApiError::Database(_) => "database_error",
            ApiError::Internal { .. } => "internal_error",
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => codes::validation::INVALID_INPUT,
            ApiError::Authentication { code, .. }
            | ApiError::Authorization { code, .. }
            | ApiError::BusinessRule { code, .. } => *code,
            ApiError::NotFound { .. } => codes::business::RESOURCE_NOT_FOUND,
            ApiError::Database(DatabaseError::ConnectionFailed(_)) => codes::database::CONNECTION_FAILED,
            ApiError::Database(DatabaseError::DuplicateKey { .. }) => {
                codes::database::CONSTRAINT_VIOLATION
            }
            ApiError::Database(_) => codes::database::QUERY_FAILED,
            ApiError::Internal { .. } => codes::system::INTERNAL,
        }
    }

    fn is_internal(&self) -> bool {
        matches!(self, ApiError::Database(_) | ApiError::Internal { .. })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4().to_string();
        let status_code = self.status_code();

        if self.is_internal() {
            error!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "API error occurred"
            );
        } else {
            warn!(
                error_id = %error_id,
                error_type = %self.error_type(),
                status_code = %status_code.as_u16(),
                error = %self,
                "Request rejected"
            );
        }

        let message = if self.is_internal() && !EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed) {
            GENERIC_INTERNAL_MESSAGE.to_string()
        } else {
            self.to_string()
        };
        let errors = match &self {
            ApiError::Validation { field_errors, .. } => field_errors.clone(),
            _ => None,
        };

        let body = ApiErrorResponse {
            success: false,
            message,
            errors,
            error_type: self.error_type().to_string(),
            error_code: self.error_code().to_string(),
            error_id,
        };
        (status_code, Json(body)).into_response()
    }
}

pub fn api_success<T>(data: T) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
        metadata: None,
        notification: None,
    }
}

pub fn api_success_with_meta<T>(data: T, metadata: ResponseMetadata) -> ApiResponse<T> {
    ApiResponse {
        success: true,
        data,
        metadata: Some(metadata),
        notification: None,
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<IdentityError> for ApiError {
    fn from(error: IdentityError) -> Self {
        match error {
            IdentityError::UserNotFound => ApiError::not_found("User"),
            IdentityError::InvalidCredentials => ApiError::Authentication {
                message: error.to_string(),
                code: codes::authentication::INVALID_CREDENTIALS,
            },
            IdentityError::TokenExpired => ApiError::Authentication {
                message: error.to_string(),
                code: codes::authentication::TOKEN_EXPIRED,
            },
            IdentityError::InvalidToken => ApiError::authentication(error.to_string()),
            IdentityError::AccountDisabled => ApiError::Authentication {
                message: error.to_string(),
                code: codes::authentication::ACCOUNT_DISABLED,
            },
            IdentityError::InvalidEmail => ApiError::field("email", error.to_string()),
            IdentityError::WeakPassword(_) => ApiError::field("password", error.to_string()),
            IdentityError::Validation { ref field, .. } => {
                ApiError::field(field.clone(), error.to_string())
            }
            IdentityError::EmailAlreadyInUse
            | IdentityError::UsernameAlreadyInUse
            | IdentityError::LicenseNumberInUse
            | IdentityError::EmployeeIdInUse => ApiError::BusinessRule {
                message: error.to_string(),
                code: codes::database::CONSTRAINT_VIOLATION,
            },
            IdentityError::RoleImmutable | IdentityError::CannotDeleteSelf => {
                ApiError::business_rule(error.to_string())
            }
            IdentityError::RoleNotPermitted(_) => ApiError::Authorization {
                message: error.to_string(),
                code: codes::authorization::ROLE_NOT_PERMITTED,
            },
            IdentityError::HashingError | IdentityError::JwtError(_) => {
                ApiError::internal(error.to_string())
            }
            IdentityError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(error: DirectoryError) -> Self {
        match error {
            DirectoryError::HospitalNotFound => ApiError::not_found("Hospital"),
            DirectoryError::Validation { ref field, .. } => {
                ApiError::field(field.clone(), error.to_string())
            }
            DirectoryError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<AppointmentError> for ApiError {
    fn from(error: AppointmentError) -> Self {
        match error {
            AppointmentError::AppointmentNotFound => ApiError::not_found("Appointment"),
            AppointmentError::PatientNotFound => ApiError::not_found("Patient"),
            AppointmentError::DoctorNotFound => ApiError::not_found("Doctor"),
            AppointmentError::HospitalNotFound => ApiError::not_found("Hospital"),
            AppointmentError::AccessDenied => ApiError::authorization(error.to_string()),
            AppointmentError::Validation { ref field, .. } => {
                ApiError::field(field.clone(), error.to_string())
            }
            AppointmentError::AlreadyCompleted
            | AppointmentError::AlreadyCancelled
            | AppointmentError::CancelThroughUpdate
            | AppointmentError::TerminalStatus(_) => ApiError::business_rule(error.to_string()),
            AppointmentError::NumbersExhausted(_) => ApiError::internal(error.to_string()),
            AppointmentError::Identity(e) => e.into(),
            AppointmentError::Directory(e) => e.into(),
            AppointmentError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<BillingError> for ApiError {
    fn from(error: BillingError) -> Self {
        match error {
            BillingError::PaymentNotFound => ApiError::not_found("Payment"),
            BillingError::PatientNotFound => ApiError::not_found("Patient"),
            BillingError::AppointmentNotFound => ApiError::not_found("Appointment"),
            BillingError::HospitalNotFound => ApiError::not_found("Hospital"),
            BillingError::AccessDenied => ApiError::authorization(error.to_string()),
            BillingError::Validation { ref field, .. } => {
                ApiError::field(field.clone(), error.to_string())
            }
            BillingError::ReceiptRequiresCompleted
            | BillingError::RefundRequiresCompleted
            | BillingError::RefundExceedsAmount
            | BillingError::AppointmentCancelled
            | BillingError::FeeAlreadyPaid(_)
            | BillingError::RefundThroughUpdate
            | BillingError::StatusLocked(_) => ApiError::business_rule(error.to_string()),
            BillingError::Appointment(e) => e.into(),
            BillingError::Identity(e) => e.into(),
            BillingError::Directory(e) => e.into(),
            BillingError::Database(e) => ApiError::Database(e),
        }
    }
}

impl From<RecordError> for ApiError {
    fn from(error: RecordError) -> Self {
        match error {
            RecordError::RecordNotFound => ApiError::not_found("Medical record"),
            RecordError::PatientNotFound => ApiError::not_found("Patient"),
            RecordError::HospitalNotFound => ApiError::not_found("Hospital"),
            RecordError::AppointmentNotFound => ApiError::not_found("Appointment"),
            RecordError::AccessDenied => ApiError::authorization(error.to_string()),
            RecordError::Validation { ref field, .. } => {
                ApiError::field(field.clone(), error.to_string())
            }
            RecordError::Identity(e) => e.into(),
            RecordError::Directory(e) => e.into(),
            RecordError::Appointment(e) => e.into(),
            RecordError::Database(e) => ApiError::Database(e),
        }
    }
}
