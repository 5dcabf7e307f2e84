use database_layer::DatabaseError;
use thiserror::Error;

use crate::models::Role;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already in use")]
    EmailAlreadyInUse,

    #[error("Username already in use")]
    UsernameAlreadyInUse,

    #[error("License number already registered")]
    LicenseNumberInUse,

    #[error("Employee ID already registered")]
    EmployeeIdInUse,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Session expired")]
    TokenExpired,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Account disabled")]
    AccountDisabled,

    #[error("User role cannot be changed")]
    RoleImmutable,

    #[error("Role '{0}' cannot be self-registered")]
    RoleNotPermitted(Role),

    #[error("You cannot delete your own account")]
    CannotDeleteSelf,

    #[error("Hashing error")]
    HashingError,

    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl IdentityError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
