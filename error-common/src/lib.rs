//! Common error handling utilities for CareHub Engine
//!
//! Process-level failures (configuration, storage bootstrap, binding the
//! listener) are reported through [`CareHubError`]. Request-level failures
//! are owned by each service crate and mapped to HTTP responses by the
//! server, which tags every error body with one of the stable codes in
//! [`codes`].
//!
//! # Example
//!
//! ```rust
//! use error_common::{CareHubError, ErrorKind, Result};
//!
//! fn require_secret(secret: &str) -> Result<()> {
//!     if secret.len() < 16 {
//!         return Err(CareHubError::ConfigError("jwt secret is too short".into()));
//!     }
//!     Ok(())
//! }
//!
//! let err = require_secret("short").unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Configuration);
//! ```

pub mod codes;
pub mod types;

pub use types::*;
