//! Identity management for CareHub Engine
//!
//! - The [`User`] document: a shared base record plus a [`RoleProfile`]
//!   variant selected by the `role` tag
//! - Registration (patients only), manager-driven account management,
//!   argon2id password hashing
//! - HS256 session tokens and their resolution back to an active user
//!
//! # Example
//!
//! ```rust,no_run
//! use auth_identity::{IdentityConfig, IdentityService, NewUser};
//! use database_layer::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn run(request: NewUser) -> auth_identity::Result<()> {
//! let service = IdentityService::new(Arc::new(MemoryStore::new()), IdentityConfig::default());
//! let user = service.register(request).await?;
//! let login = service.login(&user.email, "Secret123").await?;
//! let same_user = service.verify_token(&login.token).await?;
//! # Ok(()) }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod service;
pub mod tokens;

pub use config::*;
pub use error::*;
pub use models::*;
pub use service::*;
pub use tokens::{IssuedToken, TokenClaims, TokenService};
