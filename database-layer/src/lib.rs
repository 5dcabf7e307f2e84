//! Document store for CareHub Engine
//!
//! Every entity lives in its own collection of JSON documents. Services work
//! with a typed [`Collection`] and never see the back-end:
//!
//! - [`MemoryStore`]: DashMap-backed, used for development and tests
//! - [`PgDocumentStore`]: PostgreSQL with one JSONB table and a `sequences`
//!   table for atomic counters
//!
//! Human-readable identifiers (`APT000042`, `RCP000007`) come from
//! [`DocumentStore::next_sequence`], which is atomic on both back-ends.
//!
//! ```rust,no_run
//! use database_layer::{Collection, Document, Filter, FindOptions, MemoryStore};
//! use serde::{Deserialize, Serialize};
//! use std::sync::Arc;
//!
//! #[derive(Serialize, Deserialize)]
//! struct Ward { id: String, beds: u32 }
//!
//! impl Document for Ward {
//!     const COLLECTION: &'static str = "wards";
//!     fn document_id(&self) -> String { self.id.clone() }
//! }
//!
//! # async fn run() -> database_layer::DatabaseResult<()> {
//! let wards: Collection<Ward> = Collection::new(Arc::new(MemoryStore::new()));
//! let large = wards
//!     .find(&Filter::new().gte_opt("beds", Some(20)), &FindOptions::new())
//!     .await?;
//! # Ok(()) }
//! ```

pub mod connection;
pub mod document;
pub mod error;
pub mod memory;
pub mod query;

pub use connection::PgDocumentStore;
pub use document::{Collection, Document, DocumentStore};
pub use error::{DatabaseError, DatabaseResult};
pub use memory::MemoryStore;
pub use query::{Condition, Filter, FindOptions, SortOrder};
