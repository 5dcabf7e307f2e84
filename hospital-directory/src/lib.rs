//! Hospital directory: facilities, capacity and operating hours

pub mod error;
pub mod models;
pub mod service;

pub use error::{DirectoryError, DirectoryResult};
pub use models::*;
pub use service::HospitalService;
