pub mod appointments;
pub mod auth;
pub mod health;
pub mod hospitals;
pub mod payments;
pub mod records;
pub mod users;
