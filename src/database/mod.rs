//! # Database Module
//!
//! Pool construction and schema migrations for the Postgres context store.

pub mod connection;
pub mod migrator;

pub use connection::{connect, DatabaseConnection};
pub use migrator::MIGRATOR;
