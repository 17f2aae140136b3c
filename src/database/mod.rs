//! # Database Connection Management
//!
//! Pool construction from [`DatabaseConfig`](crate::config::DatabaseConfig)
//! plus a lightweight health check.

pub mod connection;

pub use connection::DatabaseConnection;
