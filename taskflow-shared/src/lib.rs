//! # TaskFlow Shared Library
//!
//! Domain types and logic used by the TaskFlow API server.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, session tokens and the session gate
//! - `db`: connection pool and migrations
//! - `models`: database rows and their queries
//! - `query`: filtering, searching, sorting and counting task lists
//! - `store`: storage traits with PostgreSQL and in-memory backends
//! - `validation`: task payload validation

pub mod auth;
pub mod db;
pub mod models;
pub mod query;
pub mod store;
pub mod validation;

/// Current version of the TaskFlow shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
