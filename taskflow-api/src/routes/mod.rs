/// API route handlers
///
/// - `health`: liveness and storage reachability
/// - `auth`: login, registration, logout, current user
/// - `tasks`: owner-scoped task CRUD, listing views and summary

pub mod auth;
pub mod health;
pub mod tasks;
