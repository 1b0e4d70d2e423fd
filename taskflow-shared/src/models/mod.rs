/// Database models for TaskFlow
///
/// Each model owns its SQL: static async methods taking a `&PgPool`.
///
/// # Models
///
/// - `user`: accounts (username + Argon2id hash)
/// - `task`: owner-scoped tasks, plus the create/patch payload types
/// - `session`: digests of opaque session tokens
/// - `settings`: notification and branding settings (shape only, not persisted)

pub mod session;
pub mod settings;
pub mod task;
pub mod user;
