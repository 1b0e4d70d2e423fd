/// Middleware for the API server
///
/// - `session`: resolves the session cookie and guards task routes
/// - `security`: security response headers

pub mod security;
pub mod session;
