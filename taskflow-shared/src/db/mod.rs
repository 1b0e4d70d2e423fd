/// PostgreSQL plumbing
///
/// - `pool`: connection pool construction and health checks
/// - `migrations`: embedded schema migrations (`migrations/` at the workspace root)
///
/// Row types and their queries live in [`crate::models`].

pub mod migrations;
pub mod pool;
