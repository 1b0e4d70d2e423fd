/// Session model and database operations
///
/// A session binds an opaque token to a user until logout or expiry. Only the
/// SHA-256 digest of the token is stored; see [`crate::auth::session`] for
/// token generation.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     token_hash CHAR(64) PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// Session row
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Session {
    /// Hex-encoded SHA-256 digest of the session token
    pub token_hash: String,

    /// User bound to this session
    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,

    /// After this instant the session resolves to nobody
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Returns true if the session has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Inserts a session row
    pub async fn create(
        pool: &PgPool,
        token_hash: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token_hash, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token_hash, user_id, created_at, expires_at
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(session)
    }

    /// Finds an unexpired session by token digest
    pub async fn find_active(pool: &PgPool, token_hash: &str) -> Result<Option<Self>, sqlx::Error> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT token_hash, user_id, created_at, expires_at
            FROM sessions
            WHERE token_hash = $1 AND expires_at > NOW()
            "#,
        )
        .bind(token_hash)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Deletes a session by token digest
    ///
    /// Returns true if a row was removed.
    pub async fn delete(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every expired session, returning how many were removed
    pub async fn delete_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
