/// Session tokens and the session gate
///
/// A session is an opaque random token handed to the client in a cookie. The
/// server keeps only its SHA-256 digest together with the owning user and an
/// expiry, so a leaked sessions table cannot be replayed.
///
/// # Token Format
///
/// ```text
/// tfs_<43 base62 characters>
/// ```
///
/// # Example
///
/// ```no_run
/// use taskflow_shared::auth::session::{SessionGate, SessionPolicy};
/// use taskflow_shared::store::Storage;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = Storage::in_memory();
/// let gate = SessionGate::new(&storage, SessionPolicy::default());
///
/// let outcome = gate.login("alice", "hunter2").await?;
/// let me = gate.current_user(Some(outcome.token.as_str())).await?;
/// assert_eq!(me.map(|u| u.username), Some("alice".to_string()));
/// # Ok(())
/// # }
/// ```

use chrono::Duration;
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

use super::password::{hash_password, verify_password, PasswordError};
use crate::models::user::{CreateUser, PublicUser, User};
use crate::store::{SessionStore, Storage, StoreError, UserStore};

/// Prefix carried by every session token
pub const TOKEN_PREFIX: &str = "tfs_";

/// Random characters after the prefix (~256 bits of entropy)
const TOKEN_RANDOM_LEN: usize = 43;

/// Hash verified against when the username is unknown, so rejected logins
/// cost the same Argon2 work whether or not the account exists
fn decoy_hash() -> Option<&'static str> {
    static DECOY: OnceLock<Option<String>> = OnceLock::new();
    DECOY
        .get_or_init(|| hash_password("taskflow-decoy-credential").ok())
        .as_deref()
}

/// Plaintext session token
///
/// Only ever held in memory and in the client's cookie. `Debug` output is
/// redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generates a fresh random token
    pub fn generate() -> Self {
        let random: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_RANDOM_LEN)
            .map(char::from)
            .collect();

        Self(format!("{}{}", TOKEN_PREFIX, random))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Hex SHA-256 digest used as the storage key
    pub fn digest(&self) -> String {
        hash_session_token(&self.0)
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({}***)", TOKEN_PREFIX)
    }
}

/// SHA-256 hex digest of a presented token
pub fn hash_session_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub username: String,
}

impl From<&User> for AuthContext {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
        }
    }
}

/// Session lifetime and provisioning behaviour
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// How long a session stays valid after login
    pub ttl: Duration,

    /// Create an account on first login with an unknown username
    pub auto_provision: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(168),
            auto_provision: true,
        }
    }
}

/// Session gate errors
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Unknown username (with provisioning off) or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Registration with a username that already exists
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Successful login or registration
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: PublicUser,
    pub token: SessionToken,
    /// True when the account was created by this call
    pub provisioned: bool,
}

/// Establishes, resolves and ends sessions
#[derive(Clone)]
pub struct SessionGate {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    policy: SessionPolicy,
}

impl SessionGate {
    pub fn new(storage: &Storage, policy: SessionPolicy) -> Self {
        Self {
            users: storage.users.clone(),
            sessions: storage.sessions.clone(),
            policy,
        }
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// Logs a user in, provisioning the account on first use when enabled
    ///
    /// # Errors
    ///
    /// - `InvalidCredentials` on a password mismatch, or an unknown username
    ///   with provisioning disabled
    /// - `Store` / `Password` on infrastructure failures
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, SessionError> {
        let username = username.trim();

        let (user, provisioned) = match self.users.find_by_username(username).await? {
            Some(user) => (user, false),
            None if self.policy.auto_provision => self.provision(username, password).await?,
            None => {
                if let Some(decoy) = decoy_hash() {
                    let _ = verify_password(password, decoy);
                }
                tracing::info!(username = %username, "Login rejected: unknown user");
                return Err(SessionError::InvalidCredentials);
            }
        };

        if !provisioned && !verify_password(password, &user.password_hash)? {
            tracing::info!(user_id = %user.id, "Login rejected: password mismatch");
            return Err(SessionError::InvalidCredentials);
        }

        let token = self.sessions.create(user.id, self.policy.ttl).await?;
        tracing::info!(user_id = %user.id, provisioned, "Session established");

        Ok(LoginOutcome {
            user: PublicUser::from(user),
            token,
            provisioned,
        })
    }

    /// Creates the account for an unknown username
    ///
    /// Losing a race against a concurrent first login yields the winner's
    /// record; the caller then verifies against it.
    async fn provision(&self, username: &str, password: &str) -> Result<(User, bool), SessionError> {
        let password_hash = hash_password(password)?;
        let data = CreateUser {
            username: username.to_string(),
            password_hash,
        };

        match self.users.create(data).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "User provisioned on first login");
                Ok((user, true))
            }
            Err(StoreError::Conflict(_)) => match self.users.find_by_username(username).await? {
                Some(user) => Ok((user, false)),
                None => Err(SessionError::InvalidCredentials),
            },
            Err(e) => Err(e.into()),
        }
    }

    /// Registers a new account and opens a session for it
    ///
    /// # Errors
    ///
    /// `UsernameTaken` if the username already exists.
    pub async fn register(&self, username: &str, password: &str) -> Result<LoginOutcome, SessionError> {
        let username = username.trim();
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create(CreateUser {
                username: username.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => SessionError::UsernameTaken(username.to_string()),
                other => SessionError::Store(other),
            })?;

        let token = self.sessions.create(user.id, self.policy.ttl).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "User registered");

        Ok(LoginOutcome {
            user: PublicUser::from(user),
            token,
            provisioned: true,
        })
    }

    /// Ends the session if one is presented; succeeds either way
    pub async fn logout(&self, token: Option<&str>) -> Result<(), SessionError> {
        if let Some(token) = token {
            if self.sessions.destroy(token).await? {
                tracing::info!("Session destroyed");
            }
        }
        Ok(())
    }

    /// Resolves a presented token to its user
    ///
    /// Missing, unknown and expired tokens all yield `Ok(None)`.
    pub async fn authenticate(&self, token: Option<&str>) -> Result<Option<AuthContext>, SessionError> {
        Ok(self
            .resolve_user(token)
            .await?
            .map(|user| AuthContext::from(&user)))
    }

    /// Public view of the user behind a presented token
    pub async fn current_user(&self, token: Option<&str>) -> Result<Option<PublicUser>, SessionError> {
        Ok(self.resolve_user(token).await?.map(PublicUser::from))
    }

    async fn resolve_user(&self, token: Option<&str>) -> Result<Option<User>, SessionError> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(None);
        };

        let Some(user_id) = self.sessions.resolve(token).await? else {
            return Ok(None);
        };

        // The user row may have been removed while the session lived on
        Ok(self.users.find_by_id(user_id).await?)
    }
}
