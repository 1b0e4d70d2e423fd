/// Authentication for TaskFlow
///
/// # Modules
///
/// - `password`: Argon2id password hashing and verification
/// - `session`: Opaque session tokens and the [`session::SessionGate`] that
///   implements login, registration, logout and current-user resolution
///
/// # Flow
///
/// ```text
/// POST /auth/login ─> SessionGate::login ─> UserStore (lookup / provision)
///                                        ─> SessionStore::create ─> cookie
/// any task route   ─> cookie ─> SessionGate::authenticate ─> AuthContext
/// ```

pub mod password;
pub mod session;

pub use session::{AuthContext, SessionGate, SessionPolicy, SessionToken};
