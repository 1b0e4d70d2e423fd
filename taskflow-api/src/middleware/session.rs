/// Session middleware
///
/// Task routes sit behind [`require_session`]: the session cookie is resolved
/// through the [`SessionGate`](taskflow_shared::auth::SessionGate) and the
/// resulting [`AuthContext`] is inserted into the request extensions. Requests
/// without a live session are answered with 401 before any handler runs.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use taskflow_shared::auth::AuthContext;

use crate::{app::AppState, error::ApiError};

/// Value of the session cookie, if the request carries one
pub fn session_token<'a>(state: &AppState, jar: &'a CookieJar) -> Option<&'a str> {
    jar.get(&state.config.session.cookie_name)
        .map(|cookie| cookie.value())
}

/// Rejects requests without a valid session; injects [`AuthContext`] otherwise
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth = state
        .gate
        .authenticate(session_token(&state, &jar))
        .await?
        .ok_or_else(ApiError::unauthenticated)?;

    tracing::debug!(user_id = %auth.user_id, "Session resolved");
    req.extensions_mut().insert::<AuthContext>(auth);

    Ok(next.run(req).await)
}
