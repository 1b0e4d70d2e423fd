/// Authentication endpoints
///
/// - `POST /auth/login` - log in (provisioning the account on first use when enabled)
/// - `POST /auth/register` - create an account explicitly
/// - `POST /auth/logout` - end the current session
/// - `GET /auth/user` - the user behind the current session
///
/// Successful login and registration set an `HttpOnly`, `SameSite=Lax`
/// session cookie holding an opaque token; the response body is only the
/// public user view `{ "id": "...", "username": "..." }`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    middleware::session::session_token,
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use taskflow_shared::{
    auth::session::{LoginOutcome, SessionToken},
    models::user::PublicUser,
    validation::storable_text,
};
use validator::Validate;

/// Login and registration payload
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CredentialsRequest {
    #[validate(
        length(min = 1, max = 64, message = "Username must be 1-64 characters"),
        custom(function = "storable_text")
    )]
    pub username: String,

    #[validate(length(min = 1, max = 256, message = "Password must be 1-256 characters"))]
    pub password: String,
}

impl CredentialsRequest {
    fn parse(body: Result<Json<Self>, JsonRejection>) -> ApiResult<Self> {
        let Json(req) = body?;
        req.validate()?;
        Ok(req)
    }
}

fn session_cookie(state: &AppState, token: SessionToken) -> Cookie<'static> {
    Cookie::build((state.config.session.cookie_name.clone(), token.into_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.api.production)
        .build()
}

fn establish(state: &AppState, jar: CookieJar, outcome: LoginOutcome) -> (CookieJar, Json<PublicUser>) {
    let jar = jar.add(session_cookie(state, outcome.token));
    (jar, Json(outcome.user))
}

/// Logs in
///
/// # Errors
///
/// - `400 Bad Request`: malformed or invalid payload
/// - `401 Unauthorized`: wrong password, or unknown user with provisioning off
/// - `500 Internal Server Error`: storage fault
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<PublicUser>)> {
    let req = CredentialsRequest::parse(body)?;
    let outcome = state.gate.login(&req.username, &req.password).await?;

    Ok(establish(&state, jar, outcome))
}

/// Registers a new account and logs it in
///
/// # Errors
///
/// - `400 Bad Request`: malformed or invalid payload
/// - `409 Conflict`: username already taken
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<CredentialsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, CookieJar, Json<PublicUser>)> {
    let req = CredentialsRequest::parse(body)?;
    let outcome = state.gate.register(&req.username, &req.password).await?;

    let (jar, user) = establish(&state, jar, outcome);
    Ok((StatusCode::CREATED, jar, user))
}

/// Ends the current session and clears the cookie
///
/// Succeeds without a session.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<serde_json::Value>)> {
    state.gate.logout(session_token(&state, &jar)).await?;

    let removal = Cookie::build(state.config.session.cookie_name.clone()).path("/");
    Ok((
        jar.remove(removal),
        Json(serde_json::json!({ "message": "Logged out" })),
    ))
}

/// Returns the user bound to the session
///
/// # Errors
///
/// - `401 Unauthorized`: no live session
pub async fn current_user(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Json<PublicUser>> {
    state
        .gate
        .current_user(session_token(&state, &jar))
        .await?
        .map(Json)
        .ok_or_else(ApiError::unauthenticated)
}
