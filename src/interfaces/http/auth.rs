use super::SharedState;
use crate::application::auth::Session;
use crate::error::{PortalError, Result};
use axum::{
    Json,
    extract::{Request, State},
    http::{
        HeaderMap, StatusCode,
        header::{COOKIE, SET_COOKIE},
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

pub const SESSION_COOKIE: &str = "asb_session";

#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
    #[serde(flatten)]
    pub session: Option<Session>,
}

pub async fn login(
    State(state): State<SharedState>,
    Json(credentials): Json<Credentials>,
) -> Result<Response> {
    let session = state
        .sessions
        .login(&credentials.username, &credentials.password)
        .await?;
    let cookie = session_cookie(&session.token, state.sessions.ttl().num_seconds());

    Ok((
        [(SET_COOKIE, cookie)],
        Json(SessionStatus {
            authenticated: true,
            session: Some(session),
        }),
    )
        .into_response())
}

pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.revoke(token).await;
    }
    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, session_cookie("", 0))],
    )
        .into_response()
}

pub async fn session(State(state): State<SharedState>, headers: HeaderMap) -> Json<SessionStatus> {
    let session = match session_token(&headers) {
        Some(token) => state.sessions.validate(token).await,
        None => None,
    };
    Json(SessionStatus {
        authenticated: session.is_some(),
        session,
    })
}

/// Rejects requests without a live admin session. The session is handed
/// to handlers through request extensions.
pub async fn require_admin(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = session_token(request.headers())
        .map(str::to_string)
        .ok_or(PortalError::Unauthorized)?;
    let session = state
        .sessions
        .validate(&token)
        .await
        .ok_or(PortalError::Unauthorized)?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

fn session_cookie(token: &str, max_age: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

/// Reads the session token out of the `Cookie` headers.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}
