//! Session resolution and the sign-in redirect rule.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;

use crate::backend::AuthSession;
use crate::db::SessionId;
use crate::models::User;
use crate::routes::AppState;

pub const SESSION_COOKIE: &str = "todo_session";
pub const SIGN_IN: &str = "/auth/signin";
pub const DASHBOARD: &str = "/tododashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Pass,
    Redirect(&'static str),
}

/// Signed-out visitors only reach `/auth/*`; signed-in visitors never do.
pub fn route_decision(path: &str, signed_in: bool) -> Decision {
    if path == "/health" || path.starts_with("/assets/") {
        return Decision::Pass;
    }
    let auth_route = path == "/auth" || path.starts_with("/auth/");
    match (signed_in, auth_route) {
        (false, false) => Decision::Redirect(SIGN_IN),
        (true, true) => Decision::Redirect(DASHBOARD),
        _ => Decision::Pass,
    }
}

/// The signed-in user's session, available to handlers behind the gate.
#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub id: SessionId,
    pub auth: AuthSession,
}
impl CurrentSession {
    pub fn token(&self) -> &str {
        &self.auth.access_token
    }
    pub fn user(&self) -> &User {
        &self.auth.user
    }
}

/// Marks a response whose backend call refused the session's token.
#[derive(Debug, Clone, Copy)]
pub struct SessionRejected;

pub fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("HX-Request")
}

/// Full navigation for plain requests, `HX-Redirect` for htmx ones.
pub fn redirect(headers: &HeaderMap, to: &'static str) -> Response {
    if is_htmx(headers) {
        let mut response = StatusCode::OK.into_response();
        response
            .headers_mut()
            .insert("HX-Redirect", HeaderValue::from_static(to));
        response
    } else {
        Redirect::to(to).into_response()
    }
}

pub fn session_cookie(id: &SessionId, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Looks the cookie up in the store and refreshes the backend tokens when
/// they are about to expire. A session that cannot be refreshed is dropped.
async fn resolve(state: &AppState, jar: &CookieJar) -> (Option<CurrentSession>, bool) {
    let Some(id) = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| SessionId::parse(cookie.value()))
    else {
        return (None, false);
    };
    let stored = match state.sessions.get(&id) {
        Ok(Some(stored)) => stored,
        Ok(None) => return (None, true),
        Err(err) => {
            tracing::error!("reading session {}: {:#}", id, err);
            return (None, false);
        }
    };
    if !stored.auth.is_expired(Utc::now()) {
        return (
            Some(CurrentSession {
                id,
                auth: stored.auth,
            }),
            false,
        );
    }

    match state.backend.refresh(&stored.auth.refresh_token).await {
        Ok(auth) => {
            if let Err(err) = state.sessions.replace(&id, auth.clone()) {
                tracing::error!("storing refreshed session {}: {:#}", id, err);
            }
            tracing::debug!("refreshed tokens for user {}", auth.user.id);
            (Some(CurrentSession { id, auth }), false)
        }
        Err(err) => {
            tracing::info!("session for user {} ended: {}", stored.auth.user.id, err);
            if let Err(err) = state.sessions.remove(&id) {
                tracing::error!("removing session {}: {:#}", id, err);
            }
            (None, true)
        }
    }
}

pub async fn session_gate(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let (session, stale_cookie) = resolve(&state, &jar).await;
    let jar = if stale_cookie {
        jar.remove(removal_cookie())
    } else {
        jar
    };

    let path = req.uri().path().to_string();
    match route_decision(&path, session.is_some()) {
        Decision::Redirect(to) => {
            let mut response = redirect(req.headers(), to);
            // fragment endpoints answer htmx with 401 so the swap is skipped
            if is_htmx(req.headers()) && session.is_none() {
                *response.status_mut() = StatusCode::UNAUTHORIZED;
            }
            (jar, response).into_response()
        }
        Decision::Pass => {
            let session_id = session.as_ref().map(|session| session.id);
            let htmx = is_htmx(req.headers());
            if let Some(session) = session {
                req.extensions_mut().insert(session);
            }
            let response = next.run(req).await;
            if response.extensions().get::<SessionRejected>().is_some() {
                return end_session(&state, jar, session_id, htmx, response);
            }
            // a handler that issued a fresh session cookie wins over the removal
            if sets_session_cookie(&response) {
                return response;
            }
            (jar, response).into_response()
        }
    }
}

/// Forgets a session whose tokens the backend no longer accepts.
fn end_session(
    state: &AppState,
    jar: CookieJar,
    session_id: Option<SessionId>,
    htmx: bool,
    response: Response,
) -> Response {
    if let Some(id) = session_id {
        tracing::info!("backend rejected session {}, signing out", id);
        if let Err(err) = state.sessions.remove(&id) {
            tracing::error!("removing session {}: {:#}", id, err);
        }
    }
    let jar = jar.remove(removal_cookie());
    if htmx {
        (jar, response).into_response()
    } else {
        (jar, Redirect::to(SIGN_IN)).into_response()
    }
}

fn sets_session_cookie(response: &Response) -> bool {
    let prefix = format!("{}=", SESSION_COOKIE);
    response
        .headers()
        .get_all(axum::http::header::SET_COOKIE)
        .iter()
        .any(|value| value.to_str().is_ok_and(|v| v.starts_with(&prefix)))
}
