use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Extension, Form,
};
use axum_extra::extract::cookie::CookieJar;
use maud::Markup;
use serde::Deserialize;

use super::AppState;
use crate::backend::SignUp;
use crate::error::AppError;
use crate::gate::{self, CurrentSession, DASHBOARD, SIGN_IN};
use crate::models::ValidationError;
use crate::views::{self, Notice};

const REGISTERED: &str = "/auth/signin?registered=1";

#[derive(Deserialize)]
pub struct SignInQuery {
    #[serde(default)]
    registered: Option<String>,
}
pub async fn signin_page(Query(query): Query<SignInQuery>) -> Markup {
    let notices = match query.registered {
        Some(_) => vec![Notice::success(
            "Account created. Confirm your email, then sign in.",
        )],
        None => Vec::new(),
    };
    views::auth::signin_page(&notices)
}

#[derive(Deserialize)]
pub struct SignInForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Form(SignInForm { email, password }): Form<SignInForm>,
) -> Result<Response, AppError> {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingCredentials.into());
    }
    let auth = state.backend.sign_in(email, &password).await?;
    tracing::info!("user {} signed in", auth.user.id);
    let id = state.sessions.create(auth)?;
    let jar = jar.add(gate::session_cookie(&id, state.cookie_secure));
    Ok((jar, gate::redirect(&headers, DASHBOARD)).into_response())
}

pub async fn signup_page() -> Markup {
    views::auth::signup_page(None)
}

/// Inline sign-up problem: the bare message for htmx, the whole page otherwise.
fn signup_failed(headers: &HeaderMap, message: &str) -> Response {
    if gate::is_htmx(headers) {
        views::auth::form_error(message).into_response()
    } else {
        views::auth::signup_page(Some(message)).into_response()
    }
}

#[derive(Deserialize)]
pub struct SignUpForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
}
/// Problems are rendered inline under the form rather than as toasts.
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    Form(form): Form<SignUpForm>,
) -> Result<Response, AppError> {
    let username = form.username.trim();
    let email = form.email.trim();
    let invalid = if username.is_empty() {
        Some(ValidationError::MissingUsername)
    } else if email.is_empty() || form.password.is_empty() {
        Some(ValidationError::MissingCredentials)
    } else if form.password != form.confirm_password {
        Some(ValidationError::PasswordMismatch)
    } else {
        None
    };
    if let Some(err) = invalid {
        return Ok(signup_failed(&headers, &err.to_string()));
    }

    match state.backend.sign_up(email, &form.password, username).await
    {
        Ok(SignUp::Session(auth)) => {
            tracing::info!("user {} signed up", auth.user.id);
            let id = state.sessions.create(auth)?;
            let jar = jar.add(gate::session_cookie(&id, state.cookie_secure));
            Ok((jar, gate::redirect(&headers, DASHBOARD)).into_response())
        }
        Ok(SignUp::ConfirmationRequired) => {
            tracing::info!("sign up awaiting email confirmation");
            Ok(gate::redirect(&headers, REGISTERED))
        }
        Err(err) => {
            tracing::warn!("sign up failed: {}", err);
            Ok(signup_failed(&headers, &err.to_string()))
        }
    }
}

pub async fn signout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Err(err) = state.backend.sign_out(session.token()).await {
        tracing::warn!("backend sign out failed: {}", err);
    }
    state.sessions.remove(&session.id)?;
    tracing::info!("user {} signed out", session.user().id);
    let jar = jar.remove(gate::removal_cookie());
    Ok((jar, gate::redirect(&headers, SIGN_IN)).into_response())
}
