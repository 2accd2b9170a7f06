pub mod auth;
pub mod stats;
pub mod todos;


use std::sync::Arc;

use axum::{
    http::{header, HeaderMap},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};

use crate::backend::Backend;
use crate::db::SessionStore;
use crate::gate::{self, DASHBOARD};

const APP_JS: &str = include_str!("../../assets/app.js");

// === App State ===
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub sessions: SessionStore,
    pub cookie_secure: bool,
}
impl AppState {
    pub fn new(backend: Arc<dyn Backend>, sessions: SessionStore, cookie_secure: bool) -> Self {
        Self {
            backend,
            sessions,
            cookie_secure,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        // `GET /` only answers signed-in users; the gate sends everyone else to sign in
        .route("/", get(root))
        .route("/auth/signin", get(auth::signin_page).post(auth::signin))
        .route("/auth/signup", get(auth::signup_page).post(auth::signup))
        .route("/signout", post(auth::signout))
        .route("/tododashboard", get(todos::dashboard))
        .route("/todos", get(todos::panel).post(todos::create_todo))
        .route("/todos/:id", put(todos::save_todo).delete(todos::remove_todo))
        .route("/todos/:id/edit", get(todos::edit_todo))
        .route("/todos/:id/toggle", post(todos::toggle_todo))
        .route("/stats", get(stats::stats))
        .route("/assets/app.js", get(app_js))
        .route("/health", get(health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            gate::session_gate,
        ))
        .with_state(state)
}

async fn root(headers: HeaderMap) -> Response {
    gate::redirect(&headers, DASHBOARD)
}

async fn app_js() -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        APP_JS,
    )
        .into_response()
}

async fn health() -> &'static str {
    "ok"
}
