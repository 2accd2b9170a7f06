//! The backend-as-a-service seam.
//!
//! Authentication and the `todos` table both live in a hosted backend. The
//! rest of the app only sees the [`Backend`] trait so routes can be exercised
//! against an in-memory double in tests.

pub mod supabase;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{NewTodo, Todo, TodoId, TodoPatch, User};

pub use supabase::SupabaseClient;

/// Tokens handed out by the auth API after a successful sign in or refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}
impl AuthSession {
    pub const REFRESH_LEEWAY_SECS: i64 = 60;

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(Self::REFRESH_LEEWAY_SECS) <= now
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SignUp {
    /// The project auto-confirms accounts and returned a live session.
    Session(AuthSession),
    /// A confirmation email was sent; the user signs in afterwards.
    ConfirmationRequired,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Session expired, please sign in again")]
    Unauthorized,
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
    #[error("Backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Unexpected backend response: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;

#[async_trait]
pub trait Backend: Send + Sync + 'static {
    // auth
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> BackendResult<SignUp>;
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession>;
    async fn sign_out(&self, access_token: &str) -> BackendResult<()>;
    async fn refresh(&self, refresh_token: &str) -> BackendResult<AuthSession>;

    // todos, always scoped to the owner
    async fn list_todos(&self, access_token: &str, user_id: Uuid) -> BackendResult<Vec<Todo>>;
    async fn insert_todo(&self, access_token: &str, todo: &NewTodo) -> BackendResult<Todo>;
    async fn update_todo(
        &self,
        access_token: &str,
        user_id: Uuid,
        id: &TodoId,
        patch: &TodoPatch,
    ) -> BackendResult<Option<Todo>>;
    async fn delete_todo(&self, access_token: &str, user_id: Uuid, id: &TodoId)
        -> BackendResult<bool>;
    async fn completion_flags(&self, access_token: &str, user_id: Uuid) -> BackendResult<Vec<bool>>;
}
