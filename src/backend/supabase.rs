//! Supabase implementation of [`Backend`]: GoTrue for auth, PostgREST for the
//! todos table.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use uuid::Uuid;

use super::{AuthSession, Backend, BackendError, BackendResult, SignUp};
use crate::config::SupabaseConfig;
use crate::models::{NewTodo, Todo, TodoId, TodoPatch, User};

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    table: String,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            table: config.table.clone(),
        }
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }
    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    /// Every call carries the project key; `token` is the user's access
    /// token when there is one.
    fn authorized(&self, builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        builder
            .header("apikey", &self.anon_key)
            .bearer_auth(token.unwrap_or(self.anon_key.as_str()))
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> BackendResult<Response> {
        let request = self
            .http
            .post(self.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .json(&body);
        Ok(self.authorized(request, None).send().await?)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    expires_at: Option<i64>,
    user: WireUser,
}
impl TokenResponse {
    fn into_session(self, now: DateTime<Utc>) -> AuthSession {
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or_else(|| now + Duration::seconds(self.expires_in));
        AuthSession {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at,
            user: self.user.into(),
        }
    }
}

#[derive(Deserialize)]
struct WireUser {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: UserMetadata,
}
#[derive(Deserialize, Default)]
struct UserMetadata {
    #[serde(default)]
    username: Option<String>,
}
impl From<WireUser> for User {
    fn from(user: WireUser) -> Self {
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            username: user.user_metadata.username.filter(|name| !name.is_empty()),
        }
    }
}

#[derive(Deserialize)]
struct CompletionRow {
    is_complete: bool,
}

/// Pulls a readable message out of a GoTrue or PostgREST error body.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["msg", "message", "error_description", "error"] {
            if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
                if !message.is_empty() {
                    return message.to_string();
                }
            }
        }
    }
    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

async fn check(resp: Response) -> BackendResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::Unauthorized);
    }
    let body = resp.text().await?;
    Err(BackendError::Rejected {
        status,
        message: error_message(status, &body),
    })
}

async fn decode<T: DeserializeOwned>(resp: Response) -> BackendResult<T> {
    let bytes = resp.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

pub(crate) fn owner_filter(user_id: Uuid) -> Vec<(&'static str, String)> {
    vec![("user_id", format!("eq.{}", user_id))]
}

pub(crate) fn row_filter(user_id: Uuid, id: &TodoId) -> Vec<(&'static str, String)> {
    vec![
        ("id", format!("eq.{}", id)),
        ("user_id", format!("eq.{}", user_id)),
    ]
}

#[async_trait]
impl Backend for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> BackendResult<SignUp> {
        let request = self.http.post(self.auth_url("signup")).json(&json!({
            "email": email,
            "password": password,
            "data": { "username": username },
        }));
        let resp = check(self.authorized(request, None).send().await?).await?;
        let body: serde_json::Value = decode(resp).await?;
        // Without auto-confirm the endpoint answers with the bare user.
        if body.get("access_token").is_some() {
            let tokens: TokenResponse = serde_json::from_value(body)?;
            Ok(SignUp::Session(tokens.into_session(Utc::now())))
        } else {
            Ok(SignUp::ConfirmationRequired)
        }
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let resp = self
            .token_grant("password", json!({ "email": email, "password": password }))
            .await?;
        if resp.status() == StatusCode::BAD_REQUEST {
            return Err(BackendError::InvalidCredentials);
        }
        let tokens: TokenResponse = decode(check(resp).await?).await?;
        Ok(tokens.into_session(Utc::now()))
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        let request = self.http.post(self.auth_url("logout"));
        check(self.authorized(request, Some(access_token)).send().await?).await?;
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> BackendResult<AuthSession> {
        let resp = self
            .token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await?;
        if resp.status() == StatusCode::BAD_REQUEST {
            return Err(BackendError::Unauthorized);
        }
        let tokens: TokenResponse = decode(check(resp).await?).await?;
        Ok(tokens.into_session(Utc::now()))
    }

    async fn list_todos(&self, access_token: &str, user_id: Uuid) -> BackendResult<Vec<Todo>> {
        let request = self
            .http
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .query(&owner_filter(user_id));
        let resp = check(self.authorized(request, Some(access_token)).send().await?).await?;
        decode(resp).await
    }

    async fn insert_todo(&self, access_token: &str, todo: &NewTodo) -> BackendResult<Todo> {
        let request = self
            .http
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(&[todo]);
        let resp = check(self.authorized(request, Some(access_token)).send().await?).await?;
        let mut rows: Vec<Todo> = decode(resp).await?;
        rows.pop().ok_or_else(|| BackendError::Rejected {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Insert returned no row".to_string(),
        })
    }

    async fn update_todo(
        &self,
        access_token: &str,
        user_id: Uuid,
        id: &TodoId,
        patch: &TodoPatch,
    ) -> BackendResult<Option<Todo>> {
        let request = self
            .http
            .patch(self.table_url())
            .query(&row_filter(user_id, id))
            .header("Prefer", "return=representation")
            .json(patch);
        let resp = check(self.authorized(request, Some(access_token)).send().await?).await?;
        let rows: Vec<Todo> = decode(resp).await?;
        Ok(rows.into_iter().next())
    }

    async fn delete_todo(
        &self,
        access_token: &str,
        user_id: Uuid,
        id: &TodoId,
    ) -> BackendResult<bool> {
        let request = self
            .http
            .delete(self.table_url())
            .query(&row_filter(user_id, id))
            .header("Prefer", "return=representation");
        let resp = check(self.authorized(request, Some(access_token)).send().await?).await?;
        let rows: Vec<serde_json::Value> = decode(resp).await?;
        Ok(!rows.is_empty())
    }

    async fn completion_flags(&self, access_token: &str, user_id: Uuid) -> BackendResult<Vec<bool>> {
        let request = self
            .http
            .get(self.table_url())
            .query(&[("select", "is_complete")])
            .query(&owner_filter(user_id));
        let resp = check(self.authorized(request, Some(access_token)).send().await?).await?;
        let rows: Vec<CompletionRow> = decode(resp).await?;
        Ok(rows.into_iter().map(|row| row.is_complete).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SupabaseClient {
        SupabaseClient::new(&SupabaseConfig {
            url: "https://project.supabase.co/".into(),
            anon_key: "anon".into(),
            table: "todos".into(),
        })
    }

    #[test]
    fn test_urls() {
        let client = client();
        assert_eq!(
            client.auth_url("token"),
            "https://project.supabase.co/auth/v1/token"
        );
        assert_eq!(client.table_url(), "https://project.supabase.co/rest/v1/todos");
    }

    #[test]
    fn test_filters_are_owner_scoped() {
        let user = Uuid::nil();
        assert_eq!(
            owner_filter(user),
            vec![("user_id", format!("eq.{}", user))]
        );
        let filter = row_filter(user, &TodoId::new("12"));
        assert_eq!(filter[0], ("id", "eq.12".to_string()));
        assert_eq!(filter[1].0, "user_id");
    }

    #[test]
    fn test_error_message_prefers_known_fields() {
        let status = StatusCode::UNPROCESSABLE_ENTITY;
        assert_eq!(
            error_message(status, r#"{"code":422,"msg":"Password should be at least 6 characters"}"#),
            "Password should be at least 6 characters"
        );
        assert_eq!(
            error_message(status, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            "Invalid login credentials"
        );
        assert_eq!(error_message(status, "plain text"), "plain text");
        assert_eq!(error_message(status, ""), "Unprocessable Entity");
    }

    #[test]
    fn test_token_response_into_session() {
        let body = serde_json::json!({
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1_700_000_000,
            "refresh_token": "refresh",
            "user": {
                "id": "6f2c1b0e-6a55-4d3c-9f39-6f0c4d8e2a11",
                "email": "ann@example.com",
                "user_metadata": { "username": "ann" }
            }
        });
        let tokens: TokenResponse = serde_json::from_value(body).unwrap();
        let session = tokens.into_session(Utc::now());
        assert_eq!(session.expires_at.timestamp(), 1_700_000_000);
        assert_eq!(session.user.display_name(), "ann");
        assert_eq!(session.user.email, "ann@example.com");
    }

    #[test]
    fn test_token_response_without_expires_at() {
        let body = serde_json::json!({
            "access_token": "jwt",
            "expires_in": 60,
            "refresh_token": "refresh",
            "user": { "id": "6f2c1b0e-6a55-4d3c-9f39-6f0c4d8e2a11" }
        });
        let tokens: TokenResponse = serde_json::from_value(body).unwrap();
        let now = Utc::now();
        let session = tokens.into_session(now);
        assert_eq!(session.expires_at, now + Duration::seconds(60));
        assert_eq!(session.user.username, None);
    }
}
