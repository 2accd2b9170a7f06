//! In-memory [`Backend`] used by the route tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::StatusCode;
use uuid::Uuid;

use super::{AuthSession, Backend, BackendError, BackendResult, SignUp};
use crate::models::{NewTodo, Todo, TodoId, TodoPatch, User};

#[derive(Default)]
pub struct MemoryBackend {
    accounts: Mutex<Vec<(User, String)>>,
    tokens: Mutex<Vec<(String, Uuid)>>,
    refresh_tokens: Mutex<Vec<(String, User)>>,
    todos: Mutex<Vec<Todo>>,
    next_id: AtomicU64,
    /// Makes every table call fail, for exercising error paths.
    pub failing: AtomicBool,
    /// Sign-up hands back a live session instead of asking for confirmation.
    pub auto_confirm: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_account(&self, email: &str, password: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: None,
        };
        self.accounts
            .lock()
            .unwrap()
            .push((user.clone(), password.to_string()));
        user
    }

    pub fn rows(&self) -> Vec<Todo> {
        self.todos.lock().unwrap().clone()
    }

    /// Stores a row directly, bypassing the access checks.
    pub fn seed(&self, user_id: Uuid, title: &str, is_complete: bool) -> Todo {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let todo = Todo {
            id: TodoId::new(id.to_string()),
            user_id,
            title: title.to_string(),
            description: None,
            is_complete,
            created_at: Utc::now() + Duration::milliseconds(id as i64),
        };
        self.todos.lock().unwrap().push(todo.clone());
        todo
    }

    fn issue(&self, user: User) -> AuthSession {
        let access_token = Uuid::new_v4().to_string();
        let refresh_token = Uuid::new_v4().to_string();
        self.tokens
            .lock()
            .unwrap()
            .push((access_token.clone(), user.id));
        self.refresh_tokens
            .lock()
            .unwrap()
            .push((refresh_token.clone(), user.clone()));
        AuthSession {
            access_token,
            refresh_token,
            expires_at: Utc::now() + Duration::hours(1),
            user,
        }
    }

    fn owner(&self, access_token: &str) -> BackendResult<Uuid> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BackendError::Rejected {
                status: StatusCode::SERVICE_UNAVAILABLE,
                message: "backend down".to_string(),
            });
        }
        self.tokens
            .lock()
            .unwrap()
            .iter()
            .find(|(token, _)| token == access_token)
            .map(|(_, user_id)| *user_id)
            .ok_or(BackendError::Unauthorized)
    }

    /// Mirrors the row-level policy: a token only reaches its own rows.
    fn scoped(&self, access_token: &str, user_id: Uuid) -> BackendResult<Uuid> {
        let owner = self.owner(access_token)?;
        if owner != user_id {
            return Err(BackendError::Unauthorized);
        }
        Ok(owner)
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn sign_up(&self, email: &str, password: &str, username: &str) -> BackendResult<SignUp> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|(user, _)| user.email == email) {
            return Err(BackendError::Rejected {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: "User already registered".to_string(),
            });
        }
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            username: Some(username.to_string()),
        };
        accounts.push((user.clone(), password.to_string()));
        drop(accounts);
        if self.auto_confirm.load(Ordering::SeqCst) {
            return Ok(SignUp::Session(self.issue(user)));
        }
        Ok(SignUp::ConfirmationRequired)
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let user = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|(user, secret)| user.email == email && secret == password)
            .map(|(user, _)| user.clone())
            .ok_or(BackendError::InvalidCredentials)?;
        Ok(self.issue(user))
    }

    async fn sign_out(&self, access_token: &str) -> BackendResult<()> {
        self.tokens
            .lock()
            .unwrap()
            .retain(|(token, _)| token != access_token);
        Ok(())
    }

    /// Refresh tokens are single use, like the real auth server's.
    async fn refresh(&self, refresh_token: &str) -> BackendResult<AuthSession> {
        let user = {
            let mut known = self.refresh_tokens.lock().unwrap();
            let index = known
                .iter()
                .position(|(token, _)| token == refresh_token)
                .ok_or(BackendError::Unauthorized)?;
            known.remove(index).1
        };
        Ok(self.issue(user))
    }

    async fn list_todos(&self, access_token: &str, user_id: Uuid) -> BackendResult<Vec<Todo>> {
        let owner = self.scoped(access_token, user_id)?;
        let mut todos: Vec<Todo> = self
            .rows()
            .into_iter()
            .filter(|todo| todo.user_id == owner)
            .collect();
        todos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(todos)
    }

    async fn insert_todo(&self, access_token: &str, todo: &NewTodo) -> BackendResult<Todo> {
        let owner = self.scoped(access_token, todo.user_id())?;
        let mut stored = self.seed(owner, todo.title(), false);
        stored.description = Some(todo.description().to_string());
        let mut todos = self.todos.lock().unwrap();
        if let Some(row) = todos.iter_mut().find(|row| row.id == stored.id) {
            *row = stored.clone();
        }
        Ok(stored)
    }

    async fn update_todo(
        &self,
        access_token: &str,
        user_id: Uuid,
        id: &TodoId,
        patch: &TodoPatch,
    ) -> BackendResult<Option<Todo>> {
        let owner = self.scoped(access_token, user_id)?;
        let mut todos = self.todos.lock().unwrap();
        Ok(todos
            .iter_mut()
            .find(|todo| &todo.id == id && todo.user_id == owner)
            .map(|todo| {
                patch.apply(todo);
                todo.clone()
            }))
    }

    async fn delete_todo(
        &self,
        access_token: &str,
        user_id: Uuid,
        id: &TodoId,
    ) -> BackendResult<bool> {
        let owner = self.scoped(access_token, user_id)?;
        let mut todos = self.todos.lock().unwrap();
        let before = todos.len();
        todos.retain(|todo| !(&todo.id == id && todo.user_id == owner));
        Ok(todos.len() != before)
    }

    async fn completion_flags(&self, access_token: &str, user_id: Uuid) -> BackendResult<Vec<bool>> {
        Ok(self
            .list_todos(access_token, user_id)
            .await?
            .into_iter()
            .map(|todo| todo.is_complete)
            .collect())
    }
}
