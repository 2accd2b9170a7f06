use axum::{
    extract::{Path, Query, State},
    Extension, Form,
};
use maud::{html, Markup};
use serde::Deserialize;

use super::AppState;
use crate::backend::BackendError;
use crate::error::AppError;
use crate::gate::CurrentSession;
use crate::models::{Filter, NewTodo, TodoId, TodoPatch};
use crate::views::{dashboard, toast_oob, Notice};

#[derive(Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    filter: Option<String>,
}
impl FilterQuery {
    fn filter(&self) -> Filter {
        Filter::parse(self.filter.as_deref())
    }
}

/// Re-reads the owner's rows so the panel mirrors the backend after a change.
async fn panel_with_notice(
    state: &AppState,
    session: &CurrentSession,
    filter: Filter,
    notice: Notice,
) -> Result<Markup, AppError> {
    let todos = state
        .backend
        .list_todos(session.token(), session.user().id)
        .await?;
    Ok(html! {
        (dashboard::panel_html(&todos, filter))
        (toast_oob(&notice))
    })
}

// === Routes ===
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<FilterQuery>,
) -> Result<Markup, AppError> {
    let user = session.user();
    match state.backend.list_todos(session.token(), user.id).await {
        Ok(todos) => {
            tracing::debug!("fetched {} todos for user {}", todos.len(), user.id);
            Ok(dashboard::dashboard_page(user, &todos, query.filter(), &[]))
        }
        Err(BackendError::Unauthorized) => Err(BackendError::Unauthorized.into()),
        Err(err) => {
            tracing::warn!("fetching todos for user {}: {}", user.id, err);
            let notices = [Notice::error("Failed to fetch todos")];
            Ok(dashboard::dashboard_page(user, &[], query.filter(), &notices))
        }
    }
}

pub async fn panel(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<FilterQuery>,
) -> Result<Markup, AppError> {
    let todos = state
        .backend
        .list_todos(session.token(), session.user().id)
        .await?;
    Ok(dashboard::panel_html(&todos, query.filter()))
}

#[derive(Deserialize)]
pub struct TodoForm {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    filter: Option<String>,
}
pub async fn create_todo(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Form(form): Form<TodoForm>,
) -> Result<Markup, AppError> {
    let user_id = session.user().id;
    let new = NewTodo::new(user_id, &form.title, &form.description)?;
    let todo = state.backend.insert_todo(session.token(), &new).await?;
    tracing::info!("user {} added todo {}", user_id, todo.id);
    let filter = Filter::parse(form.filter.as_deref());
    panel_with_notice(&state, &session, filter, Notice::success("Todo added!")).await
}

#[derive(Deserialize)]
pub struct EditQuery {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
}
/// The edit button carries the values it shows, so no fetch is needed.
pub async fn edit_todo(Path(id): Path<String>, Query(query): Query<EditQuery>) -> Markup {
    dashboard::edit_todo_html(&TodoId::new(id), &query.title, &query.description)
}

pub async fn save_todo(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    Form(form): Form<TodoForm>,
) -> Result<Markup, AppError> {
    let user_id = session.user().id;
    let id = TodoId::new(id);
    let patch = TodoPatch::edit(&form.title, &form.description)?;
    state
        .backend
        .update_todo(session.token(), user_id, &id, &patch)
        .await?
        .ok_or(AppError::NotFound("Todo not found"))?;
    tracing::info!("user {} edited todo {}", user_id, id);
    let filter = Filter::parse(form.filter.as_deref());
    panel_with_notice(&state, &session, filter, Notice::success("Todo updated")).await
}

#[derive(Deserialize)]
pub struct ToggleForm {
    /// The flag as the user saw it when clicking.
    is_complete: bool,
    #[serde(default)]
    filter: Option<String>,
}
pub async fn toggle_todo(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    Form(form): Form<ToggleForm>,
) -> Result<Markup, AppError> {
    let user_id = session.user().id;
    let id = TodoId::new(id);
    let patch = TodoPatch::completion(!form.is_complete);
    let todo = state
        .backend
        .update_todo(session.token(), user_id, &id, &patch)
        .await?
        .ok_or(AppError::NotFound("Todo not found"))?;
    tracing::info!(
        "user {} set todo {} complete={}",
        user_id,
        id,
        todo.is_complete
    );
    let filter = Filter::parse(form.filter.as_deref());
    panel_with_notice(
        &state,
        &session,
        filter,
        Notice::success("Todo status updated!"),
    )
    .await
}

pub async fn remove_todo(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<String>,
    form: Option<Form<FilterQuery>>,
) -> Result<Markup, AppError> {
    // htmx sends the included filter of a DELETE as a form body
    let filter = form.map_or(Filter::All, |Form(query)| query.filter());
    let user_id = session.user().id;
    let id = TodoId::new(id);
    if !state
        .backend
        .delete_todo(session.token(), user_id, &id)
        .await?
    {
        return Err(AppError::NotFound("Todo not found"));
    }
    tracing::info!("user {} deleted todo {}", user_id, id);
    panel_with_notice(&state, &session, filter, Notice::success("Deleted")).await
}
