use axum::{extract::State, Extension};
use maud::Markup;

use super::AppState;
use crate::backend::BackendError;
use crate::error::AppError;
use crate::gate::CurrentSession;
use crate::models::TodoStats;
use crate::views::{self, Notice};

pub async fn stats(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Markup, AppError> {
    let user = session.user();
    match state.backend.completion_flags(session.token(), user.id).await {
        Ok(flags) => Ok(views::stats::stats_page(user, TodoStats::from_flags(flags), &[])),
        Err(BackendError::Unauthorized) => Err(BackendError::Unauthorized.into()),
        Err(err) => {
            tracing::warn!("loading stats for user {}: {}", user.id, err);
            let notices = [Notice::error("Error loading stats!")];
            Ok(views::stats::stats_page(user, TodoStats::default(), &notices))
        }
    }
}
