use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

use crate::backend::BackendError;
use crate::gate::SessionRejected;
use crate::models::ValidationError;
use crate::views::{toast, Notice};

/// Handler error. Every variant reaches the user as an error toast; htmx is
/// told to append it to `#toasts` instead of swapping the usual target.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("{0}")]
    NotFound(&'static str),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Backend(BackendError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
            Self::Backend(BackendError::Unauthorized) => StatusCode::UNAUTHORIZED,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Internal(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::Internal(err) => tracing::error!("request failed: {:#}", err),
            Self::Backend(err) => tracing::warn!("backend call failed: {}", err),
            _ => tracing::debug!("request rejected: {}", self),
        }
        let mut response = (self.status(), toast(&Notice::error(self.user_message()))).into_response();
        let headers = response.headers_mut();
        headers.insert("HX-Retarget", HeaderValue::from_static("#toasts"));
        headers.insert("HX-Reswap", HeaderValue::from_static("beforeend"));
        // an expired backend session cannot be recovered in place
        if matches!(self, Self::Backend(BackendError::Unauthorized)) {
            headers.insert("HX-Redirect", HeaderValue::from_static("/auth/signin"));
            response.extensions_mut().insert(SessionRejected);
        }
        response
    }
}
