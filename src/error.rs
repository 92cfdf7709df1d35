use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::fmt;

use crate::views;

/// AppError
///
/// The single error type returned by handlers, extractors and the repository.
/// Each variant maps to one HTTP status; the body is a minimal HTML error page.
#[derive(Debug)]
pub enum AppError {
    /// The requested row does not exist (404).
    NotFound,
    /// The caller is not allowed to perform the action (403).
    Forbidden,
    /// A UNIQUE constraint rejected a write. Carries the constraint name.
    Conflict(String),
    /// Any other database failure (500).
    Database(sqlx::Error),
    /// Hashing, token encoding or task failures (500).
    Internal(String),
}

impl AppError {
    /// True when this is a unique violation of exactly `constraint`.
    pub fn is_conflict_on(&self, constraint: &str) -> bool {
        matches!(self, AppError::Conflict(violated) if violated == constraint)
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound => write!(f, "not found"),
            AppError::Forbidden => write!(f, "forbidden"),
            AppError::Conflict(constraint) => write!(f, "unique constraint violated: {constraint}"),
            AppError::Database(e) => write!(f, "database error: {e}"),
            AppError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Database(e) => Some(e),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for AppError {
    /// Unique violations become `Conflict` so handlers can turn them into form errors.
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or_default().to_string();
                return AppError::Conflict(constraint);
            }
        }
        AppError::Database(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Database(_) | AppError::Internal(_) => {
                tracing::error!(error = %self, "request failed");
            }
            _ => tracing::debug!(error = %self, "request rejected"),
        }
        (status, Html(views::error_page(status))).into_response()
    }
}
