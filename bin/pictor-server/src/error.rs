//! Unified server error type.
//!
//! Handlers return `Result<T, ServerError>`. Flow failures (validation,
//! missing credentials, exhausted providers) are not errors here; they
//! re-render the form with a message.
//!
//! Internal errors are logged with full detail; the client only sees a
//! generic HTML page.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use minijinja::HtmlEscape;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("password hashing error: {0}")]
    PasswordHash(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, client_message) = match &self {
            ServerError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
            ServerError::Template(e) => {
                error!(error = ?e, "template rendering failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
            ServerError::PasswordHash(m) | ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            }
        };
        (status, Html(error_page(status, &client_message))).into_response()
    }
}

/// Standalone page so error rendering never depends on the template engine.
fn error_page(status: StatusCode, message: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Error");
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>{code} {reason}</title></head>\
         <body><h1>{code} {reason}</h1><p>{message}</p><p><a href=\"/\">Back to home</a></p></body></html>",
        code = status.as_u16(),
        message = HtmlEscape(message),
    )
}
