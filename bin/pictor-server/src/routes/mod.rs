//! Axum router construction.
//!
//! [`build`] assembles the complete application router:
//! - baseline security headers (`nosniff`, `X-Frame-Options: DENY`)
//! - per-request trace-ID span
//! - health, home, account, generation and dashboard routes

mod account;
mod dashboard;
mod generate;
mod health;
mod home;

use axum::http::header::{self, HeaderValue, SET_COOKIE};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::{middleware, Router};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::error::ServerError;
use crate::middleware::trace;
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(health::router())
        .merge(home::router())
        .merge(account::router())
        .merge(generate::router())
        .merge(dashboard::router())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_CONTENT_TYPE_OPTIONS,
                    HeaderValue::from_static("nosniff"),
                ))
                .layer(SetResponseHeaderLayer::if_not_present(
                    header::X_FRAME_OPTIONS,
                    HeaderValue::from_static("DENY"),
                )),
        )
        // Outermost layer: the span covers everything below it.
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}

async fn not_found() -> ServerError {
    ServerError::NotFound("page not found".to_owned())
}

/// `303 See Other` to `to`, setting each of `cookies`.
pub(crate) fn see_other(to: &str, cookies: Vec<String>) -> Response {
    (
        AppendHeaders(cookies.into_iter().map(|c| (SET_COOKIE, c))),
        Redirect::to(to),
    )
        .into_response()
}

#[cfg(test)]
pub(crate) mod testing;
