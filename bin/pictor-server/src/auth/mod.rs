//! Session-backed request identity.
//!
//! [`Viewer`] never rejects: anonymous requests get `user: None`.
//! [`AuthUser`] redirects anonymous requests to `/login/?next=<path>`.

pub mod password;
pub mod session;

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Redirect, Response};
use chrono::Utc;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tracing::debug;

use crate::entities::{SessionStore, UserRecord, UserStore};
use crate::error::ServerError;
use crate::flash::{Flash, FLASH_COOKIE};
use crate::state::AppState;

/// Who is asking, plus any pending flash message.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    pub user: Option<UserRecord>,
    /// Digest of the presented session token, if one resolved.
    pub session_hash: Option<String>,
    pub flash: Option<Flash>,
}

impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let cookies = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");

        let flash = session::read_cookie(&cookies, FLASH_COOKIE).and_then(Flash::decode);

        let Some(token) = session::read_cookie(&cookies, session::SESSION_COOKIE)
            .filter(|t| !t.is_empty())
        else {
            return Ok(Self { flash, ..Self::default() });
        };

        let token_hash = session::hash_token(token);
        let Some(record) = state.store.get_live_session(&token_hash, Utc::now()).await? else {
            debug!("unknown or expired session cookie");
            return Ok(Self { flash, ..Self::default() });
        };

        let user = state.store.get_user(record.user_id).await?;
        Ok(Self {
            session_hash: user.as_ref().map(|_| token_hash),
            user,
            flash,
        })
    }
}

/// An authenticated viewer.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: UserRecord,
    pub viewer: Viewer,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let viewer = Viewer::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        match viewer.user.clone() {
            Some(user) => Ok(Self { user, viewer }),
            None => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                Err(Redirect::to(&login_url(next)).into_response())
            }
        }
    }
}

pub fn login_url(next: &str) -> String {
    format!("/login/?next={}", utf8_percent_encode(next, NON_ALPHANUMERIC))
}

/// Only same-site absolute paths are accepted as post-login targets.
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(n) if n.starts_with('/') && !n.starts_with("//") && !n.contains('\\') => n,
        _ => "/",
    }
}
