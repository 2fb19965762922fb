//! Session tokens and the cookies that carry them.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use sha2::{Digest, Sha256};
use tracing::info;
use uuid::Uuid;

use crate::entities::{SessionRecord, SessionStore, SqliteStore};
use crate::error::ServerError;

pub const SESSION_COOKIE: &str = "pictor_session";

/// Fresh opaque token: 32 random bytes from two v4 UUIDs, base64url.
pub fn new_token() -> String {
    let mut raw = [0u8; 32];
    raw[..16].copy_from_slice(Uuid::new_v4().as_bytes());
    raw[16..].copy_from_slice(Uuid::new_v4().as_bytes());
    URL_SAFE_NO_PAD.encode(raw)
}

/// Only this digest is persisted; the token itself lives in the cookie.
pub fn hash_token(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()).as_slice())
}

/// Create a session for `user_id` and return the `Set-Cookie` value.
pub async fn start(
    store: &SqliteStore,
    user_id: i64,
    ttl_hours: i64,
    secure: bool,
) -> Result<String, ServerError> {
    let token = new_token();
    let now = Utc::now();
    let ttl = Duration::hours(ttl_hours);
    store
        .create_session(SessionRecord {
            token_hash: hash_token(&token),
            user_id,
            created_at: now,
            expires_at: now + ttl,
        })
        .await?;
    info!(user_id, "session started");
    Ok(set_cookie(SESSION_COOKIE, &token, Some(ttl.num_seconds()), secure))
}

/// `Set-Cookie` value: `HttpOnly; SameSite=Lax; Path=/`, plus `Max-Age` when
/// given and `Secure` when requested.
pub fn set_cookie(name: &str, value: &str, max_age: Option<i64>, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; Path=/; HttpOnly; SameSite=Lax");
    if let Some(age) = max_age {
        cookie.push_str(&format!("; Max-Age={age}"));
    }
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(name: &str, secure: bool) -> String {
    set_cookie(name, "", Some(0), secure)
}

/// Value of cookie `name` in a `Cookie` request header.
pub fn read_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v)
}
