use chrono::{DateTime, Utc};

/// A row in the `sessions` table. Only the SHA-256 of the cookie token is
/// stored.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub token_hash: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
