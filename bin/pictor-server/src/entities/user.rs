use crate::entities::{dao::UserRecord, format_ts, SqliteStore};

use chrono::Utc;
use std::future::Future;

pub trait UserStore: Send + Sync + 'static {
    /// Insert a new account and return its id. Fails with a unique-constraint
    /// database error when the username is taken.
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
    ) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;
    fn get_user(&self, id: i64) -> impl Future<Output = Result<Option<UserRecord>, sqlx::Error>> + Send;
    fn find_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<UserRecord>, sqlx::Error>> + Send;
}

type UserRow = (i64, String, String);

fn from_row((id, username, password_hash): UserRow) -> UserRecord {
    UserRecord { id, username, password_hash }
}

impl UserStore for SqliteStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<i64, sqlx::Error> {
        let created_at = format_ts(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
        )
        .bind(username)
        .bind(password_hash)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn get_user(&self, id: i64) -> Result<Option<UserRecord>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<UserRecord>, sqlx::Error> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, password_hash FROM users WHERE username = ?1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(from_row))
    }
}

/// `true` when `err` is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
