use crate::entities::{dao::SessionRecord, format_ts, parse_ts, SqliteStore};

use chrono::{DateTime, Utc};
use std::future::Future;

pub trait SessionStore: Send + Sync + 'static {
    fn create_session(&self, session: SessionRecord) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Look up a session that has not expired at `now`.
    fn get_live_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<SessionRecord>, sqlx::Error>> + Send;
    fn delete_session(&self, token_hash: &str) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Remove every session expired at `now`; returns the number removed.
    fn purge_expired_sessions(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

impl SessionStore for SqliteStore {
    async fn create_session(&self, session: SessionRecord) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&session.token_hash)
        .bind(session.user_id)
        .bind(format_ts(&session.created_at))
        .bind(format_ts(&session.expires_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_live_session(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, sqlx::Error> {
        let row: Option<(String, i64, String, String)> = sqlx::query_as(
            "SELECT token_hash, user_id, created_at, expires_at \
             FROM sessions WHERE token_hash = ?1 AND expires_at > ?2",
        )
        .bind(token_hash)
        .bind(format_ts(&now))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(token_hash, user_id, created_at, expires_at)| SessionRecord {
            token_hash,
            user_id,
            created_at: parse_ts(&created_at, "sessions.created_at"),
            expires_at: parse_ts(&expires_at, "sessions.expires_at"),
        }))
    }

    async fn delete_session(&self, token_hash: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?1")
            .bind(format_ts(&now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::UserStore;
    use chrono::Duration;

    fn session(token_hash: &str, user_id: i64, ttl: Duration) -> SessionRecord {
        let now = Utc::now();
        SessionRecord {
            token_hash: token_hash.to_owned(),
            user_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    #[tokio::test]
    async fn live_sessions_resolve_and_expired_ones_do_not() {
        let store = SqliteStore::in_memory().await.unwrap();
        let uid = store.create_user("alice", "h").await.unwrap();
        store.create_session(session("live", uid, Duration::hours(1))).await.unwrap();
        store.create_session(session("stale", uid, Duration::hours(-1))).await.unwrap();

        let now = Utc::now();
        assert_eq!(store.get_live_session("live", now).await.unwrap().unwrap().user_id, uid);
        assert!(store.get_live_session("stale", now).await.unwrap().is_none());
        assert!(store.get_live_session("missing", now).await.unwrap().is_none());

        assert_eq!(store.purge_expired_sessions(now).await.unwrap(), 1);
        store.delete_session("live").await.unwrap();
        assert!(store.get_live_session("live", now).await.unwrap().is_none());
    }
}
