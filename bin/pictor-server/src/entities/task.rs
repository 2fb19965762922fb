use crate::entities::{
    dao::{GenerationKind, GenerationTask, NewGenerationTask},
    format_ts, parse_ts, SqliteStore,
};

use chrono::Utc;
use std::future::Future;
use std::str::FromStr;

pub trait TaskStore: Send + Sync + 'static {
    /// Persist a new task and return its id. `created_at` is set here.
    fn insert_task(&self, task: NewGenerationTask) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;
    /// Fetch a task only if it belongs to `owner_id`.
    fn get_task_for_owner(
        &self,
        id: i64,
        owner_id: i64,
    ) -> impl Future<Output = Result<Option<GenerationTask>, sqlx::Error>> + Send;
    /// Tasks of `owner_id`, newest first, optionally capped at `limit`.
    fn list_tasks_for_owner(
        &self,
        owner_id: i64,
        limit: Option<i64>,
    ) -> impl Future<Output = Result<Vec<GenerationTask>, sqlx::Error>> + Send;
    fn count_tasks_for_owner(&self, owner_id: i64) -> impl Future<Output = Result<i64, sqlx::Error>> + Send;
}

type TaskRow = (i64, i64, String, String, String, Option<String>, String, String, String);

const TASK_COLUMNS: &str =
    "id, owner_id, topic, title, generated_prompt, image_data, content_type, kind, created_at";

fn from_row(row: TaskRow) -> Result<GenerationTask, sqlx::Error> {
    let (id, owner_id, topic, title, generated_prompt, image_data, content_type, kind, created_at) =
        row;
    let kind = GenerationKind::from_str(&kind).map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
    Ok(GenerationTask {
        id,
        owner_id,
        topic,
        title,
        generated_prompt,
        image_data,
        content_type,
        kind,
        created_at: parse_ts(&created_at, "generation_tasks.created_at"),
    })
}

impl TaskStore for SqliteStore {
    async fn insert_task(&self, task: NewGenerationTask) -> Result<i64, sqlx::Error> {
        let created_at = format_ts(&Utc::now());
        let result = sqlx::query(
            "INSERT INTO generation_tasks \
             (owner_id, topic, title, generated_prompt, image_data, content_type, kind, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(task.owner_id)
        .bind(&task.topic)
        .bind(&task.title)
        .bind(&task.generated_prompt)
        .bind(&task.image_data)
        .bind(&task.content_type)
        .bind(task.kind.as_ref())
        .bind(&created_at)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn get_task_for_owner(
        &self,
        id: i64,
        owner_id: i64,
    ) -> Result<Option<GenerationTask>, sqlx::Error> {
        let row: Option<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM generation_tasks WHERE id = ?1 AND owner_id = ?2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(from_row).transpose()
    }

    async fn list_tasks_for_owner(
        &self,
        owner_id: i64,
        limit: Option<i64>,
    ) -> Result<Vec<GenerationTask>, sqlx::Error> {
        // SQLite treats a negative LIMIT as "no limit".
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM generation_tasks WHERE owner_id = ?1 \
             ORDER BY created_at DESC, id DESC LIMIT ?2"
        ))
        .bind(owner_id)
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(from_row).collect()
    }

    async fn count_tasks_for_owner(&self, owner_id: i64) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM generation_tasks WHERE owner_id = ?1")
                .bind(owner_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }
}
