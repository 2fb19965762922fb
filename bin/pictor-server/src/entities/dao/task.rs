use chrono::{DateTime, Utc};
use serde::Serialize;
use strum::{AsRefStr, Display, EnumString};

/// Sentinel topic stored for direct-flow tasks.
pub const DIRECT_TOPIC: &str = "Direct Generation";
/// Sentinel title stored for direct-flow tasks.
pub const DIRECT_TITLE: &str = "User Prompt";

/// How the prompt of a task was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GenerationKind {
    /// Prompt synthesized from topic + title.
    Automatic,
    /// Prompt supplied verbatim by the user.
    Direct,
}

/// A row in the `generation_tasks` table. Rows are never updated.
#[derive(Debug, Clone)]
pub struct GenerationTask {
    pub id: i64,
    pub owner_id: i64,
    pub topic: String,
    pub title: String,
    pub generated_prompt: String,
    /// Base64 image payload.
    pub image_data: Option<String>,
    pub content_type: String,
    pub kind: GenerationKind,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for [`GenerationTask`]; `id` and `created_at` are assigned
/// by the store.
#[derive(Debug, Clone)]
pub struct NewGenerationTask {
    pub owner_id: i64,
    pub topic: String,
    pub title: String,
    pub generated_prompt: String,
    pub image_data: Option<String>,
    pub content_type: String,
    pub kind: GenerationKind,
}

impl GenerationTask {
    /// `data:<contentType>;base64,<imageData>` for inline display.
    pub fn image_data_uri(&self) -> Option<String> {
        self.image_data
            .as_deref()
            .filter(|d| !d.is_empty())
            .map(|d| pictor_synth::data_uri(&self.content_type, d))
    }
}
