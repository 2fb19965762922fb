//! Prompt synthesis: turn a (topic, title) pair into an image prompt using a
//! Gemini text model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::config::SynthConfig;
use crate::error::{truncate_body, Result, SynthError};

/// Produces an image-generation prompt from a topic and a title.
#[async_trait]
pub trait PromptSynthesizer: Send + Sync {
    /// Both inputs are expected to be non-empty; the caller validates them.
    async fn synthesize(&self, topic: &str, title: &str) -> Result<String>;
}

/// Instruction sent to the text model.
pub fn build_instruction(topic: &str, title: &str) -> String {
    format!(
        "You write prompts for AI image generators.\n\
         \n\
         Write one vivid, cinematic image-generation prompt for:\n\
         Topic: {topic}\n\
         Title: {title}\n\
         \n\
         Requirements:\n\
         - Describe only what is visible: setting, subjects, composition, colour, lighting, texture and mood.\n\
         - Name an artistic style (for example photorealistic, digital art, cinematic still, 3D render or illustration).\n\
         - Mention camera angle or framing where it helps.\n\
         - Use 2-3 sentences.\n\
         \n\
         Reply with the prompt text only, without labels, lists or commentary."
    )
}

/// [`PromptSynthesizer`] backed by the Gemini `generateContent` REST API.
pub struct GeminiPromptSynthesizer {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiPromptSynthesizer {
    pub fn new(config: &SynthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.trim_end_matches('/').to_owned(),
        }
    }
}

#[async_trait]
impl PromptSynthesizer for GeminiPromptSynthesizer {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn synthesize(&self, topic: &str, title: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("prompt synthesis requested but GEMINI_API_KEY is not configured");
            return Err(SynthError::Configuration(
                "Gemini API key not configured".to_owned(),
            ));
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(build_instruction(topic, title)),
                }],
            }],
        };

        debug!(topic_len = topic.len(), title_len = title.len(), "requesting prompt");
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "prompt provider returned an error");
            return Err(SynthError::Upstream {
                status: status.as_u16(),
                message: truncate_body(&text),
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let prompt = parsed.text().trim().to_owned();
        if prompt.is_empty() {
            return Err(SynthError::UnexpectedResponse(
                "text model returned no prompt text".to_owned(),
            ));
        }

        info!(prompt_len = prompt.len(), "prompt synthesized");
        Ok(prompt)
    }
}

// ── Gemini wire types ─────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| {
                c.parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    async fn spawn_upstream(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn config(base_url: String, key: Option<&str>) -> SynthConfig {
        SynthConfig {
            gemini_api_key: key.map(str::to_owned),
            gemini_base_url: base_url,
            ..SynthConfig::default()
        }
    }

    #[test]
    fn instruction_embeds_topic_and_title() {
        let text = build_instruction("deep sea", "The Lantern Fish");
        assert!(text.contains("Topic: deep sea"));
        assert!(text.contains("Title: The Lantern Fish"));
        assert!(text.contains("2-3 sentences"));
    }

    #[tokio::test]
    async fn missing_key_is_a_configuration_error() {
        let synth = GeminiPromptSynthesizer::new(&config("http://127.0.0.1:9".into(), None));
        let err = synth.synthesize("a", "b").await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "Gemini API key not configured");
    }

    #[tokio::test]
    async fn returns_trimmed_candidate_text() {
        let app = Router::new().route(
            "/models/{model}",
            post(|Json(body): Json<Value>| async move {
                let sent = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or("");
                assert!(sent.contains("Topic: forests"));
                Json(json!({
                    "candidates": [{
                        "content": { "parts": [
                            { "text": "  A misty pine forest at dawn," },
                            { "text": " photorealistic.\n" }
                        ]}
                    }]
                }))
            }),
        );
        let base = spawn_upstream(app).await;
        let synth = GeminiPromptSynthesizer::new(&config(base, Some("k")));

        let prompt = synth.synthesize("forests", "Morning").await.unwrap();
        assert_eq!(prompt, "A misty pine forest at dawn, photorealistic.");
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        let app = Router::new().route(
            "/models/{model}",
            post(|| async { (axum::http::StatusCode::FORBIDDEN, "quota exceeded") }),
        );
        let base = spawn_upstream(app).await;
        let synth = GeminiPromptSynthesizer::new(&config(base, Some("k")));

        match synth.synthesize("a", "b").await {
            Err(SynthError::Upstream { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "quota exceeded");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_candidates_are_unexpected() {
        let app = Router::new().route(
            "/models/{model}",
            post(|| async { Json(json!({ "candidates": [] })) }),
        );
        let base = spawn_upstream(app).await;
        let synth = GeminiPromptSynthesizer::new(&config(base, Some("k")));

        let err = synth.synthesize("a", "b").await.unwrap_err();
        assert!(matches!(err, SynthError::UnexpectedResponse(_)));
    }
}
