//! Provider configuration for the synthesizers.
//!
//! Credentials are read once at startup and handed to each synthesizer at
//! construction, so tests can build a [`SynthConfig`] by hand and point the
//! base URLs at a local fake.

use std::time::Duration;

/// Browser-like user agent sent to the fallback provider.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Settings for the text- and image-generation providers.
#[derive(Clone)]
pub struct SynthConfig {
    /// Gemini API key; `None` makes prompt synthesis fail with a
    /// configuration error.
    pub gemini_api_key: Option<String>,
    /// Gemini model used for prompt synthesis (default `gemini-2.5-flash-lite`).
    pub gemini_model: String,
    /// Base URL of the Gemini REST API.
    pub gemini_base_url: String,

    /// Hugging Face inference token; `None` makes image synthesis fail with a
    /// configuration error before any provider is called.
    pub hf_token: Option<String>,
    /// Hub model id requested from the inference router.
    pub hf_model: String,
    /// Inference provider the router forwards to (default `fal-ai`).
    pub hf_provider: String,
    /// Provider-side model id for `hf_model` (default `fal-ai/z-image/turbo`).
    pub hf_provider_model: String,
    /// Base URL of the Hugging Face inference router.
    pub hf_base_url: String,

    /// Base URL of the unauthenticated fallback endpoint; the URL-encoded
    /// prompt is appended as the final path segment.
    pub fallback_base_url: String,
    /// Request timeout for the fallback call.
    pub fallback_timeout: Duration,
    /// User agent sent to the fallback endpoint.
    pub fallback_user_agent: String,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: "gemini-2.5-flash-lite".to_owned(),
            gemini_base_url: "https://generativelanguage.googleapis.com/v1beta".to_owned(),
            hf_token: None,
            hf_model: "Tongyi-MAI/Z-Image-Turbo".to_owned(),
            hf_provider: "fal-ai".to_owned(),
            hf_provider_model: "fal-ai/z-image/turbo".to_owned(),
            hf_base_url: "https://router.huggingface.co".to_owned(),
            fallback_base_url: "https://image.pollinations.ai/prompt".to_owned(),
            fallback_timeout: Duration::from_secs(30),
            fallback_user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl SynthConfig {
    /// Build [`SynthConfig`] from environment variables, falling back to
    /// defaults. Empty credential variables count as unset.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            gemini_api_key: secret("GEMINI_API_KEY"),
            gemini_model: env_or("PICTOR_GEMINI_MODEL", &d.gemini_model),
            gemini_base_url: env_or("PICTOR_GEMINI_BASE_URL", &d.gemini_base_url),
            hf_token: secret("HUGGINGFACE_TOKEN"),
            hf_model: env_or("PICTOR_HF_MODEL", &d.hf_model),
            hf_provider: env_or("PICTOR_HF_PROVIDER", &d.hf_provider),
            hf_provider_model: env_or("PICTOR_HF_PROVIDER_MODEL", &d.hf_provider_model),
            hf_base_url: env_or("PICTOR_HF_BASE_URL", &d.hf_base_url),
            fallback_base_url: env_or("PICTOR_FALLBACK_BASE_URL", &d.fallback_base_url),
            fallback_timeout: std::env::var("PICTOR_FALLBACK_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(d.fallback_timeout),
            fallback_user_agent: d.fallback_user_agent,
        }
    }
}

// Keys stay out of debug output.
impl std::fmt::Debug for SynthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthConfig")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<set>"))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("hf_token", &self.hf_token.as_ref().map(|_| "<set>"))
            .field("hf_model", &self.hf_model)
            .field("hf_provider", &self.hf_provider)
            .field("hf_provider_model", &self.hf_provider_model)
            .field("hf_base_url", &self.hf_base_url)
            .field("fallback_base_url", &self.fallback_base_url)
            .field("fallback_timeout", &self.fallback_timeout)
            .finish()
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn secret(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
