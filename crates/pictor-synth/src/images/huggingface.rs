//! Primary provider: Hugging Face inference router, forwarding to a named
//! inference provider (`fal-ai` by default).
//!
//! The router answers with a list of image URLs (or inline `data:` URIs).
//! The first image is fetched, decoded, and re-encoded as PNG so stored
//! images always carry `image/png`.

use std::io::Cursor;

use async_trait::async_trait;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use super::{GeneratedImage, ImageProvider, DEFAULT_CONTENT_TYPE};
use crate::config::SynthConfig;
use crate::error::{truncate_body, Result, SynthError};

pub struct HuggingFaceProvider {
    client: reqwest::Client,
    token: String,
    model: String,
    provider: String,
    provider_model: String,
    base_url: String,
}

impl HuggingFaceProvider {
    /// Returns `None` when no token is configured; the synthesizer treats that
    /// as a configuration error rather than a provider failure.
    pub fn from_config(config: &SynthConfig) -> Option<Self> {
        let token = config.hf_token.clone()?;
        Some(Self {
            client: reqwest::Client::new(),
            token,
            model: config.hf_model.clone(),
            provider: config.hf_provider.clone(),
            provider_model: config.hf_provider_model.clone(),
            base_url: config.hf_base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}/{}", self.base_url, self.provider, self.provider_model)
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        if let Some(rest) = url.strip_prefix("data:") {
            let (_, payload) = rest.split_once(";base64,").ok_or_else(|| {
                SynthError::UnexpectedResponse("inline image is not base64-encoded".to_owned())
            })?;
            return base64::engine::general_purpose::STANDARD
                .decode(payload)
                .map_err(|e| SynthError::UnexpectedResponse(format!("bad inline image: {e}")));
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SynthError::Upstream {
                status: status.as_u16(),
                message: truncate_body(&text),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl ImageProvider for HuggingFaceProvider {
    fn name(&self) -> &str {
        "huggingface"
    }

    #[instrument(skip_all, fields(provider = %self.provider, model = %self.model))]
    async fn text_to_image(&self, prompt: &str) -> Result<GeneratedImage> {
        let url = self.endpoint();
        debug!(%url, prompt_len = prompt.len(), "requesting image");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&TextToImageRequest { prompt })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SynthError::Upstream {
                status: status.as_u16(),
                message: truncate_body(&text),
            });
        }

        let parsed: TextToImageResponse = response.json().await?;
        let first = parsed.images.into_iter().next().ok_or_else(|| {
            SynthError::UnexpectedResponse("provider returned no images".to_owned())
        })?;

        let raw = self.fetch_image(&first.url).await?;
        let bytes = reencode_png(&raw)?;

        info!(raw_bytes = raw.len(), png_bytes = bytes.len(), "image generated");
        Ok(GeneratedImage {
            bytes,
            content_type: DEFAULT_CONTENT_TYPE.to_owned(),
            prompt: prompt.to_owned(),
        })
    }
}

/// Decode any supported image format and write it back out as PNG.
pub(crate) fn reencode_png(raw: &[u8]) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(raw)?;
    let mut out = Cursor::new(Vec::new());
    decoded.write_to(&mut out, image::ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[derive(Debug, Serialize)]
struct TextToImageRequest<'a> {
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct TextToImageResponse {
    #[serde(default)]
    images: Vec<ImageRef>,
}

#[derive(Debug, Deserialize)]
struct ImageRef {
    url: String,
}

// ── Tests ──────────────────────────────────────────────────────────────────────
