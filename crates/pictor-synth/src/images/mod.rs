//! Image synthesis: a provider abstraction, the hosted providers, and the
//! [`ImageSynthesizer`] that runs the primary provider with a single fallback.

pub mod huggingface;
pub mod pollinations;
pub mod synthesizer;

use async_trait::async_trait;
use base64::Engine as _;

use crate::error::Result;

pub use huggingface::HuggingFaceProvider;
pub use pollinations::PollinationsProvider;
pub use synthesizer::ImageSynthesizer;

/// MIME type used when a provider does not report one.
pub const DEFAULT_CONTENT_TYPE: &str = "image/png";

/// Image bytes returned by a provider, with the prompt that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub prompt: String,
}

impl GeneratedImage {
    /// Base64 (standard alphabet, padded) encoding of the image bytes.
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }
}

/// Inline `data:` URI for a stored image: `data:<contentType>;base64,<data>`.
pub fn data_uri(content_type: &str, base64_data: &str) -> String {
    format!("data:{content_type};base64,{base64_data}")
}

/// A single text-to-image backend.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Short provider name used in logs.
    fn name(&self) -> &str;

    async fn text_to_image(&self, prompt: &str) -> Result<GeneratedImage>;
}
