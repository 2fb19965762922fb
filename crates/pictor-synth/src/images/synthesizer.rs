//! Primary-then-fallback sequencing for image generation.
//!
//! Two failure modes stay separate:
//! - no primary credential: fail at once with [`SynthError::Configuration`],
//!   the fallback is never called;
//! - primary call fails: exactly one fallback call; if that also fails the
//!   result is [`SynthError::Exhausted`].

use std::sync::Arc;

use tracing::{info, warn};

use super::{GeneratedImage, HuggingFaceProvider, ImageProvider, PollinationsProvider};
use crate::config::SynthConfig;
use crate::error::{Result, SynthError};

const MISSING_TOKEN: &str = "Hugging Face token not configured";

pub struct ImageSynthesizer {
    /// `None` when the primary provider has no credential.
    primary: Option<Arc<dyn ImageProvider>>,
    fallback: Arc<dyn ImageProvider>,
}

impl ImageSynthesizer {
    pub fn new(primary: Option<Arc<dyn ImageProvider>>, fallback: Arc<dyn ImageProvider>) -> Self {
        Self { primary, fallback }
    }

    /// Hosted providers built from `config`.
    pub fn from_config(config: &SynthConfig) -> Self {
        let primary = HuggingFaceProvider::from_config(config)
            .map(|p| Arc::new(p) as Arc<dyn ImageProvider>);
        if primary.is_none() {
            warn!("HUGGINGFACE_TOKEN is not configured; image generation will be refused");
        }
        Self::new(primary, Arc::new(PollinationsProvider::from_config(config)))
    }

    pub async fn synthesize(&self, prompt: &str) -> Result<GeneratedImage> {
        let Some(primary) = self.primary.as_ref() else {
            return Err(SynthError::Configuration(MISSING_TOKEN.to_owned()));
        };

        let primary_err = match primary.text_to_image(prompt).await {
            Ok(image) => return Ok(image),
            Err(e) => e,
        };
        warn!(
            provider = primary.name(),
            fallback = self.fallback.name(),
            error = %primary_err,
            "primary image provider failed; trying fallback"
        );

        match self.fallback.text_to_image(prompt).await {
            Ok(image) => {
                info!(provider = self.fallback.name(), "fallback served the image");
                Ok(image)
            }
            Err(fallback_err) => {
                warn!(
                    provider = self.fallback.name(),
                    error = %fallback_err,
                    "fallback image provider also failed"
                );
                Err(SynthError::Exhausted {
                    primary: primary_err.to_string(),
                    fallback: fallback_err.to_string(),
                })
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;

    struct Scripted {
        name: &'static str,
        outcome: std::result::Result<(&'static str, &'static [u8]), &'static str>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(name: &'static str, content_type: &'static str, bytes: &'static [u8]) -> Arc<Self> {
            Arc::new(Self { name, outcome: Ok((content_type, bytes)), calls: AtomicUsize::new(0) })
        }

        fn failing(name: &'static str, reason: &'static str) -> Arc<Self> {
            Arc::new(Self { name, outcome: Err(reason), calls: AtomicUsize::new(0) })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ImageProvider for Scripted {
        fn name(&self) -> &str {
            self.name
        }

        async fn text_to_image(&self, prompt: &str) -> Result<GeneratedImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Ok((content_type, bytes)) => Ok(GeneratedImage {
                    bytes: bytes.to_vec(),
                    content_type: content_type.to_owned(),
                    prompt: prompt.to_owned(),
                }),
                Err(reason) => Err(SynthError::UnexpectedResponse(reason.to_owned())),
            }
        }
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let primary = Scripted::ok("primary", "image/png", b"png");
        let fallback = Scripted::ok("fallback", "image/jpeg", b"jpg");
        let synth = ImageSynthesizer::new(Some(primary.clone() as Arc<dyn ImageProvider>), fallback.clone());

        let img = synth.synthesize("p").await.unwrap();
        assert_eq!(img.content_type, "image/png");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn missing_primary_is_a_configuration_error_without_fallback() {
        let fallback = Scripted::ok("fallback", "image/jpeg", b"jpg");
        let synth = ImageSynthesizer::new(None, fallback.clone());

        let err = synth.synthesize("p").await.unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(err.to_string(), "Hugging Face token not configured");
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    #[traced_test]
    async fn primary_failure_uses_fallback_bytes_and_content_type() {
        let primary = Scripted::failing("primary", "boom");
        let fallback = Scripted::ok("fallback", "image/jpeg", b"jpg");
        let synth = ImageSynthesizer::new(Some(primary.clone() as Arc<dyn ImageProvider>), fallback.clone());

        let img = synth.synthesize("p").await.unwrap();
        assert_eq!(img.bytes, b"jpg");
        assert_eq!(img.content_type, "image/jpeg");
        assert_eq!(primary.calls(), 1);
        assert_eq!(fallback.calls(), 1);
        assert!(logs_contain("trying fallback"));
    }

    #[tokio::test]
    async fn both_failing_is_exhausted_after_one_fallback_attempt() {
        let primary = Scripted::failing("primary", "boom");
        let fallback = Scripted::failing("fallback", "also boom");
        let synth = ImageSynthesizer::new(Some(primary.clone() as Arc<dyn ImageProvider>), fallback.clone());

        let err = synth.synthesize("p").await.unwrap_err();
        assert!(!err.is_configuration());
        match err {
            SynthError::Exhausted { primary: p, fallback: f } => {
                assert!(p.contains("boom"));
                assert!(f.contains("also boom"));
            }
            other => panic!("expected Exhausted, got {other:?}"),
        }
        assert_eq!(fallback.calls(), 1);
    }

    #[test]
    fn from_config_without_token_has_no_primary() {
        let synth = ImageSynthesizer::from_config(&SynthConfig::default());
        assert!(synth.primary.is_none());
    }
}
