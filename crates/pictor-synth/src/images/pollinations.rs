//! Fallback provider: an unauthenticated GET endpoint that returns image
//! bytes directly. Bytes and the reported content type are passed through
//! unchanged.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use tracing::{info, instrument};

use super::{GeneratedImage, ImageProvider, DEFAULT_CONTENT_TYPE};
use crate::config::SynthConfig;
use crate::error::{truncate_body, Result, SynthError};

/// Characters left unescaped in the prompt path segment: RFC 3986
/// unreserved characters plus `/`.
const PROMPT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~')
    .remove(b'/');

pub struct PollinationsProvider {
    client: reqwest::Client,
    base_url: String,
    user_agent: String,
    timeout: std::time::Duration,
}

impl PollinationsProvider {
    pub fn from_config(config: &SynthConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.fallback_base_url.trim_end_matches('/').to_owned(),
            user_agent: config.fallback_user_agent.clone(),
            timeout: config.fallback_timeout,
        }
    }

    fn url_for(&self, prompt: &str) -> String {
        format!(
            "{}/{}",
            self.base_url,
            utf8_percent_encode(prompt, PROMPT_ENCODE_SET)
        )
    }
}

#[async_trait]
impl ImageProvider for PollinationsProvider {
    fn name(&self) -> &str {
        "pollinations"
    }

    #[instrument(skip_all)]
    async fn text_to_image(&self, prompt: &str) -> Result<GeneratedImage> {
        let response = self
            .client
            .get(self.url_for(prompt))
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
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

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_owned());
        let bytes = response.bytes().await?.to_vec();

        info!(bytes = bytes.len(), %content_type, "fallback image fetched");
        Ok(GeneratedImage {
            bytes,
            content_type,
            prompt: prompt.to_owned(),
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use axum::extract::Path;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use std::time::Duration;

    async fn spawn_upstream(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn provider(base_url: String) -> PollinationsProvider {
        PollinationsProvider::from_config(&SynthConfig {
            fallback_base_url: base_url,
            fallback_timeout: Duration::from_secs(5),
            ..SynthConfig::default()
        })
    }

    #[test]
    fn prompt_is_percent_encoded_into_the_path() {
        let p = provider("https://img.example/prompt/".into());
        assert_eq!(
            p.url_for("a cat & a dog, 50% off?"),
            "https://img.example/prompt/a%20cat%20%26%20a%20dog%2C%2050%25%20off%3F"
        );
        assert_eq!(p.url_for("café"), "https://img.example/prompt/caf%C3%A9");
    }

    #[tokio::test]
    async fn passes_bytes_and_content_type_through() {
        let app = Router::new().route(
            "/prompt/{prompt}",
            get(|Path(prompt): Path<String>, headers: HeaderMap| async move {
                assert_eq!(prompt, "blue sky");
                assert!(headers["user-agent"].to_str().unwrap().starts_with("Mozilla/5.0"));
                ([("content-type", "image/jpeg")], vec![0xFFu8, 0xD8, 0xFF])
            }),
        );
        let base = spawn_upstream(app).await;

        let img = provider(format!("{base}/prompt")).text_to_image("blue sky").await.unwrap();
        assert_eq!(img.bytes, vec![0xFF, 0xD8, 0xFF]);
        assert_eq!(img.content_type, "image/jpeg");
        assert_eq!(img.prompt, "blue sky");
    }

    #[tokio::test]
    async fn error_status_fails() {
        let app = Router::new().route(
            "/prompt/{prompt}",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let base = spawn_upstream(app).await;

        let err = provider(format!("{base}/prompt")).text_to_image("x").await.unwrap_err();
        assert!(matches!(err, SynthError::Upstream { status: 502, .. }));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let app = Router::new().route(
            "/prompt/{prompt}",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                "late"
            }),
        );
        let base = spawn_upstream(app).await;
        let p = PollinationsProvider::from_config(&SynthConfig {
            fallback_base_url: format!("{base}/prompt"),
            fallback_timeout: Duration::from_millis(200),
            ..SynthConfig::default()
        });

        let err = p.text_to_image("x").await.unwrap_err();
        match err {
            SynthError::Http(e) => assert!(e.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
