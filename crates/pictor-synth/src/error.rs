use thiserror::Error;

/// Errors that can be returned by the prompt and image synthesizers.
#[derive(Debug, Error)]
pub enum SynthError {
    /// A required credential (API key / token) is not configured.
    #[error("{0}")]
    Configuration(String),

    /// An HTTP request failed (network error, timeout, body read, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("provider returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// The provider answered 2xx but the body had an unexpected shape.
    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),

    /// The returned image could not be decoded or re-encoded.
    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    /// Both the primary and the fallback image providers failed.
    #[error("all image providers failed (primary: {primary}; fallback: {fallback})")]
    Exhausted { primary: String, fallback: String },
}

impl SynthError {
    /// `true` for a missing-credential failure, which is reported to the user
    /// as-is instead of triggering the fallback provider.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Trim an upstream error body so it is safe to log and to show.
pub(crate) fn truncate_body(text: &str) -> String {
    const MAX: usize = 300;
    let text = text.trim();
    if text.len() <= MAX {
        return text.to_owned();
    }
    let mut end = MAX;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}

pub type Result<T> = std::result::Result<T, SynthError>;
