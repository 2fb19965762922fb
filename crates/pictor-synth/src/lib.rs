//! Prompt and image synthesizers for pictor.
//!
//! - [`prompt`]: topic + title → descriptive image prompt (Gemini).
//! - [`images`]: prompt → image bytes, primary provider with one fallback.
//!
//! Both take an explicit [`SynthConfig`] at construction and report failures
//! through [`SynthError`].

pub mod config;
pub mod error;
pub mod images;
pub mod prompt;

pub use config::SynthConfig;
pub use error::{Result, SynthError};
pub use images::{data_uri, GeneratedImage, ImageProvider, ImageSynthesizer};
pub use prompt::{GeminiPromptSynthesizer, PromptSynthesizer};
