//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use pictor_synth::{ImageSynthesizer, PromptSynthesizer};

use crate::config::Config;
use crate::entities::SqliteStore;
use crate::views::Views;

/// State shared across all HTTP handlers. Synthesizers are trait objects or
/// built from injectable providers so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (env-derived).
    pub config: Arc<Config>,
    /// Users, sessions and generation tasks.
    pub store: Arc<SqliteStore>,
    /// Topic + title → image prompt.
    pub prompts: Arc<dyn PromptSynthesizer>,
    /// Prompt → image, primary provider with one fallback.
    pub images: Arc<ImageSynthesizer>,
    pub views: Arc<Views>,
}
