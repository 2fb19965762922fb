//! Generation flows and the result view.
//!
//! Both flows run validate → (prompt) → image → persist → redirect. Any
//! failed stage re-renders the form with a message and persists nothing.

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Form, Router};
use minijinja::context;
use pictor_synth::{GeneratedImage, SynthError};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::auth::AuthUser;
use crate::entities::dao::task::{DIRECT_TITLE, DIRECT_TOPIC};
use crate::entities::{GenerationKind, NewGenerationTask, TaskStore};
use crate::error::ServerError;
use crate::flash::Flash;
use crate::routes::see_other;
use crate::schemas::generate::{PromptForm, TopicForm};
use crate::state::AppState;
use crate::views::{page, TaskView};

const IMAGE_FAILED: &str = "Failed to generate image. Please try again.";
const PROMPT_FAILED: &str = "Error: could not generate a prompt. Please try again.";
const TASK_HIDDEN: &str = "Image not found or you don't have permission to view it.";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/generate/", get(automatic_page).post(automatic))
        .route("/generate/direct/", get(direct_page).post(direct))
        .route("/generate/result/{id}/", get(result))
}

// ── Automatic flow ────────────────────────────────────────────────────────────

async fn automatic_page(State(state): State<Arc<AppState>>, auth: AuthUser) -> Result<Response, ServerError> {
    render_automatic(&state, &auth, "", "", None)
}

async fn automatic(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Form(form): Form<TopicForm>,
) -> Result<Response, ServerError> {
    if form.validate().is_err() {
        return render_automatic(
            &state,
            &auth,
            &form.topic,
            &form.title,
            Some("Please provide both a topic and a title."),
        );
    }
    let (topic, title) = (form.topic.trim(), form.title.trim());

    let prompt = match state.prompts.synthesize(topic, title).await {
        Ok(prompt) => prompt,
        Err(e) => {
            warn!(user_id = auth.user.id, error = %e, "prompt stage failed");
            return render_automatic(&state, &auth, topic, title, Some(prompt_error(&e).as_str()));
        }
    };

    let image = match state.images.synthesize(&prompt).await {
        Ok(image) => image,
        Err(e) => {
            warn!(user_id = auth.user.id, error = %e, "image stage failed");
            return render_automatic(&state, &auth, topic, title, Some(image_error(&e).as_str()));
        }
    };

    persist(&state, auth.user.id, topic, title, prompt, image, GenerationKind::Automatic).await
}

fn render_automatic(
    state: &AppState,
    auth: &AuthUser,
    topic: &str,
    title: &str,
    error: Option<&str>,
) -> Result<Response, ServerError> {
    let ctx = context! { form => context! { topic => topic, title => title }, error => error };
    page(state, &auth.viewer, "index.html", ctx)
}

// ── Direct flow ───────────────────────────────────────────────────────────────

async fn direct_page(State(state): State<Arc<AppState>>, auth: AuthUser) -> Result<Response, ServerError> {
    render_direct(&state, &auth, "", None)
}

async fn direct(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Form(form): Form<PromptForm>,
) -> Result<Response, ServerError> {
    if form.validate().is_err() {
        return render_direct(&state, &auth, &form.prompt, Some("Please enter a prompt."));
    }

    // The prompt is stored exactly as submitted.
    let image = match state.images.synthesize(&form.prompt).await {
        Ok(image) => image,
        Err(e) => {
            warn!(user_id = auth.user.id, error = %e, "image stage failed");
            return render_direct(&state, &auth, &form.prompt, Some(image_error(&e).as_str()));
        }
    };

    persist(
        &state,
        auth.user.id,
        DIRECT_TOPIC,
        DIRECT_TITLE,
        form.prompt,
        image,
        GenerationKind::Direct,
    )
    .await
}

fn render_direct(
    state: &AppState,
    auth: &AuthUser,
    prompt: &str,
    error: Option<&str>,
) -> Result<Response, ServerError> {
    let ctx = context! { form => context! { prompt => prompt }, error => error };
    page(state, &auth.viewer, "direct_generate.html", ctx)
}

// ── Shared stages ─────────────────────────────────────────────────────────────

/// Always begins with `"Error:"`.
fn prompt_error(e: &SynthError) -> String {
    match e {
        SynthError::Configuration(m) => format!("Error: {m}"),
        _ => PROMPT_FAILED.to_owned(),
    }
}

/// Missing credential is reported as-is; everything else is generic.
fn image_error(e: &SynthError) -> String {
    match e {
        SynthError::Configuration(m) => m.clone(),
        _ => IMAGE_FAILED.to_owned(),
    }
}

async fn persist(
    state: &AppState,
    owner_id: i64,
    topic: &str,
    title: &str,
    prompt: String,
    image: GeneratedImage,
    kind: GenerationKind,
) -> Result<Response, ServerError> {
    let task = NewGenerationTask {
        owner_id,
        topic: topic.to_owned(),
        title: title.to_owned(),
        generated_prompt: prompt,
        image_data: Some(image.to_base64()),
        content_type: image.content_type,
        kind,
    };
    let id = state.store.insert_task(task).await?;
    info!(task_id = id, owner_id, kind = %kind, bytes = image.bytes.len(), "generation task stored");
    Ok(Redirect::to(&format!("/generate/result/{id}/")).into_response())
}

// ── Result view ───────────────────────────────────────────────────────────────

/// Unknown, malformed and foreign ids all get the same redirect.
async fn result(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Response, ServerError> {
    let task = match id.parse::<i64>() {
        Ok(id) => state.store.get_task_for_owner(id, auth.user.id).await?,
        Err(_) => None,
    };
    let Some(task) = task else {
        let flash = Flash::error(TASK_HIDDEN).set_cookie(state.config.secure_cookies);
        return Ok(see_other("/", vec![flash]));
    };
    page(&state, &auth.viewer, "result.html", context! { task => TaskView::from(&task) })
}

// ── Tests ──────────────────────────────────────────────────────────────────────
