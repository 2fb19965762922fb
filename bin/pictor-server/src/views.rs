//! HTML rendering with templates embedded in the binary.

use axum::http::header::SET_COOKIE;
use axum::http::HeaderValue;
use axum::response::{Html, IntoResponse, Response};
use minijinja::{context, Environment, Value};
use serde::Serialize;

use crate::auth::Viewer;
use crate::entities::{GenerationKind, GenerationTask};
use crate::error::ServerError;
use crate::flash;
use crate::state::AppState;

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    ("home.html", include_str!("../templates/home.html")),
    ("signup.html", include_str!("../templates/signup.html")),
    ("login.html", include_str!("../templates/login.html")),
    ("index.html", include_str!("../templates/index.html")),
    ("direct_generate.html", include_str!("../templates/direct_generate.html")),
    ("result.html", include_str!("../templates/result.html")),
    ("dashboard.html", include_str!("../templates/dashboard.html")),
];

/// Template environment. `.html` templates are auto-escaped.
#[derive(Debug)]
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn render(&self, name: &str, ctx: Value) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}

/// Render `name` with `ctx` plus the viewer's user and flash. A flash shown
/// on this page is cleared.
pub fn page(state: &AppState, viewer: &Viewer, name: &str, ctx: Value) -> Result<Response, ServerError> {
    let ctx = context! {
        user => viewer.user.as_ref().map(|u| context! { id => u.id, username => &u.username }),
        flash => &viewer.flash,
        ..ctx
    };
    let html = state.views.render(name, ctx)?;
    let mut response = Html(html).into_response();
    if viewer.flash.is_some() {
        let clear = HeaderValue::from_str(&flash::clear(state.config.secure_cookies))
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        response.headers_mut().append(SET_COOKIE, clear);
    }
    Ok(response)
}

/// Template-facing view of a [`GenerationTask`].
#[derive(Debug, Serialize)]
pub struct TaskView {
    pub id: i64,
    pub topic: String,
    pub title: String,
    pub prompt: String,
    pub kind: GenerationKind,
    pub is_direct: bool,
    pub created_at: String,
    pub image_uri: Option<String>,
}

impl From<&GenerationTask> for TaskView {
    fn from(task: &GenerationTask) -> Self {
        Self {
            id: task.id,
            topic: task.topic.clone(),
            title: task.title.clone(),
            prompt: task.generated_prompt.clone(),
            kind: task.kind,
            is_direct: task.kind == GenerationKind::Direct,
            created_at: task.created_at.format("%b %d, %Y %H:%M").to_string(),
            image_uri: task.image_data_uri(),
        }
    }
}

pub fn task_views(tasks: &[GenerationTask]) -> Vec<TaskView> {
    tasks.iter().map(TaskView::from).collect()
}
