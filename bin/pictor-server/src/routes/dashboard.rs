//! The caller's full generation history.

use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use minijinja::context;
use std::sync::Arc;

use crate::auth::AuthUser;
use crate::entities::TaskStore;
use crate::error::ServerError;
use crate::state::AppState;
use crate::views::{page, task_views};

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard/", get(dashboard))
}

async fn dashboard(State(state): State<Arc<AppState>>, auth: AuthUser) -> Result<Response, ServerError> {
    let tasks = state.store.list_tasks_for_owner(auth.user.id, None).await?;
    let total_images = state.store.count_tasks_for_owner(auth.user.id).await?;
    page(
        &state,
        &auth.viewer,
        "dashboard.html",
        context! { tasks => task_views(&tasks), total_images => total_images },
    )
}
