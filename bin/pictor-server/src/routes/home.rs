//! Landing page.

use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use minijinja::context;
use std::sync::Arc;

use crate::auth::Viewer;
use crate::entities::TaskStore;
use crate::error::ServerError;
use crate::state::AppState;
use crate::views::{page, task_views};

const RECENT_TASKS: i64 = 3;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/", get(home))
}

async fn home(State(state): State<Arc<AppState>>, viewer: Viewer) -> Result<Response, ServerError> {
    let recent = match &viewer.user {
        Some(user) => {
            state
                .store
                .list_tasks_for_owner(user.id, Some(RECENT_TASKS))
                .await?
        }
        None => Vec::new(),
    };
    page(&state, &viewer, "home.html", context! { recent_tasks => task_views(&recent) })
}
