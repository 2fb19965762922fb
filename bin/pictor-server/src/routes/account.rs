//! Sign-up, login and logout.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use minijinja::context;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::auth::{login_url, password, safe_next, session, Viewer};
use crate::entities::user::is_unique_violation;
use crate::entities::{SessionStore, UserStore};
use crate::error::ServerError;
use crate::flash::Flash;
use crate::routes::see_other;
use crate::schemas::account::{signup_field_errors, LoginForm, LoginQuery, SignupForm};
use crate::schemas::FieldErrors;
use crate::state::AppState;
use crate::views::page;

const SIGNUP_FAILED: &str = "Please correct the errors below.";
const LOGIN_FAILED: &str = "Invalid username or password.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/signup/", get(signup_page).post(signup))
        .route("/login/", get(login_page).post(login))
        .route("/logout/", post(logout))
}

// ── Sign-up ───────────────────────────────────────────────────────────────────

async fn signup_page(State(state): State<Arc<AppState>>, viewer: Viewer) -> Result<Response, ServerError> {
    if viewer.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    render_signup(&state, &viewer, "", None, &FieldErrors::new())
}

async fn signup(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Form(mut form): Form<SignupForm>,
) -> Result<Response, ServerError> {
    if viewer.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    form.username = form.username.trim().to_owned();

    if let Err(errors) = form.validate() {
        return render_signup(&state, &viewer, &form.username, Some(SIGNUP_FAILED), &signup_field_errors(&errors));
    }

    let hash = password::hash_password(&form.password1)?;
    let user_id = match state.store.create_user(&form.username, &hash).await {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => {
            let errors = FieldErrors::from([("username".to_owned(), vec![USERNAME_TAKEN.to_owned()])]);
            return render_signup(&state, &viewer, &form.username, Some(SIGNUP_FAILED), &errors);
        }
        Err(e) => return Err(e.into()),
    };
    info!(user_id, "account created");

    let secure = state.config.secure_cookies;
    let session_cookie =
        session::start(&state.store, user_id, state.config.session_ttl_hours, secure).await?;
    let flash = Flash::success("Account created successfully!").set_cookie(secure);
    Ok(see_other("/", vec![session_cookie, flash]))
}

fn render_signup(
    state: &AppState,
    viewer: &Viewer,
    username: &str,
    error: Option<&str>,
    errors: &FieldErrors,
) -> Result<Response, ServerError> {
    page(
        state,
        viewer,
        "signup.html",
        context! {
            form => context! { username => username },
            error => error,
            field_errors => errors,
        },
    )
}

// ── Login / logout ────────────────────────────────────────────────────────────

async fn login_page(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Query(query): Query<LoginQuery>,
) -> Result<Response, ServerError> {
    if viewer.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    render_login(&state, &viewer, "", None, query.next.as_deref())
}

async fn login(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ServerError> {
    if viewer.user.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let username = form.username.trim();

    // Unknown usernames still pay for one Argon2 verification.
    let user = match state.store.find_user_by_username(username).await? {
        Some(user) => password::verify_password(&form.password, &user.password_hash)?.then_some(user),
        None => {
            password::verify_dummy(&form.password);
            None
        }
    };
    let Some(user) = user else {
        warn!(username_len = username.len(), "login rejected");
        return render_login(&state, &viewer, username, Some(LOGIN_FAILED), query.next.as_deref());
    };
    info!(user_id = user.id, "login succeeded");

    let secure = state.config.secure_cookies;
    let session_cookie =
        session::start(&state.store, user.id, state.config.session_ttl_hours, secure).await?;
    let flash = Flash::success(format!("Welcome back, {}!", user.username)).set_cookie(secure);
    Ok(see_other(safe_next(query.next.as_deref()), vec![session_cookie, flash]))
}

fn render_login(
    state: &AppState,
    viewer: &Viewer,
    username: &str,
    error: Option<&str>,
    next: Option<&str>,
) -> Result<Response, ServerError> {
    let action = next.map(login_url).unwrap_or_else(|| "/login/".to_owned());
    page(
        state,
        viewer,
        "login.html",
        context! {
            form => context! { username => username },
            error => error,
            action => action,
        },
    )
}

async fn logout(State(state): State<Arc<AppState>>, viewer: Viewer) -> Result<Response, ServerError> {
    if let Some(hash) = viewer.session_hash.as_deref() {
        state.store.delete_session(hash).await?;
        info!(user_id = viewer.user.as_ref().map(|u| u.id), "logged out");
    }
    let secure = state.config.secure_cookies;
    Ok(see_other(
        "/",
        vec![
            session::clear_cookie(session::SESSION_COOKIE, secure),
            Flash::success("You have been logged out successfully.").set_cookie(secure),
        ],
    ))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
