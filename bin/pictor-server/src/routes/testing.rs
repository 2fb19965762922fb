//! Router-level test harness: in-memory store, fake synthesizers, and
//! request/response helpers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use pictor_synth::{GeneratedImage, ImageProvider, ImageSynthesizer, PromptSynthesizer, SynthConfig, SynthError};
use tower::ServiceExt;

use crate::auth::session::{read_cookie, SESSION_COOKIE};
use crate::config::Config;
use crate::entities::SqliteStore;
use crate::flash::{Flash, FLASH_COOKIE};
use crate::state::AppState;
use crate::views::Views;

pub const SYNTH_PROMPT: &str = "A red fox asleep in fresh snow, soft dawn light, digital art.";
pub const PRIMARY_BYTES: &[u8] = b"\x89PNG-primary";
pub const FALLBACK_BYTES: &[u8] = b"\xff\xd8-fallback";
pub const PASSWORD: &str = "longenough";

// ── Fakes ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
pub enum PromptScript {
    Reply,
    MissingKey,
    Fails,
}

pub struct FakePrompts {
    script: PromptScript,
    pub calls: AtomicUsize,
}

#[async_trait]
impl PromptSynthesizer for FakePrompts {
    async fn synthesize(&self, _topic: &str, _title: &str) -> pictor_synth::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            PromptScript::Reply => Ok(SYNTH_PROMPT.to_owned()),
            PromptScript::MissingKey => Err(SynthError::Configuration("Gemini API key not configured".into())),
            PromptScript::Fails => Err(SynthError::Upstream { status: 500, message: "boom".into() }),
        }
    }
}

pub struct FakeProvider {
    name: &'static str,
    image: Option<(&'static [u8], &'static str)>,
    pub calls: AtomicUsize,
}

impl FakeProvider {
    pub fn ok(name: &'static str, bytes: &'static [u8], content_type: &'static str) -> Arc<Self> {
        Arc::new(Self { name, image: Some((bytes, content_type)), calls: AtomicUsize::new(0) })
    }

    pub fn failing(name: &'static str) -> Arc<Self> {
        Arc::new(Self { name, image: None, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageProvider for FakeProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn text_to_image(&self, prompt: &str) -> pictor_synth::Result<GeneratedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.image {
            Some((bytes, content_type)) => Ok(GeneratedImage {
                bytes: bytes.to_vec(),
                content_type: content_type.to_owned(),
                prompt: prompt.to_owned(),
            }),
            None => Err(SynthError::Upstream { status: 503, message: "unavailable".into() }),
        }
    }
}

// ── App ───────────────────────────────────────────────────────────────────────

pub struct TestApp {
    pub state: Arc<AppState>,
    pub prompts: Arc<FakePrompts>,
    /// `None` when the app was built without a primary credential.
    pub primary: Option<Arc<FakeProvider>>,
    pub fallback: Arc<FakeProvider>,
    router: Router,
}

impl TestApp {
    /// Prompt stage and primary image provider both succeed.
    pub async fn new() -> Self {
        Self::with(
            PromptScript::Reply,
            Some(FakeProvider::ok("primary", PRIMARY_BYTES, "image/png")),
            FakeProvider::ok("fallback", FALLBACK_BYTES, "image/jpeg"),
        )
        .await
    }

    pub async fn with(
        script: PromptScript,
        primary: Option<Arc<FakeProvider>>,
        fallback: Arc<FakeProvider>,
    ) -> Self {
        let prompts = Arc::new(FakePrompts { script, calls: AtomicUsize::new(0) });
        let images = ImageSynthesizer::new(
            primary.clone().map(|p| p as Arc<dyn ImageProvider>),
            fallback.clone() as Arc<dyn ImageProvider>,
        );
        let config = Config {
            bind_address: "127.0.0.1:0".into(),
            database_url: "sqlite::memory:".into(),
            log_level: "info".into(),
            log_json: false,
            log_dir: None,
            secure_cookies: false,
            session_ttl_hours: 1,
            synth: SynthConfig::default(),
        };
        let state = Arc::new(AppState {
            config: Arc::new(config),
            store: Arc::new(SqliteStore::in_memory().await.unwrap()),
            prompts: prompts.clone(),
            images: Arc::new(images),
            views: Arc::new(Views::new().unwrap()),
        });
        let router = crate::routes::build(state.clone());
        Self { state, prompts, primary, fallback, router }
    }

    pub async fn call(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Register `username` and return a `Cookie` header for its session.
    pub async fn signup(&self, username: &str) -> String {
        let body = format!("username={username}&password1={PASSWORD}&password2={PASSWORD}");
        let resp = self.call(post_form("/signup/", &body, None)).await;
        let token = session_cookie(&resp).expect("signup should start a session");
        format!("{SESSION_COOKIE}={token}")
    }

    pub fn prompt_calls(&self) -> usize {
        self.prompts.calls.load(Ordering::SeqCst)
    }
}

// ── Requests ──────────────────────────────────────────────────────────────────

pub fn get(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(path: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

// ── Responses ─────────────────────────────────────────────────────────────────

pub fn redirect_target(resp: &Response) -> String {
    resp.headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_owned()
}

fn set_cookie_value(resp: &Response, name: &str) -> Option<String> {
    resp.headers().get_all(SET_COOKIE).iter().find_map(|v| {
        let first = v.to_str().ok()?.split(';').next()?;
        read_cookie(first, name).map(str::to_owned)
    })
}

pub fn session_cookie(resp: &Response) -> Option<String> {
    set_cookie_value(resp, SESSION_COOKIE)
}

pub fn flash_of(resp: &Response) -> Option<Flash> {
    set_cookie_value(resp, FLASH_COOKIE).and_then(|raw| Flash::decode(&raw))
}

/// Non-empty cookies set by `resp`, joined as a `Cookie` request header.
pub fn cookie_header(resp: &Response) -> String {
    resp.headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok()?.split(';').next().map(str::to_owned))
        .filter(|pair| !pair.ends_with('='))
        .collect::<Vec<_>>()
        .join("; ")
}

pub async fn body_text(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
