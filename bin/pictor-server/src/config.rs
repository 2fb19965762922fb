//! Server configuration, loaded from environment variables at startup.

use pictor_synth::SynthConfig;

/// Runtime configuration for pictor-server.
///
/// Every field has a sensible default so the server works out-of-the-box
/// without any environment variables set. Missing provider credentials are
/// not fatal; the matching generation stage reports a configuration error.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// sqlx SQLite URL (default: `"sqlite://pictor.db?mode=rwc"`).
    pub database_url: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,sqlx=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// When set, write logs to a daily-rotated file in this directory
    /// instead of stdout.
    pub log_dir: Option<String>,

    /// Mark session and flash cookies `Secure` (enable behind HTTPS).
    pub secure_cookies: bool,

    /// Lifetime of a login session in hours.
    pub session_ttl_hours: i64,

    /// Text- and image-generation provider settings.
    pub synth: SynthConfig,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("PICTOR_BIND", "0.0.0.0:8000"),
            database_url: env_or("PICTOR_DATABASE_URL", "sqlite://pictor.db?mode=rwc"),
            log_level: env_or("PICTOR_LOG", "info"),
            log_json: env_flag("PICTOR_LOG_JSON"),
            log_dir: std::env::var("PICTOR_LOG_DIR").ok().filter(|v| !v.is_empty()),
            secure_cookies: env_flag("PICTOR_SECURE_COOKIES"),
            session_ttl_hours: parse_env("PICTOR_SESSION_TTL_HOURS", 24 * 14),
            synth: SynthConfig::from_env(),
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
