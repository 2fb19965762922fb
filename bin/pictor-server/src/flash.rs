//! One-shot messages carried across a redirect in the `pictor_flash` cookie.
//!
//! Cookie value: `<level>:<percent-encoded message>`.

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Serialize;
use strum::{AsRefStr, EnumString};

use crate::auth::session::{clear_cookie, set_cookie};

pub const FLASH_COOKIE: &str = "pictor_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self { level: Level::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: Level::Error, message: message.into() }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}:{}",
            self.level.as_ref(),
            utf8_percent_encode(&self.message, NON_ALPHANUMERIC)
        )
    }

    /// `None` for a malformed or tampered value.
    pub fn decode(raw: &str) -> Option<Self> {
        let (level, message) = raw.split_once(':')?;
        let level = level.parse().ok()?;
        let message = percent_decode_str(message).decode_utf8().ok()?.into_owned();
        Some(Self { level, message })
    }

    /// Session-scoped `Set-Cookie` value carrying this message.
    pub fn set_cookie(&self, secure: bool) -> String {
        set_cookie(FLASH_COOKIE, &self.encode(), None, secure)
    }
}

pub fn clear(secure: bool) -> String {
    clear_cookie(FLASH_COOKIE, secure)
}
