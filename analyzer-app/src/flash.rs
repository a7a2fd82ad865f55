//! One-shot messages carried across a redirect in a signed cookie.
//!
//! A handler pushes messages before redirecting; the next page that renders
//! takes them, which also clears the cookie.
use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FLASH_COOKIE: &str = "_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Danger,
}

impl Level {
    /// Suffix of the Bootstrap `alert-*` class.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: Level,
    pub message: String,
}

impl Flash {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Queue a message for the next rendered page.
pub fn push(jar: SignedCookieJar, level: Level, message: impl Into<String>) -> SignedCookieJar {
    let mut pending = read(&jar);
    pending.push(Flash::new(level, message));

    let encoded = match serde_json::to_vec(&pending) {
        Ok(bytes) => hex::encode(bytes),
        Err(err) => {
            debug!(error=%err, "flash.encode_failed");
            return jar;
        }
    };
    let cookie = Cookie::build((FLASH_COOKIE, encoded))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Drain queued messages. Tampered or unreadable cookies yield nothing.
pub fn take(jar: SignedCookieJar) -> (SignedCookieJar, Vec<Flash>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }
    let flashes = read(&jar);
    let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/"));
    (jar, flashes)
}

fn read(jar: &SignedCookieJar) -> Vec<Flash> {
    jar.get(FLASH_COOKIE)
        .and_then(|c| hex::decode(c.value()).ok())
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}
