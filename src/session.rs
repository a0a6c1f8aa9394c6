use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Operator session, restored from the session cookie on every request.
/// The token is opaque: issued by the backend on login and replayed on
/// mutating calls. Templates only ever see this read-only.
#[derive(Debug, Clone, PartialEq)]
pub enum Session {
    Anonymous,
    Authenticated { token: String },
}

impl Session {
    pub fn from_jar(jar: &CookieJar, cookie_name: &str) -> Self {
        match jar.get(cookie_name) {
            Some(cookie) if !cookie.value().is_empty() => Session::Authenticated {
                token: cookie.value().to_string(),
            },
            _ => Session::Anonymous,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Session::Authenticated { token } => Some(token),
            Session::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated { .. })
    }
}

pub fn store_token(jar: CookieJar, cookie_name: &str, token: &str) -> CookieJar {
    let mut cookie = Cookie::new(cookie_name.to_string(), token.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Logout and 401 handling both reduce to this local clear; the backend is
/// never told.
pub fn clear_token(jar: CookieJar, cookie_name: &str) -> CookieJar {
    jar.remove(Cookie::build((cookie_name.to_string(), "")).path("/"))
}

pub const FLASH_COOKIE: &str = "showcase_flash";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlashLevel {
    Success,
    Error,
}

/// One-shot notification rendered on the next page load and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            message: message.into(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self.level {
            FlashLevel::Success => "flash flash-success",
            FlashLevel::Error => "flash flash-error",
        }
    }
}

pub fn set_flash(jar: CookieJar, flash: &Flash) -> CookieJar {
    let tag = match flash.level {
        FlashLevel::Success => "success",
        FlashLevel::Error => "error",
    };
    // Base64 keeps arbitrary message text within the cookie value charset.
    let encoded = STANDARD.encode(format!("{tag}|{}", flash.message));
    let mut cookie = Cookie::new(FLASH_COOKIE, encoded);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    jar.add(cookie)
}

/// Read and consume the pending flash, if any. A tampered cookie is dropped
/// silently.
pub fn take_flash(jar: CookieJar) -> (CookieJar, Option<Flash>) {
    let flash = jar.get(FLASH_COOKIE).and_then(|c| decode_flash(c.value()));
    let jar = jar.remove(Cookie::build((FLASH_COOKIE, "")).path("/"));
    (jar, flash)
}

fn decode_flash(raw: &str) -> Option<Flash> {
    let decoded = STANDARD.decode(raw).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (tag, message) = text.split_once('|')?;
    let level = match tag {
        "success" => FlashLevel::Success,
        "error" => FlashLevel::Error,
        _ => return None,
    };
    Some(Flash {
        level,
        message: message.to_string(),
    })
}
