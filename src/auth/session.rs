//! Cookie-backed session state: the login binding and flash messages.

use actix_session::{
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
    Session, SessionMiddleware,
};
use actix_web::cookie::{time, Key, SameSite};
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::AuthSettings;
use crate::error::AppError;
use crate::models::User;

const AUTH_KEY: &str = "auth";
const FLASHES_KEY: &str = "_flashes";

lazy_static! {
    // A local absolute path: one leading slash, not followed by another
    // slash or a backslash (which browsers treat as a scheme-relative URL).
    static ref LOCAL_PATH: Regex = Regex::new(r"^/(?:[^/\\]|$)").unwrap();
}

/// Login binding stored in the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SessionAuth {
    user_id: i64,
    remember: bool,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Info,
    Success,
    Warning,
    Danger,
}

/// A one-time notice shown on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

/// Session middleware storing state in a private (encrypted) cookie.
///
/// The cookie itself lives as long as a remembered login; shorter logins are
/// expired server-side through `SessionAuth::expires_at`.
pub fn middleware(key: Key, settings: &AuthSettings) -> SessionMiddleware<CookieSessionStore> {
    let cookie_ttl = time::Duration::seconds(settings.remember_ttl.num_seconds());
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(settings.cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(SameSite::Lax)
        .session_lifecycle(PersistentSession::default().session_ttl(cookie_ttl))
        .build()
}

/// Binds the session to `user`. The session id is renewed first.
pub fn establish(
    session: &Session,
    user: &User,
    remember: bool,
    settings: &AuthSettings,
) -> Result<(), AppError> {
    let ttl = if remember {
        settings.remember_ttl
    } else {
        settings.session_ttl
    };
    session.renew();
    session.insert(
        AUTH_KEY,
        SessionAuth {
            user_id: user.id,
            remember,
            expires_at: Utc::now() + ttl,
        },
    )?;
    Ok(())
}

/// Drops the login binding. Ending a session that has none is a no-op.
pub fn end(session: &Session) {
    session.remove(AUTH_KEY);
}

/// The logged-in user id, if the binding exists and has not expired.
pub fn user_id(session: &Session) -> Result<Option<i64>, AppError> {
    match session.get::<SessionAuth>(AUTH_KEY)? {
        Some(auth) if auth.expires_at > Utc::now() => Ok(Some(auth.user_id)),
        Some(_) => {
            end(session);
            Ok(None)
        }
        None => Ok(None),
    }
}

pub fn flash(session: &Session, level: FlashLevel, message: &str) -> Result<(), AppError> {
    let mut flashes: Vec<Flash> = session.get(FLASHES_KEY)?.unwrap_or_default();
    flashes.push(Flash {
        level,
        message: message.to_string(),
    });
    session.insert(FLASHES_KEY, flashes)?;
    Ok(())
}

/// Removes and returns all pending flashes.
pub fn take_flashes(session: &Session) -> Result<Vec<Flash>, AppError> {
    let flashes: Vec<Flash> = session.get(FLASHES_KEY)?.unwrap_or_default();
    if !flashes.is_empty() {
        session.remove(FLASHES_KEY);
    }
    Ok(flashes)
}

/// The post-login destination: `next` when it is a local path, else home.
///
/// Only printable ASCII is accepted. Browsers drop tabs and newlines while
/// parsing a `Location`, so `/\t/host` would otherwise leave the site.
pub fn redirect_target(next: Option<&str>) -> String {
    match next {
        Some(path) if path.bytes().all(|b| b.is_ascii_graphic()) && LOCAL_PATH.is_match(path) => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}
