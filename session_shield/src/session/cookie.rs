use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use http::header::{COOKIE, HeaderMap, SET_COOKIE};

use crate::config::SessionConfig;
use crate::session::errors::SessionError;
use crate::session::types::SessionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Lax,
    Strict,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Lax => "Lax",
            Self::Strict => "Strict",
            Self::None => "None",
        };
        f.write_str(value)
    }
}

impl FromStr for SameSite {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lax" => Ok(Self::Lax),
            "strict" => Ok(Self::Strict),
            "none" => Ok(Self::None),
            other => Err(SessionError::Cookie(format!("Invalid SameSite value: {other}"))),
        }
    }
}

/// Format a `Set-Cookie` value carrying the session id.
///
/// Without `max_age` the cookie lives until the browser closes.
pub fn session_cookie(config: &SessionConfig, id: &SessionId, max_age: Option<Duration>) -> String {
    format_cookie(config, id.as_str(), max_age)
}

/// A cookie that makes the browser drop the session cookie.
pub fn expired_session_cookie(config: &SessionConfig) -> String {
    let mut cookie = format_cookie(config, "deleted", Some(Duration::zero()));
    cookie.push_str("; Expires=Thu, 01 Jan 1970 00:00:00 GMT");
    cookie
}

fn format_cookie(config: &SessionConfig, value: &str, max_age: Option<Duration>) -> String {
    let mut cookie = format!("{}={}; Path={}", config.cookie, value, config.path);
    if let Some(domain) = &config.domain {
        cookie.push_str(&format!("; Domain={domain}"));
    }
    if let Some(max_age) = max_age {
        cookie.push_str(&format!("; Max-Age={}", max_age.num_seconds().max(0)));
    }
    // Browsers drop SameSite=None cookies that are not Secure.
    if config.secure || config.same_site == SameSite::None {
        cookie.push_str("; Secure");
    }
    if config.http_only {
        cookie.push_str("; HttpOnly");
    }
    cookie.push_str(&format!("; SameSite={}", config.same_site));
    cookie
}

/// Append a `Set-Cookie` header.
pub fn header_set_cookie(headers: &mut HeaderMap, cookie: String) -> Result<&HeaderMap, SessionError> {
    headers.append(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| SessionError::Cookie("Failed to parse cookie".to_string()))?,
    );
    Ok(headers)
}

/// Find the value of cookie `cookie_name` in the request's `Cookie` headers.
pub fn session_id_from_headers<'a>(
    headers: &'a HeaderMap,
    cookie_name: &str,
) -> Result<Option<&'a str>, SessionError> {
    for cookie_header in headers.get_all(COOKIE) {
        let cookie_str = cookie_header.to_str().map_err(|e| {
            tracing::error!("Invalid cookie header: {}", e);
            SessionError::HeaderError("Invalid cookie header".to_string())
        })?;

        let found = cookie_str.split(';').map(|s| s.trim()).find_map(|s| {
            let mut parts = s.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(k), Some(v)) if k == cookie_name => Some(v),
                _ => None,
            }
        });
        if found.is_some() {
            return Ok(found);
        }
    }

    tracing::debug!("No session cookie '{}' found in cookies", cookie_name);
    Ok(None)
}
