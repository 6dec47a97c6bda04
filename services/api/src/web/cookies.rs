//! services/api/src/web/cookies.rs
//!
//! Reading and writing the `auth_token` and `oauth_state` cookies.

use axum::http::{header, HeaderMap};

pub const AUTH_COOKIE: &str = "auth_token";
pub const STATE_COOKIE: &str = "oauth_state";
/// The browser keeps the state cookie a little shorter than the server keeps the state.
pub const STATE_COOKIE_MAX_AGE_SECS: i64 = 10 * 60;

/// Finds a cookie by name in the `Cookie` header.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (key, value) = c.trim().split_once('=')?;
            (key == name).then_some(value)
        })
}

/// The session token from the auth cookie, or from an `Authorization: Bearer` header.
pub fn read_token(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = read_cookie(headers, AUTH_COOKIE).filter(|t| !t.is_empty()) {
        return Some(token);
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn set_cookie(name: &str, value: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        name,
        value,
        max_age_secs.max(0)
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

pub fn clear_cookie(name: &str, secure: bool) -> String {
    set_cookie(name, "", 0, secure)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_named_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=abc-123; oauth_state=s1"),
        );
        assert_eq!(read_cookie(&headers, AUTH_COOKIE), Some("abc-123"));
        assert_eq!(read_cookie(&headers, STATE_COOKIE), Some("s1"));
        assert_eq!(read_cookie(&headers, "missing"), None);
    }

    #[test]
    fn falls_back_to_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(read_token(&headers), Some("tok"));

        headers.insert(header::COOKIE, HeaderValue::from_static("auth_token=cookie-tok"));
        assert_eq!(read_token(&headers), Some("cookie-tok"));
    }

    #[test]
    fn cookies_are_http_only_and_strict() {
        let cookie = set_cookie(AUTH_COOKIE, "t", 86400, true);
        assert_eq!(
            cookie,
            "auth_token=t; HttpOnly; SameSite=Strict; Path=/; Max-Age=86400; Secure"
        );
        assert!(clear_cookie(AUTH_COOKIE, false).contains("Max-Age=0"));
    }
}
