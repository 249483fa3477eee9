// ABOUTME: Cookie helpers for the refresh credential
// ABOUTME: Reads a named cookie from request headers and builds HttpOnly Secure Set-Cookie values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use axum::http::header::{InvalidHeaderValue, COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use tokenward_core::constants::cookies::COOKIE_PATH;

/// Value of the first cookie called `name`, across every `Cookie` header
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().trim_matches('"').to_owned())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` carrying the refresh credential
///
/// # Errors
///
/// Returns an error if `name` or `value` contain bytes not allowed in a header
pub fn refresh_cookie(
    name: &str,
    value: &str,
    max_age_secs: i64,
) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{name}={value}; Max-Age={max_age_secs}; Path={COOKIE_PATH}; HttpOnly; Secure; SameSite=Strict"
    ))
}

/// `Set-Cookie` that removes the refresh cookie
///
/// # Errors
///
/// Returns an error if `name` contains bytes not allowed in a header
pub fn clear_refresh_cookie(name: &str) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{name}=; Max-Age=0; Path={COOKIE_PATH}; HttpOnly; Secure; SameSite=Strict"
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_get_cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; REFRESH_TOKEN=abc.def.ghi"));
        headers.append(COOKIE, HeaderValue::from_static("other=1"));

        assert_eq!(
            get_cookie_value(&headers, "REFRESH_TOKEN").as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(get_cookie_value(&headers, "other").as_deref(), Some("1"));
        assert!(get_cookie_value(&headers, "missing").is_none());
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("REFRESH_TOKEN="));
        assert!(get_cookie_value(&headers, "REFRESH_TOKEN").is_none());
    }

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = refresh_cookie("REFRESH_TOKEN", "tok", 604_800).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with("REFRESH_TOKEN=tok;"));
        assert!(cookie.contains("Max-Age=604800"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Path=/"));

        let cleared = clear_refresh_cookie("REFRESH_TOKEN").unwrap();
        assert!(cleared.to_str().unwrap().contains("Max-Age=0"));
    }
}
