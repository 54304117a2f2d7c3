//! Sanctum-style CSRF cookie handling.

use reqwest::header::{HeaderMap, SET_COOKIE};

/// Endpoint that issues a fresh `XSRF-TOKEN` cookie.
pub const CSRF_COOKIE_PATH: &str = "/sanctum/csrf-cookie";
pub const XSRF_COOKIE: &str = "XSRF-TOKEN";
pub const XSRF_HEADER: &str = "X-XSRF-TOKEN";

/// The URL-decoded `XSRF-TOKEN` value from a response's `Set-Cookie` headers.
pub fn xsrf_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(xsrf_from_cookie)
}

fn xsrf_from_cookie(cookie: &str) -> Option<String> {
    let pair = cookie.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    if name.trim() != XSRF_COOKIE || value.is_empty() {
        return None;
    }
    urlencoding::decode(value).ok().map(|v| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_token_is_url_decoded() {
        let mut headers = HeaderMap::new();
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("laravel_session=abc; path=/; httponly"),
        );
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("XSRF-TOKEN=eyJpdiI6IjEyMyJ9%3D; expires=Thu, 01 Jan 2099 00:00:00 GMT; path=/"),
        );
        assert_eq!(xsrf_from_headers(&headers).as_deref(), Some("eyJpdiI6IjEyMyJ9="));
    }

    #[test]
    fn test_missing_cookie() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("laravel_session=abc"));
        assert!(xsrf_from_headers(&headers).is_none());
        assert!(xsrf_from_headers(&HeaderMap::new()).is_none());
    }
}
