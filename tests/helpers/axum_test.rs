// ABOUTME: Axum HTTP testing utilities for integration tests
// ABOUTME: Drives a router in-process via tower oneshot and captures status, headers and body

use axum::{
    body::{to_bytes, Body},
    http::{header, request::Builder, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tower::ServiceExt;

/// In-process HTTP request against an Axum router
pub struct AxumTestRequest {
    builder: Builder,
    body: Body,
}

impl AxumTestRequest {
    pub fn get(uri: &str) -> Self {
        Self::with_method(Method::GET, uri)
    }

    pub fn post(uri: &str) -> Self {
        Self::with_method(Method::POST, uri)
    }

    fn with_method(method: Method, uri: &str) -> Self {
        Self {
            builder: Request::builder().method(method).uri(uri),
            body: Body::empty(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.builder = self.builder.header(name, value);
        self
    }

    /// `Authorization: Bearer <token>`
    pub fn bearer(self, token: &str) -> Self {
        self.header(header::AUTHORIZATION.as_str(), &format!("Bearer {token}"))
    }

    /// `Cookie: <name>=<value>`
    pub fn cookie(self, name: &str, value: &str) -> Self {
        self.header(header::COOKIE.as_str(), &format!("{name}={value}"))
    }

    /// Serialize `payload` as the JSON body
    pub fn json<T: Serialize>(self, payload: &T) -> Self {
        let encoded = serde_json::to_vec(payload).expect("request payload must serialize");
        self.raw_body("application/json", encoded)
    }

    /// Body bytes sent verbatim with the given content type
    pub fn raw_body(mut self, content_type: &str, body: impl Into<Body>) -> Self {
        self.builder = self.builder.header(header::CONTENT_TYPE, content_type);
        self.body = body.into();
        self
    }

    /// Run the request through `app` and buffer the response
    pub async fn send(self, app: Router) -> AxumTestResponse {
        let request = self.builder.body(self.body).expect("invalid test request");
        let response = app.oneshot(request).await.expect("router is infallible");

        let (parts, body) = response.into_parts();
        let body = to_bytes(body, usize::MAX)
            .await
            .expect("response body must be readable")
            .to_vec();

        AxumTestResponse {
            status: parts.status,
            headers: parts.headers,
            body,
        }
    }
}

/// Buffered response with assertion helpers
pub struct AxumTestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl AxumTestResponse {
    pub const fn status(&self) -> u16 {
        self.status.as_u16()
    }

    #[allow(dead_code)]
    pub const fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    pub fn set_cookie(&self) -> Option<&str> {
        self.header(header::SET_COOKIE.as_str())
    }

    /// Value part of the first `Set-Cookie` header
    pub fn cookie_value(&self) -> Option<String> {
        let (_, rest) = self.set_cookie()?.split_once('=')?;
        let value = rest.split(';').next().unwrap_or_default();
        Some(value.to_owned())
    }

    /// `error.code` from an error envelope
    #[allow(dead_code)]
    pub fn error_code(&self) -> String {
        let envelope: Value = self.json();
        match envelope.pointer("/error/code") {
            Some(Value::String(code)) => code.clone(),
            _ => panic!("no error code in body: {envelope}"),
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).unwrap_or_else(|e| {
            panic!(
                "body is not the expected JSON ({e}): {}",
                String::from_utf8_lossy(&self.body)
            )
        })
    }

    #[allow(dead_code)]
    pub fn body_is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Panics with the body text when the status differs
    pub fn assert_status(self, expected: StatusCode) -> Self {
        assert_eq!(
            self.status,
            expected,
            "unexpected status, body: {}",
            String::from_utf8_lossy(&self.body)
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;

    #[tokio::test]
    async fn test_cookie_value_is_extracted() {
        let app = Router::new().route(
            "/cookie",
            get(|| async { ([(header::SET_COOKIE, "A=b; Path=/")], "ok") }),
        );
        let response = AxumTestRequest::get("/cookie").send(app).await;
        assert_eq!(response.status(), 200);
        assert_eq!(response.cookie_value().as_deref(), Some("b"));
    }
}
