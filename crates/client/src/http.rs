//! HTTP client wrapper for the storefront backend.
//!
//! Every API module goes through [`HttpClient::request`], which:
//! - resolves the path against the configured base URL (or a per-call override)
//! - sends JSON and expects JSON back
//! - attaches the stored bearer token to everything except login
//! - turns non-success responses into [`ClientError::Api`] with the backend's
//!   `message` when it sent one
//!
//! One attempt per call: no retries, no timeout, no backoff.
//!
//! Failures are logged at `debug` only; callers decide whether an error is
//! worth reporting.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use crate::error::{ClientError, GENERIC_FAILURE_MESSAGE, Result};
use crate::session::Session;

/// Path fragment of the one endpoint that never carries a bearer token.
const LOGIN_PATH: &str = "/auth/login";

/// Options for a single request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    method: Method,
    body: Option<serde_json::Value>,
    headers: HeaderMap,
    base_url: Option<String>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new(Method::GET)
    }
}

impl RequestOptions {
    /// Options for a request with the given method and no body.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            body: None,
            headers: HeaderMap::new(),
            base_url: None,
        }
    }

    /// `GET` request.
    #[must_use]
    pub fn get() -> Self {
        Self::new(Method::GET)
    }

    /// `POST` request.
    #[must_use]
    pub fn post() -> Self {
        Self::new(Method::POST)
    }

    /// `PUT` request.
    #[must_use]
    pub fn put() -> Self {
        Self::new(Method::PUT)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete() -> Self {
        Self::new(Method::DELETE)
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Encode`] if `body` cannot be serialized.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body).map_err(ClientError::Encode)?);
        Ok(self)
    }

    /// Add a request header.
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Send this request to `base_url` instead of the configured API URL.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }
}

/// HTTP client shared by all API modules.
///
/// This struct is cheaply cloneable via `Arc`; clones share the connection
/// pool and the session.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    client: reqwest::Client,
    api_url: String,
    session: Session,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("api_url", &self.inner.api_url)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Create a client for `api_url` that reads tokens from `session`.
    #[must_use]
    pub fn new(api_url: impl Into<String>, session: Session) -> Self {
        Self::with_client(reqwest::Client::new(), api_url, session)
    }

    /// Create a client around an existing `reqwest::Client`.
    #[must_use]
    pub fn with_client(
        client: reqwest::Client,
        api_url: impl Into<String>,
        session: Session,
    ) -> Self {
        Self {
            inner: Arc::new(HttpClientInner {
                client,
                api_url: api_url.into().trim_end_matches('/').to_string(),
                session,
            }),
        }
    }

    /// Default base URL.
    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.inner.api_url
    }

    /// Session the bearer token is read from.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Send a request and decode the JSON response into `T`.
    ///
    /// An empty success body decodes as JSON `null`, so `()` and
    /// [`serde::de::IgnoredAny`] work for endpoints that return nothing.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Transport`] if no response arrives
    /// - [`ClientError::Api`] for a non-success status
    /// - [`ClientError::Decode`] if the body does not match `T`
    #[instrument(skip(self, options), fields(method = %options.method))]
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T> {
        let RequestOptions {
            method,
            body,
            headers: extra_headers,
            base_url,
        } = options;

        let base = base_url.as_deref().unwrap_or(self.inner.api_url.as_str());
        let url = format!("{base}{path}");

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(extra_headers);
        if attaches_token(path)
            && let Some(value) = self.bearer_header()
        {
            headers.insert(AUTHORIZATION, value);
        }

        let mut request = self.inner.client.request(method, &url).headers(headers);
        if let Some(body) = &body {
            request = request.json(body);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| {
            debug!(error = %e, url = %url, "Request failed before a response arrived");
            ClientError::Transport(e)
        })?;

        let status = response.status();
        let text = response.text().await?;
        let duration_ms = start.elapsed().as_millis();

        if !status.is_success() {
            let message = error_message(&text);
            debug!(
                status = status.as_u16(),
                message = %message,
                duration_ms,
                "Backend returned non-success status"
            );
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!(status = status.as_u16(), duration_ms, "Request succeeded");

        let payload = if text.trim().is_empty() {
            "null"
        } else {
            text.as_str()
        };
        serde_json::from_str(payload).map_err(|source| {
            debug!(
                error = %source,
                body_len = text.len(),
                "Response did not match expected schema"
            );
            ClientError::Decode {
                path: path.to_string(),
                source,
            }
        })
    }

    /// `Authorization` header for the stored token, if there is one.
    fn bearer_header(&self) -> Option<HeaderValue> {
        let token = self.inner.session.token()?;
        match HeaderValue::from_str(&format!("Bearer {}", token.expose_secret())) {
            Ok(mut value) => {
                value.set_sensitive(true);
                Some(value)
            }
            Err(_) => {
                warn!("Stored token is not a valid header value; sending without it");
                None
            }
        }
    }
}

/// Whether a request to `path` should carry the bearer token.
fn attaches_token(path: &str) -> bool {
    !path.contains(LOGIN_PATH)
}

/// Backend `message` from an error body, or the generic failure message.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(serde_json::Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map_or_else(|| GENERIC_FAILURE_MESSAGE.to_string(), str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_login_never_carries_token() {
        assert!(!attaches_token("/auth/login"));
        assert!(attaches_token("/auth/register"));
        assert!(attaches_token("/api/products"));
        assert!(attaches_token("/api/cart/user/7"));
    }

    #[test]
    fn test_error_message_prefers_backend_message() {
        assert_eq!(
            error_message(r#"{"message":"Product not found","status":404}"#),
            "Product not found"
        );
    }

    #[test]
    fn test_error_message_falls_back() {
        assert_eq!(error_message(""), GENERIC_FAILURE_MESSAGE);
        assert_eq!(error_message("<html>502</html>"), GENERIC_FAILURE_MESSAGE);
        assert_eq!(error_message(r#"{"error":"x"}"#), GENERIC_FAILURE_MESSAGE);
        assert_eq!(error_message(r#"{"message":""}"#), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_bearer_header_uses_session_token() {
        let session = Session::in_memory();
        let client = HttpClient::new("http://localhost:9003/", session.clone());
        assert_eq!(client.api_url(), "http://localhost:9003");
        assert!(client.bearer_header().is_none());

        session
            .persist_login(&SecretString::from("tok-1"), "ana@example.com")
            .unwrap();
        let value = client.bearer_header().unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer tok-1");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_request_options_builders() {
        let options = RequestOptions::post()
            .base_url("http://localhost:9002/")
            .json(&serde_json::json!({"a": 1}))
            .unwrap();
        assert_eq!(options.method(), &Method::POST);
        assert_eq!(options.base_url.as_deref(), Some("http://localhost:9002"));
        assert!(options.body.is_some());
    }
}
