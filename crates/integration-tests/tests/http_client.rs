//! Integration tests for the HTTP wrapper: token injection, error
//! normalization and base URL overrides.

#![allow(clippy::unwrap_used)]

use mercado_client::api::UserApi;
use mercado_client::http::{HttpClient, RequestOptions};
use mercado_client::models::Product;
use mercado_client::{ClientError, Session};
use mercado_integration_tests::{MockBackend, SEED_PASSWORD};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use secrecy::SecretString;
use serde::de::IgnoredAny;

async fn logged_in_client(backend: &MockBackend) -> HttpClient {
    backend.seed_user("ana@example.com", (1990, 5, 4));
    let http = HttpClient::new(backend.api_url(), Session::in_memory());
    UserApi::new(http.clone())
        .login("ana@example.com", &SecretString::from(SEED_PASSWORD))
        .await
        .unwrap();
    http
}

// =============================================================================
// Token handling
// =============================================================================

#[tokio::test]
async fn test_login_is_sent_without_token_and_later_calls_carry_it() {
    let backend = MockBackend::start().await;
    let http = logged_in_client(&backend).await;

    let _: Vec<Product> = http
        .request("/api/products", RequestOptions::get())
        .await
        .unwrap();

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].path, "/auth/login");
    assert!(!requests[0].has_bearer());
    assert_eq!(requests[1].path, "/api/products");
    assert!(requests[1].has_bearer());
}

#[tokio::test]
async fn test_no_token_means_no_authorization_header() {
    let backend = MockBackend::start().await;
    let http = HttpClient::new(backend.api_url(), Session::in_memory());

    let _: Vec<Product> = http
        .request("/api/products", RequestOptions::get())
        .await
        .unwrap();

    assert!(backend.requests()[0].authorization.is_none());
}

#[tokio::test]
async fn test_stored_token_overrides_caller_authorization() {
    let backend = MockBackend::start().await;
    let http = logged_in_client(&backend).await;
    backend.clear_requests();

    let options =
        RequestOptions::get().header(AUTHORIZATION, HeaderValue::from_static("Bearer bogus"));
    let _: Vec<Product> = http.request("/api/products", options).await.unwrap();

    let sent = backend.requests()[0].authorization.clone().unwrap();
    assert_ne!(sent, "Bearer bogus");
    assert!(sent.starts_with("Bearer token-"));
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_backend_message_is_surfaced_verbatim() {
    let backend = MockBackend::start().await;
    let http = HttpClient::new(backend.api_url(), Session::in_memory());

    let err = http
        .request::<Product>("/api/products/999", RequestOptions::get())
        .await
        .unwrap_err();

    match err {
        ClientError::Api { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Product not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let http = HttpClient::new(format!("http://{addr}"), Session::in_memory());
    let err = http
        .request::<Vec<Product>>("/api/products", RequestOptions::get())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Transport(_)));
}

#[tokio::test]
async fn test_schema_mismatch_is_a_decode_error() {
    let backend = MockBackend::start().await;
    let http = HttpClient::new(backend.api_url(), Session::in_memory());

    let err = http
        .request::<Product>("/api/products", RequestOptions::get())
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Decode { ref path, .. } if path == "/api/products"));
}

// =============================================================================
// Bodies and base URLs
// =============================================================================

#[tokio::test]
async fn test_empty_success_body_decodes() {
    let backend = MockBackend::start().await;
    let product_id = backend.seed_product("Shirt", 10, 5);
    let http = logged_in_client(&backend).await;

    let _: IgnoredAny = http
        .request(
            &format!("/api/products/{product_id}"),
            RequestOptions::delete(),
        )
        .await
        .unwrap();

    assert!(backend.products().is_empty());
}

#[tokio::test]
async fn test_base_url_override_routes_to_other_host() {
    let backend = MockBackend::start().await;
    let http = HttpClient::new(backend.api_url(), Session::in_memory());

    let _: Vec<Product> = http
        .request(
            "/api/products",
            RequestOptions::get().base_url(backend.cart_service_url()),
        )
        .await
        .unwrap();

    assert_eq!(backend.requests()[0].listener, "cart-service");
}
