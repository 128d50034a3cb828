//! Integration test harness for the Mercado client.
//!
//! [`MockBackend`] serves the storefront REST API from memory on two
//! loopback listeners, one for the API URL and one for the cart service URL,
//! sharing the same data. Every request is logged with the listener it
//! arrived on and its `Authorization` header so tests can assert on routing
//! and token handling.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p mercado-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod backend;

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use mercado_client::models::{Product, ProductInput};
use mercado_client::{ClientConfig, Session, Storefront};
use mercado_core::{Price, ProductId, UserId};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use backend::{BackendData, Listener, StoredUser};

/// Password of every user created with [`MockBackend::seed_user`].
pub const SEED_PASSWORD: &str = "secreto";

/// A request as seen by the mock backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Which listener received it: `"api"` or `"cart-service"`.
    pub listener: &'static str,
    pub method: String,
    /// Path including any query string.
    pub path: String,
    pub authorization: Option<String>,
}

impl RecordedRequest {
    /// Whether the request carried a bearer token.
    #[must_use]
    pub fn has_bearer(&self) -> bool {
        self.authorization
            .as_deref()
            .is_some_and(|v| v.starts_with("Bearer "))
    }
}

/// In-process storefront backend.
pub struct MockBackend {
    api_url: String,
    cart_service_url: String,
    data: Arc<Mutex<BackendData>>,
    tasks: Vec<JoinHandle<()>>,
}

impl MockBackend {
    /// Bind both listeners on `127.0.0.1:0` and start serving.
    ///
    /// # Panics
    ///
    /// Panics if a loopback listener cannot be bound.
    pub async fn start() -> Self {
        let data = Arc::new(Mutex::new(BackendData::default()));
        let (api_url, api_task) = serve(Listener::Api, Arc::clone(&data)).await;
        let (cart_service_url, cart_task) = serve(Listener::CartService, Arc::clone(&data)).await;

        Self {
            api_url,
            cart_service_url,
            data,
            tasks: vec![api_task, cart_task],
        }
    }

    #[must_use]
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    #[must_use]
    pub fn cart_service_url(&self) -> &str {
        &self.cart_service_url
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self, session_file: impl Into<PathBuf>) -> ClientConfig {
        ClientConfig {
            api_url: self.api_url.clone(),
            cart_service_url: self.cart_service_url.clone(),
            session_file: session_file.into(),
        }
    }

    /// Storefront context with an in-memory session.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        self.storefront_with_session(Session::in_memory())
    }

    #[must_use]
    pub fn storefront_with_session(&self, session: Session) -> Storefront {
        Storefront::with_session(self.config("unused-session.json"), session)
    }

    /// Create a user whose password is [`SEED_PASSWORD`].
    pub fn seed_user(&self, email: &str, birth_date: (i32, u32, u32)) -> UserId {
        let mut data = self.lock();
        let id = data.next_user_id();
        data.users.push(StoredUser {
            id,
            email: email.to_string(),
            first_name: "Ana".to_string(),
            last_name: "Diaz".to_string(),
            address: "Calle 1".to_string(),
            birth_date,
            password: SEED_PASSWORD.to_string(),
        });
        id
    }

    /// Add a product to the catalog.
    pub fn seed_product(&self, name: &str, price: i64, stock: i32) -> ProductId {
        let mut data = self.lock();
        let input = ProductInput {
            name: name.to_string(),
            price: Price::from_units(price),
            image_url: String::new(),
            stock,
            description: format!("{name} description"),
        };
        data.insert_product(input).id
    }

    /// Put a line straight into a user's cart, bypassing stock checks.
    pub fn seed_cart_line(&self, user_id: UserId, product_id: ProductId, quantity: i32) {
        let mut data = self.lock();
        let cart = data.cart_for_user(user_id);
        cart.set(product_id, quantity);
    }

    /// Products currently stored.
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.lock().products.clone()
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    pub fn clear_requests(&self) {
        self.lock().requests.clear();
    }

    /// Body of the most recent `PUT /api/users/{id}`.
    #[must_use]
    pub fn last_user_update(&self) -> Option<Value> {
        self.lock().last_user_update.clone()
    }

    /// Make login succeed with an empty `access_token`.
    pub fn issue_empty_tokens(&self, enabled: bool) {
        self.lock().empty_tokens = enabled;
    }

    /// Answer every request whose path starts with `prefix` with a 503.
    pub fn fail_requests_to(&self, prefix: &str) {
        self.lock().failing_paths.push(prefix.to_string());
    }

    /// Stop failing requests added with [`Self::fail_requests_to`].
    pub fn stop_failing(&self) {
        self.lock().failing_paths.clear();
    }

    fn lock(&self) -> MutexGuard<'_, BackendData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

#[allow(clippy::expect_used)]
async fn serve(listener: Listener, data: Arc<Mutex<BackendData>>) -> (String, JoinHandle<()>) {
    let tcp = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind loopback listener");
    let addr = tcp.local_addr().expect("listener address");
    let router = backend::router(listener, data);

    let task = tokio::spawn(async move {
        let _ = axum::serve(tcp, router).await;
    });

    (format!("http://{addr}"), task)
}
