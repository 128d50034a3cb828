//! Routes and in-memory data of the mock backend.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::{Datelike, NaiveDate, Utc};
use mercado_client::models::{Cart, CartLine, Order, OrderLine, Product, ProductInput};
use mercado_core::{CartId, CartLineId, OrderId, OrderStatus, Price, ProductId, UserId};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::RecordedRequest;

#[derive(Debug, Clone, Copy)]
pub enum Listener {
    Api,
    CartService,
}

impl Listener {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Api => "api",
            Self::CartService => "cart-service",
        }
    }
}

pub struct StoredUser {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub birth_date: (i32, u32, u32),
    pub password: String,
}

impl StoredUser {
    /// Users go out with `birthDate` as a `[y, m, d]` array and a password
    /// hash, like the real backend.
    fn to_json(&self) -> Value {
        let (y, m, d) = self.birth_date;
        json!({
            "id": self.id,
            "email": self.email,
            "firstName": self.first_name,
            "lastName": self.last_name,
            "address": self.address,
            "birthDate": [y, m, d],
            "password": "$2a$10$mockedbcrypthash",
        })
    }
}

pub struct StoredCart {
    id: CartId,
    user_id: UserId,
    lines: Vec<(ProductId, i32)>,
}

impl StoredCart {
    /// Upsert a line with the given quantity.
    pub fn set(&mut self, product_id: ProductId, quantity: i32) {
        match self.lines.iter_mut().find(|(id, _)| *id == product_id) {
            Some(line) => line.1 = quantity,
            None => self.lines.push((product_id, quantity)),
        }
    }
}

#[derive(Default)]
pub struct BackendData {
    pub users: Vec<StoredUser>,
    pub products: Vec<Product>,
    carts: Vec<StoredCart>,
    orders: Vec<Order>,
    tokens: HashMap<String, UserId>,
    pub requests: Vec<RecordedRequest>,
    pub last_user_update: Option<Value>,
    pub empty_tokens: bool,
    pub failing_paths: Vec<String>,
}

impl BackendData {
    pub fn next_user_id(&self) -> UserId {
        UserId::new(i32::try_from(self.users.len()).unwrap_or(i32::MAX - 1) + 1)
    }

    pub fn insert_product(&mut self, input: ProductInput) -> Product {
        let next = self.products.iter().map(|p| p.id.as_i32()).max().unwrap_or(0) + 1;
        let product = Product {
            id: ProductId::new(next),
            name: input.name,
            price: input.price,
            image_url: input.image_url,
            stock: input.stock,
            description: input.description,
        };
        self.products.push(product.clone());
        product
    }

    /// The user's cart, created empty on first access.
    pub fn cart_for_user(&mut self, user_id: UserId) -> &mut StoredCart {
        if let Some(index) = self.carts.iter().position(|c| c.user_id == user_id) {
            return &mut self.carts[index];
        }
        self.carts.push(StoredCart {
            id: CartId::new(user_id.as_i32() + 100),
            user_id,
            lines: Vec::new(),
        });
        let last = self.carts.len() - 1;
        &mut self.carts[last]
    }

    fn cart_mut(&mut self, cart_id: CartId) -> Result<&mut StoredCart, ApiError> {
        self.carts
            .iter_mut()
            .find(|c| c.id == cart_id)
            .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Cart not found"))
    }

    fn product(&self, id: ProductId) -> Result<&Product, ApiError> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Product not found"))
    }

    fn render_cart(&self, cart: &StoredCart) -> Cart {
        let items = cart
            .lines
            .iter()
            .filter_map(|(product_id, quantity)| {
                let product = self.products.iter().find(|p| p.id == *product_id)?;
                Some(CartLine {
                    id: CartLineId::new(product_id.as_i32()),
                    product: product.clone(),
                    quantity: *quantity,
                })
            })
            .collect();
        Cart {
            id: cart.id,
            user_id: cart.user_id,
            items,
        }
    }

    fn rendered_cart(&self, cart_id: CartId) -> Result<Cart, ApiError> {
        let cart = self
            .carts
            .iter()
            .find(|c| c.id == cart_id)
            .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Cart not found"))?;
        Ok(self.render_cart(cart))
    }

    fn bearer_user(&self, headers: &HeaderMap) -> Result<UserId, ApiError> {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(|token| self.tokens.get(token).copied())
            .ok_or_else(|| ApiError::new(StatusCode::UNAUTHORIZED, "Unauthorized"))
    }

    fn user(&self, id: UserId) -> Result<&StoredUser, ApiError> {
        self.users
            .iter()
            .find(|u| u.id == id)
            .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "User not found"))
    }
}

/// Error body in the backend's shape: `{ "message", "status" }`.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "message": self.message, "status": self.status.as_u16() });
        (self.status, Json(body)).into_response()
    }
}

type Reply<T> = Result<Json<T>, ApiError>;

#[derive(Clone)]
struct Ctx {
    listener: Listener,
    data: Arc<Mutex<BackendData>>,
}

impl Ctx {
    fn lock(&self) -> MutexGuard<'_, BackendData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn router(listener: Listener, data: Arc<Mutex<BackendData>>) -> Router {
    let ctx = Ctx { listener, data };

    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/api/users/email/{email}", get(user_by_email))
        .route("/api/users/profile", get(profile))
        .route("/api/users/{id}", put(update_user))
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/cart/user/{user_id}", get(cart_by_user))
        .route("/api/cart/{cart_id}/add/{product_id}", post(add_to_cart))
        .route(
            "/api/cart/{cart_id}/remove/{product_id}",
            delete(remove_from_cart),
        )
        .route("/api/cart/{cart_id}/checkout", post(checkout))
        .route("/orders", get(orders))
        .layer(middleware::from_fn_with_state(ctx.clone(), record))
        .with_state(ctx)
}

async fn record(State(ctx): State<Ctx>, request: Request, next: Next) -> Response {
    let entry = RecordedRequest {
        listener: ctx.listener.as_str(),
        method: request.method().to_string(),
        path: request
            .uri()
            .path_and_query()
            .map_or_else(|| request.uri().path().to_string(), ToString::to_string),
        authorization: request
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    };
    let fails = {
        let mut data = ctx.lock();
        let fails = data
            .failing_paths
            .iter()
            .any(|prefix| entry.path.starts_with(prefix.as_str()));
        data.requests.push(entry);
        fails
    };
    if fails {
        return ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "Service unavailable")
            .into_response();
    }
    next.run(request).await
}

// =============================================================================
// Auth & users
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterBody {
    first_name: String,
    last_name: String,
    email: String,
    password: String,
    address: String,
    birth_date: String,
}

async fn register(State(ctx): State<Ctx>, Json(body): Json<RegisterBody>) -> Reply<Value> {
    let mut data = ctx.lock();
    if data.users.iter().any(|u| u.email == body.email) {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "Email already registered",
        ));
    }
    let birth = NaiveDate::parse_from_str(&body.birth_date, "%Y-%m-%d")
        .map_err(|_| ApiError::new(StatusCode::BAD_REQUEST, "Invalid birth date"))?;

    let user = StoredUser {
        id: data.next_user_id(),
        email: body.email,
        first_name: body.first_name,
        last_name: body.last_name,
        address: body.address,
        birth_date: (birth.year(), birth.month(), birth.day()),
        password: body.password,
    };
    let json = user.to_json();
    data.users.push(user);
    Ok(Json(json))
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn login(State(ctx): State<Ctx>, Json(body): Json<LoginBody>) -> Reply<Value> {
    let mut data = ctx.lock();
    let user_id = data
        .users
        .iter()
        .find(|u| u.email == body.email && u.password == body.password)
        .map(|u| u.id)
        .ok_or_else(|| ApiError::new(StatusCode::FORBIDDEN, "Invalid credentials"))?;

    if data.empty_tokens {
        return Ok(Json(json!({ "access_token": "" })));
    }

    let token = format!("token-{user_id}-{}", data.tokens.len() + 1);
    data.tokens.insert(token.clone(), user_id);
    Ok(Json(json!({ "access_token": token })))
}

async fn user_by_email(
    State(ctx): State<Ctx>,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> Reply<Value> {
    let data = ctx.lock();
    data.bearer_user(&headers)?;
    data.users
        .iter()
        .find(|u| u.email == email)
        .map(|u| Json(u.to_json()))
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "User not found"))
}

async fn profile(State(ctx): State<Ctx>, headers: HeaderMap) -> Reply<Value> {
    let data = ctx.lock();
    let user_id = data.bearer_user(&headers)?;
    Ok(Json(data.user(user_id)?.to_json()))
}

async fn update_user(
    State(ctx): State<Ctx>,
    headers: HeaderMap,
    Path(id): Path<UserId>,
    Json(body): Json<Value>,
) -> Reply<Value> {
    let mut data = ctx.lock();
    let caller = data.bearer_user(&headers)?;
    if caller != id {
        return Err(ApiError::new(StatusCode::FORBIDDEN, "Cannot edit another user"));
    }
    data.last_user_update = Some(body.clone());

    let user = data
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "User not found"))?;
    let text = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);
    if let Some(v) = text("firstName") {
        user.first_name = v;
    }
    if let Some(v) = text("lastName") {
        user.last_name = v;
    }
    if let Some(v) = text("address") {
        user.address = v;
    }
    Ok(Json(user.to_json()))
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(State(ctx): State<Ctx>) -> Json<Vec<Product>> {
    Json(ctx.lock().products.clone())
}

async fn get_product(State(ctx): State<Ctx>, Path(id): Path<ProductId>) -> Reply<Product> {
    Ok(Json(ctx.lock().product(id)?.clone()))
}

async fn create_product(
    State(ctx): State<Ctx>,
    headers: HeaderMap,
    Json(input): Json<ProductInput>,
) -> Reply<Product> {
    let mut data = ctx.lock();
    data.bearer_user(&headers)?;
    Ok(Json(data.insert_product(input)))
}

async fn update_product(
    State(ctx): State<Ctx>,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Reply<Product> {
    let mut data = ctx.lock();
    data.bearer_user(&headers)?;
    let product = data
        .products
        .iter_mut()
        .find(|p| p.id == id)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "Product not found"))?;
    *product = Product {
        id,
        name: input.name,
        price: input.price,
        image_url: input.image_url,
        stock: input.stock,
        description: input.description,
    };
    Ok(Json(product.clone()))
}

async fn delete_product(
    State(ctx): State<Ctx>,
    headers: HeaderMap,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, ApiError> {
    let mut data = ctx.lock();
    data.bearer_user(&headers)?;
    data.product(id)?;
    data.products.retain(|p| p.id != id);
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Cart & orders
// =============================================================================

#[derive(Deserialize)]
struct QuantityParams {
    quantity: i32,
}

async fn cart_by_user(
    State(ctx): State<Ctx>,
    headers: HeaderMap,
    Path(user_id): Path<UserId>,
) -> Reply<Cart> {
    let mut data = ctx.lock();
    data.bearer_user(&headers)?;
    data.user(user_id)?;
    let cart_id = data.cart_for_user(user_id).id;
    Ok(Json(data.rendered_cart(cart_id)?))
}

async fn add_to_cart(
    State(ctx): State<Ctx>,
    headers: HeaderMap,
    Path((cart_id, product_id)): Path<(CartId, ProductId)>,
    Query(params): Query<QuantityParams>,
) -> Reply<Cart> {
    let mut data = ctx.lock();
    data.bearer_user(&headers)?;
    if params.quantity <= 0 {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "Quantity must be positive",
        ));
    }
    data.product(product_id)?;
    data.cart_mut(cart_id)?.set(product_id, params.quantity);
    Ok(Json(data.rendered_cart(cart_id)?))
}

async fn remove_from_cart(
    State(ctx): State<Ctx>,
    headers: HeaderMap,
    Path((cart_id, product_id)): Path<(CartId, ProductId)>,
) -> Reply<Cart> {
    let mut data = ctx.lock();
    data.bearer_user(&headers)?;
    data.cart_mut(cart_id)?
        .lines
        .retain(|(id, _)| *id != product_id);
    Ok(Json(data.rendered_cart(cart_id)?))
}

async fn checkout(
    State(ctx): State<Ctx>,
    headers: HeaderMap,
    Path(cart_id): Path<CartId>,
) -> Reply<Order> {
    let mut data = ctx.lock();
    data.bearer_user(&headers)?;
    let cart = data.rendered_cart(cart_id)?;
    if cart.items.is_empty() {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, "Cart is empty"));
    }
    if let Some(line) = cart.items.iter().find(|l| l.quantity > l.product.stock) {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            format!("Insufficient stock for {}", line.product.name),
        ));
    }

    for line in &cart.items {
        if let Some(product) = data.products.iter_mut().find(|p| p.id == line.product.id) {
            product.stock -= line.quantity;
        }
    }
    data.cart_mut(cart_id)?.lines.clear();

    let order = Order {
        id: OrderId::new(i32::try_from(data.orders.len()).unwrap_or(i32::MAX - 1) + 1),
        user_id: Some(cart.user_id),
        total: Some(
            cart.items
                .iter()
                .map(|l| l.product.price.times(l.quantity))
                .sum::<Price>(),
        ),
        items: cart
            .items
            .into_iter()
            .map(|l| OrderLine {
                product_id: Some(l.product.id),
                product: Some(l.product),
                quantity: l.quantity,
            })
            .collect(),
        status: OrderStatus::Pending,
        created_at: Some(Utc::now().to_rfc3339()),
    };
    data.orders.push(order.clone());
    Ok(Json(order))
}

async fn orders(State(ctx): State<Ctx>, headers: HeaderMap) -> Reply<Vec<Order>> {
    let data = ctx.lock();
    let user_id = data.bearer_user(&headers)?;
    Ok(Json(
        data.orders
            .iter()
            .filter(|o| o.user_id == Some(user_id))
            .cloned()
            .collect(),
    ))
}
