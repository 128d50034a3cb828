//! Wire schemas for every backend endpoint.
//!
//! Field names follow the backend's camelCase JSON. Responses that do not
//! match these shapes fail to decode rather than leaking untyped values into
//! client state.

use mercado_core::{
    BirthDate, CartId, CartLineId, OrderId, OrderStatus, Price, ProductId, UserId,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};

// =============================================================================
// Users & auth
// =============================================================================

/// A registered user, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub birth_date: Option<BirthDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl User {
    /// Name for display: the backend's `fullName` when present, otherwise
    /// first and last name.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(full) = self.full_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return full.to_string();
        }
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

fn serialize_secret<S: Serializer>(
    secret: &SecretString,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

/// `POST /auth/login` body.
#[derive(Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
}

/// `POST /auth/login` response.
#[derive(Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub access_token: String,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// `POST /auth/register` body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
    pub address: String,
    pub birth_date: BirthDate,
}

/// `PUT /api/users/{id}` body.
///
/// Carries the editable fields plus the immutable ones (email, birth date)
/// the backend expects back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub birth_date: Option<BirthDate>,
}

// =============================================================================
// Products
// =============================================================================

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub stock: i32,
    #[serde(default)]
    pub description: String,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Product fields sent on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub name: String,
    pub price: Price,
    pub image_url: String,
    pub stock: i32,
    pub description: String,
}

impl From<&Product> for ProductInput {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            stock: product.stock,
            description: product.description.clone(),
        }
    }
}

// =============================================================================
// Cart & orders
// =============================================================================

/// A user's cart as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    #[serde(default)]
    pub items: Vec<CartLine>,
}

/// One line of a backend cart.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub id: CartLineId,
    pub product: Product,
    pub quantity: i32,
}

/// Client view of a cart entry: product id, quantity and the product itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: i32,
    pub product: Product,
}

impl CartItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.product.price.times(self.quantity)
    }

    /// Whether the quantity asks for more than is in stock.
    #[must_use]
    pub const fn exceeds_stock(&self) -> bool {
        self.quantity > self.product.stock
    }
}

impl From<CartLine> for CartItem {
    fn from(line: CartLine) -> Self {
        Self {
            product_id: line.product.id,
            quantity: line.quantity,
            product: line.product,
        }
    }
}

impl Cart {
    /// Flatten the backend lines into client cart items.
    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items.into_iter().map(CartItem::from).collect()
    }
}

/// An order created at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub items: Vec<OrderLine>,
    #[serde(default)]
    pub total: Option<Price>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One line of an order.
///
/// Orders echo cart lines; depending on the backend version a line carries
/// the product inline or only its id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    #[serde(default)]
    pub product_id: Option<ProductId>,
    #[serde(default)]
    pub product: Option<Product>,
    pub quantity: i32,
}

impl OrderLine {
    /// Product id, from the explicit field or the inline product.
    #[must_use]
    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id.or_else(|| self.product.as_ref().map(|p| p.id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_flattens_into_items() {
        let json = r#"{
            "id": 11,
            "userId": 7,
            "items": [
                {"id": 1, "quantity": 2, "product": {
                    "id": 3, "name": "Shirt", "price": 10.0, "imageUrl": "u",
                    "stock": 5, "description": "d"
                }}
            ]
        }"#;
        let cart: Cart = serde_json::from_str(json).unwrap();
        let items = cart.into_items();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, ProductId::new(3));
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].line_total(), Price::from_units(20));
        assert!(!items[0].exceeds_stock());
    }

    #[test]
    fn test_user_accepts_array_birth_date() {
        let json = r#"{
            "id": 7, "email": "ana@example.com", "firstName": "Ana",
            "lastName": "Diaz", "address": "Calle 1", "birthDate": [1990, 5, 4],
            "password": "$2a$10$hash"
        }"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.birth_date.unwrap().to_string(), "1990-05-04");
        assert_eq!(user.display_name(), "Ana Diaz");
    }

    #[test]
    fn test_product_requires_schema_fields() {
        let missing_price = r#"{"id": 1, "name": "Shirt"}"#;
        assert!(serde_json::from_str::<Product>(missing_price).is_err());
    }

    #[test]
    fn test_product_input_wire_names() {
        let input = ProductInput {
            name: "Shirt".to_string(),
            price: Price::from_units(10),
            image_url: "u".to_string(),
            stock: 5,
            description: "d".to_string(),
        };
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["imageUrl"], "u");
        assert_eq!(value["price"], 10.0);
    }

    #[test]
    fn test_login_request_sends_password() {
        let body = LoginRequest {
            email: "ana@example.com".to_string(),
            password: SecretString::from("hunter22"),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["password"], "hunter22");
        assert!(!format!("{body:?}").contains("hunter22"));
    }

    #[test]
    fn test_order_tolerates_sparse_payload() {
        let order: Order = serde_json::from_str(r#"{"id": 5}"#).unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.items.is_empty());
    }
}
