//! Cart and order endpoints.
//!
//! Reads, adds and removals go to the API URL. Quantity updates and checkout
//! go to the cart service URL, which may be a different host.

use mercado_core::{CartId, ProductId, UserId};
use tracing::{info, instrument};

use crate::error::Result;
use crate::http::{HttpClient, RequestOptions};
use crate::models::{Cart, Order};

/// Client for `/api/cart` and `/orders`.
#[derive(Debug, Clone)]
pub struct CartApi {
    http: HttpClient,
    cart_service_url: String,
}

impl CartApi {
    #[must_use]
    pub fn new(http: HttpClient, cart_service_url: impl Into<String>) -> Self {
        Self {
            http,
            cart_service_url: cart_service_url.into(),
        }
    }

    /// The user's cart. The backend creates an empty one on first access.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_by_user(&self, user_id: UserId) -> Result<Cart> {
        self.http
            .request(&format!("/api/cart/user/{user_id}"), RequestOptions::get())
            .await
    }

    /// Put `quantity` units of a product into the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Cart> {
        self.http
            .request(&add_path(cart_id, product_id, quantity), RequestOptions::post())
            .await
    }

    /// Set a line's quantity through the cart service.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Cart> {
        self.http
            .request(
                &add_path(cart_id, product_id, quantity),
                RequestOptions::post().base_url(&self.cart_service_url),
            )
            .await
    }

    /// Drop a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, cart_id: CartId, product_id: ProductId) -> Result<Cart> {
        self.http
            .request(
                &format!("/api/cart/{cart_id}/remove/{product_id}"),
                RequestOptions::delete(),
            )
            .await
    }

    /// Turn the cart into an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses the checkout.
    #[instrument(skip(self))]
    pub async fn checkout(&self, cart_id: CartId) -> Result<Order> {
        let order: Order = self
            .http
            .request(
                &format!("/api/cart/{cart_id}/checkout"),
                RequestOptions::post().base_url(&self.cart_service_url),
            )
            .await?;
        info!(order_id = %order.id, "Order created");
        Ok(order)
    }

    /// Orders of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<Order>> {
        self.http.request("/orders", RequestOptions::get()).await
    }
}

fn add_path(cart_id: CartId, product_id: ProductId, quantity: i32) -> String {
    format!("/api/cart/{cart_id}/add/{product_id}?quantity={quantity}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_path_carries_quantity() {
        assert_eq!(
            add_path(CartId::new(11), ProductId::new(3), 2),
            "/api/cart/11/add/3?quantity=2"
        );
    }
}
