//! Cart state: the signed-in user's cart, flattened into items.
//!
//! The backend owns the cart. Every mutation looks the cart up by user id to
//! learn its id, sends the change, then re-fetches the whole cart.

use mercado_core::{CartId, Price, ProductId};
use tracing::{debug, instrument, warn};

use crate::api::CartApi;
use crate::error::{CheckoutBlocker, ClientError, Result, ValidationError};
use crate::models::{CartItem, Order, User};
use crate::state::{LoadState, require_user};

#[derive(Debug, Clone, Copy)]
enum CartChange {
    Add(i32),
    Set(i32),
    Remove,
}

/// Items in the current user's cart.
#[derive(Debug)]
pub struct CartState {
    carts: CartApi,
    items: Vec<CartItem>,
    status: LoadState,
}

impl CartState {
    #[must_use]
    pub const fn new(carts: CartApi) -> Self {
        Self {
            carts,
            items: Vec::new(),
            status: LoadState::Idle,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub const fn status(&self) -> &LoadState {
        &self.status
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    /// Sum of price times quantity over all items.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Why checkout is unavailable, if it is.
    #[must_use]
    pub fn checkout_blocker(&self) -> Option<CheckoutBlocker> {
        if self.items.is_empty() {
            return Some(CheckoutBlocker::EmptyCart);
        }
        self.items
            .iter()
            .find(|item| item.exceeds_stock())
            .map(|item| CheckoutBlocker::InsufficientStock {
                product_id: item.product_id,
                requested: item.quantity,
                available: item.product.stock,
            })
    }

    #[must_use]
    pub fn can_checkout(&self) -> bool {
        self.checkout_blocker().is_none()
    }

    /// Re-fetch the cart. On failure the local items are emptied.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotAuthenticated`] without a user, otherwise the fetch
    /// error.
    #[instrument(skip(self, user))]
    pub async fn refresh(&mut self, user: Option<&User>) -> Result<&[CartItem]> {
        let user = require_user(user)?;
        self.status.start();
        let result = self.carts.get_by_user(user.id).await;
        self.status.settle(&result);

        match result {
            Ok(cart) => {
                self.items = cart.into_items();
                debug!(items = self.items.len(), "Cart loaded");
                Ok(&self.items)
            }
            Err(e) => {
                warn!(error = %e, "Failed to load cart");
                self.items.clear();
                Err(e)
            }
        }
    }

    /// Add `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Fails for a non-positive quantity or any request error.
    #[instrument(skip(self, user))]
    pub async fn add(
        &mut self,
        user: Option<&User>,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<&[CartItem]> {
        let user = require_user(user)?;
        if quantity <= 0 {
            return Err(ValidationError::NonPositiveQuantity.into());
        }
        self.apply(user, product_id, CartChange::Add(quantity)).await
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns any request error.
    #[instrument(skip(self, user))]
    pub async fn remove(
        &mut self,
        user: Option<&User>,
        product_id: ProductId,
    ) -> Result<&[CartItem]> {
        let user = require_user(user)?;
        self.apply(user, product_id, CartChange::Remove).await
    }

    /// Set a product's quantity. Zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns any request error.
    #[instrument(skip(self, user))]
    pub async fn update_quantity(
        &mut self,
        user: Option<&User>,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<&[CartItem]> {
        let user = require_user(user)?;
        let change = if quantity <= 0 {
            CartChange::Remove
        } else {
            CartChange::Set(quantity)
        };
        self.apply(user, product_id, change).await
    }

    /// Check out the cart and clear the local items.
    ///
    /// # Errors
    ///
    /// [`ClientError::CheckoutBlocked`] when the cart is empty or over stock,
    /// otherwise any request error.
    #[instrument(skip(self, user))]
    pub async fn checkout(&mut self, user: Option<&User>) -> Result<Order> {
        let user = require_user(user)?;
        if let Some(blocker) = self.checkout_blocker() {
            return Err(ClientError::CheckoutBlocked(blocker));
        }

        self.status.start();
        let result = match self.cart_id(user).await {
            Ok(cart_id) => self.carts.checkout(cart_id).await,
            Err(e) => Err(e),
        };
        self.status.settle(&result);

        let order = result?;
        self.items.clear();
        Ok(order)
    }

    /// Orders placed by the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns any request error.
    #[instrument(skip(self))]
    pub async fn orders(&self) -> Result<Vec<Order>> {
        self.carts.list_orders().await
    }

    /// Drop the local items.
    pub fn clear(&mut self) {
        self.items.clear();
        self.status.reset();
    }

    /// Send one change, then re-fetch. A failed change leaves the status
    /// `Failed` and the items as they were.
    async fn apply(
        &mut self,
        user: &User,
        product_id: ProductId,
        change: CartChange,
    ) -> Result<&[CartItem]> {
        self.status.start();
        let result = self.send(user, product_id, change).await;
        self.status.settle(&result);

        if let Err(e) = result {
            warn!(error = %e, ?change, "Cart change failed");
            return Err(e);
        }
        self.refresh(Some(user)).await
    }

    async fn send(&self, user: &User, product_id: ProductId, change: CartChange) -> Result<()> {
        let cart_id = self.cart_id(user).await?;
        match change {
            CartChange::Add(quantity) => {
                self.carts.add_item(cart_id, product_id, quantity).await?;
            }
            CartChange::Set(quantity) => {
                self.carts.set_quantity(cart_id, product_id, quantity).await?;
            }
            CartChange::Remove => {
                self.carts.remove_item(cart_id, product_id).await?;
            }
        }
        Ok(())
    }

    async fn cart_id(&self, user: &User) -> Result<CartId> {
        Ok(self.carts.get_by_user(user.id).await?.id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::http::HttpClient;
    use crate::models::Product;
    use crate::session::Session;

    fn state_with(items: Vec<CartItem>) -> CartState {
        let http = HttpClient::new("http://localhost:9003", Session::in_memory());
        let mut state = CartState::new(CartApi::new(http, "http://localhost:9002"));
        state.items = items;
        state
    }

    fn item(id: i32, price: i64, stock: i32, quantity: i32) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            quantity,
            product: Product {
                id: ProductId::new(id),
                name: format!("Product {id}"),
                price: Price::from_units(price),
                image_url: String::new(),
                stock,
                description: String::new(),
            },
        }
    }

    #[test]
    fn test_total_sums_lines() {
        let state = state_with(vec![item(1, 10, 5, 2), item(2, 3, 5, 3)]);
        assert_eq!(state.total(), Price::from_units(29));
    }

    #[test]
    fn test_empty_cart_cannot_check_out() {
        let state = state_with(Vec::new());
        assert_eq!(state.checkout_blocker(), Some(CheckoutBlocker::EmptyCart));
        assert_eq!(state.total(), Price::ZERO);
    }

    #[test]
    fn test_over_stock_blocks_checkout() {
        let state = state_with(vec![item(1, 10, 5, 2), item(3, 10, 5, 6)]);
        assert!(!state.can_checkout());
        assert_eq!(
            state.checkout_blocker(),
            Some(CheckoutBlocker::InsufficientStock {
                product_id: ProductId::new(3),
                requested: 6,
                available: 5,
            })
        );
    }

    #[test]
    fn test_quantity_equal_to_stock_is_allowed() {
        let state = state_with(vec![item(1, 10, 5, 5)]);
        assert!(state.can_checkout());
    }

    #[tokio::test]
    async fn test_mutations_require_user() {
        let mut state = state_with(Vec::new());
        let err = state.add(None, ProductId::new(1), 1).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
        let err = state.checkout(None).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }
}
