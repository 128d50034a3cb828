//! Integration tests for the cart state: mutations, totals and checkout.

#![allow(clippy::unwrap_used)]

use mercado_client::state::LoadState;
use mercado_client::{CheckoutBlocker, ClientError, Storefront};
use mercado_core::{OrderStatus, Price, ProductId, UserId};
use mercado_integration_tests::{MockBackend, SEED_PASSWORD};
use secrecy::SecretString;

struct Shop {
    backend: MockBackend,
    storefront: Storefront,
    user_id: UserId,
}

/// Backend with three products (the third has 5 in stock) and a signed-in
/// user with an empty cart.
async fn shop() -> Shop {
    let backend = MockBackend::start().await;
    backend.seed_product("Mug", 7, 10);
    backend.seed_product("Cap", 12, 10);
    backend.seed_product("Shirt", 10, 5);
    let user_id = backend.seed_user("ana@example.com", (1990, 5, 4));

    let mut storefront = backend.storefront();
    storefront
        .sign_in("ana@example.com", &SecretString::from(SEED_PASSWORD))
        .await
        .unwrap();
    backend.clear_requests();

    Shop {
        backend,
        storefront,
        user_id,
    }
}

const SHIRT: ProductId = ProductId::new(3);

#[tokio::test]
async fn test_add_to_empty_cart() {
    let mut shop = shop().await;
    assert!(shop.storefront.cart().is_empty());

    let items = shop.storefront.add_to_cart(SHIRT, 2).await.unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, SHIRT);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(shop.storefront.cart().total(), Price::from_units(20));

    let requests = shop.backend.requests();
    let add = requests
        .iter()
        .find(|r| r.method == "POST")
        .unwrap();
    assert_eq!(add.path, "/api/cart/101/add/3?quantity=2");
    assert_eq!(add.listener, "api");
    assert!(add.has_bearer());
}

#[tokio::test]
async fn test_non_positive_add_is_rejected() {
    let mut shop = shop().await;

    let err = shop.storefront.add_to_cart(SHIRT, 0).await.unwrap_err();

    assert!(matches!(err, ClientError::Validation(_)));
    assert!(shop.backend.requests().is_empty());
}

#[tokio::test]
async fn test_quantity_update_goes_to_cart_service() {
    let mut shop = shop().await;
    shop.storefront.add_to_cart(SHIRT, 2).await.unwrap();
    shop.backend.clear_requests();

    let items = shop.storefront.update_cart_quantity(SHIRT, 4).await.unwrap();

    assert_eq!(items[0].quantity, 4);
    let update = shop
        .backend
        .requests()
        .into_iter()
        .find(|r| r.method == "POST")
        .unwrap();
    assert_eq!(update.listener, "cart-service");
    assert_eq!(update.path, "/api/cart/101/add/3?quantity=4");
}

#[tokio::test]
async fn test_zero_or_negative_quantity_removes_item() {
    let mut shop = shop().await;
    shop.storefront.add_to_cart(SHIRT, 2).await.unwrap();
    shop.storefront
        .add_to_cart(ProductId::new(1), 1)
        .await
        .unwrap();

    let items = shop.storefront.update_cart_quantity(SHIRT, 0).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, ProductId::new(1));

    let items = shop
        .storefront
        .update_cart_quantity(ProductId::new(1), -2)
        .await
        .unwrap();
    assert!(items.is_empty());

    assert!(
        shop.backend
            .requests()
            .iter()
            .any(|r| r.method == "DELETE" && r.path == "/api/cart/101/remove/3")
    );
}

#[tokio::test]
async fn test_failed_add_marks_status_failed_and_keeps_items() {
    let mut shop = shop().await;
    shop.storefront.add_to_cart(SHIRT, 2).await.unwrap();
    assert_eq!(shop.storefront.cart().status(), &LoadState::Loaded);

    let err = shop
        .storefront
        .add_to_cart(ProductId::new(999), 1)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert_eq!(
        shop.storefront.cart().status(),
        &LoadState::Failed(err.to_string())
    );
    assert_eq!(shop.storefront.cart().items().len(), 1);
}

#[tokio::test]
async fn test_failed_quantity_update_marks_status_failed() {
    let mut shop = shop().await;
    shop.storefront.add_to_cart(SHIRT, 2).await.unwrap();
    shop.backend.fail_requests_to("/api/cart/101/add/");

    let err = shop
        .storefront
        .update_cart_quantity(SHIRT, 3)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(503));
    assert!(matches!(shop.storefront.cart().status(), LoadState::Failed(_)));
    assert_eq!(shop.storefront.cart().items()[0].quantity, 2);

    shop.backend.stop_failing();
    shop.storefront.update_cart_quantity(SHIRT, 3).await.unwrap();
    assert_eq!(shop.storefront.cart().status(), &LoadState::Loaded);
}

#[tokio::test]
async fn test_remove_item() {
    let mut shop = shop().await;
    shop.storefront.add_to_cart(SHIRT, 1).await.unwrap();

    let items = shop.storefront.remove_from_cart(SHIRT).await.unwrap();

    assert!(items.is_empty());
}

#[tokio::test]
async fn test_over_stock_blocks_checkout() {
    let mut shop = shop().await;
    shop.backend.seed_cart_line(shop.user_id, SHIRT, 6);
    shop.storefront.refresh_cart().await.unwrap();
    shop.backend.clear_requests();

    assert!(!shop.storefront.cart().can_checkout());
    let err = shop.storefront.checkout().await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::CheckoutBlocked(CheckoutBlocker::InsufficientStock {
            requested: 6,
            available: 5,
            ..
        })
    ));
    assert!(shop.backend.requests().is_empty());
}

#[tokio::test]
async fn test_empty_cart_blocks_checkout() {
    let mut shop = shop().await;

    let err = shop.storefront.checkout().await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::CheckoutBlocked(CheckoutBlocker::EmptyCart)
    ));
}

#[tokio::test]
async fn test_checkout_creates_order_and_clears_cart() {
    let mut shop = shop().await;
    shop.storefront.add_to_cart(SHIRT, 2).await.unwrap();
    shop.storefront
        .add_to_cart(ProductId::new(1), 1)
        .await
        .unwrap();
    shop.backend.clear_requests();

    let order = shop.storefront.checkout().await.unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total, Some(Price::from_units(27)));
    assert_eq!(order.items.len(), 2);
    assert!(shop.storefront.cart().is_empty());

    let checkout = shop
        .backend
        .requests()
        .into_iter()
        .find(|r| r.path.ends_with("/checkout"))
        .unwrap();
    assert_eq!(checkout.listener, "cart-service");

    let orders = shop.storefront.orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, order.id);

    let items = shop.storefront.refresh_cart().await.unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn test_cart_requires_sign_in() {
    let backend = MockBackend::start().await;
    backend.seed_product("Shirt", 10, 5);
    let mut storefront = backend.storefront();

    let err = storefront.refresh_cart().await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));

    let err = storefront.add_to_cart(ProductId::new(1), 1).await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_sign_out_disposes_cart() {
    let mut shop = shop().await;
    shop.storefront.add_to_cart(SHIRT, 2).await.unwrap();

    shop.storefront.sign_out().unwrap();

    assert!(shop.storefront.cart().is_empty());
    assert!(shop.storefront.user().is_none());
    assert!(!shop.storefront.is_authenticated());
}
