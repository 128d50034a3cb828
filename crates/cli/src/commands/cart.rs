//! `cart show|add|remove|set|checkout` and `orders`.

use std::io::Write;

use mercado_client::Storefront;
use mercado_core::ProductId;

use super::{CliError, require_login};
use crate::render;

/// Load the signed-in user so cart operations can address their cart.
async fn signed_in(storefront: &mut Storefront) -> Result<(), CliError> {
    require_login(storefront)?;
    storefront.require_user().await?;
    Ok(())
}

fn show_cart(storefront: &Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let cart = storefront.cart();
    render::cart(
        out,
        cart.items(),
        cart.total(),
        cart.checkout_blocker().as_ref(),
    )?;
    Ok(())
}

pub async fn show(storefront: &mut Storefront, out: &mut impl Write) -> Result<(), CliError> {
    signed_in(storefront).await?;
    storefront.refresh_cart().await?;
    show_cart(storefront, out)
}

pub async fn add(
    storefront: &mut Storefront,
    out: &mut impl Write,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), CliError> {
    signed_in(storefront).await?;
    storefront.add_to_cart(product_id, quantity).await?;
    writeln!(out, "Added product #{product_id} to your cart.")?;
    show_cart(storefront, out)
}

pub async fn remove(
    storefront: &mut Storefront,
    out: &mut impl Write,
    product_id: ProductId,
) -> Result<(), CliError> {
    signed_in(storefront).await?;
    storefront.remove_from_cart(product_id).await?;
    writeln!(out, "Removed product #{product_id} from your cart.")?;
    show_cart(storefront, out)
}

pub async fn set(
    storefront: &mut Storefront,
    out: &mut impl Write,
    product_id: ProductId,
    quantity: i32,
) -> Result<(), CliError> {
    signed_in(storefront).await?;
    storefront.update_cart_quantity(product_id, quantity).await?;
    show_cart(storefront, out)
}

pub async fn checkout(storefront: &mut Storefront, out: &mut impl Write) -> Result<(), CliError> {
    signed_in(storefront).await?;
    storefront.refresh_cart().await?;
    let order = storefront.checkout().await?;
    writeln!(out, "Order placed.")?;
    render::order(out, &order)?;
    Ok(())
}

pub async fn orders(storefront: &mut Storefront, out: &mut impl Write) -> Result<(), CliError> {
    require_login(storefront)?;
    let orders = storefront.orders().await?;
    if orders.is_empty() {
        writeln!(out, "No orders yet.")?;
    }
    for order in &orders {
        render::order(out, order)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mercado_integration_tests::{MockBackend, SEED_PASSWORD};
    use secrecy::SecretString;

    use super::*;

    async fn signed_in_storefront(backend: &MockBackend) -> Storefront {
        backend.seed_user("ana@example.com", (1990, 5, 4));
        let mut storefront = backend.storefront();
        storefront
            .sign_in("ana@example.com", &SecretString::from(SEED_PASSWORD))
            .await
            .unwrap();
        storefront
    }

    #[tokio::test]
    async fn test_cart_commands_require_login() {
        let backend = MockBackend::start().await;
        let product_id = backend.seed_product("Shirt", 10, 5);
        let mut storefront = backend.storefront();
        let mut out = Vec::new();

        let err = add(&mut storefront, &mut out, product_id, 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::NotLoggedIn));

        let err = orders(&mut storefront, &mut out).await.unwrap_err();
        assert!(matches!(err, CliError::NotLoggedIn));

        assert!(backend.requests().is_empty());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_add_then_show_renders_total() {
        let backend = MockBackend::start().await;
        let product_id = backend.seed_product("Shirt", 10, 5);
        let mut storefront = signed_in_storefront(&backend).await;
        let mut out = Vec::new();

        add(&mut storefront, &mut out, product_id, 2).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Added product #1 to your cart."));
        assert!(text.contains("Total: $20.00"));
        assert!(!text.contains("Checkout disabled"));
    }

    #[tokio::test]
    async fn test_empty_cart_shows_checkout_notice() {
        let backend = MockBackend::start().await;
        let mut storefront = signed_in_storefront(&backend).await;
        let mut out = Vec::new();

        show(&mut storefront, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Your cart is empty."));
        assert!(text.contains("Checkout disabled: the cart is empty"));
    }

    #[tokio::test]
    async fn test_checkout_places_order() {
        let backend = MockBackend::start().await;
        let product_id = backend.seed_product("Shirt", 10, 5);
        let mut storefront = signed_in_storefront(&backend).await;
        add(&mut storefront, &mut Vec::new(), product_id, 1)
            .await
            .unwrap();
        let mut out = Vec::new();

        checkout(&mut storefront, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Order placed."));
        assert!(text.contains("[pending]"));
    }
}
