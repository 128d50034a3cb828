//! Text rendering for products, carts, orders and users.

use std::io::{self, Write};

use chrono::{DateTime, NaiveDateTime};
use mercado_client::CheckoutBlocker;
use mercado_client::models::{CartItem, Order, Product, User};
use mercado_core::Price;

/// Shown in place of a missing product image.
pub const PLACEHOLDER_IMAGE_URL: &str =
    "https://upload.wikimedia.org/wikipedia/commons/3/3f/Placeholder_view_vector.svg";

pub fn stock_label(stock: i32) -> String {
    if stock > 0 {
        format!("In stock: {stock} available")
    } else {
        "Out of stock".to_string()
    }
}

pub fn image_url(url: &str) -> &str {
    if url.trim().is_empty() {
        PLACEHOLDER_IMAGE_URL
    } else {
        url
    }
}

/// `YYYY-MM-DD HH:MM` for RFC 3339 or naive ISO timestamps; anything else is
/// shown as received.
pub fn timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return parsed.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

pub fn user(out: &mut impl Write, user: &User) -> io::Result<()> {
    writeln!(out, "{} <{}>", user.display_name(), user.email)?;
    writeln!(out, "  id:         {}", user.id)?;
    writeln!(out, "  address:    {}", user.address)?;
    if let Some(birth_date) = user.birth_date {
        writeln!(out, "  birth date: {birth_date}")?;
    }
    Ok(())
}

pub fn product_list(out: &mut impl Write, products: &[Product]) -> io::Result<()> {
    if products.is_empty() {
        return writeln!(out, "No products.");
    }
    for product in products {
        writeln!(
            out,
            "#{:<5} {:<30} {:>10}  {}",
            product.id.to_string(),
            product.name,
            product.price.to_string(),
            stock_label(product.stock)
        )?;
    }
    Ok(())
}

pub fn product_detail(out: &mut impl Write, product: &Product) -> io::Result<()> {
    writeln!(out, "#{} {}", product.id, product.name)?;
    writeln!(out, "  price: {}", product.price)?;
    writeln!(out, "  {}", stock_label(product.stock))?;
    writeln!(out, "  image: {}", image_url(&product.image_url))?;
    if !product.description.is_empty() {
        writeln!(out)?;
        writeln!(out, "{}", product.description)?;
    }
    Ok(())
}

pub fn cart(
    out: &mut impl Write,
    items: &[CartItem],
    total: Price,
    blocker: Option<&CheckoutBlocker>,
) -> io::Result<()> {
    if items.is_empty() {
        writeln!(out, "Your cart is empty.")?;
    }
    for item in items {
        writeln!(
            out,
            "#{:<5} {:<30} {} x {} = {}",
            item.product_id.to_string(),
            item.product.name,
            item.quantity,
            item.product.price,
            item.line_total()
        )?;
        writeln!(out, "       {}", stock_label(item.product.stock))?;
    }
    writeln!(out, "Total: {total}")?;
    if let Some(blocker) = blocker {
        writeln!(out, "Checkout disabled: {blocker}")?;
    }
    Ok(())
}

pub fn order(out: &mut impl Write, order: &Order) -> io::Result<()> {
    let placed = order
        .created_at
        .as_deref()
        .map_or_else(|| "-".to_string(), timestamp);
    let total = order
        .total
        .map_or_else(|| "-".to_string(), |t| t.to_string());
    writeln!(
        out,
        "Order #{} [{}] {} total {}",
        order.id, order.status, placed, total
    )?;
    for line in &order.items {
        let name = line.product.as_ref().map_or("", |p| p.name.as_str());
        match line.product_id() {
            Some(id) => writeln!(out, "  #{id} {name} x {}", line.quantity)?,
            None => writeln!(out, "  {name} x {}", line.quantity)?,
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mercado_core::ProductId;

    use super::*;

    fn shirt(stock: i32) -> Product {
        Product {
            id: ProductId::new(3),
            name: "Shirt".to_string(),
            price: Price::from_units(10),
            image_url: String::new(),
            stock,
            description: "Cotton".to_string(),
        }
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> io::Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_stock_label() {
        assert_eq!(stock_label(5), "In stock: 5 available");
        assert_eq!(stock_label(0), "Out of stock");
    }

    #[test]
    fn test_missing_image_uses_placeholder() {
        assert_eq!(image_url(""), PLACEHOLDER_IMAGE_URL);
        assert_eq!(image_url("http://img/1.png"), "http://img/1.png");
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(timestamp("2024-03-09T14:05:59Z"), "2024-03-09 14:05");
        assert_eq!(timestamp("2024-03-09T14:05:59.123"), "2024-03-09 14:05");
        assert_eq!(timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn test_product_detail_shows_price_and_placeholder() {
        let text = render(|out| product_detail(out, &shirt(0)));
        assert!(text.contains("price: $10.00"));
        assert!(text.contains("Out of stock"));
        assert!(text.contains(PLACEHOLDER_IMAGE_URL));
    }

    #[test]
    fn test_cart_shows_total_and_blocker() {
        let items = vec![CartItem {
            product_id: ProductId::new(3),
            quantity: 6,
            product: shirt(5),
        }];
        let blocker = CheckoutBlocker::InsufficientStock {
            product_id: ProductId::new(3),
            requested: 6,
            available: 5,
        };
        let text = render(|out| cart(out, &items, Price::from_units(60), Some(&blocker)));
        assert!(text.contains("Total: $60.00"));
        assert!(text.contains("Checkout disabled"));
    }
}
