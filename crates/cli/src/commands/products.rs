//! `products list|show|create|update|delete`.

use std::io::Write;

use mercado_client::Storefront;
use mercado_client::models::ProductInput;
use mercado_core::{Price, ProductId};

use super::{CliError, confirm, require_login};
use crate::render;

/// Product fields given on the command line.
#[derive(Debug, Default)]
pub struct ProductFields {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub image_url: Option<String>,
    pub stock: Option<i32>,
    pub description: Option<String>,
}

impl ProductFields {
    /// Fill unspecified fields from `base`.
    fn merge_into(self, base: ProductInput) -> ProductInput {
        ProductInput {
            name: self.name.unwrap_or(base.name),
            price: self.price.unwrap_or(base.price),
            image_url: self.image_url.unwrap_or(base.image_url),
            stock: self.stock.unwrap_or(base.stock),
            description: self.description.unwrap_or(base.description),
        }
    }
}

pub async fn list(storefront: &mut Storefront, out: &mut impl Write) -> Result<(), CliError> {
    let products = storefront.refresh_products().await?;
    render::product_list(out, products)?;
    Ok(())
}

pub async fn show(
    storefront: &mut Storefront,
    out: &mut impl Write,
    id: ProductId,
) -> Result<(), CliError> {
    let product = storefront.product(id).await?;
    render::product_detail(out, &product)?;
    Ok(())
}

pub async fn create(
    storefront: &mut Storefront,
    out: &mut impl Write,
    fields: ProductFields,
) -> Result<(), CliError> {
    require_login(storefront)?;
    let empty = ProductInput {
        name: String::new(),
        price: Price::ZERO,
        image_url: String::new(),
        stock: 0,
        description: String::new(),
    };
    let product = storefront.create_product(&fields.merge_into(empty)).await?;
    writeln!(out, "Created product #{}.", product.id)?;
    render::product_detail(out, &product)?;
    Ok(())
}

pub async fn update(
    storefront: &mut Storefront,
    out: &mut impl Write,
    id: ProductId,
    fields: ProductFields,
) -> Result<(), CliError> {
    require_login(storefront)?;
    let current = storefront.product(id).await?;
    let input = fields.merge_into(ProductInput::from(&current));
    let product = storefront.update_product(id, &input).await?;
    writeln!(out, "Updated product #{}.", product.id)?;
    render::product_detail(out, &product)?;
    Ok(())
}

pub async fn delete(
    storefront: &mut Storefront,
    out: &mut impl Write,
    id: ProductId,
    yes: bool,
) -> Result<(), CliError> {
    require_login(storefront)?;
    if !yes && !confirm(out, &format!("Delete product #{id}?"))? {
        writeln!(out, "Cancelled.")?;
        return Ok(());
    }
    storefront.delete_product(id).await?;
    writeln!(out, "Deleted product #{id}.")?;
    Ok(())
}
