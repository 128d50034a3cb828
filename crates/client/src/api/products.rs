//! Product catalog endpoints.

use mercado_core::ProductId;
use serde::de::IgnoredAny;
use tracing::{info, instrument};

use crate::error::Result;
use crate::http::{HttpClient, RequestOptions};
use crate::models::{Product, ProductInput};

/// Client for `/api/products`.
#[derive(Debug, Clone)]
pub struct ProductApi {
    http: HttpClient,
}

impl ProductApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>> {
        self.http
            .request("/api/products", RequestOptions::get())
            .await
    }

    /// A single product.
    ///
    /// # Errors
    ///
    /// Returns an error if the product does not exist or the request fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.http
            .request(&format!("/api/products/{id}"), RequestOptions::get())
            .await
    }

    /// Create a product. Invalid input is rejected without a request.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`](crate::ClientError::Validation) for bad input
    /// - any request error
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: &ProductInput) -> Result<Product> {
        input.validate()?;
        let product: Product = self
            .http
            .request("/api/products", RequestOptions::post().json(input)?)
            .await?;
        info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Replace a product. Invalid input is rejected without a request.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Validation`](crate::ClientError::Validation) for bad input
    /// - any request error
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: ProductId, input: &ProductInput) -> Result<Product> {
        input.validate()?;
        let product: Product = self
            .http
            .request(
                &format!("/api/products/{id}"),
                RequestOptions::put().json(input)?,
            )
            .await?;
        info!("Product updated");
        Ok(product)
    }

    /// Delete a product. Whatever the backend returns on success is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<()> {
        let _: IgnoredAny = self
            .http
            .request(&format!("/api/products/{id}"), RequestOptions::delete())
            .await?;
        info!("Product deleted");
        Ok(())
    }
}
