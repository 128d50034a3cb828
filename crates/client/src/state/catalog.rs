//! Product catalog state.

use mercado_core::ProductId;
use tracing::{debug, instrument};

use crate::api::ProductApi;
use crate::error::Result;
use crate::models::{Product, ProductInput};
use crate::state::LoadState;

/// The product list held client-side after a fetch.
///
/// Create, update and delete patch the local list instead of re-fetching.
#[derive(Debug)]
pub struct Catalog {
    api: ProductApi,
    products: Vec<Product>,
    status: LoadState,
}

impl Catalog {
    #[must_use]
    pub const fn new(api: ProductApi) -> Self {
        Self {
            api,
            products: Vec::new(),
            status: LoadState::Idle,
        }
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn status(&self) -> &LoadState {
        &self.status
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    /// Local lookup by id.
    #[must_use]
    pub fn find(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    /// Fetch the full product list.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the previous list is kept.
    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<&[Product]> {
        self.status.start();
        let result = self.api.list().await;
        self.status.settle(&result);

        self.products = result?;
        debug!(count = self.products.len(), "Catalog loaded");
        Ok(&self.products)
    }

    /// Fetch one product from the backend and update it locally if present.
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    #[instrument(skip(self))]
    pub async fn fetch(&mut self, id: ProductId) -> Result<Product> {
        self.status.start();
        let result = self.api.get(id).await;
        self.status.settle(&result);

        let product = result?;
        if let Some(existing) = self.products.iter_mut().find(|p| p.id == id) {
            *existing = product.clone();
        }
        Ok(product)
    }

    /// Create a product and append it.
    ///
    /// # Errors
    ///
    /// Returns a validation or request error.
    #[instrument(skip(self, input))]
    pub async fn create(&mut self, input: &ProductInput) -> Result<Product> {
        self.status.start();
        let result = self.api.create(input).await;
        self.status.settle(&result);

        let product = result?;
        self.products.push(product.clone());
        Ok(product)
    }

    /// Update a product and replace the local entry with the same id.
    ///
    /// # Errors
    ///
    /// Returns a validation or request error.
    #[instrument(skip(self, input))]
    pub async fn update(&mut self, id: ProductId, input: &ProductInput) -> Result<Product> {
        self.status.start();
        let result = self.api.update(id, input).await;
        self.status.settle(&result);

        let product = result?;
        for existing in self.products.iter_mut().filter(|p| p.id == id) {
            *existing = product.clone();
        }
        Ok(product)
    }

    /// Delete a product and drop the local entry.
    ///
    /// # Errors
    ///
    /// Returns the request error; the local list is untouched then.
    #[instrument(skip(self))]
    pub async fn delete(&mut self, id: ProductId) -> Result<()> {
        self.status.start();
        let result = self.api.delete(id).await;
        self.status.settle(&result);

        result?;
        self.products.retain(|p| p.id != id);
        Ok(())
    }
}
