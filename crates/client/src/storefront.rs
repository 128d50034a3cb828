//! Application context.
//!
//! [`Storefront`] is created once at start-up and owns the configuration,
//! the session, the HTTP client and the three state objects. Operations that
//! need the signed-in user read it from the auth state and pass it down
//! explicitly. Signing out disposes the user and cart state.

use chrono::Local;
use mercado_core::ProductId;
use secrecy::SecretString;
use tracing::{info, instrument};

use crate::api::{CartApi, ProductApi, UserApi};
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http::HttpClient;
use crate::models::{CartItem, Order, Product, ProductInput, User};
use crate::session::{FileSessionStore, Session};
use crate::state::{AuthState, CartState, Catalog};
use crate::validation::{ProfileChanges, RegistrationForm};

/// Client-side application state.
#[derive(Debug)]
pub struct Storefront {
    config: ClientConfig,
    http: HttpClient,
    auth: AuthState,
    cart: CartState,
    catalog: Catalog,
}

impl Storefront {
    /// Open the session file named in `config` and build the context.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file exists but cannot be read.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let store = FileSessionStore::open(&config.session_file)?;
        Ok(Self::with_session(config, Session::new(store)))
    }

    /// Build the context around an existing session.
    #[must_use]
    pub fn with_session(config: ClientConfig, session: Session) -> Self {
        let http = HttpClient::new(&config.api_url, session.clone());
        let users = UserApi::new(http.clone());
        let carts = CartApi::new(http.clone(), &config.cart_service_url);
        let products = ProductApi::new(http.clone());

        Self {
            auth: AuthState::new(users, carts.clone(), session),
            cart: CartState::new(carts),
            catalog: Catalog::new(products),
            http,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        self.http.session()
    }

    #[must_use]
    pub const fn auth(&self) -> &AuthState {
        &self.auth
    }

    #[must_use]
    pub const fn cart(&self) -> &CartState {
        &self.cart
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.auth.user()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Reload the signed-in user from the stored session, if any, then load
    /// their cart.
    ///
    /// # Errors
    ///
    /// Returns the lookup error, after which the session has been cleared, or
    /// the cart fetch error.
    pub async fn restore(&mut self) -> Result<Option<&User>> {
        self.cart.clear();
        match self.auth.restore().await {
            Ok(Some(_)) => {}
            Ok(None) => return Ok(None),
            Err(e) => return Err(e),
        }
        self.cart.refresh(self.auth.user()).await?;
        Ok(self.auth.user())
    }

    /// Like [`Self::restore`], but fails unless a user is signed in.
    ///
    /// # Errors
    ///
    /// [`ClientError::NotAuthenticated`] when no session is stored.
    pub async fn require_user(&mut self) -> Result<&User> {
        if !self.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        if self.auth.user().is_none() {
            self.restore().await?;
        }
        self.auth.user().ok_or(ClientError::NotAuthenticated)
    }

    /// Sign in, then load the new user's cart.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&mut self, email: &str, password: &SecretString) -> Result<User> {
        self.cart.clear();
        let user = self.auth.sign_in(email, password).await?;
        self.cart.refresh(Some(&user)).await?;
        Ok(user)
    }

    /// Register a new account, validating birth date against today's date.
    ///
    /// # Errors
    ///
    /// Returns a validation or request error.
    pub async fn sign_up(&mut self, form: &RegistrationForm) -> Result<User> {
        self.auth.sign_up(form, Local::now().date_naive()).await
    }

    /// Sign out and dispose the user and cart state.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be updated.
    pub fn sign_out(&mut self) -> Result<()> {
        self.cart.clear();
        self.auth.sign_out()
    }

    /// Submit profile changes. The user is signed out afterwards.
    ///
    /// # Errors
    ///
    /// Returns a validation or request error.
    pub async fn update_profile(&mut self, changes: &ProfileChanges) -> Result<User> {
        let updated = self.auth.update_profile(changes).await?;
        self.cart.clear();
        info!("Profile changed; signed out");
        Ok(updated)
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// # Errors
    ///
    /// Fails without a signed-in user or on any request error.
    pub async fn refresh_cart(&mut self) -> Result<&[CartItem]> {
        self.cart.refresh(self.auth.user()).await
    }

    /// # Errors
    ///
    /// Fails without a signed-in user or on any request error.
    pub async fn add_to_cart(
        &mut self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<&[CartItem]> {
        self.cart.add(self.auth.user(), product_id, quantity).await
    }

    /// # Errors
    ///
    /// Fails without a signed-in user or on any request error.
    pub async fn remove_from_cart(&mut self, product_id: ProductId) -> Result<&[CartItem]> {
        self.cart.remove(self.auth.user(), product_id).await
    }

    /// # Errors
    ///
    /// Fails without a signed-in user or on any request error.
    pub async fn update_cart_quantity(
        &mut self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<&[CartItem]> {
        self.cart
            .update_quantity(self.auth.user(), product_id, quantity)
            .await
    }

    /// # Errors
    ///
    /// Fails when checkout is blocked, without a signed-in user, or on any
    /// request error.
    pub async fn checkout(&mut self) -> Result<Order> {
        self.cart.checkout(self.auth.user()).await
    }

    /// # Errors
    ///
    /// Fails without a stored token or on any request error.
    pub async fn orders(&self) -> Result<Vec<Order>> {
        if !self.is_authenticated() {
            return Err(ClientError::NotAuthenticated);
        }
        self.cart.orders().await
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn refresh_products(&mut self) -> Result<&[Product]> {
        self.catalog.refresh().await
    }

    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn product(&mut self, id: ProductId) -> Result<Product> {
        self.catalog.fetch(id).await
    }

    /// # Errors
    ///
    /// Fails without a stored token, or with a validation or request error.
    pub async fn create_product(&mut self, input: &ProductInput) -> Result<Product> {
        self.ensure_token()?;
        self.catalog.create(input).await
    }

    /// # Errors
    ///
    /// Fails without a stored token, or with a validation or request error.
    pub async fn update_product(&mut self, id: ProductId, input: &ProductInput) -> Result<Product> {
        self.ensure_token()?;
        self.catalog.update(id, input).await
    }

    /// # Errors
    ///
    /// Fails without a stored token or on any request error.
    pub async fn delete_product(&mut self, id: ProductId) -> Result<()> {
        self.ensure_token()?;
        self.catalog.delete(id).await
    }

    fn ensure_token(&self) -> Result<()> {
        if self.is_authenticated() {
            Ok(())
        } else {
            Err(ClientError::NotAuthenticated)
        }
    }
}
