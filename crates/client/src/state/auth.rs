//! Authentication state: the signed-in user and their last-known cart.

use chrono::NaiveDate;
use secrecy::SecretString;
use tracing::{info, instrument, warn};

use crate::api::{CartApi, UserApi};
use crate::error::Result;
use crate::models::{Cart, UpdateUserRequest, User};
use crate::session::Session;
use crate::state::{LoadState, require_user};
use crate::validation::{ProfileChanges, RegistrationForm};

/// Current user, loading flag and last-known cart.
#[derive(Debug)]
pub struct AuthState {
    users: UserApi,
    carts: CartApi,
    session: Session,
    user: Option<User>,
    cart: Option<Cart>,
    status: LoadState,
}

impl AuthState {
    #[must_use]
    pub fn new(users: UserApi, carts: CartApi, session: Session) -> Self {
        Self {
            users,
            carts,
            session,
            user: None,
            cart: None,
            status: LoadState::Idle,
        }
    }

    /// Signed-in user, once loaded.
    #[must_use]
    pub const fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Cart fetched at sign-in.
    #[must_use]
    pub const fn cart(&self) -> Option<&Cart> {
        self.cart.as_ref()
    }

    #[must_use]
    pub const fn status(&self) -> &LoadState {
        &self.status
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.status.is_loading()
    }

    /// Whether a non-blank token is stored. Protected operations check this.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.session.has_token()
    }

    /// Log in, then load the user by email and their cart.
    ///
    /// If a step after login fails the token stays persisted; the error is
    /// returned and the in-memory user is left unset.
    ///
    /// # Errors
    ///
    /// Returns the first failing step's error.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in(&mut self, email: &str, password: &SecretString) -> Result<User> {
        self.status.start();
        let result = self.load_after_login(email, password).await;
        self.status.settle(&result);
        result
    }

    async fn load_after_login(&mut self, email: &str, password: &SecretString) -> Result<User> {
        self.users.login(email, password).await?;
        let user = self.users.get_user_by_email(email).await?;
        let cart = self.carts.get_by_user(user.id).await?;

        info!(user_id = %user.id, "Signed in");
        self.user = Some(user.clone());
        self.cart = Some(cart);
        Ok(user)
    }

    /// Validate the form and register. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns a validation error without contacting the backend, or the
    /// backend's rejection.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn sign_up(&mut self, form: &RegistrationForm, today: NaiveDate) -> Result<User> {
        self.status.start();
        let result = match form.validate(today) {
            Ok(request) => self.users.register(&request).await,
            Err(e) => Err(e.into()),
        };
        self.status.settle(&result);
        result
    }

    /// Forget the persisted token and email and the in-memory user and cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session file cannot be updated. The in-memory
    /// state is cleared regardless.
    pub fn sign_out(&mut self) -> Result<()> {
        self.user = None;
        self.cart = None;
        self.status.reset();
        self.session.clear()?;
        info!("Signed out");
        Ok(())
    }

    /// Submit profile changes, then sign out.
    ///
    /// The request carries the email stored in the session and the birth date
    /// of the cached user, since neither is editable.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NotAuthenticated`](crate::ClientError::NotAuthenticated)
    ///   without a loaded user
    /// - a validation error for blank fields
    /// - the backend's rejection (the session is kept in that case)
    #[instrument(skip(self, changes))]
    pub async fn update_profile(&mut self, changes: &ProfileChanges) -> Result<User> {
        self.status.start();
        let result = self.submit_profile(changes).await;
        self.status.settle(&result);
        let updated = result?;
        self.sign_out()?;
        Ok(updated)
    }

    async fn submit_profile(&self, changes: &ProfileChanges) -> Result<User> {
        let user = require_user(self.user.as_ref())?;
        changes.validate()?;

        let request = UpdateUserRequest {
            id: user.id,
            first_name: changes.first_name.trim().to_string(),
            last_name: changes.last_name.trim().to_string(),
            email: self.session.email().unwrap_or_else(|| user.email.clone()),
            address: changes.address.trim().to_string(),
            birth_date: user.birth_date,
        };
        let updated = self.users.update_user(&request).await?;
        info!(user_id = %request.id, "Profile updated; re-authentication required");
        Ok(updated)
    }

    /// Reload the user from the stored email and token.
    ///
    /// Returns `Ok(None)` when nothing is stored. If the lookup fails the
    /// session is cleared and the error returned.
    ///
    /// # Errors
    ///
    /// Returns the lookup error after signing out.
    #[instrument(skip(self))]
    pub async fn restore(&mut self) -> Result<Option<&User>> {
        let (Some(email), true) = (self.session.email(), self.session.has_token()) else {
            return Ok(None);
        };

        self.status.start();
        let result = self.users.get_user_by_email(&email).await;
        self.status.settle(&result);

        match result {
            Ok(user) => {
                self.user = Some(user);
                Ok(self.user.as_ref())
            }
            Err(e) => {
                warn!(error = %e, "Stored session is no longer valid");
                self.sign_out()?;
                Err(e)
            }
        }
    }
}
