//! Authentication and user profile endpoints.

use secrecy::SecretString;
use tracing::{info, instrument};

use crate::error::{ClientError, Result};
use crate::http::{HttpClient, RequestOptions};
use crate::models::{LoginRequest, LoginResponse, RegisterRequest, UpdateUserRequest, User};

/// Client for `/auth` and `/api/users`.
#[derive(Debug, Clone)]
pub struct UserApi {
    http: HttpClient,
}

impl UserApi {
    #[must_use]
    pub const fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Create an account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the registration.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        let user: User = self
            .http
            .request("/auth/register", RequestOptions::post().json(request)?)
            .await?;
        info!(user_id = %user.id, "Account registered");
        Ok(user)
    }

    /// Log in and persist the issued token and `email` into the session.
    ///
    /// # Errors
    ///
    /// - [`ClientError::Api`] with status 403 for wrong credentials
    /// - [`ClientError::MissingToken`] if the backend returned no token
    /// - [`ClientError::Session`] if the session cannot be written
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<LoginResponse> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.clone(),
        };
        let response: LoginResponse = self
            .http
            .request("/auth/login", RequestOptions::post().json(&body)?)
            .await?;

        if response.access_token.trim().is_empty() {
            return Err(ClientError::MissingToken);
        }

        let token = SecretString::from(response.access_token.as_str());
        self.http.session().persist_login(&token, email)?;
        info!("Logged in");

        Ok(response)
    }

    /// Look a user up by email. The email is percent-encoded into the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the request fails.
    #[instrument(skip(self))]
    pub async fn get_user_by_email(&self, email: &str) -> Result<User> {
        let path = format!("/api/users/email/{}", urlencoding::encode(email));
        self.http.request(&path, RequestOptions::get()).await
    }

    /// Profile of the user the token belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_profile(&self) -> Result<User> {
        self.http
            .request("/api/users/profile", RequestOptions::get())
            .await
    }

    /// Replace a user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the update.
    #[instrument(skip(self, request), fields(user_id = %request.id))]
    pub async fn update_user(&self, request: &UpdateUserRequest) -> Result<User> {
        let path = format!("/api/users/{}", request.id);
        self.http
            .request(&path, RequestOptions::put().json(request)?)
            .await
    }
}
