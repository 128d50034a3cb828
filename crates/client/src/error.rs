//! Client error types.
//!
//! Every fallible operation in this crate returns [`ClientError`]. Callers
//! catch at the call site, log, and show a message; nothing here retries.

use mercado_core::{BirthDateError, EmailError, ProductId};
use thiserror::Error;

use crate::config::ConfigError;
use crate::session::SessionError;

/// Message used when a failed response carries no `message` field.
pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

/// Input rejected before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required text field is blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// The price is zero or negative.
    #[error("price must be greater than zero")]
    NonPositivePrice,

    /// The stock is negative.
    #[error("stock cannot be negative")]
    NegativeStock,

    /// A cart add asked for zero or fewer units.
    #[error("quantity must be at least 1")]
    NonPositiveQuantity,

    /// The password is too short.
    #[error("password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum password length.
        min: usize,
    },

    /// The email is malformed.
    #[error("invalid email: {0}")]
    Email(#[from] EmailError),

    /// The birth date is malformed or fails the registration rules.
    #[error("invalid birth date: {0}")]
    BirthDate(#[from] BirthDateError),
}

/// Reason checkout is refused client-side.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutBlocker {
    /// There is nothing to check out.
    #[error("the cart is empty")]
    EmptyCart,

    /// A line asks for more units than are in stock.
    #[error("product {product_id} has {available} in stock but {requested} requested")]
    InsufficientStock {
        /// Offending product.
        product_id: ProductId,
        /// Quantity in the cart.
        requested: i32,
        /// Units in stock.
        available: i32,
    },
}

/// Errors returned by the storefront client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connection refused, DNS, TLS).
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("{message} (HTTP {status})")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Backend-provided message, or [`GENERIC_FAILURE_MESSAGE`].
        message: String,
    },

    /// A response body did not match its expected schema.
    #[error("unexpected response from {path}: {source}")]
    Decode {
        /// Request path.
        path: String,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// A request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    /// Input failed validation; no request was sent.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The operation needs a signed-in user.
    #[error("you must be signed in")]
    NotAuthenticated,

    /// Login succeeded but no access token came back.
    #[error("no access_token received")]
    MissingToken,

    /// Checkout refused client-side.
    #[error("checkout unavailable: {0}")]
    CheckoutBlocked(#[from] CheckoutBlocker),

    /// Session storage failed.
    #[error("session storage error: {0}")]
    Session(#[from] SessionError),

    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl ClientError {
    /// HTTP status of an [`ClientError::Api`] error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the backend refused the request with 403 Forbidden.
    ///
    /// Login uses this to tell wrong credentials apart from other failures.
    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self.status(), Some(403))
    }
}

/// Result type alias for [`ClientError`].
pub type Result<T> = std::result::Result<T, ClientError>;
