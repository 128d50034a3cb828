//! Mercado storefront client.
//!
//! A typed client for the Mercado REST backend plus the client-side state a
//! storefront front-end needs:
//!
//! - [`http`]: request wrapper with bearer-token injection and error
//!   normalization
//! - [`api`]: one typed wrapper per backend resource
//! - [`state`]: auth, cart and catalog state objects
//! - [`Storefront`]: the application context tying them together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod session;
pub mod state;
pub mod storefront;
pub mod validation;

pub use config::{ClientConfig, ConfigError};
pub use error::{CheckoutBlocker, ClientError, Result, ValidationError};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionError, SessionStore};
pub use storefront::Storefront;
