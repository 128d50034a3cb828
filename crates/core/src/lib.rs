//! Mercado Core - Shared domain types.
//!
//! This crate provides the types used across all Mercado components:
//! - `client` - HTTP wrapper, typed API modules and client-side state
//! - `cli` - Command-line storefront front-end
//!
//! # Architecture
//!
//! The core crate contains only types and parsing rules - no I/O, no HTTP
//! clients. This keeps it lightweight and usable from any layer.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, birth
//!   dates and order statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
