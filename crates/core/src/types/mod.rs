//! Core types for Mercado.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod birth_date;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use birth_date::{BirthDate, BirthDateError};
pub use email::{Email, EmailError};
pub use id::*;
pub use price::Price;
pub use status::*;
