//! Typed wrappers over [`HttpClient`](crate::http::HttpClient), one per
//! backend resource.

pub mod cart;
pub mod products;
pub mod users;

pub use cart::CartApi;
pub use products::ProductApi;
pub use users::UserApi;
