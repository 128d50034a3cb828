//! Client-side state objects.
//!
//! Each object owns its data and mutates through `&mut self`; callers drive
//! every transition explicitly. There is no background refresh, queuing or
//! cancellation.

pub mod auth;
pub mod cart;
pub mod catalog;

pub use auth::AuthState;
pub use cart::CartState;
pub use catalog::Catalog;

use crate::error::{ClientError, Result};
use crate::models::User;

/// Progress of the last operation on a state object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing has run yet, or the state was cleared.
    #[default]
    Idle,
    /// An operation is in flight.
    Loading,
    /// The last operation succeeded.
    Loaded,
    /// The last operation failed with this message.
    Failed(String),
}

impl LoadState {
    /// Whether an operation is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub(crate) fn start(&mut self) {
        *self = Self::Loading;
    }

    pub(crate) fn settle<T>(&mut self, result: &Result<T>) {
        *self = match result {
            Ok(_) => Self::Loaded,
            Err(e) => Self::Failed(e.to_string()),
        };
    }

    pub(crate) fn reset(&mut self) {
        *self = Self::Idle;
    }
}

/// The signed-in user, or [`ClientError::NotAuthenticated`].
pub(crate) fn require_user(user: Option<&User>) -> Result<&User> {
    user.ok_or(ClientError::NotAuthenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_state_transitions() {
        let mut state = LoadState::default();
        assert_eq!(state, LoadState::Idle);

        state.start();
        assert!(state.is_loading());

        state.settle(&Ok::<(), ClientError>(()));
        assert_eq!(state, LoadState::Loaded);

        state.settle(&Err::<(), _>(ClientError::NotAuthenticated));
        assert_eq!(state, LoadState::Failed("you must be signed in".to_string()));

        state.reset();
        assert_eq!(state, LoadState::Idle);
    }
}
