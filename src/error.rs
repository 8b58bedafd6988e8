//! Errors returned by the traversal builders and the facade

use crate::store::StoreError;
use thiserror::Error;

/// Traversal errors
///
/// Store failures, including a dangling twin id, are fatal to the whole call
/// and surface unchanged as `Store`. Hitting the iteration cap is not an
/// error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TraversalError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Traversal cancelled")]
    Cancelled,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl TraversalError {
    /// True when the call failed because a twin id did not resolve
    pub fn is_not_found(&self) -> bool {
        matches!(self, TraversalError::Store(StoreError::NotFound(_)))
    }
}

pub type TraversalResult<T> = Result<T, TraversalError>;
