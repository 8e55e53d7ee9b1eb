//! Errors surfaced by the coordinator's public operations.
//!
//! Validation rejections and processing failures never cross the public
//! API; they are dropped or routed to the handler. Only lifecycle and
//! construction problems are returned to callers.

use thiserror::Error;

/// Errors returned by [`Coordinator`](crate::Coordinator) operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// The coordinator has been closed (gracefully or by discarding).
    #[error("coordinator is already closed")]
    Closed,

    /// The supplied configuration cannot be used.
    #[error("invalid coordinator configuration: {0}")]
    InvalidConfig(String),
}
