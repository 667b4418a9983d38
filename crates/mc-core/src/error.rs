//! # AppError
//!
//! Centralized error handling for the MotoCar Ads ecosystem.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

use crate::models::ListingStatus;

/// The primary error type for all mc-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// The operation needs a signed-in user and none was supplied.
    #[error("you must be signed in to do this")]
    AuthRequired,

    /// One or more field rules failed. Carries every message, in rule order.
    #[error("validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    /// An image could not be persisted to the object store.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The database, storage or auth backend reported a failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// Resource not found (e.g., Listing, Profile)
    #[error("{0} not found with ID {1}")]
    NotFound(String, String),

    /// Bad credentials or an expired session.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Signed in, but not allowed to do this.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Resource already exists (e.g., duplicate e-mail)
    #[error("conflict: {0}")]
    Conflict(String),

    /// A status change the state machine does not allow.
    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// Infrastructure failure that is not attributable to a backend call.
    #[error("internal service error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wraps an infrastructure error coming back from a port.
    pub fn backend(err: anyhow::Error) -> Self {
        Self::Backend(format!("{err:#}"))
    }

    pub fn not_found(kind: &str, id: impl ToString) -> Self {
        Self::NotFound(kind.to_string(), id.to_string())
    }

    pub fn listing_transition(from: ListingStatus, to: ListingStatus) -> Self {
        Self::InvalidTransition {
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}

/// A specialized Result type for MotoCar Ads logic.
pub type Result<T> = std::result::Result<T, AppError>;
