//! Error types for the hoprag retrieval engine
//!
//! Adapter failures are expected operating conditions, not exceptional
//! ones: the engine degrades the affected signal and keeps going. The
//! variants here are the cases that actually reach a caller.

use thiserror::Error;

/// Main error type for the retrieval engine
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Keyword index searched before any build completed
    #[error("keyword index searched before build")]
    NotInitialized,

    /// External adapter reported itself unavailable
    #[error("{adapter} adapter unavailable: {reason}")]
    AdapterUnavailable { adapter: String, reason: String },

    /// External adapter call exceeded its per-call timeout
    #[error("{adapter} adapter timed out after {timeout_ms}ms")]
    AdapterTimeout { adapter: String, timeout_ms: u64 },

    /// Document id returned by an adapter could not be resolved
    #[error("document not found in store: {0}")]
    NotFound(String),

    /// Overall run deadline exceeded
    #[error("overall deadline exceeded after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    /// Configuration rejected at construction time
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, RetrievalError>;
