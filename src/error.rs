//! Typed errors for the ingestion and ledger engine.
//!
//! Every multi-step unit (ingestion, request resolution) rolls back
//! completely when one of these is raised — partial state is never
//! observable. `StoreUnavailable` wraps transient infrastructure failures
//! and is the only variant where retrying the whole unit is meaningful.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The user's balance is too low for the attempted operation.
    /// Surfaced to the end user; not retryable.
    #[error("insufficient credits")]
    InsufficientCredit,

    /// No credit account exists for the given user.
    #[error("no credit account for user '{0}'")]
    AccountNotFound(String),

    /// The credit request id does not exist.
    #[error("credit request '{0}' not found")]
    RequestNotFound(String),

    /// The credit request was already approved or denied; terminal
    /// states are final.
    #[error("credit request '{0}' already resolved")]
    RequestAlreadyResolved(String),

    /// Input rejected before any store interaction.
    #[error("malformed input: {0}")]
    MalformedInput(&'static str),

    /// Transient store failure (busy database, pool timeout). The whole
    /// unit is atomic, so the caller may retry it from the top.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
