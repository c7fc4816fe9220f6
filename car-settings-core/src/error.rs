//! Error types for the platform user-management service.

use thiserror::Error;

use crate::types::AccountId;

/// Failures surfaced by the platform user-management service.
///
/// The account manager never propagates these out of its public
/// operations; every failure degrades to a no-op plus a warning log, per
/// the façade's no-throw contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The platform refused to create another account, most likely
    /// because the account-count limit has been reached.
    #[error("account limit reached")]
    AccountLimitReached,

    /// No account with the given identifier exists.
    #[error("account {id} not found")]
    AccountNotFound {
        /// Identifier that failed to resolve.
        id: AccountId,
    },

    /// The operation is not permitted for the target account, e.g.
    /// removing the session that is currently running.
    #[error("operation not permitted for account {id}")]
    NotPermitted {
        /// Identifier of the refused target.
        id: AccountId,
    },

    /// The remote service call itself failed.
    #[error("remote call failed: {context}")]
    Remote {
        /// Context describing the failed call.
        context: String,
    },
}

/// Result type alias for platform service operations.
pub type PlatformResult<T> = Result<T, PlatformError>;
