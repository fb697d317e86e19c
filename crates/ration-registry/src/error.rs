//! Error types for registry operations.

use thiserror::Error;

/// Result type alias for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors that can occur during registry operations.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// Recipient not found.
    #[error("recipient not found: {id}")]
    RecipientNotFound {
        /// The recipient identifier.
        id: String,
    },

    /// Mint not found in the pointer table.
    #[error("mint not found: {mint}")]
    MintNotFound {
        /// The mint address.
        mint: String,
    },

    /// The recipient is already fulfilled. Fulfillment is one-way.
    #[error("recipient {id} already fulfilled")]
    AlreadyFulfilled {
        /// The recipient identifier.
        id: String,
    },
}
