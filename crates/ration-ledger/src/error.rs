//! Error taxonomy for ledger operations.
//!
//! Raw ledger error text is classified exactly once, at the adapter
//! boundary, via [`LedgerError::classify`]. Downstream components only
//! ever match on the typed variants.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// Malformed authority or key material. Fatal; an operator must fix it.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// Timeout, stale transaction nonce, or unreachable ledger. Retryable
    /// with bounded attempts.
    #[error("transient ledger error: {message}")]
    Transient {
        /// Description of the transient failure.
        message: String,
    },

    /// Metadata is already attached to the mint. Attachment is one-time.
    #[error("metadata already attached to mint {mint}")]
    AlreadyAttached {
        /// The mint whose metadata account already holds data.
        mint: String,
    },

    /// The recipient was already fulfilled. Fatal for that unit of work.
    #[error("recipient {recipient} already fulfilled")]
    AlreadyFulfilled {
        /// The recipient identifier.
        recipient: String,
    },

    /// Malformed recipient wallet address. Fatal for that recipient only.
    #[error("invalid wallet: {message}")]
    InvalidWallet {
        /// Description of the address problem.
        message: String,
    },

    /// Post-mint supply did not match the expected total. Fatal; indicates
    /// a concurrent writer or ledger inconsistency.
    #[error("supply verification failed: expected {expected}, ledger reports {actual}")]
    SupplyVerification {
        /// Supply the planner expected after minting.
        expected: u64,
        /// Supply the ledger actually reported.
        actual: u64,
    },

    /// Administrator balance too low to cover the operation.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Available balance in minor units.
        have: u64,
        /// Required balance in minor units.
        need: u64,
    },
}

impl LedgerError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a transient ledger error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Create an invalid wallet error.
    #[must_use]
    pub fn invalid_wallet(message: impl Into<String>) -> Self {
        Self::InvalidWallet {
            message: message.into(),
        }
    }

    /// Stable kind tag for envelopes and per-recipient reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::Transient { .. } => "transient_ledger",
            Self::AlreadyAttached { .. } => "already_attached",
            Self::AlreadyFulfilled { .. } => "already_fulfilled",
            Self::InvalidWallet { .. } => "invalid_wallet",
            Self::SupplyVerification { .. } => "supply_verification",
            Self::InsufficientFunds { .. } => "insufficient_funds",
        }
    }

    /// Whether the operation may be retried with backoff.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Classify a raw ledger error message into the taxonomy.
    ///
    /// This is the single place raw error text is inspected. Unrecognized
    /// messages classify as transient: rerunning a stage is always safe
    /// for untouched work, so retry is the conservative default.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        let lower = raw.to_lowercase();
        if lower.contains("invalid")
            && (lower.contains("address") || lower.contains("base58") || lower.contains("pubkey"))
        {
            return Self::invalid_wallet(raw);
        }
        if lower.contains("insufficient") {
            return Self::InsufficientFunds { have: 0, need: 0 };
        }
        if lower.contains("keypair") || lower.contains("secret key") || lower.contains("signer") {
            return Self::configuration(raw);
        }
        // Timeouts, stale blockhashes, connection resets, and anything
        // unrecognized all land here.
        Self::transient(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn transient_is_retryable() {
        assert!(LedgerError::transient("timed out").is_retryable());
        assert!(!LedgerError::configuration("bad key").is_retryable());
        assert!(!LedgerError::invalid_wallet("junk").is_retryable());
    }

    #[test]
    fn kind_tags_are_stable() {
        assert_eq!(LedgerError::transient("x").kind(), "transient_ledger");
        assert_eq!(
            LedgerError::SupplyVerification {
                expected: 10,
                actual: 4
            }
            .kind(),
            "supply_verification"
        );
        assert_eq!(
            LedgerError::InsufficientFunds { have: 1, need: 2 }.kind(),
            "insufficient_funds"
        );
    }

    #[test_case("connection timed out" => "transient_ledger")]
    #[test_case("blockhash not found" => "transient_ledger")]
    #[test_case("invalid base58 address" => "invalid_wallet")]
    #[test_case("Invalid pubkey supplied" => "invalid_wallet")]
    #[test_case("insufficient funds for transfer" => "insufficient_funds")]
    #[test_case("could not load keypair" => "configuration")]
    #[test_case("something nobody anticipated" => "transient_ledger")]
    fn classify_raw_messages(raw: &str) -> &'static str {
        LedgerError::classify(raw).kind()
    }

    #[test]
    fn supply_verification_display() {
        let err = LedgerError::SupplyVerification {
            expected: 1000,
            actual: 400,
        };
        let text = err.to_string();
        assert!(text.contains("1000"));
        assert!(text.contains("400"));
    }
}
