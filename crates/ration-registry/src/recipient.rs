//! Recipient entity and fulfillment lifecycle.
//!
//! The invariant enforced here: `fulfilled == true` implies
//! `tokens_received >= 1`, a receiving account, and a fulfillment
//! signature. There is no transition out of fulfilled.

use crate::error::{RegistryError, Result};
use chrono::{DateTime, Utc};
use ration_ledger::{Address, Signature};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique recipient identifier.
///
/// Ordered lexicographically; distribution selects recipients in ascending
/// id order so reruns visit them identically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecipientId(String);

impl RecipientId {
    /// Create a new random recipient id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the id as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecipientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a recipient is entitled to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// Not entitled; never selected for distribution.
    Ineligible,
    /// Entitled to exactly one unit.
    Eligible,
}

/// A pre-transfer reservation.
///
/// Persisted immediately before the transfer is submitted. If the process
/// dies between a confirmed transfer and the fulfillment write, the next
/// run finds this record and reconciles against the ledger's transfer
/// history instead of transferring again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    /// The distribution run that made the reservation.
    pub run_id: String,
    /// The receiving account the transfer was aimed at.
    pub receiving_account: Address,
    /// When the reservation was written.
    pub reserved_at: DateTime<Utc>,
}

/// A registered recipient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    /// Unique identifier.
    pub id: RecipientId,
    /// The recipient's wallet address as registered. Stored raw; validated
    /// when distribution reaches the recipient.
    pub wallet_address: String,
    /// Entitlement status.
    pub eligibility: Eligibility,
    /// Whether the recipient has received their unit.
    pub fulfilled: bool,
    /// The ledger account holding the recipient's balance, once known.
    pub receiving_account: Option<Address>,
    /// Signature of the fulfilling transfer.
    pub fulfillment_signature: Option<Signature>,
    /// Units received over the recipient's lifetime.
    pub tokens_received: u64,
    /// Outstanding pre-transfer reservation, if any.
    pub reservation: Option<Reservation>,
    /// When the recipient was registered.
    pub registered_at: DateTime<Utc>,
}

impl Recipient {
    /// Create a new unfulfilled recipient.
    #[must_use]
    pub fn new(wallet_address: impl Into<String>, eligibility: Eligibility) -> Self {
        Self {
            id: RecipientId::new(),
            wallet_address: wallet_address.into(),
            eligibility,
            fulfilled: false,
            receiving_account: None,
            fulfillment_signature: None,
            tokens_received: 0,
            reservation: None,
            registered_at: Utc::now(),
        }
    }

    /// Create with a fixed id. Useful where callers need stable ordering.
    #[must_use]
    pub fn with_id(
        id: RecipientId,
        wallet_address: impl Into<String>,
        eligibility: Eligibility,
    ) -> Self {
        Self {
            id,
            ..Self::new(wallet_address, eligibility)
        }
    }

    /// Whether distribution should select this recipient: eligible and not
    /// yet fulfilled. Wallet well-formedness is checked at delivery time.
    #[must_use]
    pub fn is_claimable(&self) -> bool {
        self.eligibility == Eligibility::Eligible && !self.fulfilled
    }

    /// Write a pre-transfer reservation.
    pub fn reserve(&mut self, run_id: impl Into<String>, receiving_account: Address) {
        self.reservation = Some(Reservation {
            run_id: run_id.into(),
            receiving_account,
            reserved_at: Utc::now(),
        });
    }

    /// Drop an outstanding reservation.
    pub fn clear_reservation(&mut self) {
        self.reservation = None;
    }

    /// Record fulfillment.
    ///
    /// Establishes the invariant in one step and clears any reservation.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyFulfilled`] if the recipient was
    /// already fulfilled; the record is left untouched.
    pub fn mark_fulfilled(&mut self, receiving_account: Address, signature: Signature) -> Result<()> {
        if self.fulfilled {
            return Err(RegistryError::AlreadyFulfilled {
                id: self.id.to_string(),
            });
        }

        self.fulfilled = true;
        self.tokens_received += 1;
        self.receiving_account = Some(receiving_account);
        self.fulfillment_signature = Some(signature);
        self.reservation = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Address {
        Address::from_array([5u8; 32])
    }

    #[test]
    fn new_recipient_is_unfulfilled() {
        let r = Recipient::new("wallet", Eligibility::Eligible);
        assert!(r.is_claimable());
        assert!(!r.fulfilled);
        assert_eq!(r.tokens_received, 0);
        assert!(r.receiving_account.is_none());
        assert!(r.fulfillment_signature.is_none());
    }

    #[test]
    fn ineligible_is_not_claimable() {
        let r = Recipient::new("wallet", Eligibility::Ineligible);
        assert!(!r.is_claimable());
    }

    #[test]
    fn fulfillment_establishes_invariant() {
        let mut r = Recipient::new("wallet", Eligibility::Eligible);
        r.mark_fulfilled(account(), Signature::from_string("sig_1"))
            .expect("should fulfill");

        assert!(r.fulfilled);
        assert!(r.tokens_received >= 1);
        assert!(r.receiving_account.is_some());
        assert!(r.fulfillment_signature.is_some());
        assert!(!r.is_claimable());
    }

    #[test]
    fn second_fulfillment_rejected() {
        let mut r = Recipient::new("wallet", Eligibility::Eligible);
        r.mark_fulfilled(account(), Signature::from_string("sig_1"))
            .expect("should fulfill");

        let result = r.mark_fulfilled(account(), Signature::from_string("sig_2"));
        assert!(matches!(
            result.unwrap_err(),
            RegistryError::AlreadyFulfilled { .. }
        ));
        assert_eq!(r.tokens_received, 1);
        assert_eq!(
            r.fulfillment_signature,
            Some(Signature::from_string("sig_1"))
        );
    }

    #[test]
    fn fulfillment_clears_reservation() {
        let mut r = Recipient::new("wallet", Eligibility::Eligible);
        r.reserve("run-1", account());
        assert!(r.reservation.is_some());

        r.mark_fulfilled(account(), Signature::from_string("sig_1"))
            .expect("should fulfill");
        assert!(r.reservation.is_none());
    }

    #[test]
    fn reservation_roundtrip() {
        let mut r = Recipient::new("wallet", Eligibility::Eligible);
        r.reserve("run-1", account());
        let res = r.reservation.as_ref().expect("reserved");
        assert_eq!(res.run_id, "run-1");
        assert_eq!(res.receiving_account, account());

        r.clear_reservation();
        assert!(r.reservation.is_none());
    }

    #[test]
    fn ids_order_lexicographically() {
        let a = RecipientId::from_string("0001");
        let b = RecipientId::from_string("0002");
        assert!(a < b);
    }

    #[test]
    fn serde_roundtrip() {
        let mut r = Recipient::new("wallet", Eligibility::Eligible);
        r.mark_fulfilled(account(), Signature::from_string("sig_1"))
            .expect("should fulfill");

        let json = serde_json::to_string(&r).expect("serialize");
        let parsed: Recipient = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.id, r.id);
        assert!(parsed.fulfilled);
        assert_eq!(parsed.tokens_received, 1);
    }
}
