//! Ledger client for mint, supply, and transfer operations.
//!
//! This module provides the adapter the pipeline talks to. It currently
//! uses a simulated in-memory backend for development. Every call runs
//! under a timeout, and every raw failure is classified into the
//! [`LedgerError`] taxonomy here, at the boundary — callers never inspect
//! raw error strings.

use crate::amount::Amount;
use crate::error::{LedgerError, Result};
use crate::metadata::{derive_metadata_address, MetadataPayload};
use crate::wallet::{Address, Authority};
use crate::METADATA_PROGRAM_ID;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Default per-call timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// On-ledger size of a token account, reported by account info.
const TOKEN_ACCOUNT_LEN: usize = 165;

/// On-ledger size of a mint account, reported by account info.
const MINT_ACCOUNT_LEN: usize = 82;

/// A transaction signature returned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(String);

impl Signature {
    fn new() -> Self {
        Self(format!("sig_{}", Uuid::new_v4()))
    }

    /// Create from an existing signature string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the signature as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Basic account information returned by [`LedgerClient::get_account_info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// The account address.
    pub address: Address,
    /// Size of the account's data, in bytes.
    pub data_len: usize,
}

/// A recorded transfer, queryable per destination account.
///
/// The pipeline's reconciliation pass uses this to decide whether an
/// interrupted run already delivered to a recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Transaction signature.
    pub signature: Signature,
    /// Source token account.
    pub source: Address,
    /// Destination token account.
    pub destination: Address,
    /// Amount moved, in minor units.
    pub amount: u64,
    /// When the transfer was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Ledger operations, for targeting fault injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedgerOp {
    /// Mint creation.
    CreateMint,
    /// Account info lookup.
    GetAccountInfo,
    /// Receiving account creation.
    CreateReceivingAccount,
    /// Minting into an account.
    MintTo,
    /// Token transfer.
    Transfer,
    /// Supply query.
    GetSupply,
    /// Balance query.
    GetBalance,
    /// Metadata submission.
    SubmitMetadata,
    /// Transaction nonce query.
    LatestNonce,
}

impl fmt::Display for LedgerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateMint => "create_mint",
            Self::GetAccountInfo => "get_account_info",
            Self::CreateReceivingAccount => "create_receiving_account",
            Self::MintTo => "mint_to",
            Self::Transfer => "transfer",
            Self::GetSupply => "get_supply",
            Self::GetBalance => "get_balance",
            Self::SubmitMetadata => "submit_metadata",
            Self::LatestNonce => "latest_nonce",
        };
        write!(f, "{name}")
    }
}

/// An injectable fault, consumed by the next call to the targeted
/// operation. Development/test hook, same spirit as a devnet airdrop.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Stall until the call's timeout expires.
    Timeout,
    /// Fail with raw error text (classified at the boundary as usual).
    Failure(String),
}

/// Simulated mint state.
#[derive(Debug, Clone)]
struct MintState {
    decimals: u8,
    #[allow(dead_code)]
    authority: Address,
    supply: u64,
}

/// Simulated token account state.
#[derive(Debug, Clone)]
struct TokenAccountState {
    #[allow(dead_code)]
    owner: Address,
    mint: Address,
    balance: u64,
}

/// Simulated ledger state.
#[derive(Debug, Default)]
struct SimulatedState {
    mints: HashMap<String, MintState>,
    accounts: HashMap<String, TokenAccountState>,
    metadata: HashMap<String, MetadataPayload>,
    transfers: Vec<TransferRecord>,
    nonce: u64,
    faults: HashMap<LedgerOp, VecDeque<Fault>>,
    pending_mints: HashMap<String, u64>,
}

/// Ledger client.
///
/// Cheap to clone; clones share the same simulated ledger.
#[derive(Clone)]
pub struct LedgerClient {
    state: Arc<Mutex<SimulatedState>>,
    timeout: Duration,
}

impl Default for LedgerClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerClient {
    /// Create a new client with the default per-call timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimulatedState::default())),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-call timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Derive the receiving account address for an owner and mint.
    ///
    /// Pure function, no network call. The same owner/mint pair always
    /// derives the same address, which is what makes create-if-absent
    /// checks possible.
    #[must_use]
    pub fn derive_receiving_address(owner: &Address, mint: &Address) -> Address {
        let mut hasher = Sha256::new();
        hasher.update(b"token-account");
        hasher.update(owner.to_bytes());
        hasher.update(mint.to_bytes());
        Address::from_array(hasher.finalize().into())
    }

    /// Queue a fault for the next call to `op`.
    pub async fn inject_fault(&self, op: LedgerOp, fault: Fault) {
        let mut state = self.state.lock().await;
        state.faults.entry(op).or_default().push_back(fault);
    }

    /// Queue extra supply that lands together with the next `mint_to` on
    /// `mint`, as if a concurrent writer minted in the same window. The
    /// extra units raise the supply but no account balance. Test hook,
    /// same spirit as [`LedgerClient::inject_fault`].
    pub async fn inject_concurrent_mint(&self, mint: &Address, amount: Amount) {
        let mut state = self.state.lock().await;
        let pending = state
            .pending_mints
            .entry(mint.as_str().to_string())
            .or_insert(0);
        *pending = pending.saturating_add(amount.base_units());
    }

    /// Create a new mint with the given authority and decimals.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] for out-of-range decimals,
    /// [`LedgerError::Transient`] on timeout.
    pub async fn create_mint(&self, authority: &Authority, decimals: u8) -> Result<Address> {
        // Validates the decimals range up front.
        Amount::scale_factor(decimals)?;

        let authority_address = authority.address().clone();
        self.run_op(LedgerOp::CreateMint, async {
            let mut bytes = [0u8; 32];
            OsRng.fill_bytes(&mut bytes);
            let mint = Address::from_array(bytes);

            let mut state = self.state.lock().await;
            state.mints.insert(
                mint.as_str().to_string(),
                MintState {
                    decimals,
                    authority: authority_address.clone(),
                    supply: 0,
                },
            );
            state.nonce += 1;

            info!(mint = %mint, decimals, "mint created");
            Ok(mint)
        })
        .await
    }

    /// Look up account info. Returns `None` for unknown addresses.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Transient`] on timeout.
    pub async fn get_account_info(&self, address: &Address) -> Result<Option<AccountInfo>> {
        self.run_op(LedgerOp::GetAccountInfo, async {
            let state = self.state.lock().await;
            let key = address.as_str();

            let data_len = if let Some(payload) = state.metadata.get(key) {
                serde_json::to_vec(payload).map(|v| v.len()).unwrap_or(0)
            } else if state.accounts.contains_key(key) {
                TOKEN_ACCOUNT_LEN
            } else if state.mints.contains_key(key) {
                MINT_ACCOUNT_LEN
            } else {
                return Ok(None);
            };

            Ok(Some(AccountInfo {
                address: address.clone(),
                data_len,
            }))
        })
        .await
    }

    /// Create the receiving account for `owner` on `mint`.
    ///
    /// Callers are expected to check existence first: a duplicate creation
    /// call fails.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] if the mint is unknown or
    /// the account already exists, [`LedgerError::Transient`] on timeout.
    pub async fn create_receiving_account(
        &self,
        owner: &Address,
        mint: &Address,
    ) -> Result<Address> {
        self.run_op(LedgerOp::CreateReceivingAccount, async {
            let account = Self::derive_receiving_address(owner, mint);

            let mut state = self.state.lock().await;
            if !state.mints.contains_key(mint.as_str()) {
                return Err(LedgerError::configuration(format!(
                    "mint {mint} does not exist"
                )));
            }
            if state.accounts.contains_key(account.as_str()) {
                return Err(LedgerError::configuration(format!(
                    "receiving account {account} already exists"
                )));
            }

            state.accounts.insert(
                account.as_str().to_string(),
                TokenAccountState {
                    owner: owner.clone(),
                    mint: mint.clone(),
                    balance: 0,
                },
            );
            state.nonce += 1;

            debug!(owner = %owner, mint = %mint, account = %account, "receiving account created");
            Ok(account)
        })
        .await
    }

    /// Mint `amount` into `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] for unknown mint or
    /// destination, [`LedgerError::Transient`] on timeout.
    pub async fn mint_to(
        &self,
        mint: &Address,
        destination: &Address,
        amount: Amount,
    ) -> Result<Signature> {
        self.run_op(LedgerOp::MintTo, async {
            let mut state = self.state.lock().await;

            let mint_state = state
                .mints
                .get(mint.as_str())
                .ok_or_else(|| LedgerError::configuration(format!("mint {mint} does not exist")))?;
            let new_supply = mint_state
                .supply
                .checked_add(amount.base_units())
                .ok_or_else(|| LedgerError::configuration("mint would overflow supply"))?;

            {
                let account = state.accounts.get(destination.as_str()).ok_or_else(|| {
                    LedgerError::configuration(format!(
                        "destination account {destination} does not exist"
                    ))
                })?;
                if account.mint != *mint {
                    return Err(LedgerError::configuration(format!(
                        "destination account {destination} belongs to a different mint"
                    )));
                }
            }

            let concurrent = state.pending_mints.remove(mint.as_str()).unwrap_or(0);
            if let Some(mint_state) = state.mints.get_mut(mint.as_str()) {
                mint_state.supply = new_supply.saturating_add(concurrent);
            }
            if let Some(account) = state.accounts.get_mut(destination.as_str()) {
                account.balance = account.balance.saturating_add(amount.base_units());
            }
            state.nonce += 1;

            let signature = Signature::new();
            info!(mint = %mint, destination = %destination, amount = %amount, "minted");
            Ok(signature)
        })
        .await
    }

    /// Transfer `amount` from `source` to `destination`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InsufficientFunds`] if the source balance
    /// cannot cover the amount, [`LedgerError::Configuration`] for
    /// unknown accounts, [`LedgerError::Transient`] on timeout.
    pub async fn transfer(
        &self,
        source: &Address,
        destination: &Address,
        amount: Amount,
    ) -> Result<Signature> {
        self.run_op(LedgerOp::Transfer, async {
            let mut state = self.state.lock().await;

            let source_balance = state
                .accounts
                .get(source.as_str())
                .ok_or_else(|| {
                    LedgerError::configuration(format!("source account {source} does not exist"))
                })?
                .balance;
            if source_balance < amount.base_units() {
                return Err(LedgerError::InsufficientFunds {
                    have: source_balance,
                    need: amount.base_units(),
                });
            }
            if !state.accounts.contains_key(destination.as_str()) {
                return Err(LedgerError::configuration(format!(
                    "destination account {destination} does not exist"
                )));
            }

            if let Some(account) = state.accounts.get_mut(source.as_str()) {
                account.balance -= amount.base_units();
            }
            if let Some(account) = state.accounts.get_mut(destination.as_str()) {
                account.balance = account.balance.saturating_add(amount.base_units());
            }

            let signature = Signature::new();
            state.transfers.push(TransferRecord {
                signature: signature.clone(),
                source: source.clone(),
                destination: destination.clone(),
                amount: amount.base_units(),
                recorded_at: Utc::now(),
            });
            state.nonce += 1;

            debug!(source = %source, destination = %destination, amount = %amount, "transfer completed");
            Ok(signature)
        })
        .await
    }

    /// Get the current supply of a mint, in minor units.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] for an unknown mint,
    /// [`LedgerError::Transient`] on timeout.
    pub async fn get_supply(&self, mint: &Address) -> Result<u64> {
        self.run_op(LedgerOp::GetSupply, async {
            let state = self.state.lock().await;
            state
                .mints
                .get(mint.as_str())
                .map(|m| m.supply)
                .ok_or_else(|| LedgerError::configuration(format!("mint {mint} does not exist")))
        })
        .await
    }

    /// Get the decimals a mint was created with.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Configuration`] for an unknown mint,
    /// [`LedgerError::Transient`] on timeout.
    pub async fn get_mint_decimals(&self, mint: &Address) -> Result<u8> {
        self.run_op(LedgerOp::GetSupply, async {
            let state = self.state.lock().await;
            state
                .mints
                .get(mint.as_str())
                .map(|m| m.decimals)
                .ok_or_else(|| LedgerError::configuration(format!("mint {mint} does not exist")))
        })
        .await
    }

    /// Get the balance of a token account, in minor units. Unknown
    /// accounts report zero.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Transient`] on timeout.
    pub async fn get_balance(&self, account: &Address) -> Result<u64> {
        self.run_op(LedgerOp::GetBalance, async {
            let state = self.state.lock().await;
            Ok(state
                .accounts
                .get(account.as_str())
                .map_or(0, |a| a.balance))
        })
        .await
    }

    /// Fetch the current transaction nonce. A submission carrying an older
    /// nonce is rejected as stale.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Transient`] on timeout.
    pub async fn latest_nonce(&self) -> Result<u64> {
        self.run_op(LedgerOp::LatestNonce, async {
            let state = self.state.lock().await;
            Ok(state.nonce)
        })
        .await
    }

    /// Submit a metadata payload for a mint.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AlreadyAttached`] if the derived metadata
    /// account already holds data, [`LedgerError::Transient`] for a stale
    /// nonce or timeout, [`LedgerError::Configuration`] for an unknown
    /// mint.
    pub async fn submit_metadata(
        &self,
        mint: &Address,
        payload: MetadataPayload,
        nonce: u64,
    ) -> Result<Signature> {
        self.run_op(LedgerOp::SubmitMetadata, async {
            let account = derive_metadata_address(METADATA_PROGRAM_ID, mint);

            let mut state = self.state.lock().await;
            if nonce != state.nonce {
                return Err(LedgerError::transient("stale transaction nonce"));
            }
            if !state.mints.contains_key(mint.as_str()) {
                return Err(LedgerError::configuration(format!(
                    "mint {mint} does not exist"
                )));
            }
            if state.metadata.contains_key(account.as_str()) {
                return Err(LedgerError::AlreadyAttached {
                    mint: mint.as_str().to_string(),
                });
            }

            state.metadata.insert(account.as_str().to_string(), payload);
            state.nonce += 1;

            let signature = Signature::new();
            info!(mint = %mint, account = %account, "metadata submitted");
            Ok(signature)
        })
        .await
    }

    /// List transfers recorded into `destination`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Transient`] on timeout.
    pub async fn transfers_to(&self, destination: &Address) -> Result<Vec<TransferRecord>> {
        self.run_op(LedgerOp::GetAccountInfo, async {
            let state = self.state.lock().await;
            Ok(state
                .transfers
                .iter()
                .filter(|t| t.destination == *destination)
                .cloned()
                .collect())
        })
        .await
    }

    /// Run an operation under the per-call timeout, consuming any queued
    /// fault for it first.
    async fn run_op<T, F>(&self, op: LedgerOp, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timed = async {
            match self.take_fault(op).await {
                Some(Fault::Timeout) => {
                    // Stall past the deadline so the timeout path is real.
                    tokio::time::sleep(self.timeout + Duration::from_millis(20)).await;
                }
                Some(Fault::Failure(message)) => return Err(LedgerError::classify(&message)),
                None => {}
            }
            fut.await
        };

        match tokio::time::timeout(self.timeout, timed).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::transient(format!(
                "{op} timed out after {:?}",
                self.timeout
            ))),
        }
    }

    async fn take_fault(&self, op: LedgerOp) -> Option<Fault> {
        let mut state = self.state.lock().await;
        state.faults.get_mut(&op).and_then(VecDeque::pop_front)
    }
}

#[allow(clippy::missing_fields_in_debug)]
impl fmt::Debug for LedgerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LedgerClient")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::TokenMetadata;

    async fn setup_mint() -> (LedgerClient, Authority, Address) {
        let client = LedgerClient::new();
        let authority = Authority::generate().expect("should generate");
        let mint = client
            .create_mint(&authority, 2)
            .await
            .expect("should create mint");
        (client, authority, mint)
    }

    #[tokio::test]
    async fn create_mint_starts_at_zero_supply() {
        let (client, _authority, mint) = setup_mint().await;
        let supply = client.get_supply(&mint).await.expect("should query");
        assert_eq!(supply, 0);
        assert_eq!(client.get_mint_decimals(&mint).await.expect("decimals"), 2);
    }

    #[tokio::test]
    async fn create_mint_rejects_absurd_decimals() {
        let client = LedgerClient::new();
        let authority = Authority::generate().expect("should generate");
        let result = client.create_mint(&authority, 30).await;
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::Configuration { .. }
        ));
    }

    #[tokio::test]
    async fn receiving_account_lifecycle() {
        let (client, authority, mint) = setup_mint().await;
        let derived = LedgerClient::derive_receiving_address(authority.address(), &mint);

        // Absent before creation.
        let info = client.get_account_info(&derived).await.expect("query");
        assert!(info.is_none());

        let created = client
            .create_receiving_account(authority.address(), &mint)
            .await
            .expect("should create");
        assert_eq!(created, derived);

        let info = client.get_account_info(&derived).await.expect("query");
        assert_eq!(info.expect("exists").data_len, TOKEN_ACCOUNT_LEN);

        // Duplicate creation is an error.
        let result = client
            .create_receiving_account(authority.address(), &mint)
            .await;
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::Configuration { .. }
        ));
    }

    #[tokio::test]
    async fn mint_to_raises_supply_and_balance() {
        let (client, authority, mint) = setup_mint().await;
        let account = client
            .create_receiving_account(authority.address(), &mint)
            .await
            .expect("should create");

        client
            .mint_to(&mint, &account, Amount::from_whole(5, 2).expect("amount"))
            .await
            .expect("should mint");

        assert_eq!(client.get_supply(&mint).await.expect("supply"), 500);
        assert_eq!(client.get_balance(&account).await.expect("balance"), 500);
    }

    #[tokio::test]
    async fn transfer_moves_funds_and_records_history() {
        let (client, authority, mint) = setup_mint().await;
        let source = client
            .create_receiving_account(authority.address(), &mint)
            .await
            .expect("create source");
        let recipient = Authority::generate().expect("generate");
        let destination = client
            .create_receiving_account(recipient.address(), &mint)
            .await
            .expect("create destination");

        client
            .mint_to(&mint, &source, Amount::from_base_units(300))
            .await
            .expect("fund source");

        let signature = client
            .transfer(&source, &destination, Amount::from_base_units(100))
            .await
            .expect("should transfer");

        assert_eq!(client.get_balance(&source).await.expect("balance"), 200);
        assert_eq!(client.get_balance(&destination).await.expect("balance"), 100);

        let history = client.transfers_to(&destination).await.expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].signature, signature);
        assert_eq!(history[0].source, source);
        assert_eq!(history[0].amount, 100);
    }

    #[tokio::test]
    async fn transfer_insufficient_funds() {
        let (client, authority, mint) = setup_mint().await;
        let source = client
            .create_receiving_account(authority.address(), &mint)
            .await
            .expect("create source");
        let recipient = Authority::generate().expect("generate");
        let destination = client
            .create_receiving_account(recipient.address(), &mint)
            .await
            .expect("create destination");

        let result = client
            .transfer(&source, &destination, Amount::from_base_units(1))
            .await;
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::InsufficientFunds { have: 0, need: 1 }
        ));
    }

    #[tokio::test]
    async fn balance_of_unknown_account_is_zero() {
        let client = LedgerClient::new();
        let unknown = Address::from_array([3u8; 32]);
        assert_eq!(client.get_balance(&unknown).await.expect("balance"), 0);
    }

    #[tokio::test]
    async fn submit_metadata_once_then_already_attached() {
        let (client, authority, mint) = setup_mint().await;
        let metadata = TokenMetadata::new("Ration", "RTN", "https://x").expect("valid");
        let payload =
            MetadataPayload::for_mint_authority(metadata, authority.address().clone());

        let nonce = client.latest_nonce().await.expect("nonce");
        client
            .submit_metadata(&mint, payload.clone(), nonce)
            .await
            .expect("first submission succeeds");

        let nonce = client.latest_nonce().await.expect("nonce");
        let result = client.submit_metadata(&mint, payload, nonce).await;
        assert!(matches!(
            result.unwrap_err(),
            LedgerError::AlreadyAttached { .. }
        ));
    }

    #[tokio::test]
    async fn stale_nonce_is_transient() {
        let (client, authority, mint) = setup_mint().await;
        let metadata = TokenMetadata::new("Ration", "RTN", "https://x").expect("valid");
        let payload =
            MetadataPayload::for_mint_authority(metadata, authority.address().clone());

        let stale = client.latest_nonce().await.expect("nonce");
        // Any state-mutating call advances the nonce.
        client
            .create_receiving_account(authority.address(), &mint)
            .await
            .expect("create account");

        let result = client.submit_metadata(&mint, payload, stale).await;
        let err = result.unwrap_err();
        assert!(err.is_retryable(), "stale nonce should be retryable: {err}");
    }

    #[tokio::test]
    async fn injected_timeout_classifies_transient() {
        let (client, authority, mint) = setup_mint().await;
        let client = client.with_timeout(Duration::from_millis(20));

        client.inject_fault(LedgerOp::GetSupply, Fault::Timeout).await;
        let err = client.get_supply(&mint).await.unwrap_err();
        assert!(matches!(err, LedgerError::Transient { .. }));

        // The fault is consumed; the next call goes through.
        assert_eq!(client.get_supply(&mint).await.expect("supply"), 0);
        let _ = authority;
    }

    #[tokio::test]
    async fn injected_failure_is_classified_at_boundary() {
        let (client, _authority, mint) = setup_mint().await;

        client
            .inject_fault(
                LedgerOp::GetSupply,
                Fault::Failure("blockhash not found".to_string()),
            )
            .await;
        let err = client.get_supply(&mint).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn nonce_query_carries_fault_injection() {
        let (client, _authority, _mint) = setup_mint().await;

        client
            .inject_fault(
                LedgerOp::LatestNonce,
                Fault::Failure("connection reset".to_string()),
            )
            .await;
        let err = client.latest_nonce().await.unwrap_err();
        assert!(err.is_retryable());

        assert!(client.latest_nonce().await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_mint_lands_with_next_mint_to() {
        let (client, authority, mint) = setup_mint().await;
        let account = client
            .create_receiving_account(authority.address(), &mint)
            .await
            .expect("should create");

        client
            .inject_concurrent_mint(&mint, Amount::from_base_units(50))
            .await;
        client
            .mint_to(&mint, &account, Amount::from_base_units(100))
            .await
            .expect("should mint");

        // The concurrent writer's units raise supply but not this balance.
        assert_eq!(client.get_supply(&mint).await.expect("supply"), 150);
        assert_eq!(client.get_balance(&account).await.expect("balance"), 100);
    }

    #[tokio::test]
    async fn derived_receiving_address_is_stable() {
        let owner = Address::from_array([1u8; 32]);
        let mint = Address::from_array([2u8; 32]);
        assert_eq!(
            LedgerClient::derive_receiving_address(&owner, &mint),
            LedgerClient::derive_receiving_address(&owner, &mint)
        );
        let other_mint = Address::from_array([3u8; 32]);
        assert_ne!(
            LedgerClient::derive_receiving_address(&owner, &mint),
            LedgerClient::derive_receiving_address(&owner, &other_mint)
        );
    }

    #[tokio::test]
    async fn clones_share_state() {
        let (client, authority, mint) = setup_mint().await;
        let clone = client.clone();
        let account = clone
            .create_receiving_account(authority.address(), &mint)
            .await
            .expect("create via clone");
        let info = client.get_account_info(&account).await.expect("query");
        assert!(info.is_some());
    }
}
