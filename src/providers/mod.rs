//! Uniform provider contract and the per-wallet adapters implementing it.
//!
//! One adapter exists per (wallet, chain) pair. Each one translates a single
//! extension's native API into the [`Provider`] trait so the connector layer
//! never sees a wallet-specific call shape.

pub mod bbn;
pub mod btc;

use std::sync::Arc;

use async_trait::async_trait;

use crate::core::context::{AccountChangedCallback, ExtensionRpc};
use crate::core::errors::WalletError;
use crate::core::types::{InscriptionIdentifier, Network, SignatureType};

/// Capability set every wallet integration must provide.
///
/// Every operation except `connect_wallet` requires a prior successful
/// connect and fails with [`WalletError::NotConnected`] otherwise; none of
/// them attempt an implicit connection.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Request account access from the underlying extension. Must verify the
    /// extension is on (or can be switched to) the configured network and
    /// that the returned address matches that network's format.
    async fn connect_wallet(&self) -> Result<(), WalletError>;

    /// Cached address of the connected account; no extension round-trip.
    async fn get_address(&self) -> Result<String, WalletError>;

    /// Cached compressed public key of the connected account, hex encoded.
    async fn get_public_key_hex(&self) -> Result<String, WalletError>;

    /// Best-effort mapping of the extension-reported network onto the
    /// uniform enum.
    async fn get_network(&self) -> Result<Network, WalletError>;

    /// Sign an arbitrary message with the connected account.
    async fn sign_message(
        &self,
        message: &str,
        sig_type: SignatureType,
    ) -> Result<String, WalletError>;

    /// Subscribe to the account-changed event, whatever the extension
    /// natively calls it.
    fn on_account_changed(&self, callback: AccountChangedCallback) -> Result<(), WalletError>;

    /// Unsubscribe a previously registered account-changed callback.
    fn off_account_changed(&self, callback: &AccountChangedCallback) -> Result<(), WalletError>;

    /// Display name of the wallet provider.
    async fn provider_name(&self) -> Result<String, WalletError>;

    /// Icon of the wallet provider (URL or data URI).
    async fn provider_icon(&self) -> Result<String, WalletError>;
}

/// Bitcoin-side capabilities on top of the base contract.
#[async_trait]
pub trait BtcProvider: Provider {
    /// Sign a hex-encoded PSBT. The returned hex is always a fully
    /// finalized PSBT; adapters finalize locally when the extension
    /// does not.
    async fn sign_psbt(&self, psbt_hex: &str) -> Result<String, WalletError>;

    /// Sign multiple PSBTs in one extension prompt where supported.
    async fn sign_psbts(&self, psbt_hexes: &[String]) -> Result<Vec<String>, WalletError>;

    /// List inscription-bearing UTXOs of the connected account. Only
    /// available where the wallet/network combination supports it.
    async fn get_inscriptions(&self) -> Result<Vec<InscriptionIdentifier>, WalletError>;
}

/// Cosmos-side capabilities on top of the base contract.
#[async_trait]
pub trait BbnProvider: Provider {
    /// Handle for offline transaction signing. The Cosmos signing internals
    /// stay behind the extension; callers drive them through the handle.
    async fn get_offline_signer(&self) -> Result<OfflineSignerHandle, WalletError>;
}

/// Opaque signer handle: the extension object plus the chain it signs for.
#[derive(Clone)]
pub struct OfflineSignerHandle {
    pub chain_id: String,
    pub extension: Arc<dyn ExtensionRpc>,
}
