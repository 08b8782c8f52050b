//! OKX wallet, Bitcoin side.
//!
//! OKX injects one object per network ("bitcoin", "bitcoinSignet", ...);
//! the adapter picks the sub-provider from the configured network and
//! routes every call through it. The extension offers no network query on
//! testnet/signet, so `get_network` echoes the configured network after
//! the connect-time address check.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::core::address::{ensure_finalized, validate_address};
use crate::core::config::BtcConfig;
use crate::core::context::{AccountChangedCallback, ExtensionRpc};
use crate::core::errors::WalletError;
use crate::core::types::{Account, InscriptionIdentifier, Network, SignatureType};
use crate::providers::btc::inscriptions::fetch_inscriptions;
use crate::providers::{BtcProvider, Provider};

pub const PROVIDER_NAME: &str = "OKX";
pub const ICON: &str = "/icons/btc/okx.svg";

const WALLET_NAME: &str = "OKX Wallet";

fn sub_provider(network: Network) -> &'static str {
    match network {
        Network::Mainnet | Network::Canary => "bitcoin",
        Network::Testnet => "bitcoinTestnet",
        Network::Signet => "bitcoinSignet",
    }
}

pub struct OkxBtcProvider {
    extension: Arc<dyn ExtensionRpc>,
    config: BtcConfig,
    sub: &'static str,
    wallet_info: Mutex<Option<Account>>,
}

impl OkxBtcProvider {
    pub fn new(
        handle: Option<Arc<dyn ExtensionRpc>>,
        config: &BtcConfig,
    ) -> Result<Self, WalletError> {
        let extension = handle.ok_or_else(|| {
            WalletError::ExtensionNotFound(format!("{} extension not found", WALLET_NAME))
        })?;

        Ok(Self {
            extension,
            config: config.clone(),
            sub: sub_provider(config.network),
            wallet_info: Mutex::new(None),
        })
    }

    fn method(&self, name: &str) -> String {
        format!("{}.{}", self.sub, name)
    }

    fn connected(&self) -> Result<Account, WalletError> {
        self.wallet_info
            .lock()
            .clone()
            .ok_or_else(|| WalletError::NotConnected(WALLET_NAME.to_string()))
    }
}

#[async_trait]
impl Provider for OkxBtcProvider {
    async fn connect_wallet(&self) -> Result<(), WalletError> {
        self.extension
            .request("enable", Value::Null)
            .await
            .map_err(|e| WalletError::from_extension_failure(WALLET_NAME, &e.to_string()))?;

        // connect resolves even with no network enabled; a failure here
        // means the configured network is missing from the extension
        let result = self
            .extension
            .request(&self.method("connect"), Value::Null)
            .await
            .map_err(|_| {
                WalletError::ExtensionError(format!(
                    "BTC {} is not enabled in {}",
                    self.config.network, WALLET_NAME
                ))
            })?;

        let address = result.get("address").and_then(Value::as_str);
        let public_key = result.get("compressedPublicKey").and_then(Value::as_str);

        match (address, public_key) {
            (Some(address), Some(public_key)) => {
                validate_address(self.config.network, address)?;
                *self.wallet_info.lock() = Some(Account {
                    address: address.to_string(),
                    public_key_hex: public_key.to_string(),
                });
                Ok(())
            }
            _ => Err(WalletError::ExtensionError(format!(
                "Could not connect to {}",
                WALLET_NAME
            ))),
        }
    }

    async fn get_address(&self) -> Result<String, WalletError> {
        Ok(self.connected()?.address)
    }

    async fn get_public_key_hex(&self) -> Result<String, WalletError> {
        Ok(self.connected()?.public_key_hex)
    }

    async fn get_network(&self) -> Result<Network, WalletError> {
        Ok(self.config.network)
    }

    async fn sign_message(
        &self,
        message: &str,
        sig_type: SignatureType,
    ) -> Result<String, WalletError> {
        self.connected()?;

        let result = self
            .extension
            .request(&self.method("signMessage"), json!([message, sig_type.as_str()]))
            .await?;

        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::ExtensionError("signMessage returned no string".to_string()))
    }

    fn on_account_changed(&self, callback: AccountChangedCallback) -> Result<(), WalletError> {
        self.connected()?;
        self.extension
            .subscribe(&self.method("accountChanged"), callback);
        Ok(())
    }

    fn off_account_changed(&self, callback: &AccountChangedCallback) -> Result<(), WalletError> {
        self.connected()?;
        self.extension
            .unsubscribe(&self.method("accountChanged"), callback);
        Ok(())
    }

    async fn provider_name(&self) -> Result<String, WalletError> {
        Ok(PROVIDER_NAME.to_string())
    }

    async fn provider_icon(&self) -> Result<String, WalletError> {
        Ok(ICON.to_string())
    }
}

#[async_trait]
impl BtcProvider for OkxBtcProvider {
    async fn sign_psbt(&self, psbt_hex: &str) -> Result<String, WalletError> {
        self.connected()?;
        if psbt_hex.is_empty() {
            return Err(WalletError::InvalidInput("psbt hex is required".to_string()));
        }

        let result = self
            .extension
            .request(&self.method("signPsbt"), json!([psbt_hex]))
            .await?;
        let signed = result
            .as_str()
            .ok_or_else(|| WalletError::ExtensionError("signPsbt returned no string".to_string()))?;

        ensure_finalized(WALLET_NAME, signed)
    }

    async fn sign_psbts(&self, psbt_hexes: &[String]) -> Result<Vec<String>, WalletError> {
        self.connected()?;
        if psbt_hexes.is_empty() {
            return Err(WalletError::InvalidInput("psbts hexes are required".to_string()));
        }

        let result = self
            .extension
            .request(&self.method("signPsbts"), json!([psbt_hexes]))
            .await?;
        let signed = result.as_array().ok_or_else(|| {
            WalletError::ExtensionError("signPsbts returned no array".to_string())
        })?;

        signed
            .iter()
            .map(|value| {
                let hex = value.as_str().ok_or_else(|| {
                    WalletError::ExtensionError("signPsbts returned a non-string".to_string())
                })?;
                ensure_finalized(WALLET_NAME, hex)
            })
            .collect()
    }

    // only the mainnet sub-provider exposes inscriptions
    async fn get_inscriptions(&self) -> Result<Vec<InscriptionIdentifier>, WalletError> {
        self.connected()?;
        if self.config.network != Network::Mainnet {
            return Err(WalletError::UnsupportedCapability(format!(
                "Inscriptions are only available on {} BTC mainnet",
                WALLET_NAME
            )));
        }

        fetch_inscriptions(&self.extension, &self.method("getInscriptions"), WALLET_NAME).await
    }
}
