//! Cactus Link wallet. Cannot switch networks programmatically, so the
//! connect flow refuses outright when the extension sits on a different
//! network than the configured one.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::core::address::{ensure_finalized, validate_address};
use crate::core::config::BtcConfig;
use crate::core::context::{AccountChangedCallback, ExtensionRpc};
use crate::core::errors::WalletError;
use crate::core::types::{Account, InscriptionIdentifier, Network, SignatureType};
use crate::providers::{BtcProvider, Provider};

pub const PROVIDER_NAME: &str = "Cactus Link";
pub const ICON: &str = "/icons/btc/cactus.svg";

const WALLET_NAME: &str = "Cactus Link Wallet";

pub struct CactusLinkProvider {
    extension: Arc<dyn ExtensionRpc>,
    config: BtcConfig,
    wallet_info: Mutex<Option<Account>>,
}

impl CactusLinkProvider {
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
            wallet_info: Mutex::new(None),
        })
    }

    fn connected(&self) -> Result<Account, WalletError> {
        self.wallet_info
            .lock()
            .clone()
            .ok_or_else(|| WalletError::NotConnected(WALLET_NAME.to_string()))
    }

    async fn fetch_address(&self) -> Result<String, WalletError> {
        let accounts = self.extension.request("getAccounts", Value::Null).await?;

        accounts
            .as_array()
            .and_then(|list| list.first())
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| WalletError::NotConnected(WALLET_NAME.to_string()))
    }
}

#[async_trait]
impl Provider for CactusLinkProvider {
    async fn connect_wallet(&self) -> Result<(), WalletError> {
        let wallet_network = self.get_network().await?;
        if self.config.network != wallet_network {
            return Err(WalletError::UnsupportedNetwork(format!(
                "Wallet is not switched to Bitcoin {} network",
                self.config.network
            )));
        }

        self.extension
            .request("requestAccounts", Value::Null)
            .await
            .map_err(|e| WalletError::from_extension_failure(WALLET_NAME, &e.to_string()))?;

        let address = self.fetch_address().await?;
        validate_address(self.config.network, &address)?;

        let public_key = self.extension.request("getPublicKey", Value::Null).await?;
        let public_key = public_key
            .as_str()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| WalletError::NotConnected(WALLET_NAME.to_string()))?;

        *self.wallet_info.lock() = Some(Account {
            address,
            public_key_hex: public_key.to_string(),
        });

        Ok(())
    }

    async fn get_address(&self) -> Result<String, WalletError> {
        Ok(self.connected()?.address)
    }

    async fn get_public_key_hex(&self) -> Result<String, WalletError> {
        Ok(self.connected()?.public_key_hex)
    }

    async fn get_network(&self) -> Result<Network, WalletError> {
        let internal = self.extension.request("getNetwork", Value::Null).await?;

        match internal.as_str() {
            Some("mainnet") => Ok(Network::Mainnet),
            Some("testnet") => Ok(Network::Testnet),
            Some("signet") => Ok(Network::Signet),
            other => Err(WalletError::UnsupportedNetwork(format!(
                "cactus network {:?}",
                other
            ))),
        }
    }

    async fn sign_message(
        &self,
        message: &str,
        sig_type: SignatureType,
    ) -> Result<String, WalletError> {
        self.connected()?;

        let result = self
            .extension
            .request("signMessage", json!([message, sig_type.as_str()]))
            .await?;

        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| WalletError::ExtensionError("signMessage returned no string".to_string()))
    }

    fn on_account_changed(&self, callback: AccountChangedCallback) -> Result<(), WalletError> {
        self.connected()?;
        self.extension.subscribe("accountsChanged", callback);
        Ok(())
    }

    fn off_account_changed(&self, callback: &AccountChangedCallback) -> Result<(), WalletError> {
        self.connected()?;
        self.extension.unsubscribe("accountsChanged", callback);
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
impl BtcProvider for CactusLinkProvider {
    async fn sign_psbt(&self, psbt_hex: &str) -> Result<String, WalletError> {
        self.connected()?;
        if psbt_hex.is_empty() {
            return Err(WalletError::InvalidInput("psbt hex is required".to_string()));
        }

        let result = self
            .extension
            .request("signPsbt", json!([psbt_hex, { "autoFinalized": true }]))
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

        let options: Vec<Value> = psbt_hexes
            .iter()
            .map(|_| json!({ "autoFinalized": true }))
            .collect();
        let result = self
            .extension
            .request("signPsbts", json!([psbt_hexes, options]))
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

    // inscription filtering is intentionally skipped for Cactus Link
    async fn get_inscriptions(&self) -> Result<Vec<InscriptionIdentifier>, WalletError> {
        Ok(Vec::new())
    }
}
