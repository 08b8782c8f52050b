//! OneKey wallet. The usable surface lives on the nested `btcwallet`
//! object, so the registry resolves the "$onekey.btcwallet" handle and a
//! missing nested object already reads as not installed.

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

pub const PROVIDER_NAME: &str = "OneKey";
pub const ICON: &str = "/icons/btc/onekey.svg";

const WALLET_NAME: &str = "OneKey Wallet";

pub struct OneKeyProvider {
    extension: Arc<dyn ExtensionRpc>,
    config: BtcConfig,
    wallet_info: Mutex<Option<Account>>,
}

impl OneKeyProvider {
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
}

#[async_trait]
impl Provider for OneKeyProvider {
    async fn connect_wallet(&self) -> Result<(), WalletError> {
        self.extension
            .request("connectWallet", Value::Null)
            .await
            .map_err(|e| WalletError::from_extension_failure(WALLET_NAME, &e.to_string()))?;

        let address = self.extension.request("getAddress", Value::Null).await?;
        let address = address.as_str().filter(|a| !a.is_empty()).ok_or_else(|| {
            WalletError::ExtensionError(format!("Could not connect to {}", WALLET_NAME))
        })?;
        validate_address(self.config.network, address)?;

        let public_key = self
            .extension
            .request("getPublicKeyHex", Value::Null)
            .await?;
        let public_key = public_key.as_str().filter(|k| !k.is_empty()).ok_or_else(|| {
            WalletError::ExtensionError(format!("Could not connect to {}", WALLET_NAME))
        })?;

        *self.wallet_info.lock() = Some(Account {
            address: address.to_string(),
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
            Some("livenet") => Ok(Network::Mainnet),
            // onekey reports signet accounts as testnet
            Some("testnet") | Some("signet") => Ok(Network::Signet),
            other => Err(WalletError::UnsupportedNetwork(format!(
                "onekey network {:?}",
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
impl BtcProvider for OneKeyProvider {
    async fn sign_psbt(&self, psbt_hex: &str) -> Result<String, WalletError> {
        self.connected()?;
        if psbt_hex.is_empty() {
            return Err(WalletError::InvalidInput("psbt hex is required".to_string()));
        }

        let result = self.extension.request("signPsbt", json!([psbt_hex])).await?;
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
            .request("signPsbts", json!([psbt_hexes]))
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

    async fn get_inscriptions(&self) -> Result<Vec<InscriptionIdentifier>, WalletError> {
        self.connected()?;
        if self.config.network != Network::Mainnet {
            return Err(WalletError::UnsupportedCapability(format!(
                "Inscriptions are only available on {} BTC mainnet",
                WALLET_NAME
            )));
        }

        fetch_inscriptions(&self.extension, "getInscriptions", WALLET_NAME).await
    }
}
