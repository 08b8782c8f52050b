//! Passthrough adapter for host pages that inject an object already
//! speaking the uniform provider contract (under "btcwallet"). Nothing is
//! cached or validated here; the injected object owns its own state.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::config::BtcConfig;
use crate::core::context::{AccountChangedCallback, ExtensionRpc};
use crate::core::errors::WalletError;
use crate::core::types::{InscriptionIdentifier, Network, SignatureType};
use crate::providers::{BtcProvider, Provider};

pub struct InjectableBtcProvider {
    extension: Arc<dyn ExtensionRpc>,
}

impl InjectableBtcProvider {
    pub fn new(
        handle: Option<Arc<dyn ExtensionRpc>>,
        _config: &BtcConfig,
    ) -> Result<Self, WalletError> {
        let extension = handle.ok_or_else(|| {
            WalletError::ExtensionNotFound("No injectable BTC wallet found".to_string())
        })?;

        Ok(Self { extension })
    }

    async fn request_string(&self, method: &str, params: Value) -> Result<String, WalletError> {
        let result = self.extension.request(method, params).await?;
        result.as_str().map(str::to_string).ok_or_else(|| {
            WalletError::ExtensionError(format!("{} returned no string", method))
        })
    }
}

#[async_trait]
impl Provider for InjectableBtcProvider {
    async fn connect_wallet(&self) -> Result<(), WalletError> {
        self.extension.request("connectWallet", Value::Null).await?;
        Ok(())
    }

    async fn get_address(&self) -> Result<String, WalletError> {
        self.request_string("getAddress", Value::Null).await
    }

    async fn get_public_key_hex(&self) -> Result<String, WalletError> {
        self.request_string("getPublicKeyHex", Value::Null).await
    }

    async fn get_network(&self) -> Result<Network, WalletError> {
        let network = self.extension.request("getNetwork", Value::Null).await?;

        serde_json::from_value(network.clone())
            .map_err(|_| WalletError::UnsupportedNetwork(format!("injectable network {}", network)))
    }

    async fn sign_message(
        &self,
        message: &str,
        sig_type: SignatureType,
    ) -> Result<String, WalletError> {
        self.request_string("signMessage", json!([message, sig_type.as_str()]))
            .await
    }

    fn on_account_changed(&self, callback: AccountChangedCallback) -> Result<(), WalletError> {
        self.extension.subscribe("accountChanged", callback);
        Ok(())
    }

    fn off_account_changed(&self, callback: &AccountChangedCallback) -> Result<(), WalletError> {
        self.extension.unsubscribe("accountChanged", callback);
        Ok(())
    }

    async fn provider_name(&self) -> Result<String, WalletError> {
        self.request_string("getWalletProviderName", Value::Null)
            .await
    }

    async fn provider_icon(&self) -> Result<String, WalletError> {
        self.request_string("getWalletProviderIcon", Value::Null)
            .await
    }
}

#[async_trait]
impl BtcProvider for InjectableBtcProvider {
    async fn sign_psbt(&self, psbt_hex: &str) -> Result<String, WalletError> {
        self.request_string("signPsbt", json!([psbt_hex])).await
    }

    async fn sign_psbts(&self, psbt_hexes: &[String]) -> Result<Vec<String>, WalletError> {
        let result = self
            .extension
            .request("signPsbts", json!([psbt_hexes]))
            .await?;

        serde_json::from_value(result)
            .map_err(|_| WalletError::ExtensionError("signPsbts returned no array".to_string()))
    }

    async fn get_inscriptions(&self) -> Result<Vec<InscriptionIdentifier>, WalletError> {
        let result = self
            .extension
            .request("getInscriptions", Value::Null)
            .await?;

        serde_json::from_value(result).map_err(WalletError::from)
    }
}
