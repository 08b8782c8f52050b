//! Passthrough adapter for host pages injecting a ready-made Cosmos
//! provider under "bbnwallet".

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::config::BbnConfig;
use crate::core::context::{AccountChangedCallback, ExtensionRpc};
use crate::core::errors::WalletError;
use crate::core::types::{Network, SignatureType};
use crate::providers::{BbnProvider, OfflineSignerHandle, Provider};

pub struct InjectableBbnProvider {
    extension: Arc<dyn ExtensionRpc>,
    chain_id: String,
}

impl InjectableBbnProvider {
    pub fn new(
        handle: Option<Arc<dyn ExtensionRpc>>,
        config: &BbnConfig,
    ) -> Result<Self, WalletError> {
        let extension = handle.ok_or_else(|| {
            WalletError::ExtensionNotFound("No injectable BBN wallet found".to_string())
        })?;

        Ok(Self {
            extension,
            chain_id: config.chain_id.clone(),
        })
    }

    async fn request_string(&self, method: &str, params: Value) -> Result<String, WalletError> {
        let result = self.extension.request(method, params).await?;
        result.as_str().map(str::to_string).ok_or_else(|| {
            WalletError::ExtensionError(format!("{} returned no string", method))
        })
    }
}

#[async_trait]
impl Provider for InjectableBbnProvider {
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
impl BbnProvider for InjectableBbnProvider {
    async fn get_offline_signer(&self) -> Result<OfflineSignerHandle, WalletError> {
        Ok(OfflineSignerHandle {
            chain_id: self.chain_id.clone(),
            extension: self.extension.clone(),
        })
    }
}
