//! Shared adapter for Keplr-API-compatible Cosmos wallets (Keplr, Leap
//! and OKX's embedded keplr object). The wallets differ only in their
//! injection key, display identity and keystore-change event name.
//!
//! Connecting enables the configured chain; if the wallet does not know
//! the chain, it is suggested once and enable is retried once. A second
//! failure is fatal, no further retries.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::core::config::BbnConfig;
use crate::core::context::{AccountChangedCallback, ExtensionRpc};
use crate::core::errors::WalletError;
use crate::core::types::{Account, Network, SignatureType};
use crate::providers::{BbnProvider, OfflineSignerHandle, Provider};

pub struct KeplrCompatProvider {
    extension: Arc<dyn ExtensionRpc>,
    config: BbnConfig,
    provider_name: &'static str,
    icon: &'static str,
    wallet_name: &'static str,
    keystore_event: &'static str,
    wallet_info: Mutex<Option<Account>>,
}

fn pubkey_hex(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Array(items) => {
            let bytes: Option<Vec<u8>> = items
                .iter()
                .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect();
            bytes.filter(|b| !b.is_empty()).map(hex::encode)
        }
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

impl KeplrCompatProvider {
    pub fn new(
        handle: Option<Arc<dyn ExtensionRpc>>,
        config: &BbnConfig,
        provider_name: &'static str,
        icon: &'static str,
        wallet_name: &'static str,
        keystore_event: &'static str,
    ) -> Result<Self, WalletError> {
        let extension = handle.ok_or_else(|| {
            WalletError::ExtensionNotFound(format!("{} extension not found", wallet_name))
        })?;

        Ok(Self {
            extension,
            config: config.clone(),
            provider_name,
            icon,
            wallet_name,
            keystore_event,
            wallet_info: Mutex::new(None),
        })
    }

    fn connected(&self) -> Result<Account, WalletError> {
        self.wallet_info
            .lock()
            .clone()
            .ok_or_else(|| WalletError::NotConnected(self.wallet_name.to_string()))
    }

    async fn enable_chain(&self) -> Result<(), WalletError> {
        let chain_id = &self.config.chain_id;

        let error = match self.extension.request("enable", json!([chain_id])).await {
            Ok(_) => return Ok(()),
            Err(error) => error,
        };

        let message = error.to_string();
        if message.contains(chain_id.as_str()) {
            // chain unknown to the wallet: suggest it and retry enable once
            let remediated = async {
                self.extension
                    .request(
                        "experimentalSuggestChain",
                        json!([self.config.chain_data.clone()]),
                    )
                    .await?;
                self.extension.request("enable", json!([chain_id])).await
            }
            .await;

            remediated.map(|_| ()).map_err(|_| {
                WalletError::ChainRegistrationFailed("Failed to add BBN chain".to_string())
            })
        } else if message.contains("rejected") {
            Err(WalletError::ConnectionRejected(format!(
                "{} connection request rejected",
                self.wallet_name
            )))
        } else if message.contains("context invalidated") {
            Err(WalletError::ExtensionError(format!(
                "{} extension context invalidated",
                self.wallet_name
            )))
        } else {
            Err(WalletError::ExtensionError(message))
        }
    }
}

#[async_trait]
impl Provider for KeplrCompatProvider {
    async fn connect_wallet(&self) -> Result<(), WalletError> {
        self.enable_chain().await?;

        let key = self
            .extension
            .request("getKey", json!([self.config.chain_id]))
            .await
            .map_err(|_| {
                WalletError::ExtensionError(format!("Failed to get {} key", self.wallet_name))
            })?;

        let address = key
            .get("bech32Address")
            .and_then(Value::as_str)
            .filter(|a| !a.is_empty());
        let public_key = pubkey_hex(key.get("pubKey"));

        match (address, public_key) {
            (Some(address), Some(public_key_hex)) => {
                *self.wallet_info.lock() = Some(Account {
                    address: address.to_string(),
                    public_key_hex,
                });
                Ok(())
            }
            _ => Err(WalletError::ExtensionError(format!(
                "Could not connect to {}",
                self.wallet_name
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
        _sig_type: SignatureType,
    ) -> Result<String, WalletError> {
        let account = self.connected()?;

        let result = self
            .extension
            .request(
                "signArbitrary",
                json!([self.config.chain_id, account.address, message]),
            )
            .await?;

        result
            .get("signature")
            .and_then(Value::as_str)
            .or_else(|| result.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                WalletError::ExtensionError("signArbitrary returned no signature".to_string())
            })
    }

    fn on_account_changed(&self, callback: AccountChangedCallback) -> Result<(), WalletError> {
        self.connected()?;
        self.extension.subscribe(self.keystore_event, callback);
        Ok(())
    }

    fn off_account_changed(&self, callback: &AccountChangedCallback) -> Result<(), WalletError> {
        self.connected()?;
        self.extension.unsubscribe(self.keystore_event, callback);
        Ok(())
    }

    async fn provider_name(&self) -> Result<String, WalletError> {
        Ok(self.provider_name.to_string())
    }

    async fn provider_icon(&self) -> Result<String, WalletError> {
        Ok(self.icon.to_string())
    }
}

#[async_trait]
impl BbnProvider for KeplrCompatProvider {
    async fn get_offline_signer(&self) -> Result<OfflineSignerHandle, WalletError> {
        Ok(OfflineSignerHandle {
            chain_id: self.config.chain_id.clone(),
            extension: self.extension.clone(),
        })
    }
}
