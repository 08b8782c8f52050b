//! Bitget wallet. Injected under "bitkeep" with a unisat-compatible
//! object at "bitkeep.unisat"; signing goes through Bitget's dapp-sign
//! tunnel rather than a plain signPsbt call, and the returned PSBT is not
//! always finalized, so key-spend inputs are finalized locally.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::core::address::{
    finalize_key_spends, is_finalized, parse_psbt, serialize_psbt, validate_address,
};
use crate::core::config::BtcConfig;
use crate::core::context::{AccountChangedCallback, ExtensionRpc};
use crate::core::errors::WalletError;
use crate::core::types::{Account, InscriptionIdentifier, Network, SignatureType};
use crate::providers::{BtcProvider, Provider};

pub const PROVIDER_NAME: &str = "Bitget";
pub const ICON: &str = "/icons/btc/bitget.svg";

const WALLET_NAME: &str = "Bitget Wallet";

fn internal_network(network: Network) -> &'static str {
    match network {
        Network::Mainnet | Network::Canary => "livenet",
        Network::Testnet => "testnet",
        Network::Signet => "signet",
    }
}

pub struct BitgetProvider {
    extension: Arc<dyn ExtensionRpc>,
    config: BtcConfig,
    wallet_info: Mutex<Option<Account>>,
}

impl BitgetProvider {
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

    fn finalize_response(&self, signed_hex: &str) -> Result<String, WalletError> {
        let mut psbt = parse_psbt(signed_hex)?;
        if !is_finalized(&psbt) {
            finalize_key_spends(&mut psbt)?;
        }
        Ok(serialize_psbt(&psbt))
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
impl Provider for BitgetProvider {
    async fn connect_wallet(&self) -> Result<(), WalletError> {
        let switch = self
            .extension
            .request(
                "switchNetwork",
                json!([internal_network(self.config.network)]),
            )
            .await;
        let request = match switch {
            Ok(_) => self.extension.request("requestAccounts", Value::Null).await,
            Err(error) => Err(error),
        };
        request.map_err(|e| WalletError::from_extension_failure(WALLET_NAME, &e.to_string()))?;

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
            Some("livenet") => Ok(Network::Mainnet),
            Some("testnet") => Ok(Network::Testnet),
            Some("signet") => Ok(Network::Signet),
            other => Err(WalletError::UnsupportedNetwork(format!(
                "bitget network {:?}",
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
impl BtcProvider for BitgetProvider {
    async fn sign_psbt(&self, psbt_hex: &str) -> Result<String, WalletError> {
        let account = self.connected()?;
        if psbt_hex.is_empty() {
            return Err(WalletError::InvalidInput("psbt hex is required".to_string()));
        }

        let data = json!({
            "method": "signPsbt",
            "params": {
                "from": account.address,
                "__internalFunc": "__signPsbt_babylon",
                "psbtHex": psbt_hex,
                "options": { "autoFinalized": true },
            },
        });

        let result = self.extension.request("dappsSign", data).await?;
        let signed = result
            .as_str()
            .ok_or_else(|| WalletError::ExtensionError("dappsSign returned no string".to_string()))?;

        self.finalize_response(signed)
    }

    async fn sign_psbts(&self, psbt_hexes: &[String]) -> Result<Vec<String>, WalletError> {
        let account = self.connected()?;
        if psbt_hexes.is_empty() {
            return Err(WalletError::InvalidInput("psbts hexes are required".to_string()));
        }

        let options: Vec<Value> = psbt_hexes
            .iter()
            .map(|_| json!({ "autoFinalized": true }))
            .collect();
        let data = json!({
            "method": "signPsbt",
            "params": {
                "from": account.address,
                "__internalFunc": "__signPsbts_babylon",
                "psbtHex": "_",
                "psbtHexs": psbt_hexes,
                "options": options,
            },
        });

        let result = self.extension.request("dappsSign", data).await?;
        // the tunnel returns the signed PSBTs as one comma-joined string
        let joined = result
            .as_str()
            .ok_or_else(|| WalletError::ExtensionError("dappsSign returned no string".to_string()))?;

        joined
            .split(',')
            .map(|signed| self.finalize_response(signed))
            .collect()
    }

    async fn get_inscriptions(&self) -> Result<Vec<InscriptionIdentifier>, WalletError> {
        Err(WalletError::UnsupportedCapability(format!(
            "Inscriptions are not available on {}",
            WALLET_NAME
        )))
    }
}
