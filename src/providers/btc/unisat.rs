//! Unisat wallet.
//!
//! Unisat needs explicit per-input signing options: taproot inputs paying
//! to the connected address must be signed with the tweaked key, and
//! already-final inputs must be excluded from the request.

use std::sync::Arc;

use async_trait::async_trait;
use bitcoin::Address;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::core::address::{ensure_finalized, parse_psbt, validate_address};
use crate::core::config::BtcConfig;
use crate::core::context::{AccountChangedCallback, ExtensionRpc};
use crate::core::errors::WalletError;
use crate::core::types::{Account, InscriptionIdentifier, Network, SignatureType};
use crate::providers::btc::inscriptions::fetch_inscriptions;
use crate::providers::{BtcProvider, Provider};

pub const PROVIDER_NAME: &str = "Unisat";
pub const ICON: &str = "/icons/btc/unisat.svg";

const WALLET_NAME: &str = "Unisat Wallet";

pub struct UnisatProvider {
    extension: Arc<dyn ExtensionRpc>,
    config: BtcConfig,
    wallet_info: Mutex<Option<Account>>,
}

impl UnisatProvider {
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

    /// Per-input signing options: skip final inputs, tweak the signer for
    /// taproot inputs spending from the connected address.
    fn sign_options(
        &self,
        psbt_hex: &str,
        network: Network,
        account: &Account,
    ) -> Result<Value, WalletError> {
        let psbt = parse_psbt(psbt_hex)?;
        // unisat exposes signet accounts under testnet address params
        let btc_network = match network {
            Network::Mainnet | Network::Canary => bitcoin::Network::Bitcoin,
            Network::Testnet | Network::Signet => bitcoin::Network::Testnet,
        };

        let mut to_sign_inputs = Vec::new();
        for (index, input) in psbt.inputs.iter().enumerate() {
            if input.final_script_sig.is_some() || input.final_script_witness.is_some() {
                continue;
            }

            let mut use_tweaked_signer = false;
            if let Some(utxo) = &input.witness_utxo {
                if let Ok(address) = Address::from_script(&utxo.script_pubkey, btc_network) {
                    let address = address.to_string();
                    let is_taproot = address.starts_with("bc1p") || address.starts_with("tb1p");
                    use_tweaked_signer = is_taproot && address == account.address;
                }
            }

            to_sign_inputs.push(json!({
                "index": index,
                "publicKey": account.public_key_hex,
                "sighashTypes": Value::Null,
                "useTweakedSigner": use_tweaked_signer,
            }));
        }

        Ok(json!({
            "autoFinalized": true,
            "toSignInputs": to_sign_inputs,
        }))
    }
}

#[async_trait]
impl Provider for UnisatProvider {
    async fn connect_wallet(&self) -> Result<(), WalletError> {
        let accounts = self
            .extension
            .request("requestAccounts", Value::Null)
            .await
            .map_err(|e| WalletError::from_extension_failure(WALLET_NAME, &e.to_string()))?;

        let address = accounts
            .as_array()
            .and_then(|list| list.first())
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WalletError::ExtensionError(format!("Could not connect to {}", WALLET_NAME))
            })?;
        validate_address(self.config.network, address)?;

        let public_key = self.extension.request("getPublicKey", Value::Null).await?;
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
        let chain = self.extension.request("getChain", Value::Null).await?;

        match chain.get("enum").and_then(Value::as_str) {
            Some("BITCOIN_MAINNET") => Ok(Network::Mainnet),
            // the staking deployment treats unisat testnet accounts as signet
            Some("BITCOIN_SIGNET") | Some("BITCOIN_TESTNET") => Ok(Network::Signet),
            other => Err(WalletError::UnsupportedNetwork(format!(
                "unisat chain {:?}",
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
impl BtcProvider for UnisatProvider {
    async fn sign_psbt(&self, psbt_hex: &str) -> Result<String, WalletError> {
        let account = self.connected()?;
        if psbt_hex.is_empty() {
            return Err(WalletError::InvalidInput("psbt hex is required".to_string()));
        }

        let network = self.get_network().await?;
        let options = self.sign_options(psbt_hex, network, &account)?;

        let result = self
            .extension
            .request("signPsbt", json!([psbt_hex, options]))
            .await?;
        let signed = result
            .as_str()
            .ok_or_else(|| WalletError::ExtensionError("signPsbt returned no string".to_string()))?;

        ensure_finalized(WALLET_NAME, signed)
    }

    async fn sign_psbts(&self, psbt_hexes: &[String]) -> Result<Vec<String>, WalletError> {
        let account = self.connected()?;
        if psbt_hexes.is_empty() {
            return Err(WalletError::InvalidInput("psbts hexes are required".to_string()));
        }

        let network = self.get_network().await?;
        let options = psbt_hexes
            .iter()
            .map(|hex| self.sign_options(hex, network, &account))
            .collect::<Result<Vec<Value>, WalletError>>()?;

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
