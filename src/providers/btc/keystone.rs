//! Keystone air-gapped hardware wallet.
//!
//! There is no injected extension: the registry key resolves a QR
//! transport that renders request codes and blocks until the device's
//! response code is scanned. Connecting syncs the device's taproot
//! account xpub; address and key are derived locally, and signed PSBTs
//! come back without final witnesses, so key-spend inputs are finalized
//! here. No persistent connection exists, so account-change subscription
//! is a no-op.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use bitcoin::bip32::{DerivationPath, Fingerprint};
use bitcoin::secp256k1::PublicKey;
use bitcoin::ScriptBuf;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::core::address::{
    finalize_key_spends, parse_psbt, serialize_psbt, taproot_account_from_xpub,
};
use crate::core::config::BtcConfig;
use crate::core::context::{AccountChangedCallback, ExtensionRpc};
use crate::core::errors::WalletError;
use crate::core::types::{Account, InscriptionIdentifier, Network, SignatureType};
use crate::providers::{BtcProvider, Provider};

pub const PROVIDER_NAME: &str = "Keystone";
pub const ICON: &str = "/icons/btc/keystone.svg";

const WALLET_NAME: &str = "Keystone Wallet";

/// Account path relative to the synced xpub: first external taproot address.
const ACCOUNT_PATH: &str = "m/0/0";

#[derive(Clone)]
struct KeystoneWalletInfo {
    mfp: String,
    path: String,
    account: Account,
    script_pubkey_hex: String,
}

pub struct KeystoneProvider {
    transport: Arc<dyn ExtensionRpc>,
    config: BtcConfig,
    wallet_info: Mutex<Option<KeystoneWalletInfo>>,
}

impl KeystoneProvider {
    pub fn new(
        handle: Option<Arc<dyn ExtensionRpc>>,
        config: &BtcConfig,
    ) -> Result<Self, WalletError> {
        let transport = handle.ok_or_else(|| {
            WalletError::ExtensionNotFound("Keystone QR transport not available".to_string())
        })?;

        Ok(Self {
            transport,
            config: config.clone(),
            wallet_info: Mutex::new(None),
        })
    }

    fn connected(&self) -> Result<KeystoneWalletInfo, WalletError> {
        self.wallet_info
            .lock()
            .clone()
            .ok_or_else(|| WalletError::NotConnected(WALLET_NAME.to_string()))
    }

    /// Mark every input paying to our script with the derivation info the
    /// stateless device needs to pick its signing key.
    fn enhance_psbt(
        &self,
        psbt: &mut bitcoin::psbt::Psbt,
        info: &KeystoneWalletInfo,
    ) -> Result<(), WalletError> {
        let script_bytes = hex::decode(&info.script_pubkey_hex)
            .map_err(|e| WalletError::InvalidInput(format!("script pubkey hex: {}", e)))?;
        let script = ScriptBuf::from_bytes(script_bytes);

        let public_key = PublicKey::from_str(&info.account.public_key_hex)
            .map_err(|e| WalletError::InvalidInput(format!("public key hex: {}", e)))?;
        let (internal_key, _parity) = public_key.x_only_public_key();

        let fingerprint = Fingerprint::from_str(&info.mfp)
            .map_err(|e| WalletError::InvalidInput(format!("master fingerprint: {}", e)))?;
        let path = DerivationPath::from_str(&format!("{}/0/0", info.path))
            .map_err(|e| WalletError::InvalidInput(format!("derivation path: {}", e)))?;

        for input in &mut psbt.inputs {
            let pays_us = input
                .witness_utxo
                .as_ref()
                .map(|utxo| utxo.script_pubkey == script)
                .unwrap_or(false);

            if pays_us {
                input.tap_internal_key = Some(internal_key);
                input
                    .tap_key_origins
                    .insert(internal_key, (Vec::new(), (fingerprint, path.clone())));
            }
        }

        Ok(())
    }

    /// One QR round-trip: display the signing request, block until the
    /// device's response code is scanned, return the signed PSBT.
    async fn sign(&self, psbt_hex: &str) -> Result<String, WalletError> {
        let response = self
            .transport
            .request("signPsbtQr", json!([psbt_hex]))
            .await?;

        match response.get("status").and_then(Value::as_str) {
            Some("success") => {}
            Some("canceled") => {
                return Err(WalletError::ConnectionRejected(
                    "Signing on Keystone was canceled".to_string(),
                ))
            }
            _ => {
                return Err(WalletError::ExtensionError(
                    "Error reading QR code, please try again".to_string(),
                ))
            }
        }

        let signed = response
            .get("psbtHex")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WalletError::ExtensionError("QR response carries no PSBT".to_string())
            })?;

        let mut psbt = parse_psbt(signed)?;
        finalize_key_spends(&mut psbt)?;
        Ok(serialize_psbt(&psbt))
    }
}

#[async_trait]
impl Provider for KeystoneProvider {
    async fn connect_wallet(&self) -> Result<(), WalletError> {
        let response = self
            .transport
            .request("readAccountQr", Value::Null)
            .await?;

        match response.get("status").and_then(Value::as_str) {
            Some("success") => {}
            Some("canceled") => {
                return Err(WalletError::ConnectionRejected(
                    "Connection to Keystone was canceled".to_string(),
                ))
            }
            _ => {
                return Err(WalletError::ExtensionError(
                    "Error reading QR code, please try again".to_string(),
                ))
            }
        }

        let xpub = response
            .get("extendedPublicKey")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WalletError::ExtensionError(
                    "Could not retrieve the extended public key".to_string(),
                )
            })?;
        let mfp = response
            .get("masterFingerprint")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let path = response
            .get("path")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let (account, script_pubkey_hex) =
            taproot_account_from_xpub(xpub, ACCOUNT_PATH, self.config.network)?;

        *self.wallet_info.lock() = Some(KeystoneWalletInfo {
            mfp,
            path,
            account,
            script_pubkey_hex,
        });

        Ok(())
    }

    async fn get_address(&self) -> Result<String, WalletError> {
        Ok(self.connected()?.account.address)
    }

    async fn get_public_key_hex(&self) -> Result<String, WalletError> {
        Ok(self.connected()?.account.public_key_hex)
    }

    async fn get_network(&self) -> Result<Network, WalletError> {
        Ok(self.config.network)
    }

    async fn sign_message(
        &self,
        message: &str,
        _sig_type: SignatureType,
    ) -> Result<String, WalletError> {
        let info = self.connected()?;

        let response = self
            .transport
            .request(
                "signMessageQr",
                json!({
                    "signData": hex::encode(message.as_bytes()),
                    "path": format!("{}/0/0", info.path),
                    "xfp": info.mfp,
                    "address": info.account.address,
                }),
            )
            .await?;

        response
            .get("signature")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                WalletError::ExtensionError("QR response carries no signature".to_string())
            })
    }

    // air-gapped: no live extension to emit account changes
    fn on_account_changed(&self, _callback: AccountChangedCallback) -> Result<(), WalletError> {
        Ok(())
    }

    fn off_account_changed(&self, _callback: &AccountChangedCallback) -> Result<(), WalletError> {
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
impl BtcProvider for KeystoneProvider {
    async fn sign_psbt(&self, psbt_hex: &str) -> Result<String, WalletError> {
        let info = self.connected()?;
        if psbt_hex.is_empty() {
            return Err(WalletError::InvalidInput("psbt hex is required".to_string()));
        }

        let mut psbt = parse_psbt(psbt_hex)?;
        self.enhance_psbt(&mut psbt, &info)?;

        self.sign(&serialize_psbt(&psbt)).await
    }

    // one scan/display round per PSBT; the device cannot batch
    async fn sign_psbts(&self, psbt_hexes: &[String]) -> Result<Vec<String>, WalletError> {
        self.connected()?;
        if psbt_hexes.is_empty() {
            return Err(WalletError::InvalidInput("psbts hexes are required".to_string()));
        }

        let mut signed = Vec::with_capacity(psbt_hexes.len());
        for psbt_hex in psbt_hexes {
            signed.push(self.sign_psbt(psbt_hex).await?);
        }
        Ok(signed)
    }

    async fn get_inscriptions(&self) -> Result<Vec<InscriptionIdentifier>, WalletError> {
        Err(WalletError::UnsupportedCapability(format!(
            "Inscriptions are not available on {}",
            WALLET_NAME
        )))
    }
}
