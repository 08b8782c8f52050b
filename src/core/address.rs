//! Bitcoin address and PSBT helpers shared by the BTC provider adapters.

use std::str::FromStr;

use bitcoin::bip32::{DerivationPath, Xpub};
use bitcoin::psbt::Psbt;
use bitcoin::secp256k1::Secp256k1;
use bitcoin::{Address, Witness};

use crate::core::errors::WalletError;
use crate::core::types::{Account, Network};

/// Map the uniform network enum onto the bitcoin crate's network type.
/// Canary is a mainnet deployment and shares its address space.
pub fn to_bitcoin_network(network: Network) -> bitcoin::Network {
    match network {
        Network::Mainnet | Network::Canary => bitcoin::Network::Bitcoin,
        Network::Testnet => bitcoin::Network::Testnet,
        Network::Signet => bitcoin::Network::Signet,
    }
}

/// Check that `address` parses and belongs to the configured network.
/// Adapters call this on every address an extension hands back.
pub fn validate_address(network: Network, address: &str) -> Result<(), WalletError> {
    let unchecked = Address::from_str(address)
        .map_err(|e| WalletError::InvalidAddress(format!("{}: {}", address, e)))?;

    unchecked
        .require_network(to_bitcoin_network(network))
        .map_err(|_| {
            WalletError::AddressMismatch(format!(
                "Incorrect address prefix for {}, address: {}",
                network, address
            ))
        })?;

    Ok(())
}

/// Parse a hex-encoded PSBT.
pub fn parse_psbt(psbt_hex: &str) -> Result<Psbt, WalletError> {
    if psbt_hex.is_empty() {
        return Err(WalletError::InvalidInput("psbt hex is required".to_string()));
    }
    let bytes = hex::decode(psbt_hex)
        .map_err(|e| WalletError::InvalidInput(format!("psbt hex: {}", e)))?;
    Psbt::deserialize(&bytes).map_err(|e| WalletError::InvalidInput(format!("psbt: {}", e)))
}

/// Serialize a PSBT back to hex.
pub fn serialize_psbt(psbt: &Psbt) -> String {
    hex::encode(psbt.serialize())
}

/// Whether every input carries final script data.
pub fn is_finalized(psbt: &Psbt) -> bool {
    psbt.inputs
        .iter()
        .all(|input| input.final_script_sig.is_some() || input.final_script_witness.is_some())
}

/// Contract check for adapters whose extension claims to auto-finalize:
/// the returned hex must always be a fully finalized PSBT.
pub fn ensure_finalized(wallet_name: &str, psbt_hex: &str) -> Result<String, WalletError> {
    let psbt = parse_psbt(psbt_hex)?;
    if !is_finalized(&psbt) {
        return Err(WalletError::SigningFailed(format!(
            "{} returned a PSBT with unfinalized inputs",
            wallet_name
        )));
    }
    Ok(psbt_hex.to_string())
}

/// Finalize taproot key-spend inputs in place: a key-path signature becomes
/// the single witness element. Inputs that are already final are untouched;
/// an input with neither a signature nor final data is an error.
pub fn finalize_key_spends(psbt: &mut Psbt) -> Result<(), WalletError> {
    for (index, input) in psbt.inputs.iter_mut().enumerate() {
        if input.final_script_sig.is_some() || input.final_script_witness.is_some() {
            continue;
        }

        let signature = input.tap_key_sig.ok_or_else(|| {
            WalletError::SigningFailed(format!("input {} is missing a taproot signature", index))
        })?;

        input.final_script_witness = Some(Witness::from_slice(&[signature.to_vec()]));
        input.tap_key_sig = None;
        input.tap_internal_key = None;
        input.tap_key_origins.clear();
        input.partial_sigs.clear();
        input.bip32_derivation.clear();
    }

    Ok(())
}

/// Derive the first taproot account (`path` under the synced xpub) the way
/// air-gapped devices expose it: address, compressed public key and
/// script pubkey, all hex/string encoded.
pub fn taproot_account_from_xpub(
    xpub: &str,
    path: &str,
    network: Network,
) -> Result<(Account, String), WalletError> {
    let secp = Secp256k1::verification_only();

    let xpub = Xpub::from_str(xpub)
        .map_err(|e| WalletError::InvalidInput(format!("extended public key: {}", e)))?;
    let path = DerivationPath::from_str(path)
        .map_err(|e| WalletError::InvalidInput(format!("derivation path: {}", e)))?;

    let derived = xpub
        .derive_pub(&secp, &path)
        .map_err(|e| WalletError::InvalidInput(format!("derivation: {}", e)))?;

    let (internal_key, _parity) = derived.public_key.x_only_public_key();
    let address = Address::p2tr(&secp, internal_key, None, to_bitcoin_network(network));

    let account = Account {
        address: address.to_string(),
        public_key_hex: hex::encode(derived.public_key.serialize()),
    };
    let script_pubkey_hex = hex::encode(address.script_pubkey().as_bytes());

    Ok((account, script_pubkey_hex))
}
