use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported Bitcoin-side networks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Canary,
    Testnet,
    Signet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mainnet => "mainnet",
            Network::Canary => "canary",
            Network::Testnet => "testnet",
            Network::Signet => "signet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chain tag owned by one connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainId {
    #[serde(rename = "BTC")]
    Btc,
    #[serde(rename = "BBN")]
    Bbn,
}

impl ChainId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChainId::Btc => "BTC",
            ChainId::Bbn => "BBN",
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connected-account snapshot: set on a wallet after a successful connect.
/// Also doubles as the adapter-internal cached wallet info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    #[serde(rename = "publicKeyHex")]
    pub public_key_hex: String,
}

/// Identifies one inscription-bearing UTXO (ordinals/BRC-20/runes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InscriptionIdentifier {
    /// Hash of the transaction that holds the inscription.
    pub txid: String,
    /// Index of the output in the transaction.
    pub vout: u32,
}

/// Signing scheme accepted by `sign_message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureType {
    Ecdsa,
}

impl SignatureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureType::Ecdsa => "ecdsa",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Network::Signet).unwrap(), "\"signet\"");
        let net: Network = serde_json::from_str("\"mainnet\"").unwrap();
        assert_eq!(net, Network::Mainnet);
    }

    #[test]
    fn test_chain_id_tags() {
        assert_eq!(ChainId::Btc.to_string(), "BTC");
        assert_eq!(ChainId::Bbn.to_string(), "BBN");
        assert_eq!(serde_json::to_string(&ChainId::Bbn).unwrap(), "\"BBN\"");
    }

    #[test]
    fn test_account_field_names() {
        let account = Account {
            address: "bc1qtest".into(),
            public_key_hex: "02ab".into(),
        };
        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains("publicKeyHex"));
    }
}
