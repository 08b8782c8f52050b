use serde::{Deserialize, Serialize};

use crate::core::types::Network;

/// Bitcoin chain configuration, passed verbatim to BTC provider adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BtcConfig {
    pub coin_name: String,
    pub coin_symbol: String,
    pub network_name: String,
    pub mempool_api_url: String,
    pub network: Network,
}

impl Default for BtcConfig {
    fn default() -> Self {
        Self {
            coin_name: "Signet BTC".to_string(),
            coin_symbol: "sBTC".to_string(),
            network_name: "BTC signet".to_string(),
            mempool_api_url: "https://mempool.space/signet".to_string(),
            network: Network::Signet,
        }
    }
}

/// Cosmos-side chain configuration, passed verbatim to BBN provider adapters.
///
/// `chain_data` is the full chain-registration document handed to the
/// extension's suggest-chain call; the connector never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BbnConfig {
    pub chain_id: String,
    pub rpc: String,
    pub chain_data: serde_json::Value,
    pub network_name: String,
    pub network_full_name: String,
    pub coin_symbol: String,
    pub network: Network,
}

impl Default for BbnConfig {
    fn default() -> Self {
        Self {
            chain_id: "bbn-test-5".to_string(),
            rpc: "https://rpc.testnet.babylonlabs.io".to_string(),
            chain_data: serde_json::json!({
                "chainId": "bbn-test-5",
                "chainName": "Babylon Phase-2 Testnet",
            }),
            network_name: "BBN".to_string(),
            network_full_name: "Babylon Chain".to_string(),
            coin_symbol: "BBN".to_string(),
            network: Network::Signet,
        }
    }
}
