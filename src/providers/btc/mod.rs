//! Bitcoin-side wallet adapters and their registry.

pub mod bitget;
pub mod cactus;
pub mod injectable;
pub mod inscriptions;
pub mod keystone;
pub mod okx;
pub mod onekey;
pub mod unisat;

use std::sync::Arc;

use crate::core::config::BtcConfig;
use crate::core::factory::{ChainMetadata, MetaValue, WalletMetadata};
use crate::core::types::{ChainId, Network};
use crate::providers::BtcProvider;

use bitget::BitgetProvider;
use cactus::CactusLinkProvider;
use injectable::InjectableBtcProvider;
use keystone::KeystoneProvider;
use okx::OkxBtcProvider;
use onekey::OneKeyProvider;
use unisat::UnisatProvider;

fn all_networks() -> Vec<Network> {
    vec![Network::Mainnet, Network::Signet]
}

/// The built-in BTC wallet catalog, in display order.
pub fn metadata() -> ChainMetadata<dyn BtcProvider, BtcConfig> {
    ChainMetadata {
        chain: ChainId::Btc,
        name: "Bitcoin",
        icon: "/icons/btc/bitcoin.svg",
        wallets: vec![
            WalletMetadata {
                id: "injectable",
                context_key: Some("btcwallet"),
                label: Some("Injectable"),
                name: MetaValue::ProviderName,
                icon: MetaValue::ProviderIcon,
                docs: "",
                networks: all_networks(),
                create_provider: Arc::new(|handle, config| {
                    InjectableBtcProvider::new(handle, config)
                        .map(|p| Arc::new(p) as Arc<dyn BtcProvider>)
                }),
            },
            WalletMetadata {
                id: "okx",
                context_key: Some("okxwallet"),
                label: None,
                name: MetaValue::Fixed(okx::PROVIDER_NAME),
                icon: MetaValue::Fixed(okx::ICON),
                docs: "https://www.okx.com/web3",
                networks: all_networks(),
                create_provider: Arc::new(|handle, config| {
                    OkxBtcProvider::new(handle, config)
                        .map(|p| Arc::new(p) as Arc<dyn BtcProvider>)
                }),
            },
            WalletMetadata {
                id: "onekey",
                context_key: Some("$onekey.btcwallet"),
                label: None,
                name: MetaValue::Fixed(onekey::PROVIDER_NAME),
                icon: MetaValue::Fixed(onekey::ICON),
                docs: "https://onekey.so/download",
                networks: all_networks(),
                create_provider: Arc::new(|handle, config| {
                    OneKeyProvider::new(handle, config)
                        .map(|p| Arc::new(p) as Arc<dyn BtcProvider>)
                }),
            },
            WalletMetadata {
                id: "bitget",
                context_key: Some("bitkeep.unisat"),
                label: None,
                name: MetaValue::Fixed(bitget::PROVIDER_NAME),
                icon: MetaValue::Fixed(bitget::ICON),
                docs: "https://web3.bitget.com",
                networks: all_networks(),
                create_provider: Arc::new(|handle, config| {
                    BitgetProvider::new(handle, config)
                        .map(|p| Arc::new(p) as Arc<dyn BtcProvider>)
                }),
            },
            WalletMetadata {
                id: "cactus",
                context_key: Some("cactuslink"),
                label: None,
                name: MetaValue::Fixed(cactus::PROVIDER_NAME),
                icon: MetaValue::Fixed(cactus::ICON),
                docs: "https://chromewebstore.google.com/detail/cactus-link/chiilpgkfmcopocdffapngjcbggdehmj",
                networks: all_networks(),
                create_provider: Arc::new(|handle, config| {
                    CactusLinkProvider::new(handle, config)
                        .map(|p| Arc::new(p) as Arc<dyn BtcProvider>)
                }),
            },
            WalletMetadata {
                id: "unisat",
                context_key: Some("unisat"),
                label: None,
                name: MetaValue::Fixed(unisat::PROVIDER_NAME),
                icon: MetaValue::Fixed(unisat::ICON),
                docs: "https://unisat.io/download",
                networks: all_networks(),
                create_provider: Arc::new(|handle, config| {
                    UnisatProvider::new(handle, config)
                        .map(|p| Arc::new(p) as Arc<dyn BtcProvider>)
                }),
            },
            WalletMetadata {
                id: "keystone",
                context_key: Some("keystone"),
                label: Some("Hardware wallet"),
                name: MetaValue::Fixed(keystone::PROVIDER_NAME),
                icon: MetaValue::Fixed(keystone::ICON),
                docs: "https://www.keyst.one/btc-only",
                networks: all_networks(),
                create_provider: Arc::new(|handle, config| {
                    KeystoneProvider::new(handle, config)
                        .map(|p| Arc::new(p) as Arc<dyn BtcProvider>)
                }),
            },
        ],
    }
}
