//! Babylon-chain (Cosmos-side) wallet adapters and their registry.

pub mod injectable;
pub mod keplr_compat;

use std::sync::Arc;

use crate::core::config::BbnConfig;
use crate::core::factory::{ChainMetadata, MetaValue, WalletMetadata};
use crate::core::types::{ChainId, Network};
use crate::providers::BbnProvider;

use injectable::InjectableBbnProvider;
use keplr_compat::KeplrCompatProvider;

pub mod keplr {
    pub const PROVIDER_NAME: &str = "Keplr";
    pub const ICON: &str = "/icons/bbn/keplr.svg";
    pub const KEYSTORE_EVENT: &str = "keplr_keystorechange";
}

pub mod leap {
    pub const PROVIDER_NAME: &str = "Leap";
    pub const ICON: &str = "/icons/bbn/leap.svg";
    pub const KEYSTORE_EVENT: &str = "leap_keystorechange";
}

pub mod okx {
    pub const PROVIDER_NAME: &str = "OKX";
    pub const ICON: &str = "/icons/bbn/okx.svg";
    pub const KEYSTORE_EVENT: &str = "keplr_keystorechange";
}

fn all_networks() -> Vec<Network> {
    vec![Network::Mainnet, Network::Signet]
}

/// The built-in BBN wallet catalog, in display order.
pub fn metadata() -> ChainMetadata<dyn BbnProvider, BbnConfig> {
    ChainMetadata {
        chain: ChainId::Bbn,
        name: "Babylon Chain",
        icon: "/icons/bbn/babylon.svg",
        wallets: vec![
            WalletMetadata {
                id: "injectable",
                context_key: Some("bbnwallet"),
                label: Some("Injectable"),
                name: MetaValue::ProviderName,
                icon: MetaValue::ProviderIcon,
                docs: "",
                networks: all_networks(),
                create_provider: Arc::new(|handle, config| {
                    InjectableBbnProvider::new(handle, config)
                        .map(|p| Arc::new(p) as Arc<dyn BbnProvider>)
                }),
            },
            WalletMetadata {
                id: "keplr",
                context_key: Some("keplr"),
                label: None,
                name: MetaValue::Fixed(keplr::PROVIDER_NAME),
                icon: MetaValue::Fixed(keplr::ICON),
                docs: "https://www.keplr.app/",
                networks: all_networks(),
                create_provider: Arc::new(|handle, config| {
                    KeplrCompatProvider::new(
                        handle,
                        config,
                        keplr::PROVIDER_NAME,
                        keplr::ICON,
                        "Keplr Wallet",
                        keplr::KEYSTORE_EVENT,
                    )
                    .map(|p| Arc::new(p) as Arc<dyn BbnProvider>)
                }),
            },
            WalletMetadata {
                id: "leap",
                context_key: Some("leap"),
                label: None,
                name: MetaValue::Fixed(leap::PROVIDER_NAME),
                icon: MetaValue::Fixed(leap::ICON),
                docs: "https://www.leapwallet.io/",
                networks: all_networks(),
                create_provider: Arc::new(|handle, config| {
                    KeplrCompatProvider::new(
                        handle,
                        config,
                        leap::PROVIDER_NAME,
                        leap::ICON,
                        "Leap Wallet",
                        leap::KEYSTORE_EVENT,
                    )
                    .map(|p| Arc::new(p) as Arc<dyn BbnProvider>)
                }),
            },
            WalletMetadata {
                id: "okx",
                context_key: Some("okxwallet.keplr"),
                label: None,
                name: MetaValue::Fixed(okx::PROVIDER_NAME),
                icon: MetaValue::Fixed(okx::ICON),
                docs: "https://www.okx.com/web3",
                networks: all_networks(),
                create_provider: Arc::new(|handle, config| {
                    KeplrCompatProvider::new(
                        handle,
                        config,
                        okx::PROVIDER_NAME,
                        okx::ICON,
                        "OKX Wallet",
                        okx::KEYSTORE_EVENT,
                    )
                    .map(|p| Arc::new(p) as Arc<dyn BbnProvider>)
                }),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_and_keys() {
        let metadata = metadata();
        let ids: Vec<&str> = metadata.wallets.iter().map(|w| w.id).collect();

        assert_eq!(ids, ["injectable", "keplr", "leap", "okx"]);
        assert_eq!(metadata.chain, ChainId::Bbn);
    }
}
