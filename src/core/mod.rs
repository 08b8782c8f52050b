//! Chain-agnostic core: errors, shared types, configs, the injected
//! runtime context, connectors and the wallet factory.

pub mod address;
pub mod config;
pub mod connector;
pub mod context;
pub mod errors;
pub mod events;
pub mod factory;
pub mod types;
pub mod wallet;

pub use config::{BbnConfig, BtcConfig};
pub use connector::WalletConnector;
pub use context::{AccountChangedCallback, ExtensionRpc, RuntimeContext, StaticContext};
pub use errors::WalletError;
pub use events::{ConnectorEvent, EventBus, EventHandler, Subscription};
pub use factory::{
    build_connectors, create_connector, create_wallet, ChainConfig, ChainMetadata, Connectors,
    MetaValue, ProviderFactory, WalletMetadata,
};
pub use types::{Account, ChainId, InscriptionIdentifier, Network, SignatureType};
pub use wallet::{external_wallet, Wallet};
