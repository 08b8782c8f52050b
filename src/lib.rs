//! Wallet-connection library for Bitcoin/Cosmos staking applications.
//!
//! Discovers browser-extension wallets through an injected runtime
//! context, adapts each one behind a uniform provider contract, and
//! drives the connect flow with per-chain connectors, a declarative
//! wallet factory and a screen state machine. All connect failures flow
//! through connector events, never through panics or thrown errors at
//! the connector boundary.

pub mod core;
pub mod providers;
pub mod widget;

pub use crate::core::{
    build_connectors, Account, BbnConfig, BtcConfig, ChainConfig, ChainId, ConnectorEvent,
    Connectors, ExtensionRpc, Network, RuntimeContext, StaticContext, Wallet, WalletConnector,
    WalletError,
};
pub use crate::providers::{BbnProvider, BtcProvider, OfflineSignerHandle, Provider};
pub use crate::widget::{InscriptionPolicy, MemoryStore, WalletWidget, WidgetState};
