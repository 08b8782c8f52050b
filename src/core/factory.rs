//! Builds connectors and their wallets from declarative per-chain metadata
//! plus the runtime context extensions inject themselves into.

use std::sync::Arc;

use tracing::{debug, info};

use crate::core::config::{BbnConfig, BtcConfig};
use crate::core::connector::WalletConnector;
use crate::core::context::{ExtensionRpc, RuntimeContext};
use crate::core::errors::WalletError;
use crate::core::types::{ChainId, Network};
use crate::core::wallet::Wallet;
use crate::providers::{bbn, btc, BbnProvider, BtcProvider, Provider};

/// Constructs one provider adapter from the resolved extension handle and
/// the chain config. A [`WalletError::ExtensionNotFound`] return marks the
/// wallet as not installed; any other error fails the factory.
pub type ProviderFactory<P, C> =
    Arc<dyn Fn(Option<Arc<dyn ExtensionRpc>>, &C) -> Result<Arc<P>, WalletError> + Send + Sync>;

/// A metadata field that is either fixed or resolved from the constructed
/// provider (used by the injectable wallets, whose display identity only
/// the injected object knows).
#[derive(Clone)]
pub enum MetaValue {
    Fixed(&'static str),
    ProviderName,
    ProviderIcon,
}

/// Declarative description of one selectable wallet.
pub struct WalletMetadata<P: ?Sized, C> {
    pub id: &'static str,
    /// Runtime-context key the extension injects itself under. `None` means
    /// the provider is constructed without an injected object.
    pub context_key: Option<&'static str>,
    pub label: Option<&'static str>,
    pub name: MetaValue,
    pub icon: MetaValue,
    pub docs: &'static str,
    pub networks: Vec<Network>,
    pub create_provider: ProviderFactory<P, C>,
}

/// Declarative description of one chain: identity plus its ordered wallets.
pub struct ChainMetadata<P: ?Sized, C> {
    pub chain: ChainId,
    pub name: &'static str,
    pub icon: &'static str,
    pub wallets: Vec<WalletMetadata<P, C>>,
}

async fn resolve_meta<P: Provider + ?Sized>(
    value: &MetaValue,
    provider: Option<&Arc<P>>,
) -> Result<String, WalletError> {
    match (value, provider) {
        (MetaValue::Fixed(text), _) => Ok((*text).to_string()),
        (MetaValue::ProviderName, Some(provider)) => provider.provider_name().await,
        (MetaValue::ProviderIcon, Some(provider)) => provider.provider_icon().await,
        // not installed: nothing to ask, the wallet is never selectable
        (_, None) => Ok(String::new()),
    }
}

fn build_provider<P: ?Sized, C>(
    factory: &ProviderFactory<P, C>,
    origin: Option<Arc<dyn ExtensionRpc>>,
    config: &C,
) -> Result<Option<Arc<P>>, WalletError> {
    match factory(origin, config) {
        Ok(provider) => Ok(Some(provider)),
        Err(error) if error.is_not_installed() => Ok(None),
        Err(error) => Err(error),
    }
}

/// Build one wallet from its metadata. Adapter construction is eager: it
/// happens here, before the user elects to connect, and an absent extension
/// yields `installed = false` rather than an error.
pub async fn create_wallet<P: Provider + ?Sized, C>(
    metadata: &WalletMetadata<P, C>,
    context: &dyn RuntimeContext,
    config: &C,
) -> Result<Wallet<P>, WalletError> {
    let origin = metadata.context_key.and_then(|key| context.resolve(key));

    let provider = match (metadata.context_key, origin) {
        (Some(_), Some(handle)) => build_provider(&metadata.create_provider, Some(handle), config)?,
        (Some(_), None) => None,
        (None, _) => build_provider(&metadata.create_provider, None, config)?,
    };

    let name = resolve_meta(&metadata.name, provider.as_ref()).await?;
    let icon = resolve_meta(&metadata.icon, provider.as_ref()).await?;

    debug!(
        wallet = metadata.id,
        installed = provider.is_some(),
        "wallet built"
    );

    Ok(Wallet::new(
        metadata.id,
        name,
        icon,
        metadata.docs,
        metadata.networks.clone(),
        metadata.label.map(str::to_string),
        provider,
    ))
}

/// Build the connector for one chain: every wallet is constructed
/// concurrently (fan-out, then join), preserving declaration order.
/// Individual wallet construction failure never fails the chain; only an
/// unexpected metadata-resolution error does.
pub async fn create_connector<P: Provider + ?Sized, C: Clone>(
    metadata: &ChainMetadata<P, C>,
    context: &dyn RuntimeContext,
    config: C,
) -> Result<WalletConnector<P, C>, WalletError> {
    let wallets: Vec<Wallet<P>> = futures::future::try_join_all(
        metadata
            .wallets
            .iter()
            .map(|wallet| create_wallet(wallet, context, &config)),
    )
    .await?;

    info!(
        chain = %metadata.chain,
        wallets = wallets.len(),
        installed = wallets.iter().filter(|w| w.installed()).count(),
        "connector built"
    );

    Ok(WalletConnector::new(
        metadata.chain,
        metadata.name,
        metadata.icon,
        wallets,
        config,
    ))
}

/// Per-chain configuration handed to [`build_connectors`].
#[derive(Debug, Clone)]
pub enum ChainConfig {
    Btc(BtcConfig),
    Bbn(BbnConfig),
}

/// The connector set for all configured chains. Built once at application
/// mount and shared read-only afterwards; wallet lists are static for the
/// session.
#[derive(Default)]
pub struct Connectors {
    pub btc: Option<Arc<WalletConnector<dyn BtcProvider, BtcConfig>>>,
    pub bbn: Option<Arc<WalletConnector<dyn BbnProvider, BbnConfig>>>,
}

/// Build every configured chain's connector against the built-in wallet
/// registries. Chains without a config entry are skipped silently; the two
/// chains are built concurrently.
pub async fn build_connectors(
    configs: &[ChainConfig],
    context: &dyn RuntimeContext,
) -> Result<Connectors, WalletError> {
    let btc_config = configs.iter().find_map(|entry| match entry {
        ChainConfig::Btc(config) => Some(config.clone()),
        ChainConfig::Bbn(_) => None,
    });
    let bbn_config = configs.iter().find_map(|entry| match entry {
        ChainConfig::Bbn(config) => Some(config.clone()),
        ChainConfig::Btc(_) => None,
    });

    let btc_task = async {
        match btc_config {
            Some(config) => create_connector(&btc::metadata(), context, config)
                .await
                .map(|connector| Some(Arc::new(connector))),
            None => {
                debug!(chain = %ChainId::Btc, "no config, chain skipped");
                Ok(None)
            }
        }
    };
    let bbn_task = async {
        match bbn_config {
            Some(config) => create_connector(&bbn::metadata(), context, config)
                .await
                .map(|connector| Some(Arc::new(connector))),
            None => {
                debug!(chain = %ChainId::Bbn, "no config, chain skipped");
                Ok(None)
            }
        }
    };

    let (btc, bbn) = futures::try_join!(btc_task, bbn_task)?;

    Ok(Connectors { btc, bbn })
}
