use parking_lot::{Mutex, RwLock};
use tracing::{info, warn};

use crate::core::errors::WalletError;
use crate::core::events::{ConnectorEvent, EventBus, EventHandler, Subscription};
use crate::core::types::ChainId;
use crate::core::wallet::Wallet;
use crate::providers::Provider;

/// Per-chain owner of the wallet list and the current connection state.
///
/// Two states: disconnected (no connected wallet) and connected. Connecting
/// a new wallet while one is connected replaces the reference; the previous
/// wallet is not auto-disconnected (caller responsibility). Overlapping
/// `connect` calls on the same connector are not serialized; the last
/// writer wins.
pub struct WalletConnector<P: ?Sized, C> {
    pub id: ChainId,
    pub name: String,
    pub icon: String,
    pub config: C,
    wallets: RwLock<Vec<Wallet<P>>>,
    connected: Mutex<Option<Wallet<P>>>,
    events: EventBus<P>,
}

impl<P: Provider + ?Sized, C> WalletConnector<P, C> {
    pub fn new(
        id: ChainId,
        name: impl Into<String>,
        icon: impl Into<String>,
        wallets: Vec<Wallet<P>>,
        config: C,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            icon: icon.into(),
            config,
            wallets: RwLock::new(wallets),
            connected: Mutex::new(None),
            events: EventBus::new(),
        }
    }

    /// Snapshot of the wallet list, in declaration order.
    pub fn wallets(&self) -> Vec<Wallet<P>> {
        self.wallets.read().clone()
    }

    /// Snapshot of one wallet by id.
    pub fn wallet(&self, wallet_id: &str) -> Option<Wallet<P>> {
        self.wallets
            .read()
            .iter()
            .find(|wallet| wallet.id == wallet_id)
            .cloned()
    }

    /// Currently connected wallet, if any.
    pub fn connected_wallet(&self) -> Option<Wallet<P>> {
        self.connected.lock().clone()
    }

    pub fn on(&self, handler: EventHandler<P>) -> Subscription {
        self.events.on(handler)
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.events.unsubscribe(subscription);
    }

    /// Connect the wallet with the given id.
    ///
    /// Emits `Connecting` before awaiting the provider, then exactly one of
    /// `Connect` or `Error`. Never returns an error to the caller: every
    /// failure becomes an `Error` event and a `None` result.
    pub async fn connect(&self, wallet_id: &str) -> Option<Wallet<P>> {
        match self.wallet(wallet_id) {
            Some(wallet) => self.connect_target(wallet).await,
            None => {
                let error = WalletError::WalletNotFound(wallet_id.to_string());
                warn!(chain = %self.id, wallet = wallet_id, "connect failed: unknown wallet");
                self.events.emit(&ConnectorEvent::Error { error });
                None
            }
        }
    }

    /// Connect a wallet instance directly (external wallets that are not in
    /// the registry-built list). Same event contract as [`connect`].
    ///
    /// [`connect`]: Self::connect
    pub async fn connect_external(&self, wallet: Wallet<P>) -> Option<Wallet<P>> {
        self.connect_target(wallet).await
    }

    async fn connect_target(&self, mut wallet: Wallet<P>) -> Option<Wallet<P>> {
        self.events.emit(&ConnectorEvent::Connecting {
            message: format!("Connecting {}", wallet.name),
        });

        match wallet.connect().await {
            Ok(()) => {
                // Write the account back into the canonical list so later
                // snapshots observe it.
                {
                    let mut wallets = self.wallets.write();
                    if let Some(slot) = wallets.iter_mut().find(|w| w.id == wallet.id) {
                        slot.account = wallet.account.clone();
                    }
                }
                *self.connected.lock() = Some(wallet.clone());

                info!(chain = %self.id, wallet = %wallet.id, "wallet connected");
                self.events.emit(&ConnectorEvent::Connect {
                    wallet: wallet.clone(),
                });
                Some(wallet)
            }
            Err(error) => {
                warn!(chain = %self.id, wallet = %wallet.id, %error, "connect failed");
                self.events.emit(&ConnectorEvent::Error { error });
                None
            }
        }
    }

    /// Disconnect the current wallet, if any. Emits `Disconnect` while the
    /// wallet is still observable as connected, then clears the reference.
    /// No-op (no events) when already disconnected.
    ///
    /// The wallet's own `account` is intentionally left in place; only the
    /// connector's reference is cleared.
    pub async fn disconnect(&self) {
        let current = self.connected.lock().clone();

        if let Some(wallet) = current {
            info!(chain = %self.id, wallet = %wallet.id, "wallet disconnected");
            self.events.emit(&ConnectorEvent::Disconnect { wallet });
            *self.connected.lock() = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::AccountChangedCallback;
    use crate::core::types::{Network, SignatureType};
    use async_trait::async_trait;
    use parking_lot::Mutex as PlMutex;
    use std::sync::Arc;

    struct ScriptedProvider {
        fail_with: Option<WalletError>,
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        async fn connect_wallet(&self) -> Result<(), WalletError> {
            match &self.fail_with {
                Some(error) => Err(error.clone()),
                None => Ok(()),
            }
        }

        async fn get_address(&self) -> Result<String, WalletError> {
            Ok("bc1qscripted".to_string())
        }

        async fn get_public_key_hex(&self) -> Result<String, WalletError> {
            Ok("02ab".to_string())
        }

        async fn get_network(&self) -> Result<Network, WalletError> {
            Ok(Network::Signet)
        }

        async fn sign_message(
            &self,
            _message: &str,
            _sig_type: SignatureType,
        ) -> Result<String, WalletError> {
            Ok("sig".to_string())
        }

        fn on_account_changed(
            &self,
            _callback: AccountChangedCallback,
        ) -> Result<(), WalletError> {
            Ok(())
        }

        fn off_account_changed(
            &self,
            _callback: &AccountChangedCallback,
        ) -> Result<(), WalletError> {
            Ok(())
        }

        async fn provider_name(&self) -> Result<String, WalletError> {
            Ok("Scripted".to_string())
        }

        async fn provider_icon(&self) -> Result<String, WalletError> {
            Ok(String::new())
        }
    }

    fn wallet(id: &str, provider: Option<ScriptedProvider>) -> Wallet<dyn Provider> {
        Wallet::new(
            id,
            format!("{} Wallet", id),
            "",
            "",
            vec![Network::Signet],
            None,
            provider.map(|p| Arc::new(p) as Arc<dyn Provider>),
        )
    }

    fn connector(wallets: Vec<Wallet<dyn Provider>>) -> WalletConnector<dyn Provider, ()> {
        WalletConnector::new(ChainId::Btc, "Bitcoin", "btc.svg", wallets, ())
    }

    fn record_events(
        connector: &WalletConnector<dyn Provider, ()>,
    ) -> Arc<PlMutex<Vec<String>>> {
        let log = Arc::new(PlMutex::new(Vec::new()));
        let sink = log.clone();
        connector.on(Arc::new(move |event| {
            let tag = match event {
                ConnectorEvent::Connecting { .. } => "connecting".to_string(),
                ConnectorEvent::Connect { wallet } => format!("connect:{}", wallet.id),
                ConnectorEvent::Disconnect { wallet } => format!("disconnect:{}", wallet.id),
                ConnectorEvent::Error { error } => format!("error:{}", error),
            };
            sink.lock().push(tag);
        }));
        log
    }

    #[test_log::test(tokio::test)]
    async fn test_connect_success_event_order() {
        let connector = connector(vec![wallet("w1", Some(ScriptedProvider { fail_with: None }))]);
        let log = record_events(&connector);

        let connected = connector.connect("w1").await.expect("connected");

        assert_eq!(*log.lock(), vec!["connecting", "connect:w1"]);
        assert_eq!(connected.account.as_ref().unwrap().address, "bc1qscripted");
        assert_eq!(connector.connected_wallet().unwrap().id, "w1");
    }

    #[test_log::test(tokio::test)]
    async fn test_connect_unknown_wallet_emits_error_only() {
        let connector = connector(vec![wallet("w1", Some(ScriptedProvider { fail_with: None }))]);
        let log = record_events(&connector);

        let result = connector.connect("missing").await;

        assert!(result.is_none());
        assert_eq!(log.lock().len(), 1);
        assert!(log.lock()[0].starts_with("error:Wallet not found"));
        assert!(connector.connected_wallet().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_connect_not_installed_resolves_none() {
        let connector = connector(vec![wallet("w2", None)]);
        let log = record_events(&connector);

        let result = connector.connect("w2").await;

        assert!(result.is_none());
        assert_eq!(log.lock().len(), 2);
        assert_eq!(log.lock()[0], "connecting");
        assert!(log.lock()[1].starts_with("error:Provider not found"));
        assert!(connector.connected_wallet().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_connect_provider_failure_rolls_back() {
        let connector = connector(vec![wallet(
            "w1",
            Some(ScriptedProvider {
                fail_with: Some(WalletError::ConnectionRejected(
                    "Connection to Scripted was rejected".into(),
                )),
            }),
        )]);
        let log = record_events(&connector);

        let result = connector.connect("w1").await;

        assert!(result.is_none());
        assert_eq!(log.lock()[0], "connecting");
        assert!(log.lock()[1].starts_with("error:Connection rejected"));
        assert!(connector.connected_wallet().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_disconnect_clears_reference_not_account() {
        let connector = connector(vec![wallet("w1", Some(ScriptedProvider { fail_with: None }))]);
        connector.connect("w1").await.unwrap();

        connector.disconnect().await;

        assert!(connector.connected_wallet().is_none());
        // the wallet in the list keeps its stale account (source behavior)
        assert!(connector.wallet("w1").unwrap().account.is_some());
    }

    #[test_log::test(tokio::test)]
    async fn test_disconnect_when_disconnected_is_noop() {
        let connector = connector(vec![wallet("w1", Some(ScriptedProvider { fail_with: None }))]);
        let log = record_events(&connector);

        connector.disconnect().await;

        assert!(log.lock().is_empty());
        assert!(connector.connected_wallet().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_disconnect_event_sees_wallet_still_connected() {
        let connector = Arc::new(connector(vec![wallet(
            "w1",
            Some(ScriptedProvider { fail_with: None }),
        )]));
        connector.connect("w1").await.unwrap();

        let observed = Arc::new(PlMutex::new(None));
        {
            let connector = connector.clone();
            let observed = observed.clone();
            connector.clone().on(Arc::new(move |event| {
                if matches!(event, ConnectorEvent::Disconnect { .. }) {
                    *observed.lock() = Some(connector.connected_wallet().is_some());
                }
            }));
        }

        connector.disconnect().await;

        assert_eq!(*observed.lock(), Some(true));
        assert!(connector.connected_wallet().is_none());
    }

    #[test_log::test(tokio::test)]
    async fn test_connect_replaces_previous_without_disconnect() {
        let connector = connector(vec![
            wallet("w1", Some(ScriptedProvider { fail_with: None })),
            wallet("w2", Some(ScriptedProvider { fail_with: None })),
        ]);
        let log = record_events(&connector);

        connector.connect("w1").await.unwrap();
        connector.connect("w2").await.unwrap();

        assert_eq!(connector.connected_wallet().unwrap().id, "w2");
        // no disconnect event between the two connects
        assert_eq!(
            *log.lock(),
            vec!["connecting", "connect:w1", "connecting", "connect:w2"]
        );
    }

    // Overlapping connects are intentionally unguarded: the last writer wins
    // on the connected reference. This pins down the documented race.
    #[test_log::test(tokio::test)]
    async fn test_overlapping_connects_last_writer_wins() {
        let connector = Arc::new(connector(vec![
            wallet("w1", Some(ScriptedProvider { fail_with: None })),
            wallet("w2", Some(ScriptedProvider { fail_with: None })),
        ]));

        let first = connector.clone();
        let second = connector.clone();
        let (a, b) = tokio::join!(first.connect("w1"), second.connect("w2"));

        assert!(a.is_some());
        assert!(b.is_some());
        let winner = connector.connected_wallet().unwrap().id;
        assert!(winner == "w1" || winner == "w2");
    }
}
