//! The widget controller: owns the screen state, listens to connector
//! events and exposes the actions the presentation layer calls.
//!
//! Connector events drive the screen routing: connecting shows the
//! loader; a BTC connect shows the inscriptions screen (unless the user
//! opted out) while any other terminal event routes back to chain
//! selection. Errors are forwarded to the host's callback and never
//! dead-end the flow.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::core::connector::WalletConnector;
use crate::core::errors::WalletError;
use crate::core::events::ConnectorEvent;
use crate::core::factory::Connectors;
use crate::core::types::ChainId;
use crate::core::wallet::Wallet;
use crate::providers::Provider;
use crate::widget::inscriptions::InscriptionPolicy;
use crate::widget::state::{ChainDescriptor, SelectedWallet, WidgetState};

pub type ErrorCallback = Arc<dyn Fn(&WalletError) + Send + Sync>;

pub struct WalletWidget {
    state: Mutex<WidgetState>,
    connectors: Arc<Connectors>,
    inscriptions: InscriptionPolicy,
    on_error: Option<ErrorCallback>,
}

fn selected_from<P: ?Sized>(wallet: &Wallet<P>) -> SelectedWallet {
    SelectedWallet {
        id: wallet.id.clone(),
        name: wallet.name.clone(),
        icon: wallet.icon.clone(),
        account: wallet.account.clone(),
    }
}

fn descriptor<P: ?Sized, C>(connector: &WalletConnector<P, C>) -> ChainDescriptor {
    ChainDescriptor {
        id: connector.id,
        name: connector.name.clone(),
        icon: connector.icon.clone(),
    }
}

impl WalletWidget {
    pub fn new(
        connectors: Arc<Connectors>,
        inscriptions: InscriptionPolicy,
        on_error: Option<ErrorCallback>,
    ) -> Arc<Self> {
        let mut chains = HashMap::new();
        if let Some(connector) = &connectors.btc {
            chains.insert(ChainId::Btc, descriptor(connector.as_ref()));
        }
        if let Some(connector) = &connectors.bbn {
            chains.insert(ChainId::Bbn, descriptor(connector.as_ref()));
        }

        let widget = Arc::new(Self {
            state: Mutex::new(WidgetState::new(chains)),
            connectors,
            inscriptions,
            on_error,
        });
        widget.bind();
        widget
    }

    /// Wire connector events into screen routing. Handlers hold a weak
    /// reference: a late event after the widget is gone is dropped.
    fn bind(self: &Arc<Self>) {
        if let Some(connector) = &self.connectors.btc {
            let widget: Weak<Self> = Arc::downgrade(self);
            connector.on(Arc::new(move |event| {
                if let Some(widget) = widget.upgrade() {
                    widget.handle_event(ChainId::Btc, event);
                }
            }));
        }
        if let Some(connector) = &self.connectors.bbn {
            let widget: Weak<Self> = Arc::downgrade(self);
            connector.on(Arc::new(move |event| {
                if let Some(widget) = widget.upgrade() {
                    widget.handle_event(ChainId::Bbn, event);
                }
            }));
        }
    }

    fn handle_event<P: Provider + ?Sized>(&self, chain: ChainId, event: &ConnectorEvent<P>) {
        match event {
            ConnectorEvent::Connecting { message } => {
                self.state.lock().display_loader(message.clone());
            }
            ConnectorEvent::Connect { wallet } => {
                let mut state = self.state.lock();
                state.select_wallet(chain, selected_from(wallet));

                if chain == ChainId::Btc && self.inscriptions.show_again() {
                    state.display_inscriptions();
                } else {
                    state.display_chains();
                }
            }
            ConnectorEvent::Disconnect { .. } => {
                let mut state = self.state.lock();
                state.remove_wallet(chain);
                state.display_chains();
            }
            ConnectorEvent::Error { error } => {
                debug!(%chain, %error, "connect flow error, returning to chain selection");
                if let Some(on_error) = &self.on_error {
                    on_error(error);
                }
                self.state.lock().display_chains();
            }
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> WidgetState {
        self.state.lock().clone()
    }

    /// Open the dialog; a restart always begins from a clean flow.
    pub fn open(&self) {
        let mut state = self.state.lock();
        state.reset();
        state.open();
    }

    /// Hide the dialog without clearing selections; `open` re-enters the
    /// flow from the start.
    pub fn close(&self) {
        self.state.lock().close();
    }

    pub fn confirm(&self) {
        self.state.lock().confirm();
    }

    pub fn display_loader(&self, message: impl Into<String>) {
        self.state.lock().display_loader(message);
    }

    pub fn display_terms_of_service(&self) {
        self.state.lock().display_terms_of_service();
    }

    pub fn display_chains(&self) {
        self.state.lock().display_chains();
    }

    pub fn display_wallets(&self, chain: ChainId) {
        self.state.lock().display_wallets(chain);
    }

    pub fn display_inscriptions(&self) {
        self.state.lock().display_inscriptions();
    }

    pub fn inscriptions(&self) -> &InscriptionPolicy {
        &self.inscriptions
    }

    pub fn selected_wallet(&self, chain: ChainId) -> Option<SelectedWallet> {
        self.state.lock().selected_wallets.get(&chain).cloned()
    }

    /// Every configured chain has a connected wallet.
    pub fn all_selected(&self) -> bool {
        self.state.lock().all_selected()
    }

    /// Terminal success condition: everything selected and confirmed.
    pub fn connected(&self) -> bool {
        let state = self.state.lock();
        state.all_selected() && state.confirmed
    }

    /// Start a connect attempt; the outcome arrives through events.
    pub async fn connect(&self, chain: ChainId, wallet_id: &str) {
        match chain {
            ChainId::Btc => {
                if let Some(connector) = &self.connectors.btc {
                    connector.connect(wallet_id).await;
                }
            }
            ChainId::Bbn => {
                if let Some(connector) = &self.connectors.bbn {
                    connector.connect(wallet_id).await;
                }
            }
        }
    }

    pub async fn disconnect(&self, chain: ChainId) {
        match chain {
            ChainId::Btc => {
                if let Some(connector) = &self.connectors.btc {
                    connector.disconnect().await;
                }
            }
            ChainId::Bbn => {
                if let Some(connector) = &self.connectors.bbn {
                    connector.disconnect().await;
                }
            }
        }
    }

    /// Disconnect every chain and restart the flow.
    pub async fn disconnect_all(&self) {
        if let Some(connector) = &self.connectors.btc {
            connector.disconnect().await;
        }
        if let Some(connector) = &self.connectors.bbn {
            connector.disconnect().await;
        }
        self.state.lock().reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{BbnConfig, BtcConfig};
    use crate::core::context::AccountChangedCallback;
    use crate::core::types::{Account, InscriptionIdentifier, Network, SignatureType};
    use crate::providers::{BbnProvider, BtcProvider, OfflineSignerHandle};
    use crate::widget::inscriptions::MemoryStore;
    use crate::widget::state::Screen;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct StubProvider {
        fail: bool,
    }

    #[async_trait]
    impl Provider for StubProvider {
        async fn connect_wallet(&self) -> Result<(), WalletError> {
            if self.fail {
                Err(WalletError::ConnectionRejected("stub".to_string()))
            } else {
                Ok(())
            }
        }
        async fn get_address(&self) -> Result<String, WalletError> {
            Ok("bc1qtest".to_string())
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
            Ok(String::new())
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
            Ok("Stub".to_string())
        }
        async fn provider_icon(&self) -> Result<String, WalletError> {
            Ok(String::new())
        }
    }

    #[async_trait]
    impl BtcProvider for StubProvider {
        async fn sign_psbt(&self, psbt_hex: &str) -> Result<String, WalletError> {
            Ok(psbt_hex.to_string())
        }
        async fn sign_psbts(&self, psbt_hexes: &[String]) -> Result<Vec<String>, WalletError> {
            Ok(psbt_hexes.to_vec())
        }
        async fn get_inscriptions(&self) -> Result<Vec<InscriptionIdentifier>, WalletError> {
            Ok(Vec::new())
        }
    }

    #[async_trait]
    impl BbnProvider for StubProvider {
        async fn get_offline_signer(&self) -> Result<OfflineSignerHandle, WalletError> {
            Err(WalletError::UnsupportedCapability("stub".to_string()))
        }
    }

    fn btc_wallet(id: &str, fail: bool) -> Wallet<dyn BtcProvider> {
        Wallet::new(
            id,
            id.to_uppercase(),
            "",
            "",
            vec![Network::Signet],
            None,
            Some(Arc::new(StubProvider { fail }) as Arc<dyn BtcProvider>),
        )
    }

    fn bbn_wallet(id: &str) -> Wallet<dyn BbnProvider> {
        Wallet::new(
            id,
            id.to_uppercase(),
            "",
            "",
            vec![Network::Signet],
            None,
            Some(Arc::new(StubProvider { fail: false }) as Arc<dyn BbnProvider>),
        )
    }

    fn connectors() -> Arc<Connectors> {
        Arc::new(Connectors {
            btc: Some(Arc::new(WalletConnector::new(
                ChainId::Btc,
                "Bitcoin",
                "",
                vec![btc_wallet("okx", false), btc_wallet("broken", true)],
                BtcConfig::default(),
            ))),
            bbn: Some(Arc::new(WalletConnector::new(
                ChainId::Bbn,
                "Babylon Chain",
                "",
                vec![bbn_wallet("keplr")],
                BbnConfig::default(),
            ))),
        })
    }

    fn widget_with_policy(show_again: bool) -> Arc<WalletWidget> {
        let policy = InscriptionPolicy::new(Arc::new(MemoryStore::new()));
        policy.set_show_again(show_again);
        WalletWidget::new(connectors(), policy, None)
    }

    #[test]
    fn test_chains_derived_from_connectors() {
        let widget = widget_with_policy(true);
        let state = widget.state();

        assert_eq!(state.chains.len(), 2);
        assert_eq!(state.chains[&ChainId::Btc].name, "Bitcoin");
        assert_eq!(state.chains[&ChainId::Bbn].name, "Babylon Chain");
    }

    #[test]
    fn test_open_forces_reset() {
        let widget = widget_with_policy(true);
        widget.display_wallets(ChainId::Btc);
        widget.close();

        widget.open();

        let state = widget.state();
        assert!(state.visible);
        assert_eq!(state.screen, Screen::TermsOfService);
    }

    #[tokio::test]
    async fn test_btc_connect_routes_to_inscriptions() {
        let widget = widget_with_policy(true);
        widget.open();

        widget.connect(ChainId::Btc, "okx").await;

        let state = widget.state();
        assert_eq!(state.screen, Screen::Inscriptions);
        let selected = widget.selected_wallet(ChainId::Btc).unwrap();
        assert_eq!(selected.id, "okx");
        assert_eq!(
            selected.account,
            Some(Account {
                address: "bc1qtest".to_string(),
                public_key_hex: "02ab".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_btc_connect_skips_inscriptions_when_opted_out() {
        let widget = widget_with_policy(false);
        widget.open();

        widget.connect(ChainId::Btc, "okx").await;

        assert_eq!(widget.state().screen, Screen::Chains);
    }

    #[tokio::test]
    async fn test_bbn_connect_never_shows_inscriptions() {
        let widget = widget_with_policy(true);
        widget.open();

        widget.connect(ChainId::Bbn, "keplr").await;

        assert_eq!(widget.state().screen, Screen::Chains);
        assert!(widget.selected_wallet(ChainId::Bbn).is_some());
    }

    #[tokio::test]
    async fn test_error_forwards_and_routes_to_chains() {
        let seen: Arc<Mutex<Vec<WalletError>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let policy = InscriptionPolicy::new(Arc::new(MemoryStore::new()));
        let widget = WalletWidget::new(
            connectors(),
            policy,
            Some(Arc::new(move |error: &WalletError| {
                sink.lock().push(error.clone());
            })),
        );
        widget.open();

        widget.connect(ChainId::Btc, "broken").await;

        assert_eq!(widget.state().screen, Screen::Chains);
        assert!(widget.selected_wallet(ChainId::Btc).is_none());
        assert_eq!(seen.lock().len(), 1);
        assert!(seen.lock()[0].is_rejection());
    }

    #[tokio::test]
    async fn test_disconnect_clears_selection() {
        let widget = widget_with_policy(false);
        widget.open();
        widget.connect(ChainId::Btc, "okx").await;
        assert!(widget.selected_wallet(ChainId::Btc).is_some());

        widget.disconnect(ChainId::Btc).await;

        assert!(widget.selected_wallet(ChainId::Btc).is_none());
        assert_eq!(widget.state().screen, Screen::Chains);
    }

    #[tokio::test]
    async fn test_connected_requires_both_chains_and_confirm() {
        let widget = widget_with_policy(false);
        widget.open();

        widget.connect(ChainId::Btc, "okx").await;
        assert!(!widget.connected());

        widget.connect(ChainId::Bbn, "keplr").await;
        assert!(widget.all_selected());
        assert!(!widget.connected());

        widget.confirm();
        assert!(widget.connected());
        assert!(!widget.state().visible);
    }

    #[tokio::test]
    async fn test_disconnect_all_resets() {
        let widget = widget_with_policy(false);
        widget.open();
        widget.connect(ChainId::Btc, "okx").await;
        widget.connect(ChainId::Bbn, "keplr").await;
        widget.confirm();

        widget.disconnect_all().await;

        let state = widget.state();
        assert!(state.selected_wallets.is_empty());
        assert!(!state.confirmed);
        assert_eq!(state.screen, Screen::TermsOfService);
        assert!(!state.chains.is_empty());
    }
}
