//! Connect-flow screen state.
//!
//! The screen is a closed sum type and the named transition methods are
//! the only mutators; presentation layers consume snapshots and never
//! write fields directly.

use std::collections::HashMap;

use crate::core::types::{Account, ChainId};

/// The five screens of the connect flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Loader { message: String },
    TermsOfService,
    Chains,
    Wallets { chain: ChainId },
    Inscriptions,
}

impl Default for Screen {
    fn default() -> Self {
        Screen::TermsOfService
    }
}

/// Presentation snapshot of the wallet a chain connected with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedWallet {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub account: Option<Account>,
}

/// Chain identity shown on the chain-selection screen, derived from the
/// built connectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainDescriptor {
    pub id: ChainId,
    pub name: String,
    pub icon: String,
}

/// Widget-wide UI state. `reset` restores everything except `chains`,
/// which are fixed for the session.
#[derive(Debug, Clone, Default)]
pub struct WidgetState {
    pub confirmed: bool,
    pub visible: bool,
    pub screen: Screen,
    pub selected_wallets: HashMap<ChainId, SelectedWallet>,
    pub chains: HashMap<ChainId, ChainDescriptor>,
}

impl WidgetState {
    pub fn new(chains: HashMap<ChainId, ChainDescriptor>) -> Self {
        Self {
            chains,
            ..Self::default()
        }
    }

    pub fn open(&mut self) {
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn reset(&mut self) {
        let chains = std::mem::take(&mut self.chains);
        *self = Self::new(chains);
    }

    pub fn display_loader(&mut self, message: impl Into<String>) {
        self.screen = Screen::Loader {
            message: message.into(),
        };
    }

    pub fn display_terms_of_service(&mut self) {
        self.screen = Screen::TermsOfService;
    }

    pub fn display_chains(&mut self) {
        self.screen = Screen::Chains;
    }

    pub fn display_wallets(&mut self, chain: ChainId) {
        self.screen = Screen::Wallets { chain };
    }

    pub fn display_inscriptions(&mut self) {
        self.screen = Screen::Inscriptions;
    }

    pub fn select_wallet(&mut self, chain: ChainId, wallet: SelectedWallet) {
        self.selected_wallets.insert(chain, wallet);
    }

    pub fn remove_wallet(&mut self, chain: ChainId) {
        self.selected_wallets.remove(&chain);
    }

    /// Terminal success: the caller is done picking wallets.
    pub fn confirm(&mut self) {
        self.confirmed = true;
        self.visible = false;
    }

    /// Every configured chain has a selected wallet.
    pub fn all_selected(&self) -> bool {
        self.chains
            .keys()
            .all(|chain| self.selected_wallets.contains_key(chain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn chains() -> HashMap<ChainId, ChainDescriptor> {
        HashMap::from([(
            ChainId::Btc,
            ChainDescriptor {
                id: ChainId::Btc,
                name: "Bitcoin".to_string(),
                icon: String::new(),
            },
        )])
    }

    fn wallet() -> SelectedWallet {
        SelectedWallet {
            id: "okx".to_string(),
            name: "OKX".to_string(),
            icon: String::new(),
            account: None,
        }
    }

    #[test]
    fn test_initial_screen_is_terms() {
        let state = WidgetState::new(chains());
        assert_eq!(state.screen, Screen::TermsOfService);
        assert!(!state.confirmed);
        assert!(!state.visible);
    }

    #[test]
    fn test_screen_transitions() {
        let mut state = WidgetState::new(chains());

        state.display_chains();
        assert_eq!(state.screen, Screen::Chains);

        state.display_wallets(ChainId::Btc);
        assert_eq!(
            state.screen,
            Screen::Wallets {
                chain: ChainId::Btc
            }
        );

        state.display_loader("Connecting OKX");
        assert_eq!(
            state.screen,
            Screen::Loader {
                message: "Connecting OKX".to_string()
            }
        );

        state.display_inscriptions();
        assert_eq!(state.screen, Screen::Inscriptions);
    }

    #[test]
    fn test_display_chains_is_idempotent() {
        let mut state = WidgetState::new(chains());

        state.display_chains();
        let snapshot = state.clone();
        state.display_chains();

        assert_eq!(state.screen, snapshot.screen);
        assert_eq!(state.selected_wallets, snapshot.selected_wallets);
    }

    #[test]
    fn test_reset_keeps_chains() {
        let mut state = WidgetState::new(chains());
        state.open();
        state.confirm();
        state.select_wallet(ChainId::Btc, wallet());
        state.display_chains();

        state.reset();

        assert_eq!(state.screen, Screen::TermsOfService);
        assert!(!state.confirmed);
        assert!(!state.visible);
        assert!(state.selected_wallets.is_empty());
        assert_eq!(state.chains, chains());
    }

    #[test]
    fn test_confirm_closes() {
        let mut state = WidgetState::new(chains());
        state.open();

        state.confirm();

        assert!(state.confirmed);
        assert!(!state.visible);
    }

    #[test]
    fn test_all_selected() {
        let mut state = WidgetState::new(chains());
        assert!(!state.all_selected());

        state.select_wallet(ChainId::Btc, wallet());
        assert!(state.all_selected());

        state.remove_wallet(ChainId::Btc);
        assert!(!state.all_selected());
    }
}
