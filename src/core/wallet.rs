use std::sync::Arc;

use tracing::debug;

use crate::core::errors::WalletError;
use crate::core::types::{Account, Network};
use crate::providers::Provider;

/// One selectable wallet option for a chain.
///
/// Identity fields are fixed at factory-build time; only `account` changes,
/// exactly once per successful connect. A wallet without a provider adapter
/// (`installed() == false`) can never transition to connected.
pub struct Wallet<P: ?Sized> {
    pub id: String,
    pub name: String,
    pub icon: String,
    pub docs: String,
    pub networks: Vec<Network>,
    label: Option<String>,
    pub provider: Option<Arc<P>>,
    pub account: Option<Account>,
}

// Manual impl: `P` is a trait object, derive would require `P: Debug`.
impl<P: ?Sized> std::fmt::Debug for Wallet<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("icon", &self.icon)
            .field("docs", &self.docs)
            .field("networks", &self.networks)
            .field("label", &self.label)
            .field("provider", &self.provider.as_ref().map(|_| "<provider>"))
            .field("account", &self.account)
            .finish()
    }
}

// Manual impl: `P` is a trait object, derive would require `P: Clone`.
impl<P: ?Sized> Clone for Wallet<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            name: self.name.clone(),
            icon: self.icon.clone(),
            docs: self.docs.clone(),
            networks: self.networks.clone(),
            label: self.label.clone(),
            provider: self.provider.clone(),
            account: self.account.clone(),
        }
    }
}

impl<P: ?Sized> Wallet<P> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        icon: impl Into<String>,
        docs: impl Into<String>,
        networks: Vec<Network>,
        label: Option<String>,
        provider: Option<Arc<P>>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            icon: icon.into(),
            docs: docs.into(),
            networks,
            label,
            provider,
            account: None,
        }
    }

    /// A wallet is installed iff its provider adapter was constructed.
    pub fn installed(&self) -> bool {
        self.provider.is_some()
    }

    /// Display tag: an explicit label wins, otherwise "Installed" for
    /// wallets with a live adapter and nothing for the rest.
    pub fn label(&self) -> &str {
        match &self.label {
            Some(label) => label,
            None if self.installed() => "Installed",
            None => "",
        }
    }
}

impl<P: Provider + ?Sized> Wallet<P> {
    /// Connect through the provider adapter and cache the resulting account.
    /// Address and public key are fetched in parallel after the connect call.
    pub async fn connect(&mut self) -> Result<(), WalletError> {
        let provider = self
            .provider
            .as_ref()
            .ok_or_else(|| WalletError::ProviderNotFound(self.id.clone()))?;

        provider.connect_wallet().await?;

        let (address, public_key_hex) =
            futures::try_join!(provider.get_address(), provider.get_public_key_hex())?;

        debug!(wallet = %self.id, %address, "wallet connected");
        self.account = Some(Account {
            address,
            public_key_hex,
        });

        Ok(())
    }
}

/// Build a wallet around an externally supplied provider instance,
/// bypassing the metadata registry. Used by host-app wallet integrations
/// that implement the provider contract themselves.
pub fn external_wallet<P: ?Sized>(
    id: impl Into<String>,
    name: impl Into<String>,
    icon: impl Into<String>,
    provider: Arc<P>,
) -> Wallet<P> {
    Wallet::new(
        id,
        name,
        icon,
        "",
        vec![Network::Mainnet, Network::Signet],
        None,
        Some(provider),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::AccountChangedCallback;
    use crate::core::types::SignatureType;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    struct StubProvider;

    #[async_trait]
    impl Provider for StubProvider {
        async fn connect_wallet(&self) -> Result<(), WalletError> {
            Ok(())
        }

        async fn get_address(&self) -> Result<String, WalletError> {
            Ok("bc1qstub".to_string())
        }

        async fn get_public_key_hex(&self) -> Result<String, WalletError> {
            Ok("02ab".to_string())
        }

        async fn get_network(&self) -> Result<Network, WalletError> {
            Ok(Network::Mainnet)
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
            Ok("Stub".to_string())
        }

        async fn provider_icon(&self) -> Result<String, WalletError> {
            Ok(String::new())
        }
    }

    fn installed_wallet() -> Wallet<dyn Provider> {
        Wallet::new(
            "stub",
            "Stub Wallet",
            "icon.svg",
            "https://example.com",
            vec![Network::Mainnet],
            None,
            Some(Arc::new(StubProvider) as Arc<dyn Provider>),
        )
    }

    #[tokio::test]
    async fn test_connect_populates_account() {
        let mut wallet = installed_wallet();
        assert!(wallet.account.is_none());

        wallet.connect().await.unwrap();

        let account = wallet.account.as_ref().unwrap();
        assert_eq!(account.address, "bc1qstub");
        assert_eq!(account.public_key_hex, "02ab");
    }

    #[tokio::test]
    async fn test_connect_without_provider_fails() {
        let mut wallet: Wallet<dyn Provider> = Wallet::new(
            "ghost",
            "Ghost",
            "",
            "",
            vec![Network::Mainnet],
            None,
            None,
        );

        let err = wallet.connect().await.unwrap_err();
        assert!(matches!(err, WalletError::ProviderNotFound(_)));
        assert!(wallet.account.is_none());
    }

    #[test]
    fn test_label_derivation() {
        let wallet = installed_wallet();
        assert_eq!(wallet.label(), "Installed");

        let missing: Wallet<dyn Provider> =
            Wallet::new("ghost", "Ghost", "", "", vec![], None, None);
        assert_eq!(missing.label(), "");

        let hardware: Wallet<dyn Provider> = Wallet::new(
            "keystone",
            "Keystone",
            "",
            "",
            vec![],
            Some("Hardware wallet".to_string()),
            None,
        );
        assert_eq!(hardware.label(), "Hardware wallet");
    }

    #[test]
    fn test_clone_shares_provider_reference() {
        let wallet = installed_wallet();
        let copy = wallet.clone();

        assert_eq!(copy.id, wallet.id);
        assert_eq!(copy.name, wallet.name);
        assert_eq!(copy.icon, wallet.icon);
        assert_eq!(copy.docs, wallet.docs);
        assert_eq!(copy.networks, wallet.networks);
        assert!(Arc::ptr_eq(
            wallet.provider.as_ref().unwrap(),
            copy.provider.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_external_wallet_defaults() {
        let wallet = external_wallet(
            "custom",
            "Custom",
            "icon",
            Arc::new(StubProvider) as Arc<dyn Provider>,
        );
        assert!(wallet.installed());
        assert_eq!(wallet.networks, vec![Network::Mainnet, Network::Signet]);
        assert_eq!(wallet.docs, "");
    }
}
