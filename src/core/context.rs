//! Extension discovery.
//!
//! Browser wallets inject themselves into a global namespace under
//! well-known keys ("okxwallet", "keplr", ...). The connector never touches
//! ambient globals: discovery goes through an injected [`RuntimeContext`],
//! and every injected object is adapted behind the [`ExtensionRpc`]
//! request/response surface so providers stay testable with fake registries.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::errors::WalletError;

/// Callback invoked when the extension reports an account change.
/// `Arc` identity is used for unsubscription.
pub type AccountChangedCallback = Arc<dyn Fn() + Send + Sync>;

/// Uniform surface over one injected extension object.
///
/// Methods mirror the extension's own API names ("requestAccounts",
/// "signPsbt", "enable", ...); params and results are plain JSON, exactly
/// the shape the extension speaks.
#[async_trait]
pub trait ExtensionRpc: Send + Sync {
    /// Invoke a method on the injected object.
    async fn request(&self, method: &str, params: Value) -> Result<Value, WalletError>;

    /// Subscribe to an extension event. Extensions without event support
    /// keep the default no-op.
    fn subscribe(&self, _event: &str, _callback: AccountChangedCallback) {}

    /// Unsubscribe a previously registered callback, matched by `Arc` identity.
    fn unsubscribe(&self, _event: &str, _callback: &AccountChangedCallback) {}
}

/// Lookup of injected extensions by their namespace key.
/// Absence of a key means "not installed", never an error.
pub trait RuntimeContext: Send + Sync {
    fn resolve(&self, key: &str) -> Option<Arc<dyn ExtensionRpc>>;
}

/// Map-backed context: the host application registers every injected
/// extension handle at startup.
#[derive(Default)]
pub struct StaticContext {
    entries: HashMap<String, Arc<dyn ExtensionRpc>>,
}

impl StaticContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, key: impl Into<String>, ext: Arc<dyn ExtensionRpc>) -> Self {
        self.entries.insert(key.into(), ext);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, ext: Arc<dyn ExtensionRpc>) {
        self.entries.insert(key.into(), ext);
    }
}

impl RuntimeContext for StaticContext {
    fn resolve(&self, key: &str) -> Option<Arc<dyn ExtensionRpc>> {
        self.entries.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoExtension;

    #[async_trait]
    impl ExtensionRpc for EchoExtension {
        async fn request(&self, method: &str, _params: Value) -> Result<Value, WalletError> {
            Ok(Value::String(method.to_string()))
        }
    }

    #[tokio::test]
    async fn test_resolve_present_key() {
        let context = StaticContext::new().with_extension("unisat", Arc::new(EchoExtension));

        let handle = context.resolve("unisat").expect("registered");
        let result = handle.request("getPublicKey", Value::Null).await.unwrap();
        assert_eq!(result, Value::String("getPublicKey".into()));
    }

    #[test]
    fn test_resolve_absent_key_is_none() {
        let context = StaticContext::new();
        assert!(context.resolve("okxwallet").is_none());
    }
}
