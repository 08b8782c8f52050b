//! Shared pagination over the `getInscriptions` extension call.
//!
//! Every wallet speaking the unisat-style API returns pages of
//! `{ "list": [{ "output": "txid:vout" }, ...] }`. Pages are fetched in
//! fixed batches until a short page arrives; a hard iteration ceiling
//! turns a runaway cursor into a fatal error instead of a silent
//! truncation.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use crate::core::context::ExtensionRpc;
use crate::core::errors::WalletError;
use crate::core::types::InscriptionIdentifier;

const BATCH_SIZE: u64 = 100;
const MAX_ITERATIONS: u64 = 100;

fn parse_page(page: &Value) -> Result<Vec<InscriptionIdentifier>, WalletError> {
    let list = page
        .get("list")
        .and_then(Value::as_array)
        .ok_or_else(|| WalletError::ExtensionError("inscription page has no list".to_string()))?;

    list.iter()
        .map(|item| {
            let output = item
                .get("output")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    WalletError::ExtensionError("inscription item has no output".to_string())
                })?;
            let (txid, vout) = output.split_once(':').ok_or_else(|| {
                WalletError::ExtensionError(format!("malformed inscription output: {}", output))
            })?;
            let vout = vout.parse::<u32>().map_err(|_| {
                WalletError::ExtensionError(format!("malformed inscription vout: {}", output))
            })?;

            Ok(InscriptionIdentifier {
                txid: txid.to_string(),
                vout,
            })
        })
        .collect()
}

/// Drain the wallet's inscription listing through `method` on `extension`.
/// `wallet_name` only feeds error messages.
pub async fn fetch_inscriptions(
    extension: &Arc<dyn ExtensionRpc>,
    method: &str,
    wallet_name: &str,
) -> Result<Vec<InscriptionIdentifier>, WalletError> {
    let mut identifiers = Vec::new();
    let mut cursor = 0u64;
    let mut iterations = 0u64;

    loop {
        let page = extension
            .request(method, json!([cursor, BATCH_SIZE]))
            .await
            .map_err(|_| {
                WalletError::ExtensionError(format!(
                    "Failed to get inscriptions from {}",
                    wallet_name
                ))
            })?;

        let batch = parse_page(&page)?;
        let short_page = (batch.len() as u64) < BATCH_SIZE;
        identifiers.extend(batch);

        if short_page {
            break;
        }

        cursor += BATCH_SIZE;
        iterations += 1;
        if iterations >= MAX_ITERATIONS {
            return Err(WalletError::IterationLimitExceeded(format!(
                "fetching inscriptions from {}",
                wallet_name
            )));
        }
    }

    debug!(wallet = wallet_name, count = identifiers.len(), "inscriptions fetched");
    Ok(identifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Returns `pages` full batches before a final short page, unless
    /// `endless` keeps every page full.
    struct PagedExtension {
        full_pages: u64,
        endless: bool,
        calls: Mutex<u64>,
    }

    impl PagedExtension {
        fn page(len: u64, cursor: u64) -> Value {
            let list: Vec<Value> = (0..len)
                .map(|i| json!({ "output": format!("{:064x}:{}", cursor + i, 0) }))
                .collect();
            json!({ "list": list })
        }
    }

    #[async_trait]
    impl ExtensionRpc for PagedExtension {
        async fn request(&self, _method: &str, params: Value) -> Result<Value, WalletError> {
            let cursor = params[0].as_u64().unwrap();
            let mut calls = self.calls.lock();
            *calls += 1;

            if self.endless || *calls <= self.full_pages {
                Ok(Self::page(BATCH_SIZE, cursor))
            } else {
                Ok(Self::page(3, cursor))
            }
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_single_short_page() {
        let ext: Arc<dyn ExtensionRpc> = Arc::new(PagedExtension {
            full_pages: 0,
            endless: false,
            calls: Mutex::new(0),
        });

        let result = fetch_inscriptions(&ext, "getInscriptions", "Test").await.unwrap();
        assert_eq!(result.len(), 3);
    }

    #[test_log::test(tokio::test)]
    async fn test_multiple_pages_accumulate() {
        let ext: Arc<dyn ExtensionRpc> = Arc::new(PagedExtension {
            full_pages: 2,
            endless: false,
            calls: Mutex::new(0),
        });

        let result = fetch_inscriptions(&ext, "getInscriptions", "Test").await.unwrap();
        assert_eq!(result.len(), 203);
    }

    #[test_log::test(tokio::test)]
    async fn test_iteration_ceiling_is_fatal() {
        let ext: Arc<dyn ExtensionRpc> = Arc::new(PagedExtension {
            full_pages: 0,
            endless: true,
            calls: Mutex::new(0),
        });

        let err = fetch_inscriptions(&ext, "getInscriptions", "Test").await.unwrap_err();
        assert!(matches!(err, WalletError::IterationLimitExceeded(_)));
    }

    struct FailingExtension;

    #[async_trait]
    impl ExtensionRpc for FailingExtension {
        async fn request(&self, _method: &str, _params: Value) -> Result<Value, WalletError> {
            Err(WalletError::ExtensionError("boom".to_string()))
        }
    }

    #[test_log::test(tokio::test)]
    async fn test_transport_failure_is_wrapped() {
        let ext: Arc<dyn ExtensionRpc> = Arc::new(FailingExtension);

        let err = fetch_inscriptions(&ext, "getInscriptions", "OKX Wallet").await.unwrap_err();
        assert_eq!(
            err,
            WalletError::ExtensionError("Failed to get inscriptions from OKX Wallet".to_string())
        );
    }
}
