//! Persistence of the inscription-policy choices made on the widget's
//! inscriptions screen: whether to lock inscribed UTXOs away from
//! staking, and whether to keep showing the screen on future connects.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

const SHOW_AGAIN_KEY: &str = "bwc-inscription-modal-show-again";
const LOCK_KEY: &str = "bwc-inscription-modal-lock";

/// Host-supplied persistent storage (browser localStorage or similar).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory store, for tests and hosts without persistence.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }
}

/// Both flags default to true: new users see the screen and inscriptions
/// are locked until they opt out.
#[derive(Clone)]
pub struct InscriptionPolicy {
    store: Arc<dyn KeyValueStore>,
}

impl InscriptionPolicy {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn flag(&self, key: &str) -> bool {
        match self.store.get(key).as_deref() {
            Some("false") => false,
            Some(_) | None => true,
        }
    }

    pub fn show_again(&self) -> bool {
        self.flag(SHOW_AGAIN_KEY)
    }

    pub fn set_show_again(&self, value: bool) {
        self.store.set(SHOW_AGAIN_KEY, if value { "true" } else { "false" });
    }

    pub fn lock_inscriptions(&self) -> bool {
        self.flag(LOCK_KEY)
    }

    pub fn set_lock_inscriptions(&self, value: bool) {
        self.store.set(LOCK_KEY, if value { "true" } else { "false" });
    }
}
