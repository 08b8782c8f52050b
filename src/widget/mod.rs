//! Connect-flow widget: screen state machine, inscription policy and the
//! controller wiring connector events into screen routing.

pub mod controller;
pub mod inscriptions;
pub mod state;

pub use controller::{ErrorCallback, WalletWidget};
pub use inscriptions::{InscriptionPolicy, KeyValueStore, MemoryStore};
pub use state::{ChainDescriptor, Screen, SelectedWallet, WidgetState};
