use std::fmt;

/// Custom error type for wallet-connection operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The injected extension object is absent from the runtime context.
    /// Converted to `installed = false` by the factory, never surfaced to callers.
    ExtensionNotFound(String),
    /// The user rejected the extension's connection prompt.
    ConnectionRejected(String),
    /// The chain is missing from the extension and the single
    /// suggest-chain remediation plus retry also failed.
    ChainRegistrationFailed(String),
    /// An operation requiring a connected account was invoked before
    /// `connect_wallet` succeeded.
    NotConnected(String),
    /// The extension reported a network with no mapping to the uniform enum,
    /// or the configured network is not supported by the wallet.
    UnsupportedNetwork(String),
    /// A capability (e.g. inscriptions) is unavailable for the current
    /// wallet/network combination.
    UnsupportedCapability(String),
    /// A paginated extension call exceeded its iteration ceiling.
    IterationLimitExceeded(String),
    /// The address returned by the extension does not parse.
    InvalidAddress(String),
    /// The address parses but belongs to a different network than configured.
    AddressMismatch(String),
    /// Connector-level lookup: no wallet with the requested id.
    WalletNotFound(String),
    /// The wallet has no provider adapter (extension was never found).
    ProviderNotFound(String),
    /// Signing produced an unusable result (e.g. PSBT left unfinalized).
    SigningFailed(String),
    /// Normalized extension/transport failure.
    ExtensionError(String),
    /// Invalid input errors.
    InvalidInput(String),
    /// Generic errors.
    Other(String),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::ExtensionNotFound(msg) => write!(f, "Extension not found: {}", msg),
            WalletError::ConnectionRejected(msg) => write!(f, "Connection rejected: {}", msg),
            WalletError::ChainRegistrationFailed(msg) => write!(f, "Failed to add chain: {}", msg),
            WalletError::NotConnected(msg) => write!(f, "Wallet not connected: {}", msg),
            WalletError::UnsupportedNetwork(msg) => write!(f, "Unsupported network: {}", msg),
            WalletError::UnsupportedCapability(msg) => write!(f, "Unsupported capability: {}", msg),
            WalletError::IterationLimitExceeded(msg) => {
                write!(f, "Exceeded maximum iterations: {}", msg)
            }
            WalletError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            WalletError::AddressMismatch(msg) => write!(f, "Address network mismatch: {}", msg),
            WalletError::WalletNotFound(msg) => write!(f, "Wallet not found: {}", msg),
            WalletError::ProviderNotFound(msg) => write!(f, "Provider not found: {}", msg),
            WalletError::SigningFailed(msg) => write!(f, "Signing failed: {}", msg),
            WalletError::ExtensionError(msg) => write!(f, "Extension error: {}", msg),
            WalletError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            WalletError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for WalletError {}

impl WalletError {
    /// Create a generic error.
    pub fn new(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether this error means "the wallet is simply not installed".
    /// The factory records these as `installed = false` instead of failing.
    pub fn is_not_installed(&self) -> bool {
        matches!(self, WalletError::ExtensionNotFound(_))
    }

    /// Whether the failure was caused by the user declining a prompt.
    pub fn is_rejection(&self) -> bool {
        matches!(self, WalletError::ConnectionRejected(_))
    }

    /// Normalize a raw extension failure message: extensions signal user
    /// rejection with a free-form message containing "rejected".
    pub fn from_extension_failure(wallet_name: &str, message: &str) -> Self {
        if message.contains("rejected") {
            WalletError::ConnectionRejected(format!("Connection to {} was rejected", wallet_name))
        } else {
            WalletError::ExtensionError(message.to_string())
        }
    }
}

impl From<anyhow::Error> for WalletError {
    fn from(err: anyhow::Error) -> Self {
        WalletError::Other(err.to_string())
    }
}

impl From<serde_json::Error> for WalletError {
    fn from(err: serde_json::Error) -> Self {
        WalletError::ExtensionError(format!("malformed extension response: {}", err))
    }
}
