use strongbox_core::{KeyAccess, KeychainConfig};

/// Default keychain service name
pub const DEFAULT_SERVICE: &str = "strongbox";

/// Default keychain account name
pub const DEFAULT_ACCOUNT: &str = "encryption-key";

/// Identifies one key in a secure store.
///
/// An entry is addressed by `service` and `account` alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeychainParameters {
    pub service: String,
    pub account: String,
    /// Requested accessibility class. Recorded in logs only: neither
    /// [`KeyringStore`](crate::KeyringStore) nor
    /// [`MemoryKeyStore`](crate::MemoryKeyStore) can enforce it, so the
    /// platform keychain applies its own default.
    pub key_access: KeyAccess,
}

impl KeychainParameters {
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
            key_access: KeyAccess::default(),
        }
    }

    pub fn with_key_access(mut self, key_access: KeyAccess) -> Self {
        self.key_access = key_access;
        self
    }
}

impl Default for KeychainParameters {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE, DEFAULT_ACCOUNT)
    }
}

impl From<&KeychainConfig> for KeychainParameters {
    fn from(config: &KeychainConfig) -> Self {
        Self::new(config.service.clone(), config.account.clone())
            .with_key_access(config.key_access)
    }
}
