//! Byte-level secure stores

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::collections::HashMap;
use std::sync::Mutex;
use zeroize::Zeroize;

use crate::error::KeyStoreError;
use crate::params::KeychainParameters;

/// Secure storage for raw key bytes, addressed by [`KeychainParameters`].
pub trait KeyStore: Send + Sync {
    /// `Ok(None)` when nothing is stored under `params`.
    fn read(&self, params: &KeychainParameters) -> Result<Option<Vec<u8>>, KeyStoreError>;

    /// Store `secret`, replacing any previous value.
    fn write(&self, params: &KeychainParameters, secret: &[u8]) -> Result<(), KeyStoreError>;

    /// Remove the entry. Deleting a missing entry succeeds.
    fn delete(&self, params: &KeychainParameters) -> Result<(), KeyStoreError>;
}

fn fetch_error(params: &KeychainParameters, reason: impl ToString) -> KeyStoreError {
    KeyStoreError::Fetch {
        service: params.service.clone(),
        account: params.account.clone(),
        reason: reason.to_string(),
    }
}

fn store_error(params: &KeychainParameters, reason: impl ToString) -> KeyStoreError {
    KeyStoreError::Store {
        service: params.service.clone(),
        account: params.account.clone(),
        reason: reason.to_string(),
    }
}

/// Platform keychain via the `keyring` crate:
/// - macOS: Keychain Services
/// - Linux: Secret Service (D-Bus)
/// - Windows: Credential Manager
///
/// Key bytes are stored base64-encoded as the entry's password.
///
/// `keyring` exposes no accessibility attribute, so
/// [`KeychainParameters::key_access`] is ignored and entries get the
/// platform default.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyringStore;

impl KeyringStore {
    pub fn new() -> Self {
        Self
    }

    fn entry(params: &KeychainParameters) -> keyring::Result<keyring::Entry> {
        keyring::Entry::new(&params.service, &params.account)
    }
}

impl KeyStore for KeyringStore {
    fn read(&self, params: &KeychainParameters) -> Result<Option<Vec<u8>>, KeyStoreError> {
        let entry = Self::entry(params).map_err(|e| fetch_error(params, e))?;
        match entry.get_password() {
            Ok(mut encoded) => {
                let decoded = STANDARD.decode(encoded.trim());
                encoded.zeroize();
                decoded
                    .map(Some)
                    .map_err(|e| fetch_error(params, format!("stored key is not base64: {e}")))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(fetch_error(params, e)),
        }
    }

    fn write(&self, params: &KeychainParameters, secret: &[u8]) -> Result<(), KeyStoreError> {
        let entry = Self::entry(params).map_err(|e| store_error(params, e))?;
        let mut encoded = STANDARD.encode(secret);
        let result = entry.set_password(&encoded);
        encoded.zeroize();
        result.map_err(|e| store_error(params, e))?;
        tracing::debug!(
            service = %params.service,
            account = %params.account,
            key_access = %params.key_access,
            "stored key in platform keychain"
        );
        Ok(())
    }

    fn delete(&self, params: &KeychainParameters) -> Result<(), KeyStoreError> {
        let entry = Self::entry(params).map_err(|e| store_error(params, e))?;
        match entry.delete_credential() {
            Ok(()) => {
                tracing::debug!(
                    service = %params.service,
                    account = %params.account,
                    "deleted key from platform keychain"
                );
                Ok(())
            }
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(store_error(params, e)),
        }
    }
}

/// Process-local store. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryKeyStore {
    entries: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(params: &KeychainParameters) -> (String, String) {
        (params.service.clone(), params.account.clone())
    }
}

impl KeyStore for MemoryKeyStore {
    fn read(&self, params: &KeychainParameters) -> Result<Option<Vec<u8>>, KeyStoreError> {
        let entries = self.entries.lock().map_err(|e| fetch_error(params, e))?;
        Ok(entries.get(&Self::key(params)).cloned())
    }

    fn write(&self, params: &KeychainParameters, secret: &[u8]) -> Result<(), KeyStoreError> {
        let mut entries = self.entries.lock().map_err(|e| store_error(params, e))?;
        if let Some(mut old) = entries.insert(Self::key(params), secret.to_vec()) {
            old.zeroize();
        }
        Ok(())
    }

    fn delete(&self, params: &KeychainParameters) -> Result<(), KeyStoreError> {
        let mut entries = self.entries.lock().map_err(|e| store_error(params, e))?;
        if let Some(mut old) = entries.remove(&Self::key(params)) {
            old.zeroize();
        }
        Ok(())
    }
}

impl Drop for MemoryKeyStore {
    fn drop(&mut self) {
        if let Ok(entries) = self.entries.get_mut() {
            entries.values_mut().for_each(|v| v.zeroize());
        }
    }
}

impl std::fmt::Debug for MemoryKeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        f.debug_struct("MemoryKeyStore")
            .field("entries", &len)
            .finish()
    }
}
