use strongbox_crypto::{KeySize, SymmetricKey};
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::error::KeyStoreError;
use crate::params::KeychainParameters;
use crate::store::{KeyStore, KeyringStore};

/// Source of the symmetric key.
pub trait KeyService: Send + Sync {
    /// The stored key, or `Ok(None)` if none exists yet.
    fn fetch_key(&self) -> Result<Option<SymmetricKey>, KeyStoreError>;

    /// Generate a fresh 256-bit key and persist it, replacing any existing one.
    fn create_key(&self) -> Result<SymmetricKey, KeyStoreError>;
}

/// [`KeyService`] backed by a [`KeyStore`] entry.
#[derive(Debug)]
pub struct KeychainKeyService<S = KeyringStore> {
    store: S,
    params: KeychainParameters,
}

impl KeychainKeyService<KeyringStore> {
    /// Platform keychain entry described by `params`.
    pub fn keyring(params: KeychainParameters) -> Self {
        Self::new(KeyringStore::new(), params)
    }
}

impl<S: KeyStore> KeychainKeyService<S> {
    pub fn new(store: S, params: KeychainParameters) -> Self {
        Self { store, params }
    }

    pub fn params(&self) -> &KeychainParameters {
        &self.params
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: KeyStore> KeyService for KeychainKeyService<S> {
    fn fetch_key(&self) -> Result<Option<SymmetricKey>, KeyStoreError> {
        let Some(mut bytes) = self.store.read(&self.params).map_err(|e| {
            warn!(
                service = %self.params.service,
                account = %self.params.account,
                "key fetch failed: {e}"
            );
            e
        })?
        else {
            return Ok(None);
        };

        let key = SymmetricKey::from_bytes(&bytes);
        let len = bytes.len();
        bytes.zeroize();
        key.map(Some)
            .map_err(|_| KeyStoreError::InvalidKeyMaterial { len })
    }

    fn create_key(&self) -> Result<SymmetricKey, KeyStoreError> {
        let key = SymmetricKey::generate(KeySize::Bits256);
        self.store
            .write(&self.params, key.as_bytes())
            .map_err(|e| {
                warn!(
                    service = %self.params.service,
                    account = %self.params.account,
                    "key store failed: {e}"
                );
                e
            })?;
        info!(
            service = %self.params.service,
            account = %self.params.account,
            key_access = %self.params.key_access,
            "created new 256-bit key"
        );
        Ok(key)
    }
}
