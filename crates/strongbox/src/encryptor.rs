use std::path::Path;
use std::sync::Mutex;
use strongbox_cbc::IV_SIZE;
use strongbox_core::{Algorithm, StrongboxConfig};
use strongbox_crypto::{
    CbcService, ChaChaPolyService, CryptoService, GcmService, PipelineOptions, ProgressFn,
    SymmetricKey,
};
use strongbox_keys::{KeyService, KeychainKeyService, KeychainParameters};
use tracing::{debug, info};

use crate::error::{Result, StrongboxError};

/// Which [`CryptoService`] strategy an [`Encryptor`] uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoServiceType {
    /// AES-CBC with an out-of-band IV
    Cbc { iv: [u8; IV_SIZE] },
    /// AES-GCM sealed boxes
    Gcm,
    /// ChaCha20-Poly1305 sealed boxes
    ChaCha20Poly1305,
}

impl CryptoServiceType {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Cbc { .. } => Algorithm::Cbc,
            Self::Gcm => Algorithm::Gcm,
            Self::ChaCha20Poly1305 => Algorithm::ChaCha20Poly1305,
        }
    }

    pub fn into_service(self) -> Box<dyn CryptoService> {
        self.into_service_with(PipelineOptions::default())
    }

    /// AEAD strategies read in fixed framing units, so only `yield_every`
    /// applies to them.
    pub fn into_service_with(self, options: PipelineOptions) -> Box<dyn CryptoService> {
        match self {
            Self::Cbc { iv } => Box::new(CbcService::new(iv).with_options(options)),
            Self::Gcm => Box::new(GcmService::new().with_yield_every(options.yield_every)),
            Self::ChaCha20Poly1305 => {
                Box::new(ChaChaPolyService::new().with_yield_every(options.yield_every))
            }
        }
    }
}

/// Facade pairing one crypto strategy with one key source.
///
/// The key is resolved on first use (fetch, else create) and cached for the
/// lifetime of the `Encryptor`.
pub struct Encryptor {
    service: Box<dyn CryptoService>,
    keys: Box<dyn KeyService>,
    key: Mutex<Option<SymmetricKey>>,
}

impl Encryptor {
    pub fn new(service_type: CryptoServiceType, key_service: impl KeyService + 'static) -> Self {
        Self::from_parts(service_type.into_service(), Box::new(key_service))
    }

    /// Key stored in the platform keychain under `params`.
    pub fn with_keychain(service_type: CryptoServiceType, params: KeychainParameters) -> Self {
        Self::new(service_type, KeychainKeyService::keyring(params))
    }

    /// Build from a config, using the platform keychain.
    pub fn from_config(config: &StrongboxConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| StrongboxError::Config(format!("{e:#}")))?;
        let service_type = service_type_from_config(config)?;
        let options = PipelineOptions {
            buffer_size: config.streaming.buffer_size,
            yield_every: config.streaming.yield_every,
        };
        let params = KeychainParameters::from(&config.keychain);
        debug!(
            algorithm = %service_type.algorithm(),
            service = %params.service,
            "encryptor from config"
        );
        Ok(Self::from_parts(
            service_type.into_service_with(options),
            Box::new(KeychainKeyService::keyring(params)),
        ))
    }

    /// Any strategy with any key source.
    pub fn from_parts(service: Box<dyn CryptoService>, keys: Box<dyn KeyService>) -> Self {
        Self {
            service,
            keys,
            key: Mutex::new(None),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.service.algorithm()
    }

    /// The cached key, or fetch it, or create it.
    pub fn get_or_create_key(&self) -> Result<SymmetricKey> {
        let mut cached = self.key.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(key) = cached.as_ref() {
            return Ok(key.clone());
        }

        let key = match self.keys.fetch_key()? {
            Some(key) => {
                debug!("using stored key");
                key
            }
            None => {
                info!("no stored key, creating one");
                self.keys.create_key()?
            }
        };
        *cached = Some(key.clone());
        Ok(key)
    }

    pub fn encrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let key = self.get_or_create_key()?;
        Ok(self.service.encrypt(data, &key)?)
    }

    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>> {
        let key = self.get_or_create_key()?;
        Ok(self.service.decrypt(data, &key)?)
    }

    /// Encrypt `src` into `dest`, replacing `dest` only on success.
    pub async fn encrypt_file(
        &self,
        src: &Path,
        dest: &Path,
        on_progress: Option<&ProgressFn>,
    ) -> Result<()> {
        let key = self.get_or_create_key()?;
        self.service
            .encrypt_file(src, dest, &key, on_progress)
            .await?;
        Ok(())
    }

    /// Decrypt `src` into `dest`, replacing `dest` only on success.
    pub async fn decrypt_file(
        &self,
        src: &Path,
        dest: &Path,
        on_progress: Option<&ProgressFn>,
    ) -> Result<()> {
        let key = self.get_or_create_key()?;
        self.service
            .decrypt_file(src, dest, &key, on_progress)
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for Encryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let resolved = self.key.lock().map(|k| k.is_some()).unwrap_or(false);
        f.debug_struct("Encryptor")
            .field("algorithm", &self.algorithm())
            .field("key_resolved", &resolved)
            .finish()
    }
}

fn service_type_from_config(config: &StrongboxConfig) -> Result<CryptoServiceType> {
    match config.crypto.algorithm {
        Algorithm::Gcm => Ok(CryptoServiceType::Gcm),
        Algorithm::ChaCha20Poly1305 => Ok(CryptoServiceType::ChaCha20Poly1305),
        Algorithm::Cbc => {
            let iv = config
                .crypto
                .decoded_iv()
                .map_err(|e| StrongboxError::Config(format!("{e:#}")))?
                .ok_or_else(|| StrongboxError::Config("crypto.iv is required for cbc".into()))?;
            let iv: [u8; IV_SIZE] = iv.as_slice().try_into().map_err(|_| {
                StrongboxError::Config(format!(
                    "crypto.iv must decode to {IV_SIZE} bytes, got {}",
                    iv.len()
                ))
            })?;
            Ok(CryptoServiceType::Cbc { iv })
        }
    }
}
