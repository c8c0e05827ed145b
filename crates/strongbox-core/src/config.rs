use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::types::{Algorithm, KeyAccess};

/// Default read buffer for the streaming file pipeline (bytes)
pub const DEFAULT_BUFFER_SIZE: usize = 32_000;

/// Default number of chunks processed between cooperative yields
pub const DEFAULT_YIELD_EVERY: usize = 10;

/// Top-level encryptor configuration (loaded from strongbox.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StrongboxConfig {
    pub crypto: CryptoConfig,
    pub keychain: KeychainConfig,
    pub streaming: StreamingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// Algorithm: "cbc", "gcm" or "chacha20poly1305" (default: gcm)
    pub algorithm: Algorithm,
    /// Base64 CBC initialization vector, 16 bytes once decoded (CBC only)
    pub iv: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeychainConfig {
    /// Keychain service name (default: strongbox)
    pub service: String,
    /// Keychain account name (default: encryption-key)
    pub account: String,
    /// Accessibility class for newly created keys
    pub key_access: KeyAccess,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Read buffer for CBC file streaming in bytes (default: 32000)
    pub buffer_size: usize,
    /// Yield to the scheduler every N chunks, 0 disables (default: 10)
    pub yield_every: usize,
}

impl Default for KeychainConfig {
    fn default() -> Self {
        Self {
            service: "strongbox".into(),
            account: "encryption-key".into(),
            key_access: KeyAccess::default(),
        }
    }
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            yield_every: DEFAULT_YIELD_EVERY,
        }
    }
}

impl StrongboxConfig {
    /// Load and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let config = Self::from_toml_str(&raw)
            .with_context(|| format!("parsing config: {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            algorithm = %config.crypto.algorithm,
            "loaded config"
        );
        Ok(config)
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: StrongboxConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.streaming.buffer_size == 0 {
            anyhow::bail!("streaming.buffer_size must be > 0");
        }
        if self.keychain.service.is_empty() || self.keychain.account.is_empty() {
            anyhow::bail!("keychain.service and keychain.account must not be empty");
        }
        match (self.crypto.algorithm, self.crypto.decoded_iv()?) {
            (Algorithm::Cbc, None) => anyhow::bail!("crypto.iv is required for cbc"),
            (Algorithm::Cbc, Some(iv)) if iv.len() != 16 => {
                anyhow::bail!("crypto.iv must decode to 16 bytes, got {}", iv.len())
            }
            (Algorithm::Gcm | Algorithm::ChaCha20Poly1305, Some(_)) => {
                tracing::warn!(
                    algorithm = %self.crypto.algorithm,
                    "crypto.iv is ignored for this algorithm"
                );
            }
            _ => {}
        }
        Ok(())
    }
}

impl CryptoConfig {
    /// Decode the configured IV, if any.
    pub fn decoded_iv(&self) -> Result<Option<Vec<u8>>> {
        self.iv
            .as_deref()
            .map(|iv| {
                STANDARD
                    .decode(iv.trim())
                    .with_context(|| "crypto.iv is not valid base64")
            })
            .transpose()
    }
}
