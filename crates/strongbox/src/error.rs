use strongbox_crypto::CryptoError;
use strongbox_keys::KeyStoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrongboxError {
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("key store error: {0}")]
    KeyStore(#[from] KeyStoreError),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, StrongboxError>;
