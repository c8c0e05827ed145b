use async_trait::async_trait;
use std::path::Path;
use strongbox_core::Algorithm;

use crate::error::CryptoError;
use crate::key::SymmetricKey;

/// Progress callback, receives `floor(bytes_done * 100 / file_size)`
pub type ProgressFn = Box<dyn Fn(u8) + Send + Sync>;

/// Uniform encrypt/decrypt contract implemented once per algorithm.
///
/// Buffer operations are atomic: they return the whole result or an error,
/// never partial output. File operations stream and only replace `dest` once
/// the whole source has been processed.
#[async_trait]
pub trait CryptoService: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    fn encrypt(&self, data: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, CryptoError>;

    fn decrypt(&self, data: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, CryptoError>;

    async fn encrypt_file(
        &self,
        src: &Path,
        dest: &Path,
        key: &SymmetricKey,
        on_progress: Option<&ProgressFn>,
    ) -> Result<(), CryptoError>;

    async fn decrypt_file(
        &self,
        src: &Path,
        dest: &Path,
        key: &SymmetricKey,
        on_progress: Option<&ProgressFn>,
    ) -> Result<(), CryptoError>;
}
