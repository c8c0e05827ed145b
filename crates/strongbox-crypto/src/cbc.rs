use async_trait::async_trait;
use std::path::Path;
use strongbox_cbc::{Cipher, Operation, Padding, IV_SIZE};
use strongbox_core::Algorithm;
use tracing::info;

use crate::error::CryptoError;
use crate::key::SymmetricKey;
use crate::pipeline::{process_file, PipelineOptions};
use crate::service::{CryptoService, ProgressFn};

/// AES-CBC with PKCS#7 padding.
///
/// The IV is supplied out of band and is not written to the output. Files run
/// through a single incremental engine, so the ciphertext of a file equals the
/// one-shot ciphertext of its contents.
#[derive(Debug, Clone)]
pub struct CbcService {
    iv: [u8; IV_SIZE],
    options: PipelineOptions,
}

impl CbcService {
    pub fn new(iv: [u8; IV_SIZE]) -> Self {
        Self {
            iv,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    async fn run_file(
        &self,
        operation: Operation,
        src: &Path,
        dest: &Path,
        key: &SymmetricKey,
        on_progress: Option<&ProgressFn>,
    ) -> Result<(), CryptoError> {
        let cipher = Cipher::new(operation, key.as_bytes(), &self.iv, Padding::Pkcs7)?;
        process_file(src, dest, cipher, self.options, on_progress).await?;
        info!(?operation, src = %src.display(), dest = %dest.display(), "AES-CBC file done");
        Ok(())
    }
}

#[async_trait]
impl CryptoService for CbcService {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Cbc
    }

    fn encrypt(&self, data: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
        Ok(strongbox_cbc::encrypt(data, key.as_bytes(), &self.iv)?)
    }

    fn decrypt(&self, data: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
        Ok(strongbox_cbc::decrypt(data, key.as_bytes(), &self.iv)?)
    }

    async fn encrypt_file(
        &self,
        src: &Path,
        dest: &Path,
        key: &SymmetricKey,
        on_progress: Option<&ProgressFn>,
    ) -> Result<(), CryptoError> {
        self.run_file(Operation::Encrypt, src, dest, key, on_progress)
            .await
    }

    async fn decrypt_file(
        &self,
        src: &Path,
        dest: &Path,
        key: &SymmetricKey,
        on_progress: Option<&ProgressFn>,
    ) -> Result<(), CryptoError> {
        self.run_file(Operation::Decrypt, src, dest, key, on_progress)
            .await
    }
}
