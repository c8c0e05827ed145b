use async_trait::async_trait;
use chacha20poly1305::ChaCha20Poly1305;
use std::path::Path;
use strongbox_core::config::DEFAULT_YIELD_EVERY;
use strongbox_core::Algorithm;
use tracing::info;

use crate::aead::{self, AeadFraming};
use crate::error::CryptoError;
use crate::key::SymmetricKey;
use crate::pipeline::{process_file, PerChunk, PipelineOptions};
use crate::service::{CryptoService, ProgressFn};

const ALGORITHM: &str = "ChaCha20-Poly1305";

/// ChaCha20-Poly1305 (IETF, 96-bit nonce) sealed boxes. 256-bit keys only.
#[derive(Debug, Clone, Copy)]
pub struct ChaChaPolyService {
    framing: AeadFraming,
    yield_every: usize,
}

impl ChaChaPolyService {
    pub fn new() -> Self {
        Self::with_framing(AeadFraming::V1)
    }

    pub fn with_framing(framing: AeadFraming) -> Self {
        Self {
            framing,
            yield_every: DEFAULT_YIELD_EVERY,
        }
    }

    pub fn with_yield_every(mut self, yield_every: usize) -> Self {
        self.yield_every = yield_every;
        self
    }

    pub fn framing(&self) -> AeadFraming {
        self.framing
    }

    fn cipher(key: &SymmetricKey) -> Result<ChaCha20Poly1305, CryptoError> {
        aead::init(key.as_bytes(), ALGORITHM)
    }

    fn options(&self, buffer_size: usize) -> PipelineOptions {
        PipelineOptions {
            buffer_size,
            yield_every: self.yield_every,
        }
    }
}

impl Default for ChaChaPolyService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CryptoService for ChaChaPolyService {
    fn algorithm(&self) -> Algorithm {
        Algorithm::ChaCha20Poly1305
    }

    fn encrypt(&self, data: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
        aead::seal(&Self::cipher(key)?, data)
    }

    fn decrypt(&self, data: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
        aead::open(&Self::cipher(key)?, data)
    }

    async fn encrypt_file(
        &self,
        src: &Path,
        dest: &Path,
        key: &SymmetricKey,
        on_progress: Option<&ProgressFn>,
    ) -> Result<(), CryptoError> {
        let cipher = Self::cipher(key)?;
        let transform = PerChunk(|chunk: &[u8]| aead::seal(&cipher, chunk));
        let options = self.options(self.framing.plaintext_chunk());
        process_file(src, dest, transform, options, on_progress).await?;
        info!(src = %src.display(), dest = %dest.display(), "ChaCha20-Poly1305 file encrypted");
        Ok(())
    }

    async fn decrypt_file(
        &self,
        src: &Path,
        dest: &Path,
        key: &SymmetricKey,
        on_progress: Option<&ProgressFn>,
    ) -> Result<(), CryptoError> {
        let cipher = Self::cipher(key)?;
        let transform = PerChunk(|chunk: &[u8]| aead::open(&cipher, chunk));
        let options = self.options(self.framing.sealed_chunk());
        process_file(src, dest, transform, options, on_progress).await?;
        info!(src = %src.display(), dest = %dest.display(), "ChaCha20-Poly1305 file decrypted");
        Ok(())
    }
}
