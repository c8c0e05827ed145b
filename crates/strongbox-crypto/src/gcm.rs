use aes_gcm::{Aes128Gcm, Aes256Gcm};
use async_trait::async_trait;
use std::path::Path;
use strongbox_core::config::DEFAULT_YIELD_EVERY;
use strongbox_core::Algorithm;
use tracing::info;

use crate::aead::{self, AeadFraming};
use crate::error::CryptoError;
use crate::key::SymmetricKey;
use crate::pipeline::{process_file, PerChunk, PipelineOptions};
use crate::service::{CryptoService, ProgressFn};

const ALGORITHM: &str = "AES-GCM";

/// AES-GCM keyed by 128- or 256-bit material.
enum GcmCipher {
    Aes128(Aes128Gcm),
    Aes256(Box<Aes256Gcm>),
}

impl GcmCipher {
    fn new(key: &SymmetricKey) -> Result<Self, CryptoError> {
        let bytes = key.as_bytes();
        match bytes.len() {
            16 => aead::init(bytes, ALGORITHM).map(Self::Aes128),
            32 => {
                let cipher: Aes256Gcm = aead::init(bytes, ALGORITHM)?;
                Ok(Self::Aes256(Box::new(cipher)))
            }
            len => Err(CryptoError::InvalidKeyLength {
                algorithm: ALGORITHM,
                len,
            }),
        }
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            Self::Aes128(c) => aead::seal(c, plaintext),
            Self::Aes256(c) => aead::seal(c.as_ref(), plaintext),
        }
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
        match self {
            Self::Aes128(c) => aead::open(c, sealed),
            Self::Aes256(c) => aead::open(c.as_ref(), sealed),
        }
    }
}

/// AES-GCM sealed boxes; files are sealed chunk by chunk.
#[derive(Debug, Clone, Copy)]
pub struct GcmService {
    framing: AeadFraming,
    yield_every: usize,
}

impl GcmService {
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

    fn options(&self, buffer_size: usize) -> PipelineOptions {
        PipelineOptions {
            buffer_size,
            yield_every: self.yield_every,
        }
    }
}

impl Default for GcmService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CryptoService for GcmService {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Gcm
    }

    fn encrypt(&self, data: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
        GcmCipher::new(key)?.seal(data)
    }

    fn decrypt(&self, data: &[u8], key: &SymmetricKey) -> Result<Vec<u8>, CryptoError> {
        GcmCipher::new(key)?.open(data)
    }

    async fn encrypt_file(
        &self,
        src: &Path,
        dest: &Path,
        key: &SymmetricKey,
        on_progress: Option<&ProgressFn>,
    ) -> Result<(), CryptoError> {
        let cipher = GcmCipher::new(key)?;
        let transform = PerChunk(|chunk: &[u8]| cipher.seal(chunk));
        let options = self.options(self.framing.plaintext_chunk());
        process_file(src, dest, transform, options, on_progress).await?;
        info!(src = %src.display(), dest = %dest.display(), "AES-GCM file encrypted");
        Ok(())
    }

    async fn decrypt_file(
        &self,
        src: &Path,
        dest: &Path,
        key: &SymmetricKey,
        on_progress: Option<&ProgressFn>,
    ) -> Result<(), CryptoError> {
        let cipher = GcmCipher::new(key)?;
        let transform = PerChunk(|chunk: &[u8]| cipher.open(chunk));
        let options = self.options(self.framing.sealed_chunk());
        process_file(src, dest, transform, options, on_progress).await?;
        info!(src = %src.display(), dest = %dest.display(), "AES-GCM file decrypted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeySize;
    use rand::RngCore;

    fn random_bytes(len: usize) -> Vec<u8> {
        let mut data = vec![0u8; len];
        rand::thread_rng().fill_bytes(&mut data);
        data
    }

    #[test]
    fn test_roundtrip_128_and_256() {
        let service = GcmService::new();
        for size in [KeySize::Bits128, KeySize::Bits256] {
            let key = SymmetricKey::generate(size);
            let sealed = service.encrypt(b"hello gcm", &key).unwrap();
            assert_eq!(sealed.len(), 9 + 28);
            assert_eq!(service.decrypt(&sealed, &key).unwrap(), b"hello gcm");
        }
    }

    #[test]
    fn test_rejects_192_bit_key() {
        let key = SymmetricKey::generate(KeySize::Bits192);
        let err = GcmService::new().encrypt(b"x", &key).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKeyLength { len: 24, .. }));
    }

    #[test]
    fn test_tamper_detected() {
        let service = GcmService::new();
        let key = SymmetricKey::generate(KeySize::Bits256);
        let mut sealed = service.encrypt(b"integrity", &key).unwrap();
        sealed[14] ^= 0x01;
        assert!(matches!(
            service.decrypt(&sealed, &key),
            Err(CryptoError::Open)
        ));
    }

    #[test]
    fn test_wrong_key() {
        let service = GcmService::new();
        let sealed = service
            .encrypt(b"secret", &SymmetricKey::generate(KeySize::Bits256))
            .unwrap();
        let other = SymmetricKey::generate(KeySize::Bits256);
        assert!(matches!(
            service.decrypt(&sealed, &other),
            Err(CryptoError::Open)
        ));
    }

    #[test]
    fn test_malformed_box() {
        let key = SymmetricKey::generate(KeySize::Bits256);
        assert!(matches!(
            GcmService::new().decrypt(&[0u8; 10], &key),
            Err(CryptoError::MalformedSealedBox { len: 10, .. })
        ));
    }

    #[tokio::test]
    async fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain");
        let sealed = dir.path().join("sealed");
        let opened = dir.path().join("opened");
        let data = random_bytes(10_000);
        std::fs::write(&plain, &data).unwrap();

        let framing = AeadFraming::with_plaintext_chunk(4096).unwrap();
        let service = GcmService::with_framing(framing);
        let key = SymmetricKey::generate(KeySize::Bits256);

        service
            .encrypt_file(&plain, &sealed, &key, None)
            .await
            .unwrap();
        // three chunks: 4096 + 4096 + 1808
        assert_eq!(std::fs::metadata(&sealed).unwrap().len(), 10_000 + 3 * 28);

        service
            .decrypt_file(&sealed, &opened, &key, None)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&opened).unwrap(), data);
    }

    #[tokio::test]
    async fn test_mismatched_framing_fails() {
        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain");
        let sealed = dir.path().join("sealed");
        let opened = dir.path().join("opened");
        std::fs::write(&plain, random_bytes(50_000)).unwrap();

        let key = SymmetricKey::generate(KeySize::Bits256);
        GcmService::new()
            .encrypt_file(&plain, &sealed, &key, None)
            .await
            .unwrap();

        let framing = AeadFraming::with_plaintext_chunk(16 * 1024).unwrap();
        let err = GcmService::with_framing(framing)
            .decrypt_file(&sealed, &opened, &key, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CryptoError::Open));
        assert!(!opened.exists());
    }
}
