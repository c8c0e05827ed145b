//! Sealed-box helpers shared by the AEAD services
//!
//! Wire format of one sealed box:
//!   [12 bytes: random nonce][N bytes: ciphertext][16 bytes: tag]
//!
//! Files are a plain concatenation of sealed boxes, one per plaintext chunk.
//! Nothing marks chunk boundaries, so the reader must use the same
//! [`AeadFraming`] as the writer.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, Nonce};
use rand::RngCore;

use crate::error::CryptoError;
use crate::{NONCE_SIZE, TAG_SIZE};

/// Chunk framing for AEAD files.
///
/// A framing always has a non-zero chunk size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AeadFraming {
    version: u8,
    plaintext_chunk: usize,
    overhead: usize,
}

impl AeadFraming {
    /// 32 KiB plaintext chunks, nonce and tag inline, no header.
    pub const V1: AeadFraming = AeadFraming {
        version: 1,
        plaintext_chunk: 32 * 1024,
        overhead: NONCE_SIZE + TAG_SIZE,
    };

    /// V1 layout with a custom plaintext chunk size.
    pub fn with_plaintext_chunk(plaintext_chunk: usize) -> Result<Self, CryptoError> {
        if plaintext_chunk == 0 {
            return Err(CryptoError::InvalidFraming { plaintext_chunk });
        }
        Ok(Self {
            plaintext_chunk,
            ..Self::V1
        })
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Plaintext bytes sealed per chunk (the last chunk may be shorter)
    pub fn plaintext_chunk(&self) -> usize {
        self.plaintext_chunk
    }

    /// Bytes added to every sealed chunk
    pub fn overhead(&self) -> usize {
        self.overhead
    }

    /// Read size when opening a file: one full sealed chunk.
    pub fn sealed_chunk(&self) -> usize {
        self.plaintext_chunk + self.overhead
    }
}

impl Default for AeadFraming {
    fn default() -> Self {
        Self::V1
    }
}

pub(crate) fn init<A: KeyInit>(key: &[u8], algorithm: &'static str) -> Result<A, CryptoError> {
    A::new_from_slice(key).map_err(|_| CryptoError::InvalidKeyLength {
        algorithm,
        len: key.len(),
    })
}

/// Seal `plaintext` under a fresh random nonce.
///
/// Returns: `[nonce][ciphertext][tag]`
pub(crate) fn seal<A>(cipher: &A, plaintext: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    A: Aead + AeadCore<NonceSize = U12>,
{
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::<A>::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CryptoError::Seal)?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Open a sealed box produced by [`seal`].
pub(crate) fn open<A>(cipher: &A, sealed: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    A: Aead + AeadCore<NonceSize = U12>,
{
    let min = NONCE_SIZE + TAG_SIZE;
    if sealed.len() < min {
        return Err(CryptoError::MalformedSealedBox {
            len: sealed.len(),
            min,
        });
    }

    let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_SIZE);
    let nonce = Nonce::<A>::from_slice(nonce_bytes);
    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| CryptoError::Open)
}
