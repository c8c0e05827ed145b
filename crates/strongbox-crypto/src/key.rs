//! Raw symmetric key material

use rand::RngCore;
use zeroize::Zeroize;

use crate::error::CryptoError;

/// Supported symmetric key sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySize {
    Bits128,
    Bits192,
    Bits256,
}

impl KeySize {
    pub fn byte_len(&self) -> usize {
        match self {
            KeySize::Bits128 => 16,
            KeySize::Bits192 => 24,
            KeySize::Bits256 => 32,
        }
    }

    fn from_len(len: usize) -> Option<Self> {
        match len {
            16 => Some(KeySize::Bits128),
            24 => Some(KeySize::Bits192),
            32 => Some(KeySize::Bits256),
            _ => None,
        }
    }
}

/// A symmetric key (128, 192 or 256 bits). Zeroized on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: Vec<u8>,
}

impl SymmetricKey {
    /// Generate a random key of the given size.
    pub fn generate(size: KeySize) -> Self {
        let mut bytes = vec![0u8; size.byte_len()];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Wrap existing key material; the length must be 16, 24 or 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        KeySize::from_len(bytes.len()).ok_or(CryptoError::InvalidKeyLength {
            algorithm: "symmetric",
            len: bytes.len(),
        })?;
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Fixed-length byte view, used to persist the key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> KeySize {
        match self.bytes.len() {
            16 => KeySize::Bits128,
            24 => KeySize::Bits192,
            _ => KeySize::Bits256,
        }
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("size", &self.size())
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_generation() {
        let k1 = SymmetricKey::generate(KeySize::Bits256);
        let k2 = SymmetricKey::generate(KeySize::Bits256);
        assert_eq!(k1.as_bytes().len(), 32);
        assert_ne!(k1.as_bytes(), k2.as_bytes(), "random keys must differ");
    }

    #[test]
    fn test_generated_sizes() {
        for size in [KeySize::Bits128, KeySize::Bits192, KeySize::Bits256] {
            let key = SymmetricKey::generate(size);
            assert_eq!(key.as_bytes().len(), size.byte_len());
            assert_eq!(key.size(), size);
        }
    }

    #[test]
    fn test_from_bytes_rejects_bad_length() {
        let result = SymmetricKey::from_bytes(&[0u8; 31]);
        assert!(matches!(
            result,
            Err(CryptoError::InvalidKeyLength { len: 31, .. })
        ));
    }

    #[test]
    fn test_from_bytes_roundtrip() {
        let key = SymmetricKey::generate(KeySize::Bits128);
        let copy = SymmetricKey::from_bytes(key.as_bytes()).unwrap();
        assert_eq!(key.as_bytes(), copy.as_bytes());
    }

    #[test]
    fn test_debug_redacts() {
        let key = SymmetricKey::from_bytes(&[0x41u8; 32]).unwrap();
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("65"));
    }
}
