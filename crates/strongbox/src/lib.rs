//! strongbox: at-rest symmetric encryption of buffers and files
//!
//! ```text
//! Encryptor
//!   ├── CryptoService   CBC | GCM | ChaCha20-Poly1305   (strongbox-crypto)
//!   │     └── pipeline  chunked, atomic file replace
//!   └── KeyService      fetch-or-create, memoized       (strongbox-keys)
//! ```
//!
//! ```no_run
//! # async fn run() -> strongbox::Result<()> {
//! use std::path::Path;
//! use strongbox::{CryptoServiceType, Encryptor, KeychainParameters};
//!
//! let encryptor = Encryptor::with_keychain(CryptoServiceType::Gcm, KeychainParameters::default());
//! let sealed = encryptor.encrypt(b"secret")?;
//! assert_eq!(encryptor.decrypt(&sealed)?, b"secret");
//!
//! encryptor
//!     .encrypt_file(Path::new("notes.txt"), Path::new("notes.txt.enc"), None)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod encryptor;
pub mod error;

pub use encryptor::{CryptoServiceType, Encryptor};
pub use error::{Result, StrongboxError};

pub use strongbox_core::{Algorithm, KeyAccess, StrongboxConfig};
pub use strongbox_crypto::{CryptoError, CryptoService, KeySize, ProgressFn, SymmetricKey};
pub use strongbox_keys::{
    KeyService, KeyStore, KeyStoreError, KeychainKeyService, KeychainParameters, KeyringStore,
    MemoryKeyStore,
};
