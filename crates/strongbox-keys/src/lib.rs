//! strongbox-keys: where the symmetric key lives
//!
//! ```text
//! KeyService (fetch_key / create_key)
//!   └── KeychainKeyService<S>
//!         └── KeyStore (read / write / delete raw bytes)
//!               ├── KeyringStore     platform keychain via `keyring`
//!               └── MemoryKeyStore   process-local map
//! ```
//!
//! A missing key is `Ok(None)`, never an error; store failures are
//! [`KeyStoreError`].

pub mod error;
pub mod params;
pub mod service;
pub mod store;

pub use error::KeyStoreError;
pub use params::KeychainParameters;
pub use service::{KeyService, KeychainKeyService};
pub use store::{KeyStore, KeyringStore, MemoryKeyStore};
