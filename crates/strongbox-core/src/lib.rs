pub mod config;
pub mod types;

pub use config::{CryptoConfig, KeychainConfig, StreamingConfig, StrongboxConfig};
pub use types::{Algorithm, KeyAccess};
