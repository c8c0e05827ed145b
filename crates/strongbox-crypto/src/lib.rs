//! strongbox-crypto: symmetric encryption of buffers and streamed files
//!
//! Three interchangeable [`CryptoService`] strategies share one contract:
//!
//! ```text
//! CbcService        AES-CBC, PKCS#7, out-of-band IV   one incremental engine per file
//! GcmService        AES-GCM sealed boxes              one sealed box per chunk
//! ChaChaPolyService ChaCha20-Poly1305 sealed boxes    one sealed box per chunk
//! ```
//!
//! File operations stream through [`pipeline::process_file`]: bounded reads,
//! immediate writes to a temporary file next to the destination, progress
//! reporting, and an atomic rename on success.

pub mod aead;
pub mod cbc;
pub mod chacha;
pub mod error;
pub mod gcm;
pub mod key;
pub mod pipeline;
pub mod service;

pub use aead::AeadFraming;
pub use cbc::CbcService;
pub use chacha::ChaChaPolyService;
pub use error::CryptoError;
pub use gcm::GcmService;
pub use key::{KeySize, SymmetricKey};
pub use pipeline::{process_file, ChunkTransform, PerChunk, PipelineOptions};
pub use service::{CryptoService, ProgressFn};

/// Size of an AEAD nonce in the combined sealed-box layout (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of an AEAD authentication tag
pub const TAG_SIZE: usize = 16;
