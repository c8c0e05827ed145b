//! strongbox-cbc: incremental AES-CBC and chunked byte streaming
//!
//! The [`Cipher`] engine accepts input in arbitrarily sized pieces and only
//! resolves PKCS#7 padding once [`Cipher::finalize`] is called, so a file of
//! any size can be processed with memory bounded by the chunk size:
//!
//! ```text
//! source bytes ─▶ chunked(size) ─▶ update() × N ─▶ finalize() × 1 ─▶ sink
//! ```
//!
//! - `chunk`: fixed-size batching over iterators and async readers
//! - `cipher`: the two-state engine (`Active` → `Finalized`)
//! - `stream`: adapters that drive an engine across a chunk source

pub mod chunk;
pub mod cipher;
pub mod error;
pub mod stream;

pub use chunk::{read_chunks, Chunked, ChunkedExt};
pub use cipher::{decrypt, encrypt, Cipher, Operation, Padding};
pub use error::{CipherError, Status};
pub use stream::{cipher_bytes, cipher_chunks, CipherIter, DEFAULT_CHUNK_SIZE};

/// AES block size in bytes
pub const BLOCK_SIZE: usize = 16;

/// CBC initialization vector size in bytes
pub const IV_SIZE: usize = 16;
