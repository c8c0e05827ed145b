use std::io;
use std::path::PathBuf;
use strongbox_cbc::CipherError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error("invalid {algorithm} key length: {len} bytes")]
    InvalidKeyLength { algorithm: &'static str, len: usize },

    #[error("sealing failed")]
    Seal,

    #[error("authentication failed: tampered data, wrong key, or mismatched chunk size")]
    Open,

    #[error("sealed box too short: {len} bytes (minimum {min})")]
    MalformedSealedBox { len: usize, min: usize },

    #[error("invalid AEAD framing: plaintext chunk of {plaintext_chunk} bytes")]
    InvalidFraming { plaintext_chunk: usize },

    #[error("source file not found: {}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create output stream for {}", path.display())]
    OutputStreamCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to move output into place at {}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
