use std::fmt;
use thiserror::Error;

/// Reason reported by the block-cipher context when it rejects a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Key is not 16, 24 or 32 bytes
    InvalidKeyLength(usize),
    /// IV is not exactly one block
    InvalidIvLength(usize),
    /// Buffered input is not a whole number of blocks
    Alignment(usize),
    /// PKCS#7 padding of the final block is malformed
    BadPadding,
    /// Output or input buffer could not be grown
    MemoryFailure,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::InvalidKeyLength(len) => {
                write!(f, "invalid key length {len} (expected 16, 24 or 32)")
            }
            Status::InvalidIvLength(len) => write!(f, "invalid IV length {len} (expected 16)"),
            Status::Alignment(len) => write!(
                f,
                "input of {len} bytes is not a multiple of the block size"
            ),
            Status::BadPadding => write!(f, "bad PKCS#7 padding"),
            Status::MemoryFailure => write!(f, "buffer allocation failed"),
        }
    }
}

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("could not create cipher context: {status}")]
    ContextCreation { status: Status },

    #[error("cipher is finalized")]
    Finalized,

    #[error("could not update cipher: {status}")]
    Update { status: Status },

    #[error("could not finalize cipher: {status}")]
    Finalization { status: Status },

    #[error("I/O error while reading cipher input: {0}")]
    Io(#[from] std::io::Error),
}
