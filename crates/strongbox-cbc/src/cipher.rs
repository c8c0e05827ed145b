//! Incremental AES-CBC engine
//!
//! A [`Cipher`] owns one block-cipher context (key schedule plus chaining
//! block) and moves through exactly two states:
//!
//! ```text
//! Active { buffer } ──finalize() ok──▶ Finalized
//! ```
//!
//! `update` emits only whole blocks and keeps the remainder in the active
//! buffer. On PKCS#7 decryption the last whole block is also held back, since
//! only `finalize` knows whether it carries the padding. Every call on a
//! finalized engine fails with [`CipherError::Finalized`].

use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use aes::{Aes128Dec, Aes128Enc, Aes192Dec, Aes192Enc, Aes256Dec, Aes256Enc, Block};
use std::fmt;
use zeroize::Zeroize;

use crate::error::{CipherError, Status};
use crate::{BLOCK_SIZE, IV_SIZE};

/// Direction of a cipher context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Encrypt,
    Decrypt,
}

/// Block padding applied on encrypt and verified on decrypt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Padding {
    #[default]
    Pkcs7,
    /// Input must be block aligned; nothing is added or stripped
    None,
}

enum BlockCipher {
    Aes128Enc(Aes128Enc),
    Aes192Enc(Aes192Enc),
    Aes256Enc(Aes256Enc),
    Aes128Dec(Aes128Dec),
    Aes192Dec(Aes192Dec),
    Aes256Dec(Aes256Dec),
}

impl BlockCipher {
    fn new(operation: Operation, key: &[u8]) -> Result<Self, Status> {
        let cipher = match (operation, key.len()) {
            (Operation::Encrypt, 16) => Aes128Enc::new_from_slice(key).map(Self::Aes128Enc),
            (Operation::Encrypt, 24) => Aes192Enc::new_from_slice(key).map(Self::Aes192Enc),
            (Operation::Encrypt, 32) => Aes256Enc::new_from_slice(key).map(Self::Aes256Enc),
            (Operation::Decrypt, 16) => Aes128Dec::new_from_slice(key).map(Self::Aes128Dec),
            (Operation::Decrypt, 24) => Aes192Dec::new_from_slice(key).map(Self::Aes192Dec),
            (Operation::Decrypt, 32) => Aes256Dec::new_from_slice(key).map(Self::Aes256Dec),
            (_, len) => return Err(Status::InvalidKeyLength(len)),
        };
        cipher.map_err(|_| Status::InvalidKeyLength(key.len()))
    }

    fn operation(&self) -> Operation {
        match self {
            Self::Aes128Enc(_) | Self::Aes192Enc(_) | Self::Aes256Enc(_) => Operation::Encrypt,
            Self::Aes128Dec(_) | Self::Aes192Dec(_) | Self::Aes256Dec(_) => Operation::Decrypt,
        }
    }

    /// Apply the raw block transform in place.
    fn apply(&self, block: &mut Block) {
        match self {
            Self::Aes128Enc(c) => c.encrypt_block(block),
            Self::Aes192Enc(c) => c.encrypt_block(block),
            Self::Aes256Enc(c) => c.encrypt_block(block),
            Self::Aes128Dec(c) => c.decrypt_block(block),
            Self::Aes192Dec(c) => c.decrypt_block(block),
            Self::Aes256Dec(c) => c.decrypt_block(block),
        }
    }
}

/// Native block-cipher context: key schedule, direction and CBC chaining block.
struct Context {
    cipher: BlockCipher,
    chain: [u8; BLOCK_SIZE],
    padding: Padding,
}

impl Context {
    fn operation(&self) -> Operation {
        self.cipher.operation()
    }

    /// Chain one block and advance the chaining value.
    fn chain_block(&mut self, input: &[u8], out: &mut Vec<u8>) {
        let mut block = Block::clone_from_slice(input);
        match self.operation() {
            Operation::Encrypt => {
                xor_in_place(&mut block, &self.chain);
                self.cipher.apply(&mut block);
                self.chain.copy_from_slice(&block);
                out.extend_from_slice(&block);
            }
            Operation::Decrypt => {
                self.cipher.apply(&mut block);
                xor_in_place(&mut block, &self.chain);
                self.chain.copy_from_slice(input);
                out.extend_from_slice(&block);
            }
        }
        block.as_mut_slice().zeroize();
    }

    /// Number of buffered bytes that may be emitted now.
    fn ready_len(&self, buffered: usize) -> usize {
        let whole = buffered - buffered % BLOCK_SIZE;
        match (self.operation(), self.padding) {
            // the final block may be padding; keep it for finalize
            (Operation::Decrypt, Padding::Pkcs7) if whole == buffered && whole > 0 => {
                whole - BLOCK_SIZE
            }
            _ => whole,
        }
    }

    fn update(&mut self, buffer: &mut Vec<u8>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
        buffer
            .try_reserve(data.len())
            .map_err(|_| CipherError::Update {
                status: Status::MemoryFailure,
            })?;
        buffer.extend_from_slice(data);

        let ready = self.ready_len(buffer.len());
        let mut out = Vec::new();
        out.try_reserve_exact(ready)
            .map_err(|_| CipherError::Update {
                status: Status::MemoryFailure,
            })?;

        for block in buffer[..ready].chunks_exact(BLOCK_SIZE) {
            self.chain_block(block, &mut out);
        }
        buffer[..ready].zeroize();
        buffer.drain(..ready);
        Ok(out)
    }

    /// Resolve the buffered tail. Leaves `buffer` and the chain untouched on error.
    fn finalize(&mut self, buffer: &[u8]) -> Result<Vec<u8>, CipherError> {
        let misaligned = |len| CipherError::Finalization {
            status: Status::Alignment(len),
        };

        match (self.operation(), self.padding) {
            (Operation::Encrypt, Padding::Pkcs7) => {
                let pad = (BLOCK_SIZE - buffer.len()) as u8;
                let mut last = [pad; BLOCK_SIZE];
                last[..buffer.len()].copy_from_slice(buffer);
                let mut out = Vec::with_capacity(BLOCK_SIZE);
                self.chain_block(&last, &mut out);
                last.zeroize();
                Ok(out)
            }
            (Operation::Decrypt, Padding::Pkcs7) => {
                if buffer.len() != BLOCK_SIZE {
                    return Err(misaligned(buffer.len()));
                }
                let mut block = Block::clone_from_slice(buffer);
                self.cipher.apply(&mut block);
                xor_in_place(&mut block, &self.chain);

                let result = match unpadded_len(&block) {
                    Some(len) => Ok(block[..len].to_vec()),
                    None => Err(CipherError::Finalization {
                        status: Status::BadPadding,
                    }),
                };
                block.as_mut_slice().zeroize();
                result
            }
            (_, Padding::None) => {
                if buffer.is_empty() {
                    Ok(Vec::new())
                } else {
                    Err(misaligned(buffer.len()))
                }
            }
        }
    }
}

impl Drop for Context {
    fn drop(&mut self) {
        self.chain.zeroize();
    }
}

/// Engine lifecycle.
enum State {
    Active { buffer: Vec<u8> },
    Finalized,
}

/// Incremental AES-CBC cipher.
///
/// ```
/// use strongbox_cbc::{Cipher, Operation, Padding};
///
/// let key = [7u8; 32];
/// let iv = [1u8; 16];
/// let mut enc = Cipher::new(Operation::Encrypt, &key, &iv, Padding::Pkcs7).unwrap();
/// let mut ciphertext = enc.update(b"hello ").unwrap();
/// ciphertext.extend(enc.update(b"world").unwrap());
/// ciphertext.extend(enc.finalize().unwrap());
///
/// let plaintext = strongbox_cbc::decrypt(&ciphertext, &key, &iv).unwrap();
/// assert_eq!(plaintext, b"hello world");
/// ```
pub struct Cipher {
    context: Context,
    state: State,
}

impl Cipher {
    /// Create a context bound to `key` (16, 24 or 32 bytes) and a 16-byte `iv`.
    pub fn new(
        operation: Operation,
        key: &[u8],
        iv: &[u8],
        padding: Padding,
    ) -> Result<Self, CipherError> {
        let chain: [u8; IV_SIZE] = iv.try_into().map_err(|_| CipherError::ContextCreation {
            status: Status::InvalidIvLength(iv.len()),
        })?;
        let cipher = BlockCipher::new(operation, key)
            .map_err(|status| CipherError::ContextCreation { status })?;

        tracing::debug!(?operation, ?padding, key_bits = key.len() * 8, "created CBC context");

        Ok(Self {
            context: Context {
                cipher,
                chain,
                padding,
            },
            state: State::Active { buffer: Vec::new() },
        })
    }

    pub fn operation(&self) -> Operation {
        self.context.operation()
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self.state, State::Finalized)
    }

    /// Feed `data` and return the blocks that are complete now.
    pub fn update(&mut self, data: &[u8]) -> Result<Vec<u8>, CipherError> {
        match &mut self.state {
            State::Active { buffer } => self.context.update(buffer, data),
            State::Finalized => Err(CipherError::Finalized),
        }
    }

    /// Flush the buffered tail, adding (encrypt) or checking and stripping
    /// (decrypt) the padding. Succeeds at most once per engine.
    pub fn finalize(&mut self) -> Result<Vec<u8>, CipherError> {
        match &mut self.state {
            State::Active { buffer } => {
                let out = self.context.finalize(buffer)?;
                buffer.zeroize();
                self.state = State::Finalized;
                tracing::debug!(operation = ?self.operation(), "finalized CBC context");
                Ok(out)
            }
            State::Finalized => Err(CipherError::Finalized),
        }
    }
}

impl Drop for Cipher {
    fn drop(&mut self) {
        if let State::Active { buffer } = &mut self.state {
            buffer.zeroize();
        }
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher")
            .field("operation", &self.operation())
            .field("padding", &self.context.padding)
            .field("finalized", &self.is_finalized())
            .finish_non_exhaustive()
    }
}

/// One-shot PKCS#7 AES-CBC encryption.
pub fn encrypt(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CipherError> {
    one_shot(Operation::Encrypt, data, key, iv)
}

/// One-shot PKCS#7 AES-CBC decryption.
pub fn decrypt(data: &[u8], key: &[u8], iv: &[u8]) -> Result<Vec<u8>, CipherError> {
    one_shot(Operation::Decrypt, data, key, iv)
}

fn one_shot(
    operation: Operation,
    data: &[u8],
    key: &[u8],
    iv: &[u8],
) -> Result<Vec<u8>, CipherError> {
    let mut cipher = Cipher::new(operation, key, iv, Padding::Pkcs7)?;
    let mut out = cipher.update(data)?;
    match cipher.finalize() {
        Ok(tail) => {
            out.extend_from_slice(&tail);
            Ok(out)
        }
        Err(e) => {
            out.zeroize();
            Err(e)
        }
    }
}

fn xor_in_place(block: &mut Block, other: &[u8; BLOCK_SIZE]) {
    for (b, o) in block.iter_mut().zip(other) {
        *b ^= o;
    }
}

/// Length of the plaintext in a decrypted final block, if its padding is valid.
fn unpadded_len(block: &[u8]) -> Option<usize> {
    let pad = *block.last()? as usize;
    if pad == 0 || pad > BLOCK_SIZE {
        return None;
    }
    let (data, padding) = block.split_at(BLOCK_SIZE - pad);
    padding
        .iter()
        .all(|&b| b as usize == pad)
        .then_some(data.len())
}
