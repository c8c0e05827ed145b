//! Drive a [`Cipher`] across a chunked source.
//!
//! Both adapters emit one `update` output per source chunk, then exactly one
//! `finalize` output, then end. The first error ends the sequence.

use futures::{Stream, StreamExt};
use std::io;

use crate::chunk::{Chunked, ChunkedExt};
use crate::cipher::Cipher;
use crate::error::CipherError;

/// Default batch size for cipher streams (32 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 32 * 1024;

/// Transform a stream of chunks (e.g. from [`read_chunks`](crate::read_chunks)).
///
/// If `cipher` is already finalized the first item is [`CipherError::Finalized`].
pub fn cipher_chunks<S>(
    chunks: S,
    cipher: Cipher,
) -> impl Stream<Item = Result<Vec<u8>, CipherError>>
where
    S: Stream<Item = io::Result<Vec<u8>>> + Unpin,
{
    futures::stream::unfold(Some((chunks, cipher)), |state| async move {
        let (mut chunks, mut cipher) = state?;
        let item = match chunks.next().await {
            Some(Ok(chunk)) => cipher.update(&chunk),
            Some(Err(e)) => Err(CipherError::Io(e)),
            None => return Some((cipher.finalize(), None)),
        };
        let next = item.is_ok().then_some((chunks, cipher));
        Some((item, next))
    })
}

/// Synchronous cipher adapter over a byte iterator.
#[derive(Debug)]
pub struct CipherIter<I: Iterator<Item = u8>> {
    chunks: Chunked<I>,
    cipher: Cipher,
    done: bool,
}

impl<I: Iterator<Item = u8>> Iterator for CipherIter<I> {
    type Item = Result<Vec<u8>, CipherError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.chunks.next() {
            Some(chunk) => self.cipher.update(&chunk),
            None => {
                self.done = true;
                self.cipher.finalize()
            }
        };
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

/// Batch `bytes` into `chunk_size` pieces and run them through `cipher`.
pub fn cipher_bytes<I>(bytes: I, cipher: Cipher, chunk_size: usize) -> CipherIter<I::IntoIter>
where
    I: IntoIterator<Item = u8>,
{
    CipherIter {
        chunks: bytes.into_iter().chunked(chunk_size),
        cipher,
        done: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::read_chunks;
    use crate::cipher::{decrypt, encrypt, Operation, Padding};
    use futures::TryStreamExt;
    use rand::RngCore;

    const KEY: [u8; 16] = [0x11; 16];
    const IV: [u8; 16] = [0x22; 16];

    fn input() -> Vec<u8> {
        let mut data = vec![0u8; 100_000];
        rand::thread_rng().fill_bytes(&mut data);
        data
    }

    fn encryptor() -> Cipher {
        Cipher::new(Operation::Encrypt, &KEY, &IV, Padding::Pkcs7).unwrap()
    }

    #[tokio::test]
    async fn test_stream_encrypts_reader() {
        let data = input();
        let chunks = Box::pin(read_chunks(&data[..], DEFAULT_CHUNK_SIZE));

        let batches: Vec<Vec<u8>> = cipher_chunks(chunks, encryptor())
            .try_collect()
            .await
            .unwrap();

        // 4 chunks (3 full + 1 short) plus the finalize batch
        assert_eq!(batches.len(), 5);
        let decrypted = decrypt(&batches.concat(), &KEY, &IV).unwrap();
        assert_eq!(decrypted, data);
    }

    #[tokio::test]
    async fn test_stream_decrypts() {
        let data = input();
        let encrypted = encrypt(&data, &KEY, &IV).unwrap();
        let cipher = Cipher::new(Operation::Decrypt, &KEY, &IV, Padding::Pkcs7).unwrap();
        let chunks = Box::pin(read_chunks(&encrypted[..], 1000));

        let batches: Vec<Vec<u8>> = cipher_chunks(chunks, cipher).try_collect().await.unwrap();
        assert_eq!(batches.concat(), data);
    }

    #[tokio::test]
    async fn test_stream_empty_source_only_finalizes() {
        let chunks = Box::pin(read_chunks(&b""[..], 64));
        let batches: Vec<Vec<u8>> = cipher_chunks(chunks, encryptor())
            .try_collect()
            .await
            .unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 16);
    }

    #[tokio::test]
    async fn test_stream_fails_when_finalized_prematurely() {
        let mut cipher = encryptor();
        cipher.finalize().unwrap();

        let chunks = Box::pin(read_chunks(&b"some bytes"[..], 64));
        let mut stream = Box::pin(cipher_chunks(chunks, cipher));

        assert!(matches!(stream.next().await, Some(Err(CipherError::Finalized))));
        assert!(stream.next().await.is_none(), "stream ends after the first error");
    }

    #[tokio::test]
    async fn test_stream_propagates_io_error() {
        let source = futures::stream::iter(vec![
            Ok(vec![1u8; 32]),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "gone")),
            Ok(vec![2u8; 32]),
        ]);
        let results: Vec<_> = cipher_chunks(source, encryptor()).collect().await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().len(), 32);
        assert!(matches!(results[1], Err(CipherError::Io(_))));
    }

    #[test]
    fn test_iter_roundtrip() {
        let data = input();
        let encrypted: Vec<u8> = cipher_bytes(data.iter().copied(), encryptor(), 4096)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .concat();

        let decryptor = Cipher::new(Operation::Decrypt, &KEY, &IV, Padding::Pkcs7).unwrap();
        let decrypted: Vec<u8> = cipher_bytes(encrypted, decryptor, 777)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
            .concat();

        assert_eq!(decrypted, data);
    }

    #[test]
    fn test_iter_stops_after_error() {
        let mut cipher = encryptor();
        cipher.finalize().unwrap();

        let mut iter = cipher_bytes(vec![1u8, 2, 3], cipher, 2);
        assert!(matches!(iter.next(), Some(Err(CipherError::Finalized))));
        assert!(iter.next().is_none());
    }
}
