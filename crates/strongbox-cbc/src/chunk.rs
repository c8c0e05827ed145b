//! Fixed-size batching of byte sources
//!
//! Two front-ends with the same contract:
//!   - [`Chunked`]: adapter over any iterator (pull, synchronous)
//!   - [`read_chunks`]: stream over any `AsyncRead` (pull, asynchronous)
//!
//! Every chunk holds exactly `size` items except possibly the last one. An
//! empty source produces no chunks at all.

use futures::Stream;
use std::io;
use std::iter::Fuse;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Iterator adapter yielding `Vec`s of up to `size` consecutive items.
#[derive(Debug, Clone)]
pub struct Chunked<I> {
    inner: Fuse<I>,
    size: usize,
}

impl<I: Iterator> Chunked<I> {
    /// # Panics
    /// Panics if `size` is 0.
    pub fn new(inner: I, size: usize) -> Self {
        assert!(size > 0, "chunk size must be positive");
        Self {
            inner: inner.fuse(),
            size,
        }
    }

    /// The configured chunk size.
    pub fn chunk_size(&self) -> usize {
        self.size
    }
}

impl<I: Iterator> Iterator for Chunked<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let chunk: Vec<I::Item> = self.inner.by_ref().take(self.size).collect();
        if chunk.is_empty() {
            None
        } else {
            Some(chunk)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (lo, hi) = self.inner.size_hint();
        (lo.div_ceil(self.size), hi.map(|hi| hi.div_ceil(self.size)))
    }
}

/// Extension adding `.chunked(size)` to every iterator.
pub trait ChunkedExt: Iterator + Sized {
    fn chunked(self, size: usize) -> Chunked<Self> {
        Chunked::new(self, size)
    }
}

impl<I: Iterator> ChunkedExt for I {}

/// Read `reader` as a stream of chunks of `chunk_size` bytes.
///
/// Short reads are coalesced, so chunk boundaries depend only on the chunk
/// size and never on how the reader happens to deliver data. Exactly one
/// chunk buffer is alive at a time.
///
/// # Panics
/// Panics if `chunk_size` is 0.
pub fn read_chunks<R>(reader: R, chunk_size: usize) -> impl Stream<Item = io::Result<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    assert!(chunk_size > 0, "chunk size must be positive");

    futures::stream::try_unfold(Some(reader), move |state| async move {
        let Some(mut reader) = state else {
            return Ok(None);
        };

        let mut chunk = vec![0u8; chunk_size];
        let mut filled = 0;
        while filled < chunk_size {
            let n = reader.read(&mut chunk[filled..]).await?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        if filled == 0 {
            return Ok(None);
        }

        // a short chunk means end-of-file was reached
        let next = (filled == chunk_size).then_some(reader);
        chunk.truncate(filled);
        Ok(Some((chunk, next)))
    })
}
