//! Streaming file pipeline
//!
//! ```text
//! stat(src) ─▶ open temp next to dest ─▶ chunk loop ─▶ finish ─▶ rename over dest
//! ```
//!
//! Every chunk is transformed and written out immediately, so memory stays
//! bounded by `buffer_size` plus one transformed chunk. The temporary file is
//! removed on any error and when the future is dropped mid-stream; `dest` is
//! only ever touched by the final rename.

use futures::TryStreamExt;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::pin;
use strongbox_cbc::{read_chunks, Cipher};
use strongbox_core::config::{DEFAULT_BUFFER_SIZE, DEFAULT_YIELD_EVERY};
use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::error::CryptoError;
use crate::service::ProgressFn;

/// One step of the chunk loop plus an optional final flush.
pub trait ChunkTransform: Send {
    fn update(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError>;

    /// Called once after the source is exhausted.
    fn finish(&mut self) -> Result<Vec<u8>, CryptoError> {
        Ok(Vec::new())
    }
}

impl ChunkTransform for Cipher {
    fn update(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError> {
        Ok(Cipher::update(self, chunk)?)
    }

    fn finish(&mut self) -> Result<Vec<u8>, CryptoError> {
        Ok(self.finalize()?)
    }
}

/// Applies an independent, atomic operation to every chunk.
pub struct PerChunk<F>(pub F);

impl<F> ChunkTransform for PerChunk<F>
where
    F: FnMut(&[u8]) -> Result<Vec<u8>, CryptoError> + Send,
{
    fn update(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError> {
        (self.0)(chunk)
    }
}

/// Pipeline tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Bytes read per chunk
    pub buffer_size: usize,
    /// Yield to the scheduler every N chunks (0 = never)
    pub yield_every: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            yield_every: DEFAULT_YIELD_EVERY,
        }
    }
}

/// Stream `src` through `transform` into `dest`.
///
/// Fails with [`CryptoError::SourceNotFound`] before creating any output if
/// the size of `src` cannot be determined.
///
/// # Panics
/// Panics if `options.buffer_size` is 0.
pub async fn process_file<T>(
    src: &Path,
    dest: &Path,
    mut transform: T,
    options: PipelineOptions,
    on_progress: Option<&ProgressFn>,
) -> Result<(), CryptoError>
where
    T: ChunkTransform,
{
    let file_size = source_size(src).await?;
    let source = File::open(src)
        .await
        .map_err(|source| CryptoError::SourceNotFound {
            path: src.to_path_buf(),
            source,
        })?;

    let (output, temp_path) = create_temp_output(dest)?;
    debug!(src = %src.display(), tmp = %temp_path.display(), file_size, "streaming file");
    let mut output = BufWriter::new(output);

    let mut chunks = pin!(read_chunks(source, options.buffer_size));
    let mut offset: u64 = 0;
    let mut count: usize = 0;
    let mut since_yield: usize = 0;
    let mut written: u64 = 0;

    while let Some(chunk) = chunks.try_next().await? {
        let processed = transform.update(&chunk)?;
        output.write_all(&processed).await?;
        written += processed.len() as u64;

        offset += chunk.len() as u64;
        if let Some(cb) = on_progress {
            cb(percent(offset, file_size));
        }

        count += 1;
        since_yield += 1;
        if since_yield == options.yield_every {
            since_yield = 0;
            tokio::task::yield_now().await;
        }
    }

    let tail = transform.finish()?;
    output.write_all(&tail).await?;
    written += tail.len() as u64;

    output.flush().await?;
    let file = output.into_inner();
    file.sync_all().await?;
    drop(file);

    temp_path.persist(dest).map_err(|e| CryptoError::Persist {
        path: dest.to_path_buf(),
        source: e.error,
    })?;

    debug!(
        dest = %dest.display(),
        chunks = count,
        bytes_in = offset,
        bytes_out = written,
        "file replaced"
    );
    Ok(())
}

async fn source_size(src: &Path) -> Result<u64, CryptoError> {
    let not_found = |source| CryptoError::SourceNotFound {
        path: src.to_path_buf(),
        source,
    };
    let meta = tokio::fs::metadata(src).await.map_err(not_found)?;
    if !meta.is_file() {
        return Err(not_found(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }
    Ok(meta.len())
}

/// Temp file in the destination's directory, so the final rename stays on
/// one filesystem.
fn create_temp_output(dest: &Path) -> Result<(File, TempPath), CryptoError> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let temp = tempfile::Builder::new()
        .prefix(".strongbox-")
        .suffix(".tmp")
        .tempfile_in(&dir)
        .map_err(|source| CryptoError::OutputStreamCreation {
            path: dest.to_path_buf(),
            source,
        })?;
    let (file, path) = temp.into_parts();
    Ok((File::from_std(file), path))
}

fn percent(offset: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (u128::from(offset) * 100 / u128::from(total)).min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::task::Poll;
    use std::time::Duration;

    /// Uppercases ASCII and appends a marker on finish.
    struct Upper;

    impl ChunkTransform for Upper {
        fn update(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError> {
            Ok(chunk.to_ascii_uppercase())
        }

        fn finish(&mut self) -> Result<Vec<u8>, CryptoError> {
            Ok(b"<end>".to_vec())
        }
    }

    fn recorder() -> (ProgressFn, Arc<Mutex<Vec<u8>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let cb: ProgressFn = Box::new(move |p| sink.lock().unwrap().push(p));
        (cb, seen)
    }

    fn leftover_temp_files(dir: &Path) -> Vec<PathBuf> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.to_string_lossy().ends_with(".tmp"))
            .collect()
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 10), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(5, 3), 100);
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(u64::MAX, u64::MAX), 100);
    }

    #[tokio::test]
    async fn test_transforms_and_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.txt");
        let dest = dir.path().join("out.txt");
        std::fs::write(&src, b"hello pipeline").unwrap();

        let options = PipelineOptions {
            buffer_size: 4,
            yield_every: 1,
        };
        process_file(&src, &dest, Upper, options, None)
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"HELLO PIPELINE<end>");
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_progress_fires_per_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.bin");
        let dest = dir.path().join("out.bin");
        std::fs::write(&src, vec![b'a'; 500]).unwrap();

        let (cb, seen) = recorder();
        let options = PipelineOptions {
            buffer_size: 100,
            yield_every: 10,
        };
        process_file(&src, &dest, Upper, options, Some(&cb))
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![20, 40, 60, 80, 100]);
    }

    #[tokio::test]
    async fn test_empty_source_still_finishes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("empty");
        let dest = dir.path().join("out");
        std::fs::write(&src, b"").unwrap();

        let (cb, seen) = recorder();
        process_file(&src, &dest, Upper, PipelineOptions::default(), Some(&cb))
            .await
            .unwrap();

        assert_eq!(std::fs::read(&dest).unwrap(), b"<end>");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_source() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out");

        let err = process_file(
            &dir.path().join("missing"),
            &dest,
            Upper,
            PipelineOptions::default(),
            None,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CryptoError::SourceNotFound { .. }));
        assert!(!dest.exists());
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_directory_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = process_file(
            dir.path(),
            &dir.path().join("out"),
            Upper,
            PipelineOptions::default(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CryptoError::SourceNotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_dest_dir() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in");
        std::fs::write(&src, b"data").unwrap();

        let err = process_file(
            &src,
            &dir.path().join("no/such/dir/out"),
            Upper,
            PipelineOptions::default(),
            None,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CryptoError::OutputStreamCreation { .. }));
    }

    #[tokio::test]
    async fn test_failure_leaves_dest_untouched() {
        struct FailSecond(usize);
        impl ChunkTransform for FailSecond {
            fn update(&mut self, chunk: &[u8]) -> Result<Vec<u8>, CryptoError> {
                self.0 += 1;
                if self.0 == 2 {
                    return Err(CryptoError::Open);
                }
                Ok(chunk.to_vec())
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in");
        let dest = dir.path().join("out");
        std::fs::write(&src, vec![1u8; 300]).unwrap();
        std::fs::write(&dest, b"original").unwrap();

        let options = PipelineOptions {
            buffer_size: 100,
            yield_every: 0,
        };
        let err = process_file(&src, &dest, FailSecond(0), options, None)
            .await
            .unwrap_err();

        assert!(matches!(err, CryptoError::Open));
        assert_eq!(std::fs::read(&dest).unwrap(), b"original");
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_stream_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in");
        let dest = dir.path().join("out");
        std::fs::write(&src, vec![7u8; 1024 * 1024]).unwrap();
        std::fs::write(&dest, b"original").unwrap();

        let options = PipelineOptions {
            buffer_size: 1000,
            yield_every: 1,
        };
        let mut fut = Box::pin(process_file(&src, &dest, Upper, options, None));
        for _ in 0..50 {
            if let Poll::Ready(res) = futures::poll!(fut.as_mut()) {
                panic!("finished before cancellation: {res:?}");
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(leftover_temp_files(dir.path()).len(), 1);

        drop(fut);

        assert_eq!(std::fs::read(&dest).unwrap(), b"original");
        assert!(leftover_temp_files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_yield_every_larger_than_chunk_count() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in");
        let dest = dir.path().join("out");
        std::fs::write(&src, b"abcdef").unwrap();

        let options = PipelineOptions {
            buffer_size: 2,
            yield_every: usize::MAX,
        };
        process_file(&src, &dest, Upper, options, None)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"ABCDEF<end>");
    }

    #[tokio::test]
    async fn test_replaces_existing_dest() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in");
        let dest = dir.path().join("out");
        std::fs::write(&src, b"new").unwrap();
        std::fs::write(&dest, b"a much longer original file").unwrap();

        process_file(&src, &dest, Upper, PipelineOptions::default(), None)
            .await
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"NEW<end>");
    }

    #[tokio::test]
    async fn test_per_chunk_closure() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in");
        let dest = dir.path().join("out");
        std::fs::write(&src, b"abcdefg").unwrap();

        let mut calls = 0;
        let transform = PerChunk(|chunk: &[u8]| -> Result<Vec<u8>, CryptoError> {
            calls += 1;
            Ok(chunk.iter().rev().copied().collect())
        });
        let options = PipelineOptions {
            buffer_size: 3,
            yield_every: 0,
        };
        process_file(&src, &dest, transform, options, None)
            .await
            .unwrap();

        assert_eq!(calls, 3);
        assert_eq!(std::fs::read(&dest).unwrap(), b"cbafedg");
    }
}
