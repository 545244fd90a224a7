//! Disk-backed blob store for uploads.
use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use bytes::Bytes;
use futures_util::{pin_mut, Stream, StreamExt};
use rand::Rng;
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
};

use crate::error::{bad, io, AppResult};

#[derive(Clone, Debug)]
pub struct BlobStore {
    dir: PathBuf,
}

/// Where an upload ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub filename: String,
    pub size:     u64,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Streams `chunks` to a fresh file named after `original`.
    /// A partially written file is removed on failure.
    pub async fn store<S, E>(&self, original: &str, chunks: S) -> AppResult<StoredBlob>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        fs::create_dir_all(&self.dir).await.map_err(io)?;

        let millis = chrono::Utc::now().timestamp_millis();
        let salt = rand::thread_rng().gen_range(0..1_000_000_000u32);
        self.store_as(unique_name(original, millis, salt), chunks).await
    }

    /// Fails instead of overwriting if `filename` is already taken.
    async fn store_as<S, E>(&self, filename: String, chunks: S) -> AppResult<StoredBlob>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: Display,
    {
        let path = self.dir.join(&filename);
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(io)?;

        match write_all(file, chunks).await {
            Ok(size) => Ok(StoredBlob { filename, size }),
            Err(e) => {
                fs::remove_file(&path).await.ok();
                Err(e)
            }
        }
    }
}

async fn write_all<S, E>(mut file: File, chunks: S) -> AppResult<u64>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    pin_mut!(chunks);
    let mut size = 0u64;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(bad)?;
        file.write_all(&chunk).await.map_err(io)?;
        size += chunk.len() as u64;
    }
    file.flush().await.map_err(io)?;
    Ok(size)
}

/// `<base>-<millis>-<salt><.ext>`, built from the last path component of the
/// client-supplied name.
pub fn unique_name(original: &str, millis: i64, salt: u32) -> String {
    let leaf = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let leaf = Path::new(leaf);

    let base = leaf
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty() && *s != "..")
        .unwrap_or("upload");
    let ext = leaf
        .extension()
        .and_then(|s| s.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    format!("{base}-{millis}-{salt}{ext}")
}
