//! File Cache - One File Per Key
//!
//! Stores every entry in its own file below a directory. Each read goes
//! back to disk, so entries written by other processes are visible
//! immediately.
//!
//! # On-disk format
//!
//! ```text
//! <directory>/<sanitized key>.cache
//! [FILE_MAGIC: 4 bytes][lifetime: u64 big-endian, unix seconds, 0 = never][codec payload]
//! ```
//!
//! Writes go to a uniquely named temp file in the same directory that is
//! then renamed over the target, so concurrent saves of one key never
//! fail and readers never see a partial file. The last rename wins.

use super::{effective_ttl, whole_secs};
use crate::codecs::JsonCodec;
use crate::traits::CacheCodec;
use crate::value::CacheValue;
use anyhow::{Context, Result, bail};
use bytes::{Buf, BufMut, BytesMut};
use serde_json::Value;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Extension of every cache file
pub const FILE_EXTENSION: &str = "cache";

/// Leading bytes of every cache file
pub const FILE_MAGIC: &[u8; 4] = b"ECF1";

const HEADER_LEN: usize = FILE_MAGIC.len() + std::mem::size_of::<u64>();

/// Characters that may not appear in a cache file name
const FORBIDDEN_CHARS: &[char] = &['\\', '/', ':', '"', '*', '?', '<', '>', '|'];

/// Envelope written to disk
#[derive(Debug)]
struct FileEntry {
    /// Absolute expiry as unix seconds, 0 when the entry never expires
    lifetime: u64,
    /// Codec-encoded value
    data: Vec<u8>,
}

impl FileEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            lifetime: lifetime_for(ttl),
            data,
        }
    }

    fn encode(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(HEADER_LEN + self.data.len());
        buf.put_slice(FILE_MAGIC);
        buf.put_u64(self.lifetime);
        buf.put_slice(&self.data);
        buf
    }

    /// `None` for anything not written by this backend
    fn decode(raw: &[u8]) -> Option<Self> {
        let mut buf = raw.strip_prefix(FILE_MAGIC.as_slice())?;
        if buf.remaining() < std::mem::size_of::<u64>() {
            return None;
        }
        let lifetime = buf.get_u64();
        Some(Self {
            lifetime,
            data: buf.to_vec(),
        })
    }

    fn is_expired(&self) -> bool {
        self.lifetime != 0 && unix_now() > self.lifetime
    }
}

/// Absolute expiry for `ttl`, 0 when it never expires
fn lifetime_for(ttl: Duration) -> u64 {
    effective_ttl(ttl).map_or(0, |ttl| unix_now().saturating_add(whole_secs(ttl)))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs())
}

/// Filesystem backend
///
/// Values are encoded with the codec `C` (JSON by default). Object
/// handles cannot be stored.
#[derive(Debug, Clone)]
pub struct FileCache<C: CacheCodec = JsonCodec> {
    directory: PathBuf,
    codec: C,
}

impl FileCache<JsonCodec> {
    /// Create a file cache rooted at `directory`
    ///
    /// The directory is created lazily on first save.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::with_codec(directory, JsonCodec)
    }
}

impl<C: CacheCodec> FileCache<C> {
    /// Create a file cache with a custom codec
    pub fn with_codec(directory: impl Into<PathBuf>, codec: C) -> Self {
        let directory = directory.into();
        info!(directory = %directory.display(), codec = codec.name(), "Initializing File Cache");
        Self { directory, codec }
    }

    /// Root directory of this cache
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file holding `key`
    ///
    /// Path separators and other characters invalid in file names are
    /// stripped from the key.
    #[must_use]
    pub fn file_path(&self, key: &str) -> PathBuf {
        let sanitized: String = key.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect();
        self.directory.join(format!("{sanitized}.{FILE_EXTENSION}"))
    }

    async fn read_entry(&self, key: &str) -> Result<Option<FileEntry>> {
        let path = self.file_path(key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(error).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        // A truncated or foreign file is a miss, not a failure
        let Some(entry) = FileEntry::decode(&raw) else {
            debug!(path = %path.display(), "[File] Ignoring unparsable cache file");
            return Ok(None);
        };

        if entry.is_expired() {
            return Ok(None);
        }
        Ok(Some(entry))
    }

    async fn ensure_directory(&self) -> Result<()> {
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(0o750);
        builder
            .create(&self.directory)
            .await
            .with_context(|| format!("Failed to create {}", self.directory.display()))
    }
}

/// Recursively collect every cache file below `root`
async fn cache_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => continue,
            Err(error) => return Err(error.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
            } else if path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(FILE_EXTENSION))
            {
                files.push(path);
            }
        }
    }

    Ok(files)
}

// ===== Trait Implementations =====

use crate::traits::CacheBackend;
use async_trait::async_trait;

#[async_trait]
impl<C: CacheCodec> CacheBackend for FileCache<C> {
    async fn fetch(&self, key: &str) -> Result<Option<CacheValue>> {
        let Some(entry) = self.read_entry(key).await? else {
            return Ok(None);
        };
        match self.codec.deserialize::<Value>(&entry.data) {
            Ok(value) => Ok(Some(CacheValue::Data(value))),
            Err(error) => {
                debug!(key = %key, error = %error, "[File] Ignoring undecodable payload");
                Ok(None)
            }
        }
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.read_entry(key).await?.is_some())
    }

    async fn save(&self, key: &str, value: CacheValue, ttl: Duration) -> Result<bool> {
        let CacheValue::Data(data) = value else {
            bail!("File backend cannot store object handles (key: {key})");
        };

        self.ensure_directory().await?;

        let entry = FileEntry::new(self.codec.serialize(&data)?, ttl);
        let raw = entry.encode();

        let directory = self.directory.clone();
        let path = self.file_path(key);
        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut tmp = tempfile::NamedTempFile::new_in(&directory)
                .with_context(|| format!("Failed to create temp file in {}", directory.display()))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                tmp.as_file()
                    .set_permissions(std::fs::Permissions::from_mode(0o640))
                    .with_context(|| format!("Failed to set permissions on {}", tmp.path().display()))?;
            }
            tmp.write_all(&raw)
                .with_context(|| format!("Failed to write {}", tmp.path().display()))?;
            tmp.persist(&path)
                .with_context(|| format!("Failed to move cache file into {}", path.display()))?;
            Ok(())
        })
        .await
        .context("File write task failed")??;

        debug!(key = %key, lifetime = entry.lifetime, "[File] Cached key");
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let path = self.file_path(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(true),
            Err(error) => {
                Err(error).with_context(|| format!("Failed to delete {}", path.display()))
            }
        }
    }

    async fn flush(&self) -> Result<bool> {
        let files = cache_files(&self.directory).await?;
        let count = files.len();
        for file in files {
            match tokio::fs::remove_file(&file).await {
                Ok(()) => {}
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => {
                    return Err(error)
                        .with_context(|| format!("Failed to delete {}", file.display()));
                }
            }
        }
        debug!(count, directory = %self.directory.display(), "[File] Flushed cache files");
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "File"
    }
}
