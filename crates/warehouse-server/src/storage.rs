//! Secondary content storage.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DirEntry {
    /// File or directory name.
    pub name: String,
    /// Whether the entry is a directory.
    pub directory: bool,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time, when the filesystem reports one.
    pub modified: Option<DateTime<Utc>>,
}

/// What a storage target turned out to be.
pub enum SecondaryContent {
    /// A regular file, streamed in chunks.
    File {
        len: u64,
        stream: BoxStream<'static, io::Result<Bytes>>,
    },
    /// A directory, listed by name.
    Directory(Vec<DirEntry>),
}

impl std::fmt::Debug for SecondaryContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SecondaryContent::File { len, .. } => f.debug_struct("File").field("len", len).finish(),
            SecondaryContent::Directory(entries) => {
                f.debug_tuple("Directory").field(&entries.len()).finish()
            }
        }
    }
}

/// Backend holding the archived secondary outputs.
#[async_trait]
pub trait SecondaryStorage: Send + Sync {
    /// Open `path`, which has already passed the traversal guard.
    async fn open(&self, path: &Path) -> io::Result<SecondaryContent>;
}

/// Shared storage handle.
pub type SharedStorage = Arc<dyn SecondaryStorage>;

/// Storage on a locally mounted filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorage;

#[async_trait]
impl SecondaryStorage for LocalStorage {
    async fn open(&self, path: &Path) -> io::Result<SecondaryContent> {
        let metadata = tokio::fs::metadata(path).await?;

        if metadata.is_dir() {
            let mut entries = Vec::new();
            let mut dir = tokio::fs::read_dir(path).await?;
            while let Some(entry) = dir.next_entry().await? {
                let meta = entry.metadata().await?;
                entries.push(DirEntry {
                    name: entry.file_name().to_string_lossy().into_owned(),
                    directory: meta.is_dir(),
                    size: if meta.is_dir() { 0 } else { meta.len() },
                    modified: meta.modified().ok().map(DateTime::<Utc>::from),
                });
            }
            entries.sort_by(|a, b| a.name.cmp(&b.name));
            return Ok(SecondaryContent::Directory(entries));
        }

        let file = tokio::fs::File::open(path).await?;
        Ok(SecondaryContent::File {
            len: metadata.len(),
            stream: ReaderStream::new(file).boxed(),
        })
    }
}
