//! File-backed checkpoint storage
//!
//! [`FileCheckpointer`] keeps the newest checkpoint of each thread in its own file under a
//! directory, so checkpoints survive a process restart and separate threads never touch
//! the same file. Writes go to a temporary sibling first and are then renamed into place,
//! which means a crash mid-write leaves the previous checkpoint intact.
//!
//! ```text
//! checkpoints/
//! ├── session-1.json
//! ├── session-2.json
//! └── user%3A42.json      thread "user:42"
//! ```
//!
//! Thread ids are percent-encoded into file names; any byte outside `[A-Za-z0-9_-]` is
//! written as `%XX`.

use crate::{
    checkpoint::Checkpoint,
    error::{CheckpointError, Result},
    serializer::{JsonSerializer, SerializerProtocol},
    traits::{CheckpointStream, Checkpointer},
};
use async_trait::async_trait;
use futures::stream;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Checkpointer that persists one file per thread
#[derive(Debug, Clone)]
pub struct FileCheckpointer<S = JsonSerializer> {
    dir: PathBuf,
    serializer: S,
}

impl FileCheckpointer<JsonSerializer> {
    /// Store checkpoints as compact JSON under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_serializer(dir, JsonSerializer)
    }
}

impl<S: SerializerProtocol> FileCheckpointer<S> {
    /// Store checkpoints under `dir` using a custom serializer
    pub fn with_serializer(dir: impl Into<PathBuf>, serializer: S) -> Self {
        Self {
            dir: dir.into(),
            serializer,
        }
    }

    /// Directory holding the checkpoint files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `thread_id`'s checkpoint
    pub fn path_for(&self, thread_id: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{}", encode_thread_id(thread_id), self.serializer.extension()))
    }

    /// Thread ids that currently have a checkpoint file
    pub async fn threads(&self) -> Result<Vec<String>> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let suffix = format!(".{}", self.serializer.extension());
        let mut threads = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if let Some(stem) = name.strip_suffix(&suffix) {
                if let Some(thread_id) = decode_thread_id(stem) {
                    threads.push(thread_id);
                }
            }
        }
        threads.sort();
        Ok(threads)
    }
}

#[async_trait]
impl<S: SerializerProtocol + 'static> Checkpointer for FileCheckpointer<S> {
    async fn save(&self, checkpoint: Checkpoint) -> Result<()> {
        if checkpoint.thread_id.is_empty() {
            return Err(CheckpointError::Invalid("thread_id is required".to_string()));
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(&checkpoint.thread_id);
        let tmp = path.with_extension(format!("{}.tmp", self.serializer.extension()));
        let bytes = self.serializer.dumps(&checkpoint)?;

        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Checkpoint> {
        let path = self.path_for(thread_id);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CheckpointError::NotFound(thread_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let checkpoint: Checkpoint = self.serializer.loads(&bytes)?;
        if checkpoint.thread_id != thread_id {
            return Err(CheckpointError::Invalid(format!(
                "file {} holds thread '{}', expected '{}'",
                path.display(),
                checkpoint.thread_id,
                thread_id
            )));
        }
        Ok(checkpoint)
    }

    async fn list(&self, thread_id: &str, limit: Option<usize>) -> Result<CheckpointStream> {
        let latest = match (self.try_load(thread_id).await?, limit) {
            (_, Some(0)) | (None, _) => Vec::new(),
            (Some(checkpoint), _) => vec![Ok(checkpoint)],
        };
        Ok(Box::pin(stream::iter(latest)))
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        match tokio::fs::remove_file(self.path_for(thread_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

fn encode_thread_id(thread_id: &str) -> String {
    let mut out = String::with_capacity(thread_id.len());
    for byte in thread_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{:02X}", byte));
        }
    }
    out
}

fn decode_thread_id(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = encoded.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}
