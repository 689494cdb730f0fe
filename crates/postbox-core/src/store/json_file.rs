//! JSON array files with serialized, atomic rewrites.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use super::SubmissionStore;
use crate::error::{Error, Result};
use crate::models::ContactSubmission;

/// A JSON array persisted in a single file.
///
/// Every load and update holds the same async mutex, so read-modify-write
/// cycles issued through one instance never interleave. Writes go to a sibling
/// temp file that is then renamed over the target, so readers observe either
/// the old list or the new one.
///
/// The lock is per instance: share one instance (behind an `Arc`) for every
/// writer of a given path.
#[derive(Debug)]
pub struct JsonListFile<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonListFile<T>
where
    T: Serialize + DeserializeOwned + Send,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole list. A missing file is an empty list.
    pub async fn load(&self) -> Result<Vec<T>> {
        let _guard = self.lock.lock().await;
        read_list(&self.path).await
    }

    /// Apply `change` to the current list and write the result back.
    ///
    /// Nothing is written when reading or parsing the current list fails.
    pub async fn update<F, R>(&self, change: F) -> Result<R>
    where
        F: FnOnce(&mut Vec<T>) -> R + Send,
        R: Send,
    {
        let _guard = self.lock.lock().await;
        let mut items = read_list(&self.path).await?;
        let outcome = change(&mut items);
        write_list(&self.path, &items).await?;
        Ok(outcome)
    }
}

async fn read_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => return Err(error.into()),
    };

    serde_json::from_str(&raw).map_err(|source| Error::CorruptStore {
        path: path.to_path_buf(),
        source,
    })
}

async fn write_list<T: Serialize>(path: &Path, items: &[T]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let serialized = serde_json::to_string_pretty(items)?;
    let staging = staging_path(path);
    tokio::fs::write(&staging, serialized).await?;
    tokio::fs::rename(&staging, path).await?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut file_name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("list"));
    file_name.push(".tmp");
    path.with_file_name(file_name)
}

/// File-backed [`SubmissionStore`].
#[derive(Debug)]
pub struct JsonFileStore {
    file: JsonListFile<ContactSubmission>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: JsonListFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait]
impl SubmissionStore for JsonFileStore {
    async fn append(&self, submission: ContactSubmission) -> Result<()> {
        let id = submission.id_label();
        let len = self
            .file
            .update(move |items| {
                items.push(submission);
                items.len()
            })
            .await?;
        tracing::debug!(id = %id, len, path = %self.path().display(), "Appended submission");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ContactSubmission>> {
        self.file.load().await
    }
}
