//! Offer photo storage behind an object-store seam.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::info;

use super::accounts::UserId;
use super::error::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("photo url is not served by this storage: {0}")]
    InvalidUrl(String),
    #[error("owner identifier must be non-empty and must not contain '/'")]
    InvalidOwner,
    #[error("invalid photo path: {0}")]
    InvalidPath(String),
    #[error("photo not found: {0}")]
    NotFound(String),
    #[error("photo belongs to another owner")]
    NotOwner,
    #[error("photo is empty")]
    Empty,
    #[error("object store unavailable: {0}")]
    Backend(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn code(&self) -> ErrorCode {
        match self {
            StorageError::InvalidUrl(_)
            | StorageError::InvalidOwner
            | StorageError::InvalidPath(_)
            | StorageError::Empty => ErrorCode::Validation,
            StorageError::NotFound(_) => ErrorCode::NotFound,
            StorageError::NotOwner => ErrorCode::Forbidden,
            StorageError::Backend(_) | StorageError::Io(_) => ErrorCode::Server,
        }
    }
}

/// Raw object persistence keyed by relative path.
pub trait ObjectStore: Send + Sync {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError>;
    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError>;
    /// Returns whether an object was removed.
    fn remove(&self, path: &str) -> Result<bool, StorageError>;
}

#[derive(Debug, Default, Clone)]
pub struct InMemoryObjectStore {
    objects: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().map(|objects| objects.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn objects(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, StorageError> {
        self.objects
            .lock()
            .map_err(|_| StorageError::Backend("object mutex poisoned".to_string()))
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.objects()?.insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.objects()?.get(path).cloned())
    }

    fn remove(&self, path: &str) -> Result<bool, StorageError> {
        Ok(self.objects()?.remove(path).is_some())
    }
}

/// Objects stored as files under a root directory.
#[derive(Debug, Clone)]
pub struct FileSystemObjectStore {
    root: PathBuf,
}

impl FileSystemObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if path.is_empty() || !safe {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for FileSystemObjectStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, bytes)?;
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Option<Vec<u8>>, StorageError> {
        match std::fs::read(self.resolve(path)?) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn remove(&self, path: &str) -> Result<bool, StorageError> {
        match std::fs::remove_file(self.resolve(path)?) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// Result of an upload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StoredPhoto {
    pub path: String,
    pub url: String,
}

/// Bytes served back to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoObject {
    pub bytes: Vec<u8>,
    pub content_type: mime::Mime,
}

pub struct PhotoStorage<O> {
    objects: O,
    public_base_url: String,
}

impl<O> PhotoStorage<O>
where
    O: ObjectStore,
{
    pub fn new(objects: O, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            objects,
            public_base_url,
        }
    }

    pub fn objects(&self) -> &O {
        &self.objects
    }

    pub fn public_base_url(&self) -> &str {
        &self.public_base_url
    }

    /// Store `bytes` under `<owner>/<uuid>[.<ext>]` and return its public URL.
    pub fn upload(
        &self,
        owner: &UserId,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredPhoto, StorageError> {
        let owner = owner.as_str();
        if owner.is_empty() || owner.contains('/') {
            return Err(StorageError::InvalidOwner);
        }
        if bytes.is_empty() {
            return Err(StorageError::Empty);
        }

        let object_name = match extension(file_name) {
            Some(ext) => format!("{}.{ext}", uuid::Uuid::new_v4()),
            None => uuid::Uuid::new_v4().to_string(),
        };
        let path = format!("{owner}/{object_name}");
        self.objects.put(&path, bytes)?;
        info!(%owner, %path, size = bytes.len(), "photo uploaded");

        Ok(StoredPhoto {
            url: self.url_for(&path),
            path,
        })
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{path}", self.public_base_url)
    }

    /// Map a public URL back to its object path.
    pub fn path_for(&self, url: &str) -> Result<String, StorageError> {
        url.strip_prefix(&self.public_base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|path| !path.is_empty())
            .map(str::to_string)
            .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))
    }

    pub fn delete(&self, url: &str) -> Result<(), StorageError> {
        let path = self.path_for(url)?;
        if !self.objects.remove(&path)? {
            return Err(StorageError::NotFound(path));
        }
        info!(%path, "photo deleted");
        Ok(())
    }

    /// Delete on behalf of `owner`; photos live under their owner's prefix.
    pub fn delete_owned(&self, owner: &UserId, url: &str) -> Result<(), StorageError> {
        let path = self.path_for(url)?;
        let prefix = format!("{}/", owner.as_str());
        if !path.starts_with(&prefix) {
            return Err(StorageError::NotOwner);
        }
        self.delete(url)
    }

    pub fn fetch(&self, path: &str) -> Result<PhotoObject, StorageError> {
        let bytes = self
            .objects
            .get(path)?
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        let content_type = mime_guess::from_path(path).first_or_octet_stream();
        Ok(PhotoObject {
            bytes,
            content_type,
        })
    }
}

fn extension(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name.trim()).extension()?.to_str()?;
    let ext = ext.to_ascii_lowercase();
    if ext.is_empty() || !ext.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}
