use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};

use super::path::normalize_path;

/// Backing store the resolver reads imported files from.
pub trait SourceLoader: Send + Sync {
    /// Cheap existence probe used to pick among candidate paths.
    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> BoxFuture<'static, io::Result<String>>;
}

/// Reads from the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsLoader;

impl SourceLoader for FsLoader {
    /// A blocking `stat`, run inline on the resolving task. It is one syscall
    /// per candidate, so it is not moved to a blocking thread.
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> BoxFuture<'static, io::Result<String>> {
        tokio::fs::read_to_string(path.to_path_buf()).boxed()
    }
}

/// In-memory files, keyed by lexically normalized path. An entry without text
/// exists but fails to read.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    files: Arc<DashMap<PathBuf, Option<String>>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize_path(path.as_ref()), Some(text.into()));
    }

    pub fn insert_unreadable(&self, path: impl AsRef<Path>) {
        self.files.insert(normalize_path(path.as_ref()), None);
    }
}

impl SourceLoader for MemoryLoader {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize_path(path))
    }

    fn read(&self, path: &Path) -> BoxFuture<'static, io::Result<String>> {
        let key = normalize_path(path);
        let entry = self.files.get(&key).map(|entry| entry.value().clone());
        async move {
            match entry {
                Some(Some(text)) => Ok(text),
                Some(None) => Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("{} is not readable", key.display()),
                )),
                None => Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} does not exist", key.display()),
                )),
            }
        }
        .boxed()
    }
}
