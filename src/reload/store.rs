//! Proxy config persistence.

use async_trait::async_trait;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Where the rendered proxy config lives.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn read(&self) -> io::Result<String>;

    /// Replace the stored config. Readers see the old or the new content, never a mix.
    async fn write(&self, content: &str) -> io::Result<()>;

    /// Path handed to the proxy process.
    fn location(&self) -> &Path;
}

/// Config kept in a single file on disk.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    path: PathBuf,
}

impl FsConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

fn write_then_swap(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl ConfigStore for FsConfigStore {
    async fn read(&self) -> io::Result<String> {
        tokio::fs::read_to_string(&self.path).await
    }

    async fn write(&self, content: &str) -> io::Result<()> {
        let path = self.path.clone();
        let bytes = content.as_bytes().to_vec();
        tokio::task::spawn_blocking(move || write_then_swap(&path, &bytes))
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
