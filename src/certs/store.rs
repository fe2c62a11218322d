//! Filesystem-backed certificate store.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised by the certificate store.
#[derive(Debug, Error)]
pub enum CertError {
    #[error("invalid certificate name '{0}'")]
    InvalidName(String),

    #[error("certificate '{0}' contains no PEM certificate or key")]
    InvalidContent(String),

    #[error("certificate store not initialized")]
    NotInitialized,

    #[error("certificate I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CertError {
    /// True when the caller supplied bad input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, CertError::InvalidName(_) | CertError::InvalidContent(_))
    }
}

/// One stored certificate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Certificate {
    pub name: String,
    pub path: String,
    pub content: String,
}

/// Every stored certificate, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CertificateBundle {
    pub certs: Vec<Certificate>,
}

impl CertificateBundle {
    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }
}

/// Contract the engine and API use for certificate material.
#[async_trait]
pub trait CertificateGateway: Send + Sync {
    /// Prepare storage. Must succeed before the first reload.
    async fn init(&self) -> Result<(), CertError>;

    /// Store `content` under `name`, returning the written path.
    async fn put(&self, name: &str, content: &[u8]) -> Result<String, CertError>;

    async fn get_all(&self) -> Result<CertificateBundle, CertError>;

    /// Directory the proxy binds certificates from.
    fn certs_dir(&self) -> &str;
}

/// Certificates kept as `*.pem` files in one directory.
#[derive(Debug, Clone)]
pub struct FsCertStore {
    dir: String,
    index: Arc<DashMap<String, PathBuf>>,
    initialized: Arc<AtomicBool>,
}

impl FsCertStore {
    pub fn new(dir: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            index: Arc::new(DashMap::new()),
            initialized: Arc::new(AtomicBool::new(false)),
        }
    }

    fn ensure_initialized(&self) -> Result<(), CertError> {
        if self.initialized.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(CertError::NotInitialized)
        }
    }
}

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// True when `content` holds at least one PEM certificate or private key.
fn contains_pem(content: &[u8]) -> bool {
    let mut reader = content;
    let found = rustls_pemfile::read_all(&mut reader).any(|item| {
        matches!(
            item,
            Ok(rustls_pemfile::Item::X509Certificate(_))
                | Ok(rustls_pemfile::Item::Pkcs1Key(_))
                | Ok(rustls_pemfile::Item::Pkcs8Key(_))
                | Ok(rustls_pemfile::Item::Sec1Key(_))
        )
    });
    found
}

fn write_atomic(dir: &Path, target: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait]
impl CertificateGateway for FsCertStore {
    async fn init(&self) -> Result<(), CertError> {
        let dir = PathBuf::from(&self.dir);
        tokio::fs::create_dir_all(&dir).await?;

        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("pem") {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                self.index.insert(name.to_string(), path.clone());
            }
        }
        self.initialized.store(true, Ordering::Release);

        tracing::info!(dir = %self.dir, certs = self.index.len(), "Certificate store initialized");
        Ok(())
    }

    async fn put(&self, name: &str, content: &[u8]) -> Result<String, CertError> {
        self.ensure_initialized()?;
        if !valid_name(name) {
            return Err(CertError::InvalidName(name.to_string()));
        }
        if !contains_pem(content) {
            return Err(CertError::InvalidContent(name.to_string()));
        }

        let file_name = if name.ends_with(".pem") {
            name.to_string()
        } else {
            format!("{}.pem", name)
        };
        let dir = PathBuf::from(&self.dir);
        let target = dir.join(&file_name);
        let bytes = content.to_vec();
        let write_target = target.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &write_target, &bytes))
            .await
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))??;

        self.index.insert(file_name.clone(), target.clone());
        tracing::info!(cert = %file_name, path = %target.display(), "Certificate stored");
        Ok(target.display().to_string())
    }

    async fn get_all(&self) -> Result<CertificateBundle, CertError> {
        self.ensure_initialized()?;
        let mut entries: Vec<(String, PathBuf)> = self
            .index
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut certs = Vec::with_capacity(entries.len());
        for (name, path) in entries {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => certs.push(Certificate {
                    name,
                    path: path.display().to_string(),
                    content,
                }),
                Err(e) => {
                    tracing::warn!(cert = %name, error = %e, "Certificate vanished from disk, dropping it");
                    self.index.remove(&name);
                }
            }
        }
        Ok(CertificateBundle { certs })
    }

    fn certs_dir(&self) -> &str {
        &self.dir
    }
}
