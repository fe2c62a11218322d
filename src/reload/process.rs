//! Proxy process control.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

/// The proxy could not be reloaded.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to run reload command: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("reload command exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Signals the running proxy to adopt a new config.
#[async_trait]
pub trait ProxyProcess: Send + Sync {
    /// Gracefully reload using the config at `config_path`.
    async fn reload(&self, config_path: &Path) -> Result<(), ProcessError>;
}

/// Runs a shell command; `{config}` in the command is replaced with the config path.
#[derive(Debug, Clone)]
pub struct CommandProcess {
    command: String,
}

impl CommandProcess {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl ProxyProcess for CommandProcess {
    async fn reload(&self, config_path: &Path) -> Result<(), ProcessError> {
        let command = self
            .command
            .replace("{config}", &config_path.display().to_string());
        tracing::debug!(command = %command, "Reloading proxy");

        let output = Command::new("sh").arg("-c").arg(&command).output().await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(ProcessError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// Writes config only; used when no reload command is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProcess;

#[async_trait]
impl ProxyProcess for NoopProcess {
    async fn reload(&self, config_path: &Path) -> Result<(), ProcessError> {
        tracing::info!(config = %config_path.display(), "No reload command configured, skipping proxy reload");
        Ok(())
    }
}
