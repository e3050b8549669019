//! Write the approved page and hand it to the push script.
//!
//! The file write and the publish step are separate on purpose: a failed
//! push leaves the written file in place.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Default location of the push script, relative to the working directory.
pub const DEFAULT_SCRIPT: &str = "scripts/push_to_github.sh";

const INTERPRETER: &str = "/bin/bash";

/// Environment variable carrying the written file's path to the script.
pub const OUTPUT_ENV: &str = "PAGESMITH_OUTPUT";

#[derive(Debug, thiserror::Error)]
#[error("failed to write {}: {source}", .path.display())]
pub struct WriteError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("publish script not found: {}", .0.display())]
    ScriptMissing(PathBuf),
    #[error("failed to launch publish script: {0}")]
    Spawn(#[source] io::Error),
    #[error("publish script timed out after {0:?}")]
    Timeout(Duration),
    #[error("publish script exited with code {code}: {}", .stderr.trim())]
    Failed {
        code: i32,
        stdout: String,
        stderr: String,
    },
}

/// Captured result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Replace the file at `path` with `payload`, creating parent directories.
pub async fn write_payload(path: &Path, payload: &str) -> Result<(), WriteError> {
    let result = async {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(payload.as_bytes()).await?;
        file.flush().await?;
        Ok::<_, io::Error>(())
    }
    .await;

    result.map_err(|source| WriteError {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), bytes = payload.len(), "Wrote payload");
    Ok(())
}

/// Commit message used for a published file.
pub fn commit_message(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    format!("feat: AI-generated update for {name}")
}

/// Commits and pushes the file at `path`.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, path: &Path, commit_message: &str) -> Result<PublishOutput, PublishError>;
}

/// Runs a bash script with the commit message as its only argument and the
/// file to publish in [`OUTPUT_ENV`].
#[derive(Debug, Clone)]
pub struct ScriptPublisher {
    script: PathBuf,
    timeout: Duration,
}

impl ScriptPublisher {
    pub fn new(script: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            script: script.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Publisher for ScriptPublisher {
    async fn publish(&self, path: &Path, commit_message: &str) -> Result<PublishOutput, PublishError> {
        if !self.script.is_file() {
            return Err(PublishError::ScriptMissing(self.script.clone()));
        }

        tracing::info!(
            script = %self.script.display(),
            path = %path.display(),
            %commit_message,
            "Running publish script"
        );
        let output = tokio::time::timeout(
            self.timeout,
            Command::new(INTERPRETER)
                .arg(&self.script)
                .arg(commit_message)
                .env(OUTPUT_ENV, path)
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| PublishError::Timeout(self.timeout))?
        .map_err(PublishError::Spawn)?;

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);

        if !output.status.success() {
            tracing::error!(code, "Publish script failed");
            return Err(PublishError::Failed {
                code,
                stdout,
                stderr,
            });
        }

        Ok(PublishOutput {
            exit_code: code,
            stdout,
            stderr,
        })
    }
}
