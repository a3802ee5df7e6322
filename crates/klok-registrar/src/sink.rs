//! Append-only success and failure output files.

use crate::error::{RegistrarError, RegistrarResult};
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

/// Final result for one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Registered {
        address: String,
        raw_key: String,
        token: String,
    },
    Failed {
        address: String,
        raw_key: String,
    },
}

impl Outcome {
    /// The line written to the matching sink, newline included.
    pub fn to_line(&self) -> String {
        match self {
            Outcome::Registered {
                address,
                raw_key,
                token,
            } => format!("{}:{}:{}\n", address, raw_key, token),
            Outcome::Failed { address, raw_key } => format!("{}:{}\n", address, raw_key),
        }
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, Outcome::Registered { .. })
    }
}

struct SinkFile {
    path: PathBuf,
    file: Mutex<File>,
}

impl SinkFile {
    async fn create(path: &Path) -> RegistrarResult<Self> {
        let file = File::create(path)
            .await
            .map_err(|e| RegistrarError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    async fn append(&self, line: &str) -> RegistrarResult<()> {
        // One locked write per record keeps lines whole.
        let mut file = self.file.lock().await;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| RegistrarError::io(&self.path, e))?;
        file.flush()
            .await
            .map_err(|e| RegistrarError::io(&self.path, e))
    }
}

/// The pair of output files for a run.
pub struct ResultSink {
    success: SinkFile,
    failure: SinkFile,
}

impl ResultSink {
    /// Create both files, truncating anything left from a previous run.
    pub async fn create(
        success_path: impl AsRef<Path>,
        failure_path: impl AsRef<Path>,
    ) -> RegistrarResult<Self> {
        Ok(Self {
            success: SinkFile::create(success_path.as_ref()).await?,
            failure: SinkFile::create(failure_path.as_ref()).await?,
        })
    }

    /// Append one outcome to the sink that matches it.
    pub async fn record(&self, outcome: &Outcome) -> RegistrarResult<()> {
        let sink = if outcome.is_registered() {
            &self.success
        } else {
            &self.failure
        };
        debug!(path = %sink.path.display(), "Recording outcome");
        sink.append(&outcome.to_line()).await
    }

    pub fn success_path(&self) -> &Path {
        &self.success.path
    }

    pub fn failure_path(&self) -> &Path {
        &self.failure.path
    }
}
