//! Registrar error types.

use thiserror::Error;

/// Errors that abort a whole run.
///
/// Per-identity failures never surface here; they end as a failure record
/// or a rejected key.
#[derive(Error, Debug)]
pub enum RegistrarError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl RegistrarError {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        RegistrarError::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}

/// Result type alias for registrar errors.
pub type RegistrarResult<T> = Result<T, RegistrarError>;
