//! Error type shared by every stage of the pipeline.

use std::path::PathBuf;

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`], used for exit codes and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadInput,
    ApiError,
    NotFound,
    DownloadFailed,
    CorruptArchive,
    PermissionDenied,
    SubprocessFailed,
    Io,
    Config,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The link argument is not in `ctfile://<id>` form.
    #[error("invalid link {input:?}: expected {scheme}<id>")]
    BadInput { input: String, scheme: &'static str },

    #[error("request to {url} failed")]
    ApiTransport {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("could not parse response from {url} (HTTP {status})")]
    ApiParse {
        url: String,
        status: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("download of {url} failed: {reason}")]
    DownloadFailed { url: String, reason: String },

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    #[error("cannot make {} executable", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed: {reason}")]
    SubprocessFailed { program: String, reason: String },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::BadInput { .. } => ErrorKind::BadInput,
            Error::ApiTransport { .. } | Error::ApiParse { .. } => ErrorKind::ApiError,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::DownloadFailed { .. } | Error::ChecksumMismatch { .. } => {
                ErrorKind::DownloadFailed
            }
            Error::CorruptArchive(_) => ErrorKind::CorruptArchive,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Error::SubprocessFailed { .. } => ErrorKind::SubprocessFailed,
            Error::Io { .. } => ErrorKind::Io,
            Error::Config(_) => ErrorKind::Config,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }
}
