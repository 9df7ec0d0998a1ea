// Error types
// -----------
// Three layers of failure, kept apart so the type system decides what is
// allowed to stop a run:
// - `ConfigError`: fatal, raised before the first upload. Each variant owns a
//   process exit code.
// - `FileError`: scoped to one file. Never escapes `Uploader::process_file`;
//   it is folded into that file's `UploadOutcome`.
// - `ServiceError`: reported by the remote collaborator (`RemoteService`).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot access the mapping file {0}, please check the location and try again!")]
    MappingFileNotFound(PathBuf),

    #[error("Malformed mapping row at line {line}: {reason}")]
    MalformedMappingRow { line: usize, reason: String },

    #[error("Cannot access the import path {path}, please check the location and try again! ({source})")]
    PathNotAccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid file filter {0}")]
    InvalidFilter(String),

    #[error("Invalid server URL '{0}'")]
    InvalidServerUrl(String),

    #[error("Cannot log in. Check username and password.")]
    AuthenticationFailed,

    #[error("Cannot connect to project. Project #{0} does not exist.")]
    ProjectNotFound(i64),

    #[error("Cannot connect to project #{0}. Verify your Project Role.")]
    ProjectConnectFailed(i64),

    #[error("Cannot reach the Spira server: {0}")]
    ServerUnreachable(String),
}

impl ConfigError {
    /// Process exit code reported by the binary for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::MappingFileNotFound(_) => 10,
            ConfigError::MalformedMappingRow { .. } => 11,
            ConfigError::PathNotAccessible { .. } => 12,
            ConfigError::InvalidServerUrl(_) => 13,
            ConfigError::InvalidFilter(_) => 18,
            ConfigError::AuthenticationFailed => 14,
            ConfigError::ProjectNotFound(_) => 15,
            ConfigError::ProjectConnectFailed(_) => 16,
            ConfigError::ServerUnreachable(_) => 17,
        }
    }
}

/// Failure reported by the remote service collaborator.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("server returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("could not encode request: {0}")]
    Encode(String),

    #[error("could not decode server response: {0}")]
    Decode(String),

    #[error("server accepted the request but returned no attachment id")]
    Rejected,
}

impl ServiceError {
    pub fn category(&self) -> &'static str {
        match self {
            ServiceError::Transport(_) => "TransportError",
            ServiceError::HttpStatus { .. } => "HttpStatusError",
            ServiceError::Encode(_) => "EncodeError",
            ServiceError::Decode(_) => "DecodeError",
            ServiceError::Rejected => "UploadRejected",
        }
    }
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ServiceError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceError::HttpStatus {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

/// Per-file failure. Only ever surfaces as an `UploadOutcome`.
#[derive(Error, Debug)]
pub enum FileError {
    #[error("cannot access file: {0}")]
    FileAccess(#[from] io::Error),

    #[error("File has no contents.")]
    FileEmpty,

    #[error("file is {size} bytes, the server accepts at most {limit}")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("artifact lookup failed: {0}")]
    ArtifactResolution(#[source] ServiceError),

    #[error("upload failed: {0}")]
    Transport(#[source] ServiceError),
}

impl FileError {
    /// Category recorded as the outcome's `error_kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            FileError::FileAccess(_) => "FileAccessError",
            FileError::FileEmpty => "FileEmptyError",
            FileError::FileTooLarge { .. } => "FileTooLarge",
            FileError::ArtifactResolution(_) => "ArtifactResolutionError",
            FileError::Transport(err) => err.category(),
        }
    }
}
