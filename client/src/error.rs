use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request failed: {status} - {message}")]
    Request { status: u16, message: String },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("not a directory: {0}")]
    NotDirectory(String),

    #[error("is a directory: {0}")]
    IsDirectory(String),

    #[error("directory not empty: {0}")]
    DirectoryNotEmpty(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RemoteError {
    /// True for the creation conflict the upload fallback is allowed to
    /// recover from.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub(crate) fn from_response(status: u16, message: String) -> Self {
        fn strip(msg: String, prefix: &str) -> String {
            msg.strip_prefix(prefix)
                .map(|s| s.trim().to_string())
                .unwrap_or(msg)
        }
        let msg = message.trim().to_string();
        match status {
            404 => Self::NotFound(strip(msg, "not found:")),
            403 => Self::PermissionDenied(strip(msg, "permission denied:")),
            409 => Self::AlreadyExists(strip(msg, "already exists:")),
            400 => Self::InvalidArgument(strip(msg, "invalid argument:")),
            500..=599 => Self::Server(msg),
            _ => Self::Request {
                status,
                message: msg,
            },
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RemoteError>;
