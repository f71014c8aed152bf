//! Error types for rfsh

use rfs_client::RemoteError;
use thiserror::Error;

/// Result type alias for shell operations
pub type ShellResult<T> = Result<T, ShellError>;

#[derive(Error, Debug)]
pub enum ShellError {
    /// No handler registered for the command name
    #[error("Unknown command '{0}'")]
    UnknownCommand(String),

    /// Wrong argument count; carries the command's usage line
    #[error("{0}")]
    Usage(&'static str),

    /// Bad argument value (unparseable mode, non-directory cd target, ...)
    #[error("{0}")]
    Arg(String),

    /// Input line could not be tokenized
    #[error("cannot parse input: {0}")]
    Input(String),

    /// Remote engine call failed
    #[error("{0}")]
    Remote(#[from] RemoteError),

    /// Local filesystem or stream error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A chunked transfer broke protocol mid-flight
    #[error("transfer failed: {0}")]
    Transfer(String),

    /// Session termination signal; raised only by `exit` and propagated
    /// past the router to end the REPL
    #[error("exit")]
    Exit,
}

impl ShellError {
    /// Errors outside the expected usage/IO taxonomy; these get logged
    /// with full detail before being reported.
    pub fn is_unexpected(&self) -> bool {
        match self {
            Self::Io(_) | Self::Transfer(_) => true,
            Self::Remote(e) => matches!(
                e,
                RemoteError::Connection(_)
                    | RemoteError::Protocol(_)
                    | RemoteError::Server(_)
                    | RemoteError::Serialization(_)
                    | RemoteError::Request { .. }
            ),
            _ => false,
        }
    }
}
