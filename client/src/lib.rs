//! rfs-client - capability interface for the remote filesystem engine
//!
//! The shell consumes the remote engine exclusively through the [`Remote`]
//! trait. Two backends are provided:
//! - [`HttpRemote`]: JSON/HTTP adapter for a live engine
//! - [`MemoryRemote`]: in-process filesystem for tests and sandboxing

mod error;
mod http;
mod memory;
mod remote;
mod types;

pub use error::{RemoteError, Result};
pub use http::{HttpRemote, HttpRemoteBuilder};
pub use memory::MemoryRemote;
pub use remote::Remote;
pub use types::{DirEntry, FileKind, FsStats, RemoteAttr};
