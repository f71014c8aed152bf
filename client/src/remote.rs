use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::types::{DirEntry, FsStats, RemoteAttr};

/// Capability set consumed from the remote filesystem engine.
///
/// All paths are absolute and canonical; the shell's path resolver
/// guarantees that before any call lands here. Read and write are bounded
/// round trips: a single call never moves more than the negotiated block
/// size, and the transfer engine sequences calls to cover larger files.
#[async_trait]
pub trait Remote: Send + Sync {
    async fn getattr(&self, path: &str) -> Result<RemoteAttr>;

    /// One page of directory entries starting at `cookie` (0 for the first
    /// call), plus the cookie for the next page if there is one.
    async fn readdir(&self, path: &str, cookie: u64) -> Result<(Vec<DirEntry>, Option<u64>)>;

    async fn read(&self, path: &str, offset: u64, len: u32) -> Result<Bytes>;

    /// Returns the number of bytes the engine accepted.
    async fn write(&self, path: &str, offset: u64, data: &[u8]) -> Result<usize>;

    /// Create a fresh regular file. Fails with `AlreadyExists` if the path
    /// is taken; the caller owns the create-vs-overwrite decision.
    async fn mknod(&self, path: &str, mode: u32, dev: u32) -> Result<()>;

    async fn truncate(&self, path: &str, len: u64) -> Result<()>;

    async fn mkdir(&self, path: &str, mode: u32) -> Result<()>;

    async fn rmdir(&self, path: &str) -> Result<()>;

    async fn unlink(&self, path: &str) -> Result<()>;

    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    async fn chmod(&self, path: &str, mode: u32) -> Result<()>;

    async fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> Result<()>;

    async fn readlink(&self, path: &str) -> Result<String>;

    async fn statfs(&self) -> Result<FsStats>;

    /// Release the engine session. Called once at shell exit.
    async fn teardown(&self) -> Result<()>;

    /// Largest read the engine accepts per round trip, negotiated at init.
    fn read_block_size(&self) -> u32;

    /// Largest write the engine accepts per round trip, negotiated at init.
    fn write_block_size(&self) -> u32;
}
