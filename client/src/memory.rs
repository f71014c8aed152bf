use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::{RemoteError, Result};
use crate::remote::Remote;
use crate::types::{DirEntry, FileKind, FsStats, RemoteAttr};

#[derive(Debug, Clone)]
enum Node {
    File {
        data: Vec<u8>,
        mode: u32,
        uid: u32,
        gid: u32,
        mtime: u64,
    },
    Dir {
        mode: u32,
        uid: u32,
        gid: u32,
        mtime: u64,
    },
    Symlink {
        target: String,
        mode: u32,
        uid: u32,
        gid: u32,
        mtime: u64,
    },
}

impl Node {
    fn kind(&self) -> FileKind {
        match self {
            Self::File { .. } => FileKind::Regular,
            Self::Dir { .. } => FileKind::Directory,
            Self::Symlink { .. } => FileKind::Symlink,
        }
    }

    fn attr(&self) -> RemoteAttr {
        let (mode, uid, gid, size, mtime) = match self {
            Self::File {
                data,
                mode,
                uid,
                gid,
                mtime,
            } => (*mode, *uid, *gid, data.len() as u64, *mtime),
            Self::Dir {
                mode,
                uid,
                gid,
                mtime,
            } => (*mode, *uid, *gid, 0, *mtime),
            Self::Symlink {
                target,
                mode,
                uid,
                gid,
                mtime,
            } => (*mode, *uid, *gid, target.len() as u64, *mtime),
        };
        RemoteAttr {
            kind: self.kind(),
            mode,
            uid,
            gid,
            size,
            mtime,
        }
    }

    fn set_mode(&mut self, new_mode: u32) {
        match self {
            Self::File { mode, .. } | Self::Dir { mode, .. } | Self::Symlink { mode, .. } => {
                *mode = new_mode;
            }
        }
    }

    fn set_owner(&mut self, new_uid: Option<u32>, new_gid: Option<u32>) {
        match self {
            Self::File { uid, gid, .. }
            | Self::Dir { uid, gid, .. }
            | Self::Symlink { uid, gid, .. } => {
                if let Some(u) = new_uid {
                    *uid = u;
                }
                if let Some(g) = new_gid {
                    *gid = g;
                }
            }
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// In-process filesystem engine.
///
/// Backs the test suite and the `--memory` sandbox. The path->node map is
/// flat; directory membership is derived from key prefixes, the way the
/// engine's own tree would derive it from handles.
pub struct MemoryRemote {
    nodes: RwLock<HashMap<String, Node>>,
    rtsize: u32,
    wtsize: u32,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::with_block_sizes(64 * 1024, 64 * 1024)
    }

    /// Small block sizes let tests force multi-chunk transfers.
    pub fn with_block_sizes(rtsize: u32, wtsize: u32) -> Self {
        let fs = Self {
            nodes: RwLock::new(HashMap::new()),
            rtsize,
            wtsize,
        };
        fs.nodes.write().unwrap().insert(
            "/".to_string(),
            Node::Dir {
                mode: 0o755,
                uid: 0,
                gid: 0,
                mtime: now_secs(),
            },
        );
        fs
    }

    /// Create a symbolic link. The shell has no command for this; it exists
    /// so fixtures can exercise `readlink` and listing of link entries.
    pub fn symlink(&self, path: &str, target: &str) -> Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.write().unwrap();
        if nodes.contains_key(&path) {
            return Err(RemoteError::AlreadyExists(path));
        }
        require_parent_dir(&nodes, &path)?;
        nodes.insert(
            path,
            Node::Symlink {
                target: target.to_string(),
                mode: 0o777,
                uid: 0,
                gid: 0,
                mtime: now_secs(),
            },
        );
        Ok(())
    }

    fn child_names(nodes: &HashMap<String, Node>, dir: &str) -> Vec<String> {
        let prefix = if dir == "/" {
            "/".to_string()
        } else {
            format!("{dir}/")
        };
        let mut names: Vec<String> = nodes
            .keys()
            .filter_map(|k| {
                let rest = k.strip_prefix(&prefix)?;
                (!rest.is_empty() && !rest.contains('/')).then(|| rest.to_string())
            })
            .collect();
        names.sort();
        names
    }
}

impl Default for MemoryRemote {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(path: &str) -> String {
    let path = if path.is_empty() { "/" } else { path };
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    if path.len() > 1 && path.ends_with('/') {
        path.trim_end_matches('/').to_string()
    } else {
        path
    }
}

fn parent_of(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    match path.rsplit_once('/') {
        Some(("", _)) => Some("/".to_string()),
        Some((parent, _)) => Some(parent.to_string()),
        None => Some("/".to_string()),
    }
}

fn require_parent_dir(nodes: &HashMap<String, Node>, path: &str) -> Result<()> {
    let parent = parent_of(path)
        .ok_or_else(|| RemoteError::InvalidArgument("cannot create root".to_string()))?;
    match nodes.get(&parent) {
        Some(Node::Dir { .. }) => Ok(()),
        Some(_) => Err(RemoteError::NotDirectory(parent)),
        None => Err(RemoteError::NotFound(parent)),
    }
}

#[async_trait]
impl Remote for MemoryRemote {
    async fn getattr(&self, path: &str) -> Result<RemoteAttr> {
        let path = normalize(path);
        let nodes = self.nodes.read().unwrap();
        nodes
            .get(&path)
            .map(Node::attr)
            .ok_or(RemoteError::NotFound(path))
    }

    async fn readdir(&self, path: &str, _cookie: u64) -> Result<(Vec<DirEntry>, Option<u64>)> {
        let path = normalize(path);
        let nodes = self.nodes.read().unwrap();
        match nodes.get(&path) {
            Some(Node::Dir { .. }) => {}
            Some(_) => return Err(RemoteError::NotDirectory(path)),
            None => return Err(RemoteError::NotFound(path)),
        }

        let mut entries = vec![
            DirEntry {
                name: ".".to_string(),
                kind_hint: Some(FileKind::Directory),
            },
            DirEntry {
                name: "..".to_string(),
                kind_hint: Some(FileKind::Directory),
            },
        ];
        for name in Self::child_names(&nodes, &path) {
            let full = if path == "/" {
                format!("/{name}")
            } else {
                format!("{path}/{name}")
            };
            // Symlink entries carry no hint; enumeration does not report
            // link types reliably and callers must re-stat anyway.
            let kind_hint = match nodes.get(&full).map(Node::kind) {
                Some(FileKind::Symlink) | None => None,
                other => other,
            };
            entries.push(DirEntry { name, kind_hint });
        }
        Ok((entries, None))
    }

    async fn read(&self, path: &str, offset: u64, len: u32) -> Result<Bytes> {
        let path = normalize(path);
        let len = len.min(self.rtsize) as usize;
        let nodes = self.nodes.read().unwrap();
        match nodes.get(&path) {
            Some(Node::File { data, .. }) => {
                let start = (offset as usize).min(data.len());
                let end = (start + len).min(data.len());
                Ok(Bytes::copy_from_slice(&data[start..end]))
            }
            Some(Node::Dir { .. }) => Err(RemoteError::IsDirectory(path)),
            Some(Node::Symlink { .. }) => Err(RemoteError::InvalidArgument(path)),
            None => Err(RemoteError::NotFound(path)),
        }
    }

    async fn write(&self, path: &str, offset: u64, data: &[u8]) -> Result<usize> {
        let path = normalize(path);
        // The engine never accepts more than the negotiated write size in
        // one round trip; oversized chunks come back as short writes.
        let accepted = data.len().min(self.wtsize as usize);
        let mut nodes = self.nodes.write().unwrap();
        match nodes.get_mut(&path) {
            Some(Node::File {
                data: content,
                mtime,
                ..
            }) => {
                let offset = offset as usize;
                if content.len() < offset + accepted {
                    content.resize(offset + accepted, 0);
                }
                content[offset..offset + accepted].copy_from_slice(&data[..accepted]);
                *mtime = now_secs();
                Ok(accepted)
            }
            Some(Node::Dir { .. }) => Err(RemoteError::IsDirectory(path)),
            Some(Node::Symlink { .. }) => Err(RemoteError::InvalidArgument(path)),
            None => Err(RemoteError::NotFound(path)),
        }
    }

    async fn mknod(&self, path: &str, mode: u32, _dev: u32) -> Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.write().unwrap();
        if nodes.contains_key(&path) {
            return Err(RemoteError::AlreadyExists(path));
        }
        require_parent_dir(&nodes, &path)?;
        nodes.insert(
            path,
            Node::File {
                data: Vec::new(),
                mode,
                uid: 0,
                gid: 0,
                mtime: now_secs(),
            },
        );
        Ok(())
    }

    async fn truncate(&self, path: &str, len: u64) -> Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.write().unwrap();
        match nodes.get_mut(&path) {
            Some(Node::File { data, mtime, .. }) => {
                data.resize(len as usize, 0);
                *mtime = now_secs();
                Ok(())
            }
            Some(Node::Dir { .. }) => Err(RemoteError::IsDirectory(path)),
            Some(Node::Symlink { .. }) => Err(RemoteError::InvalidArgument(path)),
            None => Err(RemoteError::NotFound(path)),
        }
    }

    async fn mkdir(&self, path: &str, mode: u32) -> Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.write().unwrap();
        if nodes.contains_key(&path) {
            return Err(RemoteError::AlreadyExists(path));
        }
        require_parent_dir(&nodes, &path)?;
        nodes.insert(
            path,
            Node::Dir {
                mode,
                uid: 0,
                gid: 0,
                mtime: now_secs(),
            },
        );
        Ok(())
    }

    async fn rmdir(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.write().unwrap();
        match nodes.get(&path) {
            Some(Node::Dir { .. }) => {}
            Some(_) => return Err(RemoteError::NotDirectory(path)),
            None => return Err(RemoteError::NotFound(path)),
        }
        if path == "/" {
            return Err(RemoteError::InvalidArgument("cannot remove root".to_string()));
        }
        if !Self::child_names(&nodes, &path).is_empty() {
            return Err(RemoteError::DirectoryNotEmpty(path));
        }
        nodes.remove(&path);
        Ok(())
    }

    async fn unlink(&self, path: &str) -> Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.write().unwrap();
        match nodes.get(&path).map(Node::kind) {
            Some(FileKind::Directory) => Err(RemoteError::IsDirectory(path)),
            Some(_) => {
                nodes.remove(&path);
                Ok(())
            }
            None => Err(RemoteError::NotFound(path)),
        }
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let from = normalize(from);
        let to = normalize(to);
        if to == from {
            return Ok(());
        }
        if to.starts_with(&format!("{from}/")) {
            return Err(RemoteError::InvalidArgument(
                "cannot move a directory into itself".to_string(),
            ));
        }

        let mut nodes = self.nodes.write().unwrap();
        if !nodes.contains_key(&from) {
            return Err(RemoteError::NotFound(from));
        }
        require_parent_dir(&nodes, &to)?;

        match nodes.get(&to).map(Node::kind) {
            Some(FileKind::Directory) => {
                if !Self::child_names(&nodes, &to).is_empty() {
                    return Err(RemoteError::DirectoryNotEmpty(to));
                }
                nodes.remove(&to);
            }
            Some(_) => {
                nodes.remove(&to);
            }
            None => {}
        }

        let moved_keys: Vec<String> = nodes
            .keys()
            .filter(|k| **k == from || k.starts_with(&format!("{from}/")))
            .cloned()
            .collect();
        for key in moved_keys {
            if let Some(node) = nodes.remove(&key) {
                let new_key = format!("{}{}", to, &key[from.len()..]);
                nodes.insert(new_key, node);
            }
        }
        Ok(())
    }

    async fn chmod(&self, path: &str, mode: u32) -> Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.write().unwrap();
        nodes
            .get_mut(&path)
            .map(|n| n.set_mode(mode))
            .ok_or(RemoteError::NotFound(path))
    }

    async fn chown(&self, path: &str, uid: Option<u32>, gid: Option<u32>) -> Result<()> {
        let path = normalize(path);
        let mut nodes = self.nodes.write().unwrap();
        nodes
            .get_mut(&path)
            .map(|n| n.set_owner(uid, gid))
            .ok_or(RemoteError::NotFound(path))
    }

    async fn readlink(&self, path: &str) -> Result<String> {
        let path = normalize(path);
        let nodes = self.nodes.read().unwrap();
        match nodes.get(&path) {
            Some(Node::Symlink { target, .. }) => Ok(target.clone()),
            Some(_) => Err(RemoteError::InvalidArgument(format!("not a symlink: {path}"))),
            None => Err(RemoteError::NotFound(path)),
        }
    }

    async fn statfs(&self) -> Result<FsStats> {
        let nodes = self.nodes.read().unwrap();
        let used_bytes: u64 = nodes
            .values()
            .map(|n| match n {
                Node::File { data, .. } => data.len() as u64,
                _ => 0,
            })
            .sum();
        let block_size = 4096u32;
        let total_blocks: u64 = 1 << 20;
        let used_blocks = used_bytes.div_ceil(u64::from(block_size));
        let free_blocks = total_blocks.saturating_sub(used_blocks);
        let total_files: u64 = 1 << 16;
        let used_files = nodes.len() as u64;
        Ok(FsStats {
            block_size,
            total_blocks,
            free_blocks,
            avail_blocks: free_blocks,
            total_files,
            free_files: total_files.saturating_sub(used_files),
            avail_files: total_files.saturating_sub(used_files),
        })
    }

    async fn teardown(&self) -> Result<()> {
        Ok(())
    }

    fn read_block_size(&self) -> u32 {
        self.rtsize
    }

    fn write_block_size(&self) -> u32 {
        self.wtsize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mknod_rejects_existing_path() {
        let fs = MemoryRemote::new();
        fs.mknod("/a", 0o644, 0).await.unwrap();
        let err = fs.mknod("/a", 0o644, 0).await.unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn readdir_yields_self_and_parent_markers() {
        let fs = MemoryRemote::new();
        fs.mkdir("/d", 0o755).await.unwrap();
        fs.mknod("/d/f", 0o644, 0).await.unwrap();
        let (entries, next) = fs.readdir("/d", 0).await.unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![".", "..", "f"]);
        assert!(next.is_none());
    }

    #[tokio::test]
    async fn symlink_entries_carry_no_kind_hint() {
        let fs = MemoryRemote::new();
        fs.symlink("/link", "/target").unwrap();
        let (entries, _) = fs.readdir("/", 0).await.unwrap();
        let link = entries.iter().find(|e| e.name == "link").unwrap();
        assert!(link.kind_hint.is_none());
        assert_eq!(fs.readlink("/link").await.unwrap(), "/target");
    }

    #[tokio::test]
    async fn read_is_clamped_to_negotiated_block_size() {
        let fs = MemoryRemote::with_block_sizes(4, 4);
        fs.mknod("/f", 0o644, 0).await.unwrap();
        fs.write("/f", 0, b"abcd").await.unwrap();
        fs.write("/f", 4, b"efgh").await.unwrap();
        let data = fs.read("/f", 0, 100).await.unwrap();
        assert_eq!(&data[..], b"abcd");
    }

    #[tokio::test]
    async fn oversized_write_comes_back_short() {
        let fs = MemoryRemote::with_block_sizes(4, 4);
        fs.mknod("/f", 0o644, 0).await.unwrap();
        let written = fs.write("/f", 0, b"abcdefgh").await.unwrap();
        assert_eq!(written, 4);
    }

    #[tokio::test]
    async fn rename_moves_directory_subtree() {
        let fs = MemoryRemote::new();
        fs.mkdir("/a", 0o755).await.unwrap();
        fs.mknod("/a/f", 0o644, 0).await.unwrap();
        fs.rename("/a", "/b").await.unwrap();
        assert!(fs.getattr("/a").await.unwrap_err().is_not_found());
        assert!(fs.getattr("/b/f").await.is_ok());
    }

    #[tokio::test]
    async fn rename_into_own_subtree_is_rejected() {
        let fs = MemoryRemote::new();
        fs.mkdir("/a", 0o755).await.unwrap();
        assert!(fs.rename("/a", "/a/b").await.is_err());
    }

    #[tokio::test]
    async fn rmdir_requires_empty_directory() {
        let fs = MemoryRemote::new();
        fs.mkdir("/d", 0o755).await.unwrap();
        fs.mknod("/d/f", 0o644, 0).await.unwrap();
        assert!(matches!(
            fs.rmdir("/d").await,
            Err(RemoteError::DirectoryNotEmpty(_))
        ));
        fs.unlink("/d/f").await.unwrap();
        fs.rmdir("/d").await.unwrap();
    }
}
