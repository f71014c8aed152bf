use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Symlink,
}

impl FileKind {
    pub fn is_dir(&self) -> bool {
        matches!(self, Self::Directory)
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::Regular)
    }

    pub fn is_symlink(&self) -> bool {
        matches!(self, Self::Symlink)
    }
}

/// Metadata snapshot for one remote path.
///
/// Always fetched fresh; the shell never caches attributes across commands
/// because the remote tree may change between invocations.
#[derive(Debug, Clone)]
pub struct RemoteAttr {
    pub kind: FileKind,
    /// Full mode word as reported by the engine (type bits + permissions).
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    /// Seconds since the Unix epoch.
    pub mtime: u64,
}

impl RemoteAttr {
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    pub fn is_symlink(&self) -> bool {
        self.kind.is_symlink()
    }
}

/// One name yielded by directory enumeration.
///
/// The kind hint comes from the enumeration reply and may be absent or
/// wrong for symlinks; callers resolve the real type with a follow-up
/// `getattr`.
#[derive(Debug, Clone)]
pub struct DirEntry {
    pub name: String,
    pub kind_hint: Option<FileKind>,
}

#[derive(Debug, Clone, Copy)]
pub struct FsStats {
    pub block_size: u32,
    pub total_blocks: u64,
    pub free_blocks: u64,
    pub avail_blocks: u64,
    pub total_files: u64,
    pub free_files: u64,
    pub avail_files: u64,
}

impl FsStats {
    pub fn used_blocks(&self) -> u64 {
        self.total_blocks.saturating_sub(self.free_blocks)
    }
}

pub(crate) fn kind_from_wire(s: &str) -> FileKind {
    match s {
        "directory" => FileKind::Directory,
        "symlink" => FileKind::Symlink,
        _ => FileKind::Regular,
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AttrResponse {
    pub file_type: String,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub mtime: u64,
}

impl From<AttrResponse> for RemoteAttr {
    fn from(resp: AttrResponse) -> Self {
        Self {
            kind: kind_from_wire(&resp.file_type),
            mode: resp.mode,
            uid: resp.uid,
            gid: resp.gid,
            size: resp.size,
            mtime: resp.mtime,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DirEntryResponse {
    pub name: String,
    pub file_type: Option<String>,
}

impl From<DirEntryResponse> for DirEntry {
    fn from(resp: DirEntryResponse) -> Self {
        Self {
            kind_hint: resp.file_type.as_deref().map(kind_from_wire),
            name: resp.name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReaddirResponse {
    pub entries: Vec<DirEntryResponse>,
    pub next_cookie: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatfsResponse {
    pub block_size: u32,
    pub total_blocks: u64,
    pub free_blocks: u64,
    pub avail_blocks: u64,
    pub total_files: u64,
    pub free_files: u64,
    pub avail_files: u64,
}

impl From<StatfsResponse> for FsStats {
    fn from(resp: StatfsResponse) -> Self {
        Self {
            block_size: resp.block_size,
            total_blocks: resp.total_blocks,
            free_blocks: resp.free_blocks,
            avail_blocks: resp.avail_blocks,
            total_files: resp.total_files,
            free_files: resp.free_files,
            avail_files: resp.avail_files,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct SessionResponse {
    pub rtsize: u32,
    pub wtsize: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WriteResponse {
    pub written: usize,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReadlinkResponse {
    pub target: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
    #[allow(dead_code)]
    pub code: u16,
}
