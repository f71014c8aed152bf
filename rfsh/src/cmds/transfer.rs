//! Chunked transfers: get, put, cat
//!
//! Transfers never move more than the engine's negotiated block size per
//! round trip. A transfer keeps no retry state; one failed chunk aborts
//! the whole command. Local file handles are scoped to the command and
//! closed on every exit path.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{ShellError, ShellResult};
use crate::path;
use crate::shell::Session;

impl Session {
    pub(crate) async fn cmd_get(&mut self, args: &[String]) -> ShellResult<()> {
        let remote_path = path::canonicalize(&self.cwd, &args[0]);
        self.fetch(&remote_path, args.get(1).map(String::as_str))
            .await
    }

    /// `cat` is `get` with the destination forced to standard output.
    pub(crate) async fn cmd_cat(&mut self, args: &[String]) -> ShellResult<()> {
        let remote_path = path::canonicalize(&self.cwd, &args[0]);
        self.fetch(&remote_path, Some("-")).await
    }

    async fn fetch(&mut self, remote_path: &str, local: Option<&str>) -> ShellResult<()> {
        let attr = self.remote.getattr(remote_path).await?;
        if attr.is_dir() {
            return Err(ShellError::Arg(format!(
                "get: {remote_path}: is a directory"
            )));
        }
        let size = attr.size;
        let block = u64::from(self.remote.read_block_size());

        let mut sink = match local {
            Some("-") => None,
            other => Some(File::create(local_destination(other, remote_path))?),
        };

        let mut offset = 0u64;
        while offset < size {
            let want = block.min(size - offset) as u32;
            let data: bytes::Bytes = self.remote.read(remote_path, offset, want).await?;
            if data.is_empty() {
                return Err(ShellError::Transfer(format!(
                    "{remote_path}: short read at offset {offset} ({size} bytes expected)"
                )));
            }
            match &mut sink {
                Some(file) => file.write_all(&data)?,
                None => self.out.write(&data)?,
            }
            offset += data.len() as u64;
        }
        Ok(())
    }

    pub(crate) async fn cmd_put(&mut self, args: &[String]) -> ShellResult<()> {
        let local = &args[0];
        let meta = std::fs::metadata(local)
            .map_err(|e| ShellError::Arg(format!("put: {local}: {e}")))?;
        if !meta.is_file() {
            return Err(ShellError::Arg(format!(
                "put: {local}: not a regular file"
            )));
        }
        let size = meta.len();
        let base = Path::new(local)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ShellError::Arg(format!("put: {local}: invalid file name")))?;

        let target = match args.get(1) {
            Some(remote) => path::canonicalize(&self.cwd, remote),
            None => path::canonicalize(&self.cwd, &base),
        };
        let mode = 0o666 & !self.umask;
        let dest = self.prepare_upload_target(&target, &base, mode).await?;

        let mut file = File::open(local)?;
        let block = self.remote.write_block_size() as usize;
        let mut buf = vec![0u8; block];
        let mut offset = 0u64;
        while offset < size {
            let n = file.read(&mut buf)?;
            if n == 0 {
                return Err(ShellError::Transfer(format!(
                    "{local}: file shrank at offset {offset} ({size} bytes expected)"
                )));
            }
            let written = self.remote.write(&dest, offset, &buf[..n]).await?;
            if written != n {
                return Err(ShellError::Transfer(format!(
                    "{dest}: short write at offset {offset} ({written} of {n} bytes accepted)"
                )));
            }
            offset += n as u64;
        }
        Ok(())
    }

    /// Decide where an upload lands and leave that path empty.
    ///
    /// Creation conflicts fall back in two levels: an existing directory
    /// redirects the create into it under the local basename, and only an
    /// `AlreadyExists` on that single retry degrades to a truncate. Any
    /// other creation failure aborts the put.
    async fn prepare_upload_target(
        &mut self,
        target: &str,
        base: &str,
        mode: u32,
    ) -> ShellResult<String> {
        match self.remote.mknod(target, mode, 0).await {
            Ok(()) => Ok(target.to_string()),
            Err(e) if e.is_already_exists() => {
                if self.is_remote_dir(target).await? {
                    let nested = path::join(target, base);
                    match self.remote.mknod(&nested, mode, 0).await {
                        Ok(()) => Ok(nested),
                        Err(e) if e.is_already_exists() => {
                            self.remote.truncate(&nested, 0).await?;
                            Ok(nested)
                        }
                        Err(e) => Err(e.into()),
                    }
                } else {
                    self.remote.truncate(target, 0).await?;
                    Ok(target.to_string())
                }
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolve the local side of a download: an existing directory takes the
/// remote basename, an omitted name defaults to the remote basename in
/// the local current directory.
fn local_destination(local: Option<&str>, remote_path: &str) -> PathBuf {
    match local {
        Some(name) => {
            let p = Path::new(name);
            if p.is_dir() {
                p.join(path::basename(remote_path))
            } else {
                p.to_path_buf()
            }
        }
        None => PathBuf::from(path::basename(remote_path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_local_name_is_kept() {
        assert_eq!(
            local_destination(Some("out.bin"), "/a/b.txt"),
            PathBuf::from("out.bin")
        );
    }

    #[test]
    fn existing_directory_takes_remote_basename() {
        let dir = tempfile::tempdir().unwrap();
        let dest = local_destination(Some(dir.path().to_str().unwrap()), "/a/b.txt");
        assert_eq!(dest, dir.path().join("b.txt"));
    }

    #[test]
    fn omitted_local_name_defaults_to_remote_basename() {
        assert_eq!(
            local_destination(None, "/a/b.txt"),
            PathBuf::from("b.txt")
        );
    }
}
