//! Metadata commands: mkdir, rmdir, rm, mv, chmod, chown

use crate::error::{ShellError, ShellResult};
use crate::path;
use crate::shell::Session;

impl Session {
    pub(crate) async fn cmd_mkdir(&mut self, args: &[String]) -> ShellResult<()> {
        let target = path::canonicalize(&self.cwd, &args[0]);
        let mode = 0o777 & !self.umask;
        self.remote.mkdir(&target, mode).await?;
        Ok(())
    }

    pub(crate) async fn cmd_rmdir(&mut self, args: &[String]) -> ShellResult<()> {
        let target = path::canonicalize(&self.cwd, &args[0]);
        self.remote.rmdir(&target).await?;
        Ok(())
    }

    pub(crate) async fn cmd_rm(&mut self, args: &[String]) -> ShellResult<()> {
        let target = path::canonicalize(&self.cwd, &args[0]);
        self.remote.unlink(&target).await?;
        Ok(())
    }

    pub(crate) async fn cmd_mv(&mut self, args: &[String]) -> ShellResult<()> {
        let old = path::canonicalize(&self.cwd, &args[0]);
        let new = path::canonicalize(&self.cwd, &args[1]);

        // An existing directory destination redirects the move into it;
        // only a clean "not found" keeps the name as given. Any other
        // lookup failure aborts the move.
        let dest = match self.remote.getattr(&new).await {
            Ok(attr) if attr.is_dir() => path::join(&new, path::basename(&old)),
            Ok(_) => new,
            Err(e) if e.is_not_found() => new,
            Err(e) => return Err(e.into()),
        };

        self.remote.rename(&old, &dest).await?;
        Ok(())
    }

    pub(crate) async fn cmd_chmod(&mut self, args: &[String]) -> ShellResult<()> {
        let mode = u32::from_str_radix(&args[0], 8)
            .map_err(|_| ShellError::Arg(format!("chmod: invalid mode '{}'", args[0])))?;
        if mode > 0o7777 {
            return Err(ShellError::Arg(format!(
                "chmod: invalid mode '{}'",
                args[0]
            )));
        }
        let target = path::canonicalize(&self.cwd, &args[1]);
        self.remote.chmod(&target, mode).await?;
        Ok(())
    }

    pub(crate) async fn cmd_chown(&mut self, args: &[String]) -> ShellResult<()> {
        let (uid, gid) = parse_owner(&args[0])?;
        let target = path::canonicalize(&self.cwd, &args[1]);
        self.remote.chown(&target, uid, gid).await?;
        Ok(())
    }
}

/// Parse `UID:GID` with either side optional: `1000`, `1000:`, `:100`,
/// `1000:100`. At least one side must be present.
fn parse_owner(spec: &str) -> ShellResult<(Option<u32>, Option<u32>)> {
    fn side(s: &str, what: &str, spec: &str) -> ShellResult<Option<u32>> {
        if s.is_empty() {
            return Ok(None);
        }
        s.parse::<u32>()
            .map(Some)
            .map_err(|_| ShellError::Arg(format!("chown: invalid {what} in '{spec}'")))
    }

    let (uid, gid) = match spec.split_once(':') {
        Some((u, g)) => (side(u, "uid", spec)?, side(g, "gid", spec)?),
        None => (side(spec, "uid", spec)?, None),
    };
    if uid.is_none() && gid.is_none() {
        return Err(ShellError::Arg(format!("chown: invalid owner '{spec}'")));
    }
    Ok((uid, gid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_spec_sides_are_optional() {
        assert_eq!(parse_owner("1000:100").unwrap(), (Some(1000), Some(100)));
        assert_eq!(parse_owner("1000").unwrap(), (Some(1000), None));
        assert_eq!(parse_owner("1000:").unwrap(), (Some(1000), None));
        assert_eq!(parse_owner(":100").unwrap(), (None, Some(100)));
    }

    #[test]
    fn bad_owner_specs_are_rejected() {
        assert!(parse_owner(":").is_err());
        assert!(parse_owner("alice").is_err());
        assert!(parse_owner("1000:staff").is_err());
    }
}
