//! Working-directory commands: cd, pwd, lcd, lpwd, umask

use crate::error::{ShellError, ShellResult};
use crate::path;
use crate::shell::Session;

impl Session {
    pub(crate) async fn cmd_cd(&mut self, args: &[String]) -> ShellResult<()> {
        let target = args.first().map_or("/", String::as_str);
        let new_cwd = path::canonicalize(&self.cwd, target);

        // Attributes are fetched fresh; a vanished or non-directory target
        // must fail here, not on the next ls.
        let attr = self.remote.getattr(&new_cwd).await?;
        if !attr.is_dir() {
            return Err(ShellError::Arg(format!("cd: {target}: not a directory")));
        }
        self.cwd = new_cwd;
        Ok(())
    }

    pub(crate) fn cmd_pwd(&mut self) -> ShellResult<()> {
        let cwd = self.cwd.clone();
        self.out.writeln(&cwd)?;
        Ok(())
    }

    pub(crate) fn cmd_lcd(&mut self, args: &[String]) -> ShellResult<()> {
        let target = match args.first() {
            Some(dir) => dir.clone(),
            None => std::env::var("HOME")
                .map_err(|_| ShellError::Arg("lcd: HOME is not set".to_string()))?,
        };
        std::env::set_current_dir(&target)
            .map_err(|e| ShellError::Arg(format!("lcd: {target}: {e}")))?;
        Ok(())
    }

    pub(crate) fn cmd_lpwd(&mut self) -> ShellResult<()> {
        let cwd = std::env::current_dir()?;
        self.out.writeln(&cwd.display().to_string())?;
        Ok(())
    }

    pub(crate) fn cmd_umask(&mut self, args: &[String]) -> ShellResult<()> {
        match args.first() {
            None => {
                let mask = format!("{:04o}", self.umask);
                self.out.writeln(&mask)?;
            }
            Some(arg) => {
                let mask = u32::from_str_radix(arg, 8)
                    .map_err(|_| ShellError::Arg(format!("umask: invalid mask '{arg}'")))?;
                if mask > 0o777 {
                    return Err(ShellError::Arg(format!("umask: invalid mask '{arg}'")));
                }
                self.umask = mask;
            }
        }
        Ok(())
    }
}
