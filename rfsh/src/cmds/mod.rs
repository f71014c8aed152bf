//! Command router
//!
//! Maps a command name to its handler after checking the argument count
//! against the table in [`crate::help`]. Handlers are `Session` methods
//! grouped by concern: navigation, listing, transfer, metadata.

use crate::error::{ShellError, ShellResult};
use crate::help;
use crate::shell::Session;

mod listing;
mod meta;
mod nav;
mod transfer;

impl Session {
    pub(crate) async fn dispatch(&mut self, argv: &[String]) -> ShellResult<()> {
        let Some((name, args)) = argv.split_first() else {
            return Ok(());
        };
        let Some(spec) = help::lookup(name) else {
            return Err(ShellError::UnknownCommand(name.clone()));
        };
        if args.len() < spec.min_args || args.len() > spec.max_args {
            return Err(ShellError::Usage(spec.usage));
        }

        match name.as_str() {
            "help" => self.cmd_help(args),
            "exit" => Err(ShellError::Exit),
            "cd" => self.cmd_cd(args).await,
            "pwd" => self.cmd_pwd(),
            "lcd" => self.cmd_lcd(args),
            "lpwd" => self.cmd_lpwd(),
            "umask" => self.cmd_umask(args),
            "ls" => self.cmd_ls(args).await,
            "df" => self.cmd_df().await,
            "cat" => self.cmd_cat(args).await,
            "get" => self.cmd_get(args).await,
            "put" => self.cmd_put(args).await,
            "mkdir" => self.cmd_mkdir(args).await,
            "rmdir" => self.cmd_rmdir(args).await,
            "rm" => self.cmd_rm(args).await,
            "mv" => self.cmd_mv(args).await,
            "chmod" => self.cmd_chmod(args).await,
            "chown" => self.cmd_chown(args).await,
            _ => unreachable!(),
        }
    }

    fn cmd_help(&mut self, args: &[String]) -> ShellResult<()> {
        match args.first() {
            None => {
                for cmd in help::COMMANDS {
                    self.out
                        .writeln(&format!("{:<8} {}", cmd.name, cmd.summary))?;
                }
                Ok(())
            }
            Some(name) => match help::lookup(name) {
                Some(cmd) => {
                    self.out.writeln(&format!("usage: {}", cmd.usage))?;
                    self.out.writeln(cmd.summary)?;
                    Ok(())
                }
                None => Err(ShellError::UnknownCommand(name.clone())),
            },
        }
    }
}
