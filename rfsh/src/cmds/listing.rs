//! Listing commands: ls (with worklist recursion) and df

use std::collections::VecDeque;

use rfs_client::RemoteAttr;

use crate::error::{ShellError, ShellResult};
use crate::path;
use crate::shell::Session;

impl Session {
    pub(crate) async fn cmd_ls(&mut self, args: &[String]) -> ShellResult<()> {
        let mut recursive = false;
        let mut targets: Vec<&str> = Vec::new();
        for arg in args {
            if arg == "-r" {
                recursive = true;
            } else if arg.starts_with('-') && arg.len() > 1 {
                return Err(ShellError::Usage("ls [-r] [PATH]..."));
            } else {
                targets.push(arg);
            }
        }
        if targets.is_empty() {
            targets.push(".");
        }

        // Explicit worklist instead of recursion: -r appends discovered
        // subdirectories, so arbitrarily deep trees cannot grow the call
        // stack, and each queued target fails independently.
        let mut pending: VecDeque<String> = targets
            .iter()
            .map(|t| path::canonicalize(&self.cwd, t))
            .collect();
        let headers = recursive || pending.len() > 1;
        let mut first = true;

        while let Some(target) = pending.pop_front() {
            if let Err(e) = self
                .list_one(&target, recursive, headers, &mut first, &mut pending)
                .await
            {
                self.err.writeln(&format!("rfsh: ls: {target}: {e}"))?;
            }
        }
        Ok(())
    }

    async fn list_one(
        &mut self,
        target: &str,
        recursive: bool,
        headers: bool,
        first: &mut bool,
        pending: &mut VecDeque<String>,
    ) -> ShellResult<()> {
        let attr = self.remote.getattr(target).await?;

        if !attr.is_dir() {
            // A plain file lists as a single synthetic entry of itself.
            self.print_entry(&attr, target, path::basename(target))
                .await?;
            *first = false;
            return Ok(());
        }

        if headers {
            if !*first {
                self.out.writeln("")?;
            }
            self.out.writeln(&format!("{target}:"))?;
        }
        *first = false;

        let mut cookie = 0;
        loop {
            let (entries, next) = self.remote.readdir(target, cookie).await?;
            for entry in entries {
                let full = path::canonicalize(target, &entry.name);
                // The enumeration hint is unreliable (symlinks in
                // particular); the displayed attributes always come from a
                // fresh per-entry lookup.
                let attr = match self.remote.getattr(&full).await {
                    Ok(attr) => attr,
                    Err(e) => {
                        self.err.writeln(&format!("rfsh: ls: {full}: {e}"))?;
                        continue;
                    }
                };
                self.print_entry(&attr, &full, &entry.name).await?;
                if recursive && attr.is_dir() && entry.name != "." && entry.name != ".." {
                    pending.push_back(full);
                }
            }
            match next {
                Some(c) => cookie = c,
                None => break,
            }
        }
        Ok(())
    }

    async fn print_entry(
        &mut self,
        attr: &RemoteAttr,
        full: &str,
        name: &str,
    ) -> ShellResult<()> {
        let name_field = if attr.is_symlink() {
            // Show the link target; a dangling or unreadable link must not
            // abort the rest of the listing.
            match self.remote.readlink(full).await {
                Ok(target) => format!("{name} -> {target}"),
                Err(_) => format!("{name} -> ?"),
            }
        } else {
            name.to_string()
        };
        self.out.writeln(&format!(
            "{:>7o} {:>5} {:>5} {:>10} {} {}",
            attr.mode,
            attr.uid,
            attr.gid,
            attr.size,
            format_mtime(attr.mtime),
            name_field
        ))?;
        Ok(())
    }

    pub(crate) async fn cmd_df(&mut self) -> ShellResult<()> {
        let stats = self.remote.statfs().await?;
        self.out.writeln(&format!(
            "{:>12} {:>12} {:>12} {:>7} {:>10} {:>10} {:>10}",
            "blocks", "bfree", "bavail", "bsize", "files", "ffree", "favail"
        ))?;
        self.out.writeln(&format!(
            "{:>12} {:>12} {:>12} {:>7} {:>10} {:>10} {:>10}",
            stats.total_blocks,
            stats.free_blocks,
            stats.avail_blocks,
            stats.block_size,
            stats.total_files,
            stats.free_files,
            stats.avail_files
        ))?;
        Ok(())
    }
}

/// `Mon dd HH:MM` from seconds since the Unix epoch (Gregorian, UTC).
fn format_mtime(mtime: u64) -> String {
    const MONTHS: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    let days = (mtime / 86400) as i64;
    let secs = mtime % 86400;

    // Civil-from-days: day-of-era arithmetic instead of looping over years.
    let z = days + 719_468;
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };

    format!(
        "{} {:>2} {:02}:{:02}",
        MONTHS[(month - 1) as usize],
        day,
        secs / 3600,
        (secs % 3600) / 60
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_formats_as_january_first() {
        assert_eq!(format_mtime(0), "Jan  1 00:00");
    }

    #[test]
    fn known_timestamp_formats_correctly() {
        // 2023-11-14 22:13:20 UTC
        assert_eq!(format_mtime(1_700_000_000), "Nov 14 22:13");
    }

    #[test]
    fn leap_day_is_handled() {
        // 2024-02-29 12:00:00 UTC
        assert_eq!(format_mtime(1_709_208_000), "Feb 29 12:00");
    }
}
