//! Session state and command execution entry point

use std::io::Write;
use std::sync::Arc;

use rfs_client::Remote;

use crate::error::{ShellError, ShellResult};
use crate::input;
use crate::path;

/// Output sink for command results and diagnostics.
///
/// Handlers never print directly; they write through the session's sinks
/// so tests can capture everything a command produced.
pub enum Output {
    Stdout,
    Stderr,
    Buffer(Vec<u8>),
}

impl Output {
    pub fn write(&mut self, data: &[u8]) -> std::io::Result<()> {
        match self {
            Self::Stdout => {
                std::io::stdout().write_all(data)?;
                std::io::stdout().flush()
            }
            Self::Stderr => {
                std::io::stderr().write_all(data)?;
                std::io::stderr().flush()
            }
            Self::Buffer(buf) => {
                buf.extend_from_slice(data);
                Ok(())
            }
        }
    }

    pub fn writeln(&mut self, s: &str) -> std::io::Result<()> {
        self.write(s.as_bytes())?;
        self.write(b"\n")
    }

    /// Drain a buffered sink; empty for the stream variants.
    pub fn take(&mut self) -> Vec<u8> {
        match self {
            Self::Buffer(buf) => std::mem::take(buf),
            _ => Vec::new(),
        }
    }
}

/// One shell session: remote working directory, umask, and the engine
/// connection. Created at startup, mutated by `cd`/`umask`, torn down at
/// exit. Handlers receive it explicitly; there is no ambient global state.
pub struct Session {
    pub cwd: String,
    pub umask: u32,
    pub remote: Arc<dyn Remote>,
    pub out: Output,
    pub err: Output,
}

impl Session {
    pub fn new(remote: Arc<dyn Remote>) -> Self {
        Self {
            cwd: "/".to_string(),
            umask: 0o022,
            remote,
            out: Output::Stdout,
            err: Output::Stderr,
        }
    }

    /// Session with buffered sinks, for tests.
    pub fn captured(remote: Arc<dyn Remote>) -> Self {
        Self {
            out: Output::Buffer(Vec::new()),
            err: Output::Buffer(Vec::new()),
            ..Self::new(remote)
        }
    }

    /// Decode one raw input line and run each `;`-separated command in
    /// order. Every error except the `exit` signal is reported here and
    /// swallowed, so a failed command never kills the shell. Returns the
    /// exit status of the last command.
    pub async fn execute(&mut self, line: &str) -> ShellResult<i32> {
        let commands = match input::decode_line(line) {
            Ok(commands) => commands,
            Err(e) => {
                self.report(&e);
                return Ok(1);
            }
        };

        let mut code = 0;
        for argv in commands {
            match self.dispatch(&argv).await {
                Ok(()) => code = 0,
                Err(ShellError::Exit) => return Err(ShellError::Exit),
                Err(e) => {
                    self.report(&e);
                    code = 1;
                }
            }
        }
        Ok(code)
    }

    /// Whether `path` currently resolves to a remote directory. A failed
    /// resolution propagates; "does not exist" is not "not a directory".
    pub async fn is_remote_dir(&self, path: &str) -> ShellResult<bool> {
        let canonical = path::canonicalize(&self.cwd, path);
        Ok(self.remote.getattr(&canonical).await?.is_dir())
    }

    /// Release the engine session. Failures are logged, not raised; the
    /// shell is exiting either way.
    pub async fn teardown(&self) {
        if let Err(e) = self.remote.teardown().await {
            tracing::debug!(error = %e, "session teardown failed");
        }
    }

    fn report(&mut self, err: &ShellError) {
        if err.is_unexpected() {
            tracing::error!(error = %err, "command failed");
        }
        let line = match err {
            ShellError::Usage(usage) => format!("usage: {usage}"),
            other => format!("rfsh: {other}"),
        };
        let _ = self.err.writeln(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfs_client::MemoryRemote;

    #[tokio::test]
    async fn session_starts_at_root_with_default_umask() {
        let session = Session::captured(Arc::new(MemoryRemote::new()));
        assert_eq!(session.cwd, "/");
        assert_eq!(session.umask, 0o022);
    }

    #[tokio::test]
    async fn unknown_command_is_reported_not_fatal() {
        let mut session = Session::captured(Arc::new(MemoryRemote::new()));
        let code = session.execute("frobnicate").await.unwrap();
        assert_eq!(code, 1);
        let err = String::from_utf8(session.err.take()).unwrap();
        assert!(err.contains("Unknown command 'frobnicate'"));
    }

    #[tokio::test]
    async fn exit_signal_propagates() {
        let mut session = Session::captured(Arc::new(MemoryRemote::new()));
        assert!(matches!(
            session.execute("exit").await,
            Err(ShellError::Exit)
        ));
    }

    #[tokio::test]
    async fn bad_line_is_a_noop() {
        let mut session = Session::captured(Arc::new(MemoryRemote::new()));
        let code = session.execute("cd 'unterminated").await.unwrap();
        assert_eq!(code, 1);
        assert_eq!(session.cwd, "/");
    }
}
