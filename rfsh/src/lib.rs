//! rfsh - interactive shell for a handle-based remote filesystem
//!
//! This crate provides:
//! - A line-oriented command REPL (`ls`, `get`, `put`, `mv`, ...)
//! - Chunked transfers bounded by the engine's negotiated block sizes
//! - A worklist-based recursive listing engine
//! - Lossless handling of non-ASCII input lines

mod cmds;
pub mod error;
pub mod help;
pub mod input;
pub mod lexer;
pub mod path;
pub mod shell;

pub use error::{ShellError, ShellResult};
pub use shell::{Output, Session};
