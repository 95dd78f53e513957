//! Unified error types for the weft template engine.

use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur while rendering a template.
#[derive(Error, Debug)]
pub enum WeftError {
    // --- Parsing ---

    /// An open delimiter has no matching close delimiter.
    #[error("{}:{line}: unmatched '{delimiter}'", path.display())]
    Parse {
        path: PathBuf,
        line: u32,
        delimiter: String,
    },

    /// A file directive is not `include("...")` or `import("...")`.
    #[error("{}:{line}: malformed file directive: {directive}", path.display())]
    Directive {
        path: PathBuf,
        line: u32,
        directive: String,
    },

    /// A template includes itself, directly or through other includes.
    #[error("{}:{line}: include cycle: {}", path.display(), target.display())]
    IncludeCycle {
        path: PathBuf,
        line: u32,
        target: PathBuf,
    },

    /// The resolved include/import path does not exist.
    #[error("{}:{line}: file not found: {}", path.display(), target.display())]
    MissingFile {
        path: PathBuf,
        line: u32,
        target: PathBuf,
    },

    // --- Context ---

    /// A context blob could not be decoded (bad magic, version, or layout).
    #[error("invalid context blob: {0}")]
    ContextDecode(String),

    // --- Toolchain ---

    /// A required external tool (e.g. `rustc`, `cp`) is not installed.
    #[error("required tool '{name}' not found, install with: {install}")]
    MissingTool { name: String, install: String },

    /// The compiler reported diagnostics for the generated program.
    #[error("compilation failed: {0}")]
    Compile(String),

    /// The post-link path editor reported diagnostics.
    #[error("post-link step failed: {0}")]
    Link(String),

    // --- Execution ---

    /// The generated program terminated abnormally (signal, nonzero exit).
    #[error("generated program terminated abnormally: {reason}")]
    Process { reason: String, stderr: String },

    /// The generated program wrote to its error stream.
    #[error("render failed for {}: {stderr}", template.display())]
    Render { template: PathBuf, stderr: String },

    // --- General ---

    /// A filesystem I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A catch-all for errors from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Alias for `Result<T, WeftError>`.
pub type Result<T> = std::result::Result<T, WeftError>;
