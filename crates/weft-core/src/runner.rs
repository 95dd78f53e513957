//! Executes a compiled template binary against a serialized context.
//!
//! The context is encoded to a scratch file whose path is the binary's
//! sole argument. Both output streams are captured; anything on stderr is
//! a rendering failure even when the exit status is zero, because the
//! generated program reports directive failures there.

use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::context;
use crate::error::{Result, WeftError};

/// Options for executing the generated binary.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Optional wall-clock limit; the process is killed when exceeded.
    /// `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

struct Captured {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

/// Run `binary` with `context_value`, returning captured stdout verbatim.
///
/// `template` names the template being rendered and is only used to tag
/// [`WeftError::Render`] messages.
pub fn run(
    binary: &Path,
    context_value: &serde_json::Value,
    template: &Path,
    options: &RunOptions,
) -> Result<String> {
    let scratch = tempfile::Builder::new().prefix("weft-ctx-").tempfile()?;
    std::fs::write(scratch.path(), context::encode(context_value))?;

    tracing::debug!(binary = %binary.display(), template = %template.display(), "running generated program");
    let captured = match options.timeout {
        None => {
            let out = Command::new(binary).arg(scratch.path()).output()?;
            Captured {
                status: out.status,
                stdout: out.stdout,
                stderr: out.stderr,
            }
        }
        Some(limit) => run_with_timeout(binary, scratch.path(), limit)?,
    };

    classify(template, &captured)
}

fn classify(template: &Path, captured: &Captured) -> Result<String> {
    let stderr = String::from_utf8_lossy(&captured.stderr);
    if !stderr.is_empty() {
        // Rendering error regardless of exit status.
        return Err(WeftError::Render {
            template: template.to_path_buf(),
            stderr: stderr.into_owned(),
        });
    }
    match captured.status.code() {
        Some(0) => Ok(String::from_utf8_lossy(&captured.stdout).into_owned()),
        _ => Err(WeftError::Process {
            reason: captured.status.to_string(),
            stderr: String::new(),
        }),
    }
}

fn run_with_timeout(binary: &Path, context_path: &Path, limit: Duration) -> Result<Captured> {
    let mut child = Command::new(binary)
        .arg(context_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    // Drain the pipes from threads so a chatty program cannot deadlock
    // against a full pipe buffer while we poll for exit.
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();
    let stdout_reader = std::thread::spawn(move || drain(stdout_pipe));
    let stderr_reader = std::thread::spawn(move || drain(stderr_pipe));

    let deadline = Instant::now() + limit;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            // Leave the readers detached: grandchildren may still hold
            // the pipes open, and joining would wait on them.
            return Err(WeftError::Process {
                reason: format!("timed out after {}ms", limit.as_millis()),
                stderr: String::new(),
            });
        }
        std::thread::sleep(Duration::from_millis(10));
    };

    Ok(Captured {
        status,
        stdout: stdout_reader.join().unwrap_or_default(),
        stderr: stderr_reader.join().unwrap_or_default(),
    })
}

fn drain(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf);
    }
    buf
}
