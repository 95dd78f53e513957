//! External toolchain configuration and subprocess wrappers.
//!
//! The compiler, the file-copy utility, and the optional post-link path
//! editor are opaque external processes invoked with fixed arguments.
//! Missing tools surface as [`WeftError::MissingTool`]; their diagnostics
//! surface verbatim as [`WeftError::Compile`] / [`WeftError::Link`].

use std::path::Path;
use std::process::Command;

use crate::error::{Result, WeftError};

/// Crate name given to the compiler for every generated program.
pub const GENERATED_CRATE_NAME: &str = "weft_template";

const COMPILER_INSTALL: &str = "https://rustup.rs";
const COPY_INSTALL: &str = "coreutils";
const RPATH_INSTALL: &str = "patchelf (distribution package)";

/// Information about a missing prerequisite tool.
#[derive(Debug, Clone)]
pub struct MissingPrerequisite {
    pub tool_name: String,
    pub install_instructions: String,
}

/// The external tools the build orchestrator invokes.
#[derive(Debug, Clone)]
pub struct Toolchain {
    /// Compiler for generated programs.
    pub compiler: String,
    /// File-copy utility used to materialize import files.
    pub copy_tool: String,
    /// Optional post-link editor that rewrites the binary's runtime
    /// library search path. Off by default: the default pipeline compiles
    /// runtime support statically into the binary, so there is nothing to
    /// locate at run time.
    pub rpath_tool: Option<String>,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: "rustc".into(),
            copy_tool: "cp".into(),
            rpath_tool: None,
        }
    }
}

impl Toolchain {
    /// Check that all configured tools are installed.
    pub fn check_prerequisites(&self) -> std::result::Result<(), Vec<MissingPrerequisite>> {
        let mut required = vec![
            (self.compiler.as_str(), COMPILER_INSTALL),
            (self.copy_tool.as_str(), COPY_INSTALL),
        ];
        if let Some(tool) = &self.rpath_tool {
            required.push((tool.as_str(), RPATH_INSTALL));
        }

        let missing: Vec<_> = required
            .into_iter()
            .filter(|(tool, _)| which::which(tool).is_err())
            .map(|(tool, install)| MissingPrerequisite {
                tool_name: tool.to_string(),
                install_instructions: install.to_string(),
            })
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    /// Compile the generated source in `workspace` into `binary`.
    ///
    /// Fixed flags: optimizations off, fixed crate name, warnings
    /// suppressed, search path at the runtime support location (the
    /// workspace itself).
    pub fn compile(&self, workspace: &Path, source: &Path, binary: &Path) -> Result<()> {
        tracing::debug!(compiler = %self.compiler, source = %source.display(), "compiling generated program");

        let output = Command::new(&self.compiler)
            .arg("--edition")
            .arg("2021")
            .arg("-C")
            .arg("opt-level=0")
            .arg("--crate-name")
            .arg(GENERATED_CRATE_NAME)
            .arg("-A")
            .arg("warnings")
            .arg("-L")
            .arg(workspace)
            .arg("-o")
            .arg(binary)
            .arg(source)
            .output();

        match output {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(WeftError::Compile(
                String::from_utf8_lossy(&out.stderr).to_string(),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(WeftError::MissingTool {
                name: self.compiler.clone(),
                install: COMPILER_INSTALL.into(),
            }),
            Err(e) => Err(WeftError::Compile(e.to_string())),
        }
    }

    /// Copy `from` into `dest_dir`, preserving the filename.
    pub fn copy_into(&self, from: &Path, dest_dir: &Path) -> Result<()> {
        tracing::debug!(from = %from.display(), dest = %dest_dir.display(), "copying build input");

        let output = Command::new(&self.copy_tool)
            .arg("-R")
            .arg(from)
            .arg(dest_dir)
            .output();

        match output {
            Ok(out) if out.status.success() => Ok(()),
            Ok(out) => Err(WeftError::Other(anyhow::anyhow!(
                "{} failed: {}",
                self.copy_tool,
                String::from_utf8_lossy(&out.stderr)
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(WeftError::MissingTool {
                name: self.copy_tool.clone(),
                install: COPY_INSTALL.into(),
            }),
            Err(e) => Err(WeftError::Other(anyhow::anyhow!(
                "failed to run {}: {e}",
                self.copy_tool
            ))),
        }
    }

    /// Rewrite `binary`'s runtime library search path to `rpath`.
    ///
    /// A no-op when no rpath tool is configured. Any error text from the
    /// tool fails the build with [`WeftError::Link`].
    pub fn adjust_rpath(&self, binary: &Path, rpath: &str) -> Result<()> {
        let Some(tool) = &self.rpath_tool else {
            return Ok(());
        };
        tracing::debug!(tool = %tool, binary = %binary.display(), rpath, "adjusting runtime search path");

        let output = Command::new(tool)
            .arg("--set-rpath")
            .arg(rpath)
            .arg(binary)
            .output();

        match output {
            Ok(out) if out.status.success() && out.stderr.is_empty() => Ok(()),
            Ok(out) => Err(WeftError::Link(
                String::from_utf8_lossy(&out.stderr).to_string(),
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(WeftError::MissingTool {
                name: tool.clone(),
                install: RPATH_INSTALL.into(),
            }),
            Err(e) => Err(WeftError::Link(e.to_string())),
        }
    }
}
