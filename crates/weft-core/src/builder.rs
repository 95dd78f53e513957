//! The build orchestrator: workspace materialization, compilation, and
//! the binary cache.
//!
//! Every build gets its own temporary workspace, so concurrent renders
//! cannot collide; the cache slot is the only intentionally shared state.
//! A failed build never reaches the cache because insertion happens only
//! after a successful compile (and goes through an atomic rename).

use std::path::PathBuf;

use tempfile::TempDir;

use crate::cache::{derive_key, BinaryCache};
use crate::codegen::{GeneratedProgram, GENERATED_FILE_NAME};
use crate::error::Result;
use crate::runtime::{RUNTIME_FILE_NAME, RUNTIME_SOURCE};
use crate::toolchain::Toolchain;

/// Name of the compiled binary inside the workspace.
const BINARY_NAME: &str = "weft_template_bin";

/// A built (or cache-hit) binary ready to execute.
#[derive(Debug)]
pub struct BuildOutcome {
    /// Path of the executable binary.
    pub binary: PathBuf,
    /// Whether the binary came from the cache without a compiler run.
    pub from_cache: bool,
    /// Keeps the ephemeral workspace alive for uncached builds; the
    /// directory and its binary are removed when the outcome is dropped.
    _workspace: Option<TempDir>,
}

/// Build the generated program, using `cache` when given.
///
/// With a cache, the key is derived first and a hit returns the cached
/// binary without touching the toolchain; a miss builds fresh and then
/// publishes the binary under the key.
pub fn build(
    program: &GeneratedProgram,
    toolchain: &Toolchain,
    cache: Option<&BinaryCache>,
) -> Result<BuildOutcome> {
    match cache {
        None => {
            let (binary, workspace) = build_fresh(program, toolchain)?;
            Ok(BuildOutcome {
                binary,
                from_cache: false,
                _workspace: Some(workspace),
            })
        }
        Some(cache) => {
            let key = derive_key(&program.source, &program.imports)?;
            if let Some(binary) = cache.lookup(&key) {
                tracing::debug!(key, "cache hit");
                return Ok(BuildOutcome {
                    binary,
                    from_cache: true,
                    _workspace: None,
                });
            }
            tracing::debug!(key, "cache miss");
            let (binary, workspace) = build_fresh(program, toolchain)?;
            let cached = cache.insert(&key, &binary)?;
            drop(workspace);
            Ok(BuildOutcome {
                binary: cached,
                from_cache: false,
                _workspace: None,
            })
        }
    }
}

/// Compile into a fresh per-invocation workspace.
fn build_fresh(program: &GeneratedProgram, toolchain: &Toolchain) -> Result<(PathBuf, TempDir)> {
    let workspace = tempfile::Builder::new().prefix("weft-build-").tempdir()?;
    let dir = workspace.path();

    // Materialize build inputs: runtime support, generated source, imports.
    std::fs::write(dir.join(RUNTIME_FILE_NAME), RUNTIME_SOURCE)?;
    let source = dir.join(GENERATED_FILE_NAME);
    std::fs::write(&source, &program.source)?;
    for import in &program.imports {
        toolchain.copy_into(import, dir)?;
    }

    let binary = dir.join(BINARY_NAME);
    toolchain.compile(dir, &source, &binary)?;
    toolchain.adjust_rpath(&binary, "$ORIGIN/..")?;

    // The source served its purpose; keep only the binary.
    std::fs::remove_file(&source)?;

    Ok((binary, workspace))
}
