//! The end-to-end render pipeline: parse, generate, build, execute.
//!
//! One synchronous call per render; each stage blocks on the previous.
//! The only shared state across calls is the optional cache directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::builder;
use crate::cache::BinaryCache;
use crate::codegen::{self, GeneratedProgram};
use crate::command::CommandSequence;
use crate::error::Result;
use crate::runner::{self, RunOptions};
use crate::template::Template;
use crate::tokenizer::Delimiters;
use crate::toolchain::Toolchain;

/// Configured render pipeline.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    delimiters: Delimiters,
    toolchain: Toolchain,
    cache_dir: Option<PathBuf>,
    timeout: Option<Duration>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Cache compiled binaries under `dir` across renders.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    /// Kill the generated program if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Parse and resolve only; surfaces template errors without building.
    pub fn check(&self, template_path: &Path) -> Result<CommandSequence> {
        Template::load(template_path)?.parse(&self.delimiters)
    }

    /// Parse and generate, returning the generated program source.
    pub fn expand(&self, template_path: &Path) -> Result<GeneratedProgram> {
        Ok(codegen::generate(&self.check(template_path)?))
    }

    /// Render the template at `template_path` against `context`.
    pub fn render(&self, template_path: &Path, context: &serde_json::Value) -> Result<String> {
        let template = Template::load(template_path)?;
        let sequence = template.parse(&self.delimiters)?;
        let program = codegen::generate(&sequence);

        let cache = self.cache_dir.as_ref().map(BinaryCache::new);
        let outcome = builder::build(&program, &self.toolchain, cache.as_ref())?;

        let options = RunOptions {
            timeout: self.timeout,
        };
        runner::run(&outcome.binary, context, &template.path, &options)
    }
}
