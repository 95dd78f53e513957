use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use weft_core::{Pipeline, Toolchain};

use crate::output;

/// Render a template against a JSON data context.
pub fn run(
    template: &Path,
    data: Option<&Path>,
    cache_dir: Option<PathBuf>,
    out: Option<&Path>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let context = match data {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read data file {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("invalid JSON in {}", path.display()))?
        }
        None => serde_json::Value::Object(serde_json::Map::new()),
    };

    let toolchain = Toolchain::default();
    if let Err(missing) = toolchain.check_prerequisites() {
        for m in &missing {
            output::print_error(&format!(
                "Missing tool: {}, install with: {}",
                m.tool_name, m.install_instructions
            ));
        }
        anyhow::bail!("missing prerequisites");
    }

    let mut pipeline = Pipeline::new().with_toolchain(toolchain);
    if let Some(dir) = cache_dir {
        pipeline = pipeline.with_cache_dir(dir);
    }
    if let Some(secs) = timeout_secs {
        pipeline = pipeline.with_timeout(Duration::from_secs(secs));
    }

    let rendered = pipeline.render(template, &context)?;

    match out {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("cannot write {}", path.display()))?;
            output::print_success("Render complete");
            output::print_key_value("Output", &path.display().to_string());
        }
        None => {
            let mut stdout = std::io::stdout();
            stdout.write_all(rendered.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
