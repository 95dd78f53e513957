use std::path::Path;

use anyhow::Result;

use weft_core::Pipeline;

use crate::output;

/// Parse and resolve a template, reporting what it contains.
pub fn run(template: &Path) -> Result<()> {
    let sequence = Pipeline::new().check(template)?;

    output::print_success(&format!("{} parses cleanly", template.display()));
    output::print_key_value("Commands", &sequence.commands.len().to_string());
    output::print_key_value("Imports", &sequence.imports().len().to_string());
    for import in sequence.imports() {
        output::print_key_value("Import", &import.display().to_string());
    }
    Ok(())
}
