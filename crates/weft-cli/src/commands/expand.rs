use std::path::Path;

use anyhow::Result;

use weft_core::Pipeline;

/// Print the generated program source for a template.
pub fn run(template: &Path) -> Result<()> {
    let program = Pipeline::new().expand(template)?;
    print!("{}", program.source);
    if !program.imports.is_empty() {
        eprintln!();
        for import in &program.imports {
            eprintln!("// import: {}", import.display());
        }
    }
    Ok(())
}
