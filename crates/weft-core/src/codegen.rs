//! Renders a command sequence into the generated program's source text.
//!
//! The generated program is a single `main.rs`: `include!` splices for the
//! runtime support file and every import, then a `render()` body holding
//! the commands in source order. Output never appends a trailing
//! terminator, and literals are always routed through `print!("{}", "...")`
//! so brace characters in template text cannot be taken for format
//! placeholders. stdout is flushed before the process exits so output
//! produced before a failure is still observable.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::command::{Command, CommandSequence};
use crate::runtime::RUNTIME_FILE_NAME;

/// Fixed filename of the generated source inside the build workspace.
pub const GENERATED_FILE_NAME: &str = "main.rs";

/// Generated program source plus the import files to build alongside it.
#[derive(Debug, Clone)]
pub struct GeneratedProgram {
    pub source: String,
    pub imports: Vec<PathBuf>,
}

/// Render a command sequence into one generated-program source.
pub fn generate(sequence: &CommandSequence) -> GeneratedProgram {
    let imports = sequence.imports();
    let mut source = String::with_capacity(1024);

    source.push_str("// Generated by weft. Do not edit.\n\n");
    let _ = writeln!(source, "include!(\"{RUNTIME_FILE_NAME}\");");
    for import in &imports {
        let name = import
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let _ = writeln!(source, "include!(\"{name}\");");
    }

    source.push_str(
        "\nfn main() {\n\
         \x20   use std::io::Write;\n\
         \x20   let code = match render() {\n\
         \x20       Ok(()) => 0,\n\
         \x20       Err(err) => {\n\
         \x20           eprintln!(\"{err}\");\n\
         \x20           1\n\
         \x20       }\n\
         \x20   };\n\
         \x20   let _ = std::io::stdout().flush();\n\
         \x20   std::process::exit(code);\n\
         }\n\n",
    );

    source.push_str("#[allow(unused_variables, unused_mut)]\n");
    source.push_str("fn render() -> Result<(), String> {\n");
    source.push_str("    let ctx = load_context()?;\n");
    for command in &sequence.commands {
        match command {
            Command::Import(_) => {} // surfaced above, not part of the body
            Command::Output(expr) => {
                let _ = writeln!(source, "    print!(\"{{}}\", ({expr}));");
            }
            Command::ControlFlow(code) => {
                let _ = writeln!(source, "    {code}");
            }
            Command::Literal(text) => {
                if !text.is_empty() {
                    let _ = writeln!(source, "    print!(\"{{}}\", \"{}\");", escape_literal(text));
                }
            }
        }
    }
    source.push_str("    Ok(())\n}\n");

    GeneratedProgram { source, imports }
}

/// Escape literal text into an ASCII-safe Rust string literal body.
///
/// All non-ASCII and control characters become `\u{...}` or short escapes,
/// so the generated file is plain ASCII regardless of template content.
fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            ' '..='~' => out.push(c),
            _ => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(commands: Vec<Command>) -> GeneratedProgram {
        generate(&CommandSequence { commands })
    }

    #[test]
    fn test_runtime_is_spliced() {
        let p = program(vec![]);
        assert!(p.source.contains("include!(\"weft_runtime.rs\");"));
        assert!(p.source.contains("fn render() -> Result<(), String>"));
    }

    #[test]
    fn test_output_statement() {
        let p = program(vec![Command::Output("ctx[\"name\"]".into())]);
        assert!(p.source.contains("print!(\"{}\", (ctx[\"name\"]));"));
    }

    #[test]
    fn test_control_flow_is_verbatim() {
        let p = program(vec![
            Command::ControlFlow("for i in 1..=3 {".into()),
            Command::Output("i".into()),
            Command::ControlFlow("}".into()),
        ]);
        let body_for = p.source.find("for i in 1..=3 {").unwrap();
        let body_out = p.source.find("print!(\"{}\", (i));").unwrap();
        let body_close = p.source.rfind("    }").unwrap();
        assert!(body_for < body_out && body_out < body_close);
    }

    #[test]
    fn test_literal_braces_are_safe() {
        let p = program(vec![Command::Literal("a {} b {{}}".into())]);
        assert!(p.source.contains("print!(\"{}\", \"a {} b {{}}\");"));
    }

    #[test]
    fn test_literal_escaping() {
        let p = program(vec![Command::Literal("é\n\"x\"\t\\".into())]);
        assert!(p
            .source
            .contains("print!(\"{}\", \"\\u{e9}\\n\\\"x\\\"\\t\\\\\");"));
    }

    #[test]
    fn test_generated_source_is_ascii() {
        let p = program(vec![Command::Literal("héllo ✓".into())]);
        assert!(p.source.is_ascii());
    }

    #[test]
    fn test_imports_become_includes_not_body() {
        let p = program(vec![
            Command::Import(PathBuf::from("/tmp/helpers.rs")),
            Command::Literal("x".into()),
        ]);
        assert!(p.source.contains("include!(\"helpers.rs\");"));
        assert_eq!(p.imports, vec![PathBuf::from("/tmp/helpers.rs")]);
        // The include sits in the header, before main.
        assert!(p.source.find("include!(\"helpers.rs\")").unwrap() < p.source.find("fn main").unwrap());
    }

    #[test]
    fn test_empty_literal_emits_nothing() {
        let p = program(vec![Command::Literal(String::new())]);
        assert_eq!(p.source.matches("print!").count(), 0);
    }
}
