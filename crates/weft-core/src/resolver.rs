//! Classifies directive spans into commands and resolves file directives.
//!
//! Each span's code is checked for the three trim modifiers, then
//! classified: `-` introduces a file directive (`include`/`import`), `=`
//! an output expression, `#` or empty a no-op, anything else raw control
//! flow. Includes are parsed recursively and spliced in place; a stack of
//! in-progress include paths turns self-reference into an error instead of
//! unbounded recursion.

use std::path::{Path, PathBuf};

use crate::command::{Command, CommandSequence};
use crate::error::{Result, WeftError};
use crate::tokenizer::{tokenize, Delimiters};

/// Default extension appended when an include path does not resolve.
pub const TEMPLATE_EXTENSION: &str = "weft";
/// Default extension appended when an import path does not resolve.
pub const IMPORT_EXTENSION: &str = "rs";

/// Parse template text into the full command sequence, recursively
/// resolving includes relative to `path`.
pub fn resolve(text: &str, path: &Path, delimiters: &Delimiters) -> Result<CommandSequence> {
    let mut commands = Vec::new();
    let mut stack = vec![canonical(path)];
    parse_into(text, path, delimiters, &mut commands, &mut stack)?;
    Ok(CommandSequence { commands })
}

fn canonical(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn parse_into(
    text: &str,
    path: &Path,
    delimiters: &Delimiters,
    commands: &mut Vec<Command>,
    stack: &mut Vec<PathBuf>,
) -> Result<()> {
    let spans = tokenize(text, delimiters, path)?;

    for span in spans {
        let mut code = span.code.as_str();
        let mut literal = span.literal;

        // Trailing '-': drop exactly one line terminator after the tag.
        if let Some(stripped) = code.trim_end().strip_suffix('-') {
            code = stripped;
            literal = trim_one_newline(literal);
        }
        // Trailing '_': drop all leading indentation after the tag.
        if let Some(stripped) = code.trim_end().strip_suffix('_') {
            code = stripped;
            literal = literal.trim_start_matches([' ', '\t']).to_string();
        }
        // Leading '_': drop trailing indentation of the queued literal.
        if let Some(stripped) = code.trim_start().strip_prefix('_') {
            code = stripped;
            if let Some(Command::Literal(prev)) = commands.last_mut() {
                let trimmed_len = prev.trim_end_matches([' ', '\t']).len();
                prev.truncate(trimmed_len);
            }
        }

        classify(code, span.line, path, delimiters, commands, stack)?;

        if !literal.is_empty() {
            commands.push(Command::Literal(literal));
        }
    }

    Ok(())
}

fn classify(
    code: &str,
    line: u32,
    path: &Path,
    delimiters: &Delimiters,
    commands: &mut Vec<Command>,
    stack: &mut Vec<PathBuf>,
) -> Result<()> {
    let trimmed = code.trim();

    if let Some(rest) = trimmed.strip_prefix('-') {
        let rest = rest.trim_start();
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        if let Some(arg) = quoted_argument(rest, "include") {
            let resolved = resolve_relative(base_dir, arg, TEMPLATE_EXTENSION).ok_or_else(|| {
                WeftError::MissingFile {
                    path: path.to_path_buf(),
                    line,
                    target: base_dir.join(arg),
                }
            })?;
            let canon = canonical(&resolved);
            if stack.contains(&canon) {
                return Err(WeftError::IncludeCycle {
                    path: path.to_path_buf(),
                    line,
                    target: resolved,
                });
            }
            let included = std::fs::read_to_string(&resolved)?;
            tracing::debug!(template = %path.display(), include = %resolved.display(), "splicing include");
            stack.push(canon);
            // Errors from the recursive parse already carry path:line.
            parse_into(&included, &resolved, delimiters, commands, stack)?;
            stack.pop();
        } else if let Some(arg) = quoted_argument(rest, "import") {
            let resolved = resolve_relative(base_dir, arg, IMPORT_EXTENSION).ok_or_else(|| {
                WeftError::MissingFile {
                    path: path.to_path_buf(),
                    line,
                    target: base_dir.join(arg),
                }
            })?;
            commands.push(Command::Import(resolved));
        } else {
            return Err(WeftError::Directive {
                path: path.to_path_buf(),
                line,
                directive: trimmed.to_string(),
            });
        }
    } else if let Some(expr) = trimmed.strip_prefix('=') {
        commands.push(Command::Output(expr.trim().to_string()));
    } else if trimmed.is_empty() || trimmed.starts_with('#') {
        // Comment or blank directive: contributes nothing.
    } else {
        commands.push(Command::ControlFlow(trimmed.to_string()));
    }

    Ok(())
}

/// Extract the quoted argument of `name("...")`, if `text` has that shape.
fn quoted_argument<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let rest = text.strip_prefix(name)?.trim_start();
    let inner = rest.strip_prefix('(')?.trim_end().strip_suffix(')')?.trim();
    let arg = inner.strip_prefix('"')?.strip_suffix('"')?;
    (!arg.is_empty()).then_some(arg)
}

/// Resolve `arg` against `base_dir`; if absent and lacking `default_ext`,
/// retry with the extension appended.
fn resolve_relative(base_dir: &Path, arg: &str, default_ext: &str) -> Option<PathBuf> {
    let candidate = base_dir.join(arg);
    if candidate.exists() {
        return Some(candidate);
    }
    if candidate.extension().is_none_or(|ext| ext != default_ext) {
        let mut retry = candidate.into_os_string();
        retry.push(".");
        retry.push(default_ext);
        let retry = PathBuf::from(retry);
        if retry.exists() {
            return Some(retry);
        }
    }
    None
}

/// Remove exactly one leading line terminator, if present.
fn trim_one_newline(literal: String) -> String {
    if let Some(rest) = literal.strip_prefix("\r\n") {
        rest.to_string()
    } else if let Some(rest) = literal.strip_prefix('\n') {
        rest.to_string()
    } else {
        literal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn parse(text: &str) -> Result<CommandSequence> {
        resolve(text, &PathBuf::from("test.weft"), &Delimiters::default())
    }

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_output_expression() {
        let seq = parse("Hello <%= ctx[\"name\"] %>!").unwrap();
        assert_eq!(
            seq.commands,
            vec![
                Command::Literal("Hello ".into()),
                Command::Output("ctx[\"name\"]".into()),
                Command::Literal("!".into()),
            ]
        );
    }

    #[test]
    fn test_control_flow() {
        let seq = parse("<% for i in 1..=3 { %>x<% } %>").unwrap();
        assert_eq!(
            seq.commands,
            vec![
                Command::ControlFlow("for i in 1..=3 {".into()),
                Command::Literal("x".into()),
                Command::ControlFlow("}".into()),
            ]
        );
    }

    #[test]
    fn test_comment_and_blank_are_noops() {
        let seq = parse("<%# ignored %>X<%  %>").unwrap();
        assert_eq!(seq.commands, vec![Command::Literal("X".into())]);
    }

    #[test]
    fn test_trim_one_following_newline() {
        let seq = parse("A\n<% -%>\nB").unwrap();
        assert_eq!(
            seq.commands,
            vec![Command::Literal("A\n".into()), Command::Literal("B".into())]
        );
    }

    #[test]
    fn test_trim_only_first_newline() {
        let seq = parse("<% x -%>\n\nB").unwrap();
        assert_eq!(
            seq.commands,
            vec![
                Command::ControlFlow("x".into()),
                Command::Literal("\nB".into()),
            ]
        );
    }

    #[test]
    fn test_trim_crlf_as_one_terminator() {
        let seq = parse("<% x -%>\r\nB").unwrap();
        assert_eq!(
            seq.commands,
            vec![Command::ControlFlow("x".into()), Command::Literal("B".into())]
        );
    }

    #[test]
    fn test_trim_following_indentation() {
        let seq = parse("<% x _%>\t  B").unwrap();
        assert_eq!(
            seq.commands,
            vec![Command::ControlFlow("x".into()), Command::Literal("B".into())]
        );
    }

    #[test]
    fn test_trim_previous_literal_indentation() {
        let seq = parse("A  <%_ x %>B").unwrap();
        assert_eq!(
            seq.commands,
            vec![
                Command::Literal("A".into()),
                Command::ControlFlow("x".into()),
                Command::Literal("B".into()),
            ]
        );
    }

    #[test]
    fn test_trim_previous_keeps_newlines() {
        let seq = parse("A\n  <%_ x %>").unwrap();
        assert_eq!(
            seq.commands,
            vec![
                Command::Literal("A\n".into()),
                Command::ControlFlow("x".into()),
            ]
        );
    }

    #[test]
    fn test_malformed_file_directive() {
        let err = parse("<%- unknown(\"x\") %>").unwrap_err();
        assert!(matches!(err, WeftError::Directive { line: 1, .. }));
    }

    #[test]
    fn test_include_splices_commands() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "part.weft", "inner <%= ctx[\"n\"] %>");
        let main = write(dir.path(), "main.weft", "A<%- include(\"part\") %>B");

        let text = std::fs::read_to_string(&main).unwrap();
        let seq = resolve(&text, &main, &Delimiters::default()).unwrap();
        assert_eq!(
            seq.commands,
            vec![
                Command::Literal("A".into()),
                Command::Literal("inner ".into()),
                Command::Output("ctx[\"n\"]".into()),
                Command::Literal("B".into()),
            ]
        );
    }

    #[test]
    fn test_include_exact_path_without_retry() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "part.txt", "P");
        let main = write(dir.path(), "main.weft", "<%- include(\"part.txt\") %>");

        let text = std::fs::read_to_string(&main).unwrap();
        let seq = resolve(&text, &main, &Delimiters::default()).unwrap();
        assert_eq!(seq.commands, vec![Command::Literal("P".into())]);
    }

    #[test]
    fn test_include_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(dir.path(), "main.weft", "<%- include(\"absent\") %>");

        let text = std::fs::read_to_string(&main).unwrap();
        let err = resolve(&text, &main, &Delimiters::default()).unwrap_err();
        assert!(matches!(err, WeftError::MissingFile { line: 1, .. }));
    }

    #[test]
    fn test_include_self_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(dir.path(), "loop.weft", "<%- include(\"loop\") %>");

        let text = std::fs::read_to_string(&main).unwrap();
        let err = resolve(&text, &main, &Delimiters::default()).unwrap_err();
        assert!(matches!(err, WeftError::IncludeCycle { .. }));
    }

    #[test]
    fn test_include_transitive_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.weft", "<%- include(\"b\") %>");
        write(dir.path(), "b.weft", "<%- include(\"c\") %>");
        write(dir.path(), "c.weft", "<%- include(\"a\") %>");

        let text = std::fs::read_to_string(&a).unwrap();
        let err = resolve(&text, &a, &Delimiters::default()).unwrap_err();
        match err {
            WeftError::IncludeCycle { path, .. } => {
                assert!(path.ends_with("c.weft"));
            }
            other => panic!("expected IncludeCycle, got {other:?}"),
        }
    }

    #[test]
    fn test_sibling_includes_are_not_a_cycle() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "part.weft", "P");
        let main = write(
            dir.path(),
            "main.weft",
            "<%- include(\"part\") %><%- include(\"part\") %>",
        );

        let text = std::fs::read_to_string(&main).unwrap();
        let seq = resolve(&text, &main, &Delimiters::default()).unwrap();
        assert_eq!(
            seq.commands,
            vec![Command::Literal("P".into()), Command::Literal("P".into())]
        );
    }

    #[test]
    fn test_nested_include_error_keeps_inner_location() {
        let dir = tempfile::tempdir().unwrap();
        let outer = write(dir.path(), "outer.weft", "<%- include(\"inner\") %>");
        write(dir.path(), "inner.weft", "\n<%- include(\"gone\") %>");

        let text = std::fs::read_to_string(&outer).unwrap();
        let err = resolve(&text, &outer, &Delimiters::default()).unwrap_err();
        match err {
            WeftError::MissingFile { path, line, .. } => {
                assert!(path.ends_with("inner.weft"));
                assert_eq!(line, 2);
            }
            other => panic!("expected MissingFile, got {other:?}"),
        }
    }

    #[test]
    fn test_import_collected_not_recursed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "helpers.rs", "fn helper() {}");
        let main = write(dir.path(), "main.weft", "<%- import(\"helpers\") %>X");

        let text = std::fs::read_to_string(&main).unwrap();
        let seq = resolve(&text, &main, &Delimiters::default()).unwrap();
        assert_eq!(seq.commands.len(), 2);
        assert!(matches!(&seq.commands[0], Command::Import(p) if p.ends_with("helpers.rs")));
        assert_eq!(seq.commands[1], Command::Literal("X".into()));
        assert_eq!(seq.imports().len(), 1);
    }

    #[test]
    fn test_import_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let main = write(dir.path(), "main.weft", "<%- import(\"absent\") %>");

        let text = std::fs::read_to_string(&main).unwrap();
        let err = resolve(&text, &main, &Delimiters::default()).unwrap_err();
        assert!(matches!(err, WeftError::MissingFile { .. }));
    }

    #[test]
    fn test_quoted_argument_shapes() {
        assert_eq!(quoted_argument("include(\"a.weft\")", "include"), Some("a.weft"));
        assert_eq!(quoted_argument("include( \"a\" )", "include"), Some("a"));
        assert_eq!(quoted_argument("include(a)", "include"), None);
        assert_eq!(quoted_argument("include(\"\")", "include"), None);
        assert_eq!(quoted_argument("import(\"x\")", "include"), None);
    }
}
