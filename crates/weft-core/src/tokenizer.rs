//! Splits raw template text on delimiter pairs into directive spans.
//!
//! A span is the code between one open/close delimiter pair plus the
//! literal text that follows it up to the next open delimiter (or end of
//! input). Text before the first open delimiter becomes a leading span
//! with empty code, so downstream classification is uniform.

use std::path::Path;

use crate::error::{Result, WeftError};

/// The open/close delimiter pair recognized in template text.
#[derive(Debug, Clone)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self {
            open: "<%".into(),
            close: "%>".into(),
        }
    }
}

/// One tokenized span: directive code, the literal text after it, and the
/// 1-based line of the open delimiter (line 1 for the leading span).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSpan {
    pub code: String,
    pub literal: String,
    pub line: u32,
}

fn count_lines(s: &str) -> u32 {
    s.bytes().filter(|&b| b == b'\n').count() as u32
}

/// Tokenize template text into ordered spans.
///
/// Fails with [`WeftError::Parse`] carrying `path` and the line of the
/// offending open delimiter if it has no matching close delimiter.
pub fn tokenize(text: &str, delimiters: &Delimiters, path: &Path) -> Result<Vec<RawSpan>> {
    let open = delimiters.open.as_str();
    let close = delimiters.close.as_str();

    let mut spans = Vec::new();
    let mut line: u32 = 1;

    // Leading literal, as a span with empty code.
    let mut pos = match text.find(open) {
        Some(i) => {
            spans.push(RawSpan {
                code: String::new(),
                literal: text[..i].to_string(),
                line: 1,
            });
            line += count_lines(&text[..i]);
            i
        }
        None => {
            spans.push(RawSpan {
                code: String::new(),
                literal: text.to_string(),
                line: 1,
            });
            return Ok(spans);
        }
    };

    while pos < text.len() {
        // `pos` sits on an open delimiter.
        let open_line = line;
        let code_start = pos + open.len();
        let close_rel = text[code_start..]
            .find(close)
            .ok_or_else(|| WeftError::Parse {
                path: path.to_path_buf(),
                line: open_line,
                delimiter: open.to_string(),
            })?;
        let code = &text[code_start..code_start + close_rel];
        let after = code_start + close_rel + close.len();
        line += count_lines(&text[pos..after]);

        match text[after..].find(open) {
            Some(j) => {
                spans.push(RawSpan {
                    code: code.to_string(),
                    literal: text[after..after + j].to_string(),
                    line: open_line,
                });
                line += count_lines(&text[after..after + j]);
                pos = after + j;
            }
            None => {
                spans.push(RawSpan {
                    code: code.to_string(),
                    literal: text[after..].to_string(),
                    line: open_line,
                });
                break;
            }
        }
    }

    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tok(text: &str) -> Result<Vec<RawSpan>> {
        tokenize(text, &Delimiters::default(), &PathBuf::from("test.weft"))
    }

    #[test]
    fn test_no_directives() {
        let spans = tok("plain text").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].code, "");
        assert_eq!(spans[0].literal, "plain text");
    }

    #[test]
    fn test_empty_input() {
        let spans = tok("").unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].literal, "");
    }

    #[test]
    fn test_leading_literal_and_directive() {
        let spans = tok("A<% x %>B").unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].literal, "A");
        assert_eq!(spans[1].code, " x ");
        assert_eq!(spans[1].literal, "B");
    }

    #[test]
    fn test_adjacent_directives() {
        let spans = tok("<% a %><% b %>tail").unwrap();
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].literal, "");
        assert_eq!(spans[1].code, " a ");
        assert_eq!(spans[1].literal, "");
        assert_eq!(spans[2].code, " b ");
        assert_eq!(spans[2].literal, "tail");
    }

    #[test]
    fn test_line_numbers() {
        let spans = tok("one\ntwo\n<% a %>\n<% b %>").unwrap();
        assert_eq!(spans[1].line, 3);
        assert_eq!(spans[2].line, 4);
    }

    #[test]
    fn test_unmatched_open_delimiter() {
        let err = tok("line1\nline2 <% never closed").unwrap_err();
        match err {
            WeftError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn test_multiline_directive_line_tracking() {
        let spans = tok("<% a\nb %>x<% c %>").unwrap();
        // Second directive opens on line 2: the first spans a newline.
        assert_eq!(spans[1].line, 1);
        assert_eq!(spans[2].line, 2);
    }
}
