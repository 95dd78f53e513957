//! A template document: a source path plus its raw text.

use std::path::{Path, PathBuf};

use crate::command::CommandSequence;
use crate::error::Result;
use crate::resolver;
use crate::tokenizer::Delimiters;

/// An immutable template read from disk (or supplied in memory).
#[derive(Debug, Clone)]
pub struct Template {
    pub path: PathBuf,
    pub text: String,
}

impl Template {
    /// Read a template from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
        })
    }

    /// Wrap already-loaded text; `path` is used for error locations and
    /// as the base for include/import resolution.
    pub fn from_text(path: &Path, text: impl Into<String>) -> Self {
        Self {
            path: path.to_path_buf(),
            text: text.into(),
        }
    }

    /// Parse into the full command sequence, resolving includes recursively.
    pub fn parse(&self, delimiters: &Delimiters) -> Result<CommandSequence> {
        resolver::resolve(&self.text, &self.path, delimiters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    #[test]
    fn test_load_and_parse() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.weft");
        std::fs::write(&path, "hi <%= ctx[\"who\"] %>").unwrap();

        let template = Template::load(&path).unwrap();
        let seq = template.parse(&Delimiters::default()).unwrap();
        assert_eq!(seq.commands[0], Command::Literal("hi ".into()));
    }

    #[test]
    fn test_load_missing() {
        assert!(Template::load(Path::new("/nonexistent/t.weft")).is_err());
    }
}
