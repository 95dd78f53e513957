//! The ordered intermediate representation produced by parsing a template.

use std::path::PathBuf;

/// The classified, typed form of one directive or literal span.
///
/// Commands are emitted in source order and concatenated into the generated
/// program in that order; reordering changes program semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// A source file to compile alongside the generated program.
    Import(PathBuf),
    /// An expression whose value is printed with no trailing terminator.
    Output(String),
    /// Raw code inserted verbatim into the generated program body.
    ControlFlow(String),
    /// Literal template text printed verbatim.
    Literal(String),
}

/// The full ordered IR for a template after recursive include resolution.
#[derive(Debug, Clone, Default)]
pub struct CommandSequence {
    pub commands: Vec<Command>,
}

impl CommandSequence {
    /// Import paths in source order, deduplicated on first occurrence.
    pub fn imports(&self) -> Vec<PathBuf> {
        let mut seen = Vec::new();
        for command in &self.commands {
            if let Command::Import(path) = command {
                if !seen.contains(path) {
                    seen.push(path.clone());
                }
            }
        }
        seen
    }
}
