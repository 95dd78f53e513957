//! Core library for the weft template engine.
//!
//! weft compiles a template document into a standalone Rust program,
//! builds it with an external toolchain, caches the binary by content
//! hash, and executes it against a serialized data context to produce
//! rendered text. The pieces, leaf first:
//!
//! - [`tokenizer`] splits template text on delimiter pairs into spans;
//! - [`resolver`] classifies directives and splices includes, producing
//!   the [`command::CommandSequence`] IR;
//! - [`codegen`] renders the IR into one generated-program source;
//! - [`cache`] derives the content key and stores compiled binaries;
//! - [`builder`] materializes a workspace and drives the [`toolchain`];
//! - [`runner`] executes the binary against an encoded [`context`] blob;
//! - [`pipeline`] ties the stages into a single synchronous render call.

pub mod builder;
pub mod cache;
pub mod codegen;
pub mod command;
pub mod context;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod runner;
pub mod runtime;
pub mod template;
pub mod tokenizer;
pub mod toolchain;

pub use error::{Result, WeftError};
pub use pipeline::Pipeline;
pub use template::Template;
pub use tokenizer::Delimiters;
pub use toolchain::Toolchain;
