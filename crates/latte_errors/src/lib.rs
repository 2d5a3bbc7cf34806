//! Diagnostics for the latte front end.
//!
//! The pipeline itself fails fast with [`latte_syntax::SyntaxError`]; this
//! crate turns those (and any other tool-facing messages) into rendered
//! terminal output with source snippets, via codespan-reporting.

mod diagnostic;
mod emit;
mod file;

pub use diagnostic::{Diagnostic, Label, Severity};
pub use emit::{emit, emit_to_writer};
pub use file::{line_starts, FileDatabase, FileId, Files, SimpleFile};
