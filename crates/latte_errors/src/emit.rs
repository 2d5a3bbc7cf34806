//! Terminal rendering through codespan-reporting.

use codespan_reporting::diagnostic as cs;
use codespan_reporting::files::{Error, Files as CsFiles};
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream, WriteColor};

use crate::diagnostic::{Diagnostic, Severity};
use crate::file::{FileId, Files};

struct Adapter<'a, F: Files + ?Sized>(&'a F);

impl<'a, F: Files + ?Sized> CsFiles<'a> for Adapter<'a, F> {
    type FileId = FileId;
    type Name = &'a str;
    type Source = &'a str;

    fn name(&'a self, id: FileId) -> Result<&'a str, Error> {
        self.0.name(id).ok_or(Error::FileMissing)
    }

    fn source(&'a self, id: FileId) -> Result<&'a str, Error> {
        self.0.source(id).ok_or(Error::FileMissing)
    }

    fn line_index(&'a self, id: FileId, byte_index: usize) -> Result<usize, Error> {
        self.0.line_index(id, byte_index).ok_or(Error::FileMissing)
    }

    fn line_range(&'a self, id: FileId, line_index: usize) -> Result<std::ops::Range<usize>, Error> {
        self.0.line_range(id, line_index).ok_or(Error::FileMissing)
    }
}

fn severity(severity: Severity) -> cs::Severity {
    match severity {
        Severity::Error => cs::Severity::Error,
        Severity::Warning => cs::Severity::Warning,
        Severity::Note => cs::Severity::Note,
        Severity::Help => cs::Severity::Help,
    }
}

fn to_codespan(d: &Diagnostic) -> cs::Diagnostic<FileId> {
    let mut labels = vec![];
    if let Some(p) = &d.primary {
        labels.push(cs::Label::primary(d.file_id, p.range.clone()).with_message(&p.message));
    }
    for child in &d.children {
        labels.push(cs::Label::secondary(d.file_id, child.range.clone()).with_message(&child.message));
    }
    let mut out = cs::Diagnostic::new(severity(d.severity))
        .with_message(&d.title)
        .with_labels(labels)
        .with_notes(d.notes.clone());
    if let Some(code) = &d.code {
        out = out.with_code(code);
    }
    out
}

/// Renders `diagnostic` to the given writer.
pub fn emit_to_writer(
    writer: &mut dyn WriteColor,
    files: &dyn Files,
    diagnostic: &Diagnostic,
) -> Result<(), Error> {
    let config = term::Config::default();
    term::emit(writer, &config, &Adapter(files), &to_codespan(diagnostic))
}

/// Renders `diagnostic` to stderr, colored when stderr is a terminal.
pub fn emit(files: &dyn Files, diagnostic: &Diagnostic) -> Result<(), Error> {
    let writer = StandardStream::stderr(ColorChoice::Auto);
    let mut lock = writer.lock();
    emit_to_writer(&mut lock, files, diagnostic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::SimpleFile;
    use codespan_reporting::term::termcolor::Buffer;
    use latte_syntax::{Loc, SyntaxError};

    #[test]
    fn renders_message_and_position() {
        let file = SimpleFile::new("demo.latte", "foo(\n");
        let err = SyntaxError::new("missing )", Loc::new(0, 3, 3, 1));
        let d = Diagnostic::from_syntax_error(0, &err);
        let mut buf = Buffer::no_color();
        emit_to_writer(&mut buf, &file, &d).unwrap();
        let text = String::from_utf8(buf.into_inner()).unwrap();
        assert!(text.contains("missing )"), "got: {}", text);
        assert!(text.contains("demo.latte:1:4"), "got: {}", text);
    }
}
