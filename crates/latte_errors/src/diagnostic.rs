use std::ops::Range;

use latte_syntax::SyntaxError;

use crate::file::FileId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
    Help,
}

/// A labelled span inside a diagnostic.
#[derive(Debug, Clone)]
pub struct Label {
    pub severity: Severity,
    pub message: String,
    pub range: Range<usize>,
}

/// A renderable diagnostic: title, labelled spans, and free-standing notes.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub file_id: FileId,
    pub severity: Severity,
    pub code: Option<String>,
    pub title: String,
    pub primary: Option<Label>,
    pub children: Vec<Label>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(
        file_id: FileId,
        severity: Severity,
        code: impl Into<String>,
        title: impl Into<String>,
    ) -> Diagnostic {
        Diagnostic {
            file_id,
            severity,
            code: Some(code.into()),
            title: title.into(),
            primary: None,
            children: vec![],
            notes: vec![],
        }
    }

    pub fn error(file_id: FileId, code: impl Into<String>, title: impl Into<String>) -> Diagnostic {
        Diagnostic::new(file_id, Severity::Error, code, title)
    }

    pub fn warning(
        file_id: FileId,
        code: impl Into<String>,
        title: impl Into<String>,
    ) -> Diagnostic {
        Diagnostic::new(file_id, Severity::Warning, code, title)
    }

    /// The span the diagnostic is about.
    pub fn primary(mut self, range: Range<usize>, message: impl Into<String>) -> Diagnostic {
        self.primary = Some(Label {
            severity: self.severity,
            message: message.into(),
            range,
        });
        self
    }

    /// An additional related span.
    pub fn secondary(mut self, range: Range<usize>, message: impl Into<String>) -> Diagnostic {
        self.children.push(Label {
            severity: Severity::Note,
            message: message.into(),
            range,
        });
        self
    }

    pub fn note(mut self, message: impl Into<String>) -> Diagnostic {
        self.notes.push(message.into());
        self
    }

    /// Maps a pipeline error onto a renderable diagnostic.
    pub fn from_syntax_error(file_id: FileId, err: &SyntaxError) -> Diagnostic {
        let mut range = err.loc.span();
        if range.is_empty() {
            range.end = range.start + 1;
        }
        Diagnostic::error(file_id, "syntax", err.message.clone()).primary(range, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use latte_syntax::Loc;

    #[test]
    fn syntax_error_conversion_keeps_span() {
        let err = SyntaxError::new("missing )", Loc::new(0, 4, 4, 1));
        let d = Diagnostic::from_syntax_error(0, &err);
        assert_eq!(d.title, "missing )");
        assert_eq!(d.primary.as_ref().map(|p| p.range.clone()), Some(4..5));
        assert_eq!(d.code.as_deref(), Some("syntax"));
    }

    #[test]
    fn zero_length_spans_are_widened() {
        let err = SyntaxError::new("unexpected end of input", Loc::new(3, 0, 17, 0));
        let d = Diagnostic::from_syntax_error(0, &err);
        assert_eq!(d.primary.map(|p| p.range), Some(17..18));
    }
}
