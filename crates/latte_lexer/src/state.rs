//! Mutable scanner state beyond the cursor itself: the indentation stack,
//! the stack of expected closers, and the contextual mode flags that make
//! a handful of words mean different things mid-clause.

use latte_syntax::{Loc, SyntaxKind};

/// An opener the scanner still owes a closer for. `kind` is the closing
/// tag as it will appear in the stream (OUTDENT for indentation levels).
#[derive(Debug, Clone, Copy)]
pub(crate) struct BracketEnd {
    pub kind: SyntaxKind,
    pub origin: Loc,
}

#[derive(Debug, Default)]
pub(crate) struct LexerState {
    /// Current total indentation width.
    pub indent: u32,
    /// Width delta of each open indentation level.
    pub indents: Vec<u32>,
    /// Indentation of the first code line; dedenting below it is an error.
    pub base_indent: u32,
    /// Expected closers, innermost last.
    pub ends: Vec<BracketEnd>,
    /// Inside a `for` clause, awaiting `own`/`in`/`of`.
    pub seen_for: bool,
    /// Inside an `import` / `export` clause.
    pub seen_import: bool,
    pub seen_export: bool,
    /// Inside the braces of an import/export specifier list, where
    /// keywords revert to plain identifiers.
    pub import_specifier_list: bool,
    pub export_specifier_list: bool,
}

impl LexerState {
    pub fn push_end(&mut self, kind: SyntaxKind, origin: Loc) {
        log::trace!("ends push {:?} at {}:{}", kind, origin.line, origin.col);
        self.ends.push(BracketEnd { kind, origin });
    }

    pub fn in_specifier_list(&self) -> bool {
        self.import_specifier_list || self.export_specifier_list
    }

    /// `;` and end-of-line reset the clause-scoped flags.
    pub fn clear_clause_flags(&mut self) {
        if self.seen_for || self.seen_import || self.seen_export {
            log::trace!("clause flags cleared");
        }
        self.seen_for = false;
        self.seen_import = false;
        self.seen_export = false;
        self.import_specifier_list = false;
        self.export_specifier_list = false;
    }

    /// A newline clears the `for` clause; import/export clauses survive
    /// line breaks only while their specifier list is still open.
    pub fn clear_line_flags(&mut self) {
        self.seen_for = false;
        if !self.in_specifier_list() {
            self.seen_import = false;
            self.seen_export = false;
        }
    }
}
