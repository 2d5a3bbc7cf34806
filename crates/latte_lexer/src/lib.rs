//! The latte scanner.
//!
//! A hand-written single-pass lexer: at every position exactly one
//! sub-scanner claims at least one character, emitting zero or more tokens
//! into a flat stream. Indentation becomes INDENT/OUTDENT/TERMINATOR here,
//! interpolated strings re-enter the scanner through a child [`Lexer`]
//! running in balanced mode, and a handful of tags are sharpened while the
//! neighboring tokens are still in reach (call/index openers, arrow
//! parameters, the prototype shorthand).
//!
//! [`tokenize`] drives the whole front half of the pipeline: scan, then the
//! rewriter passes, unless the caller opts out.

mod identifiers;
mod numbers;
mod regexes;
mod state;
mod strings;
mod util;

#[cfg(test)]
mod tests;

use latte_syntax::SyntaxKind::*;
use latte_syntax::{token_set, Loc, SyntaxError, SyntaxKind, Token, TokenSet};

use crate::state::LexerState;
use crate::util::CharExt;

pub use latte_syntax::TokenStream;

/// Where and how to scan.
#[derive(Debug, Clone, Copy)]
pub struct LexOptions {
    /// Seat the scanner at an absolute position, so every Loc in the
    /// output refers to the enclosing file. Used by sub-scanners.
    pub line: u32,
    pub col: u32,
    pub offset: u32,
    /// Stop as soon as the bracket stack empties and report the consumed
    /// byte count; interpolation runs on this.
    pub until_balanced: bool,
    /// Run the rewriter pipeline over the scanned stream.
    pub rewrite: bool,
}

impl Default for LexOptions {
    fn default() -> LexOptions {
        LexOptions {
            line: 0,
            col: 0,
            offset: 0,
            until_balanced: false,
            rewrite: true,
        }
    }
}

/// Result of a balanced scan: the tokens and how many bytes they covered.
#[derive(Debug)]
pub struct Balanced {
    pub tokens: Vec<Token>,
    pub consumed: usize,
}

/// Scans `source` into a token stream, running the rewriter unless
/// `opts.rewrite` is off. The first error aborts.
pub fn tokenize(source: &str, opts: LexOptions) -> Result<Vec<Token>, SyntaxError> {
    let rewrite = opts.rewrite && !opts.until_balanced;
    let mut tokens = Lexer::new(source, opts).run()?.tokens;
    if rewrite {
        latte_rewriter::rewrite(&mut tokens)?;
    }
    Ok(tokens)
}

/// Scans until the bracket stack empties, reporting the consumed length.
/// The stream is returned raw; rewriting is the whole-file caller's job.
pub fn tokenize_balanced(source: &str, opts: LexOptions) -> Result<Balanced, SyntaxError> {
    let opts = LexOptions { until_balanced: true, rewrite: false, ..opts };
    Lexer::new(source, opts).run()
}

/// Tags that leave an expression hanging across a line break.
pub(crate) const UNFINISHED: TokenSet = token_set![
    DOT, QDOT, UNARY, MATH, UNARY_MATH, PLUS, MINUS, POW, SHIFT, RELATION, COMPARE, LOGIC,
    EXISTS, EXTENDS
];

/// Tags a call opener can directly follow.
pub(crate) const CALLABLE: TokenSet = token_set![
    IDENTIFIER, PROPERTY, R_PAREN, R_BRACK, CALL_END, INDEX_END, AT, THIS, SUPER
];

/// Tags an index opener can directly follow.
pub(crate) const INDEXABLE: TokenSet = CALLABLE.union(token_set![
    NUMBER, STRING, STRING_END, REGEX, REGEX_END, BOOL, NULL, UNDEFINED, R_CURLY
]);

/// Tags a slash after which is division, never a regex.
pub(crate) const NOT_REGEX: TokenSet = INDEXABLE.union(token_set![INCREMENT, DECREMENT]);

pub(crate) struct Lexer<'s> {
    src: &'s str,
    /// End of the scannable region; trailing blank space is cut off up
    /// front so it cannot fabricate an indentation level.
    end: usize,
    pos: usize,
    line: u32,
    col: u32,
    offset_base: u32,
    /// Whitespace seen since the last token on this line; moved onto the
    /// next emitted token.
    spaced: bool,
    until_balanced: bool,
    tokens: Vec<Token>,
    state: LexerState,
}

impl<'s> Lexer<'s> {
    pub(crate) fn new(src: &'s str, opts: LexOptions) -> Lexer<'s> {
        let mut pos = 0;
        if let Some(rest) = src.strip_prefix('\u{feff}') {
            pos = src.len() - rest.len();
        }
        Lexer {
            src,
            end: src.trim_end().len().max(pos),
            pos,
            line: opts.line,
            col: opts.col,
            offset_base: opts.offset,
            spaced: false,
            until_balanced: opts.until_balanced,
            tokens: Vec::new(),
            state: LexerState::default(),
        }
    }

    pub(crate) fn run(mut self) -> Result<Balanced, SyntaxError> {
        while self.pos < self.end {
            let progressed = self.identifier_token()?
                || self.comment_token()?
                || self.whitespace_token()?
                || self.line_token()?
                || self.string_token()?
                || self.number_token()?
                || self.regex_token()?
                || self.js_token()?
                || self.literal_token()?;
            if !progressed {
                let at = self.mark();
                let c = self.rest().chars().next().map(String::from).unwrap_or_default();
                return Err(self.err(format!("unexpected character '{}'", c), Loc { len: 1, ..at }));
            }
            if self.until_balanced && self.state.ends.is_empty() {
                return Ok(Balanced { tokens: self.tokens, consumed: self.pos });
            }
        }
        if let Some(end) = self.state.ends.iter().rev().find(|e| e.kind != OUTDENT) {
            let glyph = end.kind.glyph().unwrap_or_else(|| end.kind.name());
            return Err(SyntaxError::new(format!("missing {}", glyph), end.origin));
        }
        self.close_indentation()?;
        Ok(Balanced { consumed: self.pos, tokens: self.tokens })
    }

    // ---- cursor -----------------------------------------------------

    pub(crate) fn rest(&self) -> &str {
        &self.src[self.pos..self.end]
    }

    pub(crate) fn byte_at(&self, n: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + n).copied().filter(|_| self.pos + n < self.end)
    }

    /// Zero-length Loc at the cursor.
    pub(crate) fn mark(&self) -> Loc {
        Loc::new(self.line, self.col, self.offset_base + self.pos as u32, 0)
    }

    /// Loc from `start` through the cursor.
    pub(crate) fn loc_from(&self, start: Loc) -> Loc {
        Loc {
            len: self.offset_base + self.pos as u32 - start.offset,
            ..start
        }
    }

    pub(crate) fn advance(&mut self, n: usize) {
        let end = self.pos + n;
        debug_assert!(end <= self.src.len());
        for c in self.src[self.pos..end].chars() {
            if c == '\n' {
                self.line += 1;
                self.col = 0;
            } else {
                self.col += 1;
            }
        }
        self.pos = end;
    }

    // ---- token plumbing ---------------------------------------------

    pub(crate) fn push_token(&mut self, mut tok: Token) {
        tok.spaced = std::mem::take(&mut self.spaced);
        self.tokens.push(tok);
    }

    /// Emit with an explicit Loc.
    pub(crate) fn emit_at(&mut self, kind: SyntaxKind, value: impl Into<String>, loc: Loc) {
        self.push_token(Token::new(kind, value, loc));
    }

    /// Splice pre-built tokens (interpolation output) untouched.
    pub(crate) fn splice(&mut self, tokens: Vec<Token>) {
        self.tokens.extend(tokens);
    }

    pub(crate) fn prev(&self) -> Option<&Token> {
        self.tokens.last()
    }

    pub(crate) fn prev_kind(&self) -> Option<SyntaxKind> {
        self.tokens.last().map(|t| t.kind)
    }

    pub(crate) fn pending_space(&self) -> bool {
        self.spaced
    }

    pub(crate) fn err(&self, message: impl Into<String>, loc: Loc) -> SyntaxError {
        SyntaxError::new(message, loc)
    }

    // ---- whitespace and explicit joins ------------------------------

    fn whitespace_token(&mut self) -> Result<bool, SyntaxError> {
        let mut chars = self.rest().chars();
        match chars.next() {
            Some(c) if c.is_space() => {
                let n = self.rest().chars().take_while(|c| c.is_space()).count();
                self.advance(n);
                self.spaced = true;
                Ok(true)
            }
            Some(c) if c.is_line_break() => {
                // The line scanner consumes the break; remember it on the
                // token it follows.
                if let Some(prev) = self.tokens.last_mut() {
                    prev.newline = true;
                }
                Ok(false)
            }
            Some('\\') => self.backslash_token(),
            _ => Ok(false),
        }
    }

    /// `\` before a break joins lines; `\word` attaches a type annotation
    /// to the previous token. Anything else falls through to the
    /// unexpected-character error.
    fn backslash_token(&mut self) -> Result<bool, SyntaxError> {
        let at = self.mark();
        match self.byte_at(1) {
            Some(b'\n') | Some(b'\r') => {
                let joined = self.rest()[1..]
                    .chars()
                    .take_while(|c| c.is_line_break() || c.is_space())
                    .count();
                self.advance(1 + joined);
                self.spaced = true;
                Ok(true)
            }
            Some(b) if (b as char).is_id_start() || b == b'[' => {
                let mut depth = 0i32;
                let mut len = 0;
                for c in self.rest()[1..].chars() {
                    let take = match c {
                        '<' | '[' => {
                            depth += 1;
                            true
                        }
                        '>' | ']' => {
                            depth -= 1;
                            true
                        }
                        c if c.is_id_part() || c == '.' || c == '|' || c == '&' => true,
                        ',' | ' ' => depth > 0,
                        _ => false,
                    };
                    if !take || depth < 0 {
                        break;
                    }
                    len += c.len_utf8();
                }
                if len == 0 {
                    return Ok(false);
                }
                let text = self.rest()[1..1 + len].to_string();
                self.advance(1 + len);
                match self.tokens.last_mut() {
                    Some(prev) => {
                        prev.data_mut().annotation = Some(text);
                        Ok(true)
                    }
                    None => Err(self.err("stray type annotation", Loc { len: 1, ..at })),
                }
            }
            _ => Ok(false),
        }
    }

    // ---- lines and indentation --------------------------------------

    fn line_token(&mut self) -> Result<bool, SyntaxError> {
        match self.rest().chars().next() {
            Some(c) if c.is_line_break() => {}
            _ => return Ok(false),
        }
        let start = self.mark();
        let mut n = 0;
        let mut size = 0u32;
        for c in self.rest().chars() {
            match c {
                '\n' | '\r' => {
                    n += 1;
                    size = 0;
                }
                ' ' | '\t' => {
                    n += 1;
                    size += 1;
                }
                _ => break,
            }
        }
        let prev_unfinished = self.prev_kind().map_or(false, |k| UNFINISHED.contains(k));
        let continued = prev_unfinished || leading_continuer(&self.rest()[n..]);
        self.advance(n);
        self.state.clear_line_flags();

        let indent = self.state.indent;
        if continued {
            if size < indent && !prev_unfinished {
                self.outdent_to(size, true, start)?;
            }
            return Ok(true);
        }
        if size == indent {
            self.newline_token(start);
        } else if size > indent {
            if self.tokens.is_empty() {
                self.state.base_indent = size;
                self.state.indent = size;
                return Ok(true);
            }
            let diff = size - indent;
            let loc = Loc::new(self.line, 0, self.offset_base + self.pos as u32 - size, size);
            self.emit_at(INDENT, diff.to_string(), loc);
            self.state.indents.push(diff);
            self.state.push_end(OUTDENT, loc);
            self.state.indent = size;
        } else {
            if size < self.state.base_indent {
                return Err(self.err("missing indentation", Loc { len: 1, ..self.mark() }));
            }
            self.outdent_to(size, false, Loc { len: 1, ..start })?;
        }
        Ok(true)
    }

    /// Collapse the break into a single TERMINATOR, swallowing any `;`
    /// separators left at the end of the line.
    fn newline_token(&mut self, at: Loc) {
        self.drop_trailing_semicolons();
        if self.prev_kind() != Some(TERMINATOR) && !self.tokens.is_empty() {
            self.emit_at(TERMINATOR, "\n", Loc { len: 1, ..at });
        }
    }

    fn drop_trailing_semicolons(&mut self) {
        while self.tokens.last().map_or(false, |t| t.is(TERMINATOR) && t.value == ";") {
            self.tokens.pop();
        }
    }

    /// Pop indentation levels until the current width is `size`, emitting
    /// one OUTDENT per popped level. A dedent landing between levels
    /// adopts the new width.
    fn outdent_to(&mut self, size: u32, suppress: bool, at: Loc) -> Result<(), SyntaxError> {
        while self.state.indent > size && !self.state.indents.is_empty() {
            match self.state.ends.last().map(|e| e.kind) {
                Some(OUTDENT) => {
                    self.state.ends.pop();
                }
                _ => return Err(self.err("unmatched OUTDENT", at)),
            }
            let dent = match self.state.indents.pop() {
                Some(d) => d,
                None => break,
            };
            self.state.indent = self.state.indent.saturating_sub(dent);
            self.emit_at(OUTDENT, dent.to_string(), at);
        }
        self.state.indent = size;
        self.drop_trailing_semicolons();
        if !suppress && self.prev_kind() != Some(TERMINATOR) && !self.tokens.is_empty() {
            self.emit_at(TERMINATOR, "\n", at);
        }
        Ok(())
    }

    fn close_indentation(&mut self) -> Result<(), SyntaxError> {
        let at = self.mark();
        self.outdent_to(self.state.base_indent, false, at)
    }

    // ---- comments ----------------------------------------------------

    fn comment_token(&mut self) -> Result<bool, SyntaxError> {
        let r = self.rest();
        if !r.starts_with('#') {
            return Ok(false);
        }
        if r.starts_with("###") && r.as_bytes().get(3).map_or(false, |&b| b != b'#') {
            let start = self.mark();
            match r[4..].find("###") {
                Some(i) => self.advance(4 + i + 3),
                None => {
                    return Err(self.err("missing ### (unclosed block comment)", Loc { len: 3, ..start }))
                }
            }
            return Ok(true);
        }
        let n = r.chars().take_while(|c| !c.is_line_break()).map(char::len_utf8).sum();
        self.advance(n);
        Ok(true)
    }

    // ---- embedded host code -----------------------------------------

    fn js_token(&mut self) -> Result<bool, SyntaxError> {
        let r = self.rest();
        if !r.starts_with('`') {
            return Ok(false);
        }
        let start = self.mark();
        if let Some(body) = r.strip_prefix("```") {
            return match body.find("```") {
                Some(i) => {
                    let value = body[..i].to_string();
                    self.advance(3 + i + 3);
                    self.emit_at(JS, value, self.loc_from(start));
                    Ok(true)
                }
                None => Err(self.err("missing ``` (unclosed JS literal)", Loc { len: 3, ..start })),
            };
        }
        let bytes = r.as_bytes();
        let mut i = 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'`' => {
                    let value = r[1..i].replace("\\`", "`");
                    self.advance(i + 1);
                    self.emit_at(JS, value, self.loc_from(start));
                    return Ok(true);
                }
                _ => i += 1,
            }
        }
        Err(self.err("missing ` (unclosed JS literal)", Loc { len: 1, ..start }))
    }

    // ---- operators and brackets -------------------------------------

    fn literal_token(&mut self) -> Result<bool, SyntaxError> {
        let r = self.rest();
        let start = self.mark();

        if r.starts_with("::") || r.starts_with("?::") {
            return self.prototype_token(start);
        }
        if r.starts_with("->") || r.starts_with("=>") {
            let fat = r.starts_with("=>");
            let text = r[..2].to_string();
            self.tag_parameters();
            self.advance(2);
            self.emit_at(if fat { FAT_ARROW } else { ARROW }, text, self.loc_from(start));
            return Ok(true);
        }

        const MULTI: &[(&str, SyntaxKind)] = &[
            (">>>=", COMPOUND_ASSIGN),
            (">>>", SHIFT),
            ("<<=", COMPOUND_ASSIGN),
            (">>=", COMPOUND_ASSIGN),
            ("<<", SHIFT),
            (">>", SHIFT),
            ("<=", COMPARE),
            (">=", COMPARE),
            ("==", COMPARE),
            ("!=", COMPARE),
            ("**=", COMPOUND_ASSIGN),
            ("**", POW),
            ("//=", COMPOUND_ASSIGN),
            ("//", MATH),
            ("%%=", COMPOUND_ASSIGN),
            ("%%", MATH),
            ("&&=", COMPOUND_ASSIGN),
            ("||=", COMPOUND_ASSIGN),
            ("&&", LOGIC),
            ("||", LOGIC),
            ("&=", COMPOUND_ASSIGN),
            ("|=", COMPOUND_ASSIGN),
            ("^=", COMPOUND_ASSIGN),
            ("+=", COMPOUND_ASSIGN),
            ("-=", COMPOUND_ASSIGN),
            ("*=", COMPOUND_ASSIGN),
            ("/=", COMPOUND_ASSIGN),
            ("%=", COMPOUND_ASSIGN),
            ("?=", COMPOUND_ASSIGN),
            ("++", INCREMENT),
            ("--", DECREMENT),
            ("?.", QDOT),
            ("...", DOT3),
            ("..", DOT2),
        ];
        for &(text, kind) in MULTI {
            if r.starts_with(text) {
                self.advance(text.len());
                self.emit_at(kind, text, self.loc_from(start));
                return Ok(true);
            }
        }

        let c = match r.chars().next() {
            Some(c) => c,
            None => return Ok(false),
        };
        let kind = match c {
            ';' => {
                self.state.clear_clause_flags();
                TERMINATOR
            }
            '=' => EQ,
            '+' => PLUS,
            '-' => MINUS,
            '*' => match self.prev_kind() {
                Some(IMPORT) => IMPORT_ALL,
                Some(EXPORT) => EXPORT_ALL,
                _ => MATH,
            },
            '/' | '%' => MATH,
            '<' | '>' => COMPARE,
            '&' | '|' | '^' => LOGIC,
            '!' | '~' => UNARY_MATH,
            '?' => EXISTS,
            ':' => COLON,
            ',' => COMMA,
            '.' => DOT,
            '@' => AT,
            '(' | '[' | '{' => return self.open_bracket(c, start),
            ')' | ']' | '}' => return self.close_bracket(c, start),
            _ => return Ok(false),
        };
        self.advance(1);
        self.emit_at(kind, c.to_string(), self.loc_from(start));
        Ok(true)
    }

    /// `a::b` reads as `a.prototype.b`; the expansion happens here so the
    /// rest of the pipeline never sees the shorthand.
    fn prototype_token(&mut self, start: Loc) -> Result<bool, SyntaxError> {
        let soak = self.rest().starts_with('?');
        let oplen = if soak { 3 } else { 2 };
        self.advance(oplen);
        let loc = self.loc_from(start);
        self.emit_at(if soak { QDOT } else { DOT }, if soak { "?." } else { "." }, loc);
        self.push_token(Token::generated(PROPERTY, "prototype", loc));
        if self.rest().chars().next().map_or(false, |c| c.is_id_start()) {
            self.push_token(Token::generated(DOT, ".", self.mark()));
        }
        Ok(true)
    }

    fn open_bracket(&mut self, c: char, start: Loc) -> Result<bool, SyntaxError> {
        self.advance(1);
        let loc = self.loc_from(start);
        let unspaced_prev = !self.pending_space();
        let kind = match c {
            '(' => {
                self.state.push_end(R_PAREN, loc);
                if unspaced_prev && self.prev_kind().map_or(false, |k| CALLABLE.contains(k)) {
                    CALL_START
                } else {
                    L_PAREN
                }
            }
            '[' => {
                self.state.push_end(R_BRACK, loc);
                if unspaced_prev && self.prev_kind().map_or(false, |k| INDEXABLE.contains(k)) {
                    INDEX_START
                } else {
                    L_BRACK
                }
            }
            _ => {
                self.state.push_end(R_CURLY, loc);
                if self.state.seen_import && !self.state.import_specifier_list {
                    self.state.import_specifier_list = true;
                } else if self.state.seen_export && !self.state.export_specifier_list {
                    self.state.export_specifier_list = true;
                }
                L_CURLY
            }
        };
        self.emit_at(kind, c.to_string(), loc);
        Ok(true)
    }

    fn close_bracket(&mut self, c: char, start: Loc) -> Result<bool, SyntaxError> {
        self.advance(1);
        let loc = self.loc_from(start);
        let kind = match c {
            ')' => R_PAREN,
            ']' => R_BRACK,
            _ => {
                if self.state.import_specifier_list {
                    self.state.import_specifier_list = false;
                }
                if self.state.export_specifier_list {
                    self.state.export_specifier_list = false;
                }
                R_CURLY
            }
        };
        self.pair(kind, c, loc)?;
        self.emit_at(kind, c.to_string(), loc);
        Ok(true)
    }

    /// Match a closer against the expectation stack. A pending OUTDENT on
    /// top means the closer sits on a dedented continuation such as
    /// `f (x) ->\n  body\n)`; the indentation level closes first.
    fn pair(&mut self, kind: SyntaxKind, c: char, at: Loc) -> Result<(), SyntaxError> {
        loop {
            match self.state.ends.last().map(|e| e.kind) {
                Some(k) if k == kind => {
                    self.state.ends.pop();
                    return Ok(());
                }
                Some(OUTDENT) => {
                    let dent = self.state.indents.last().copied().unwrap_or(self.state.indent);
                    let target = self.state.indent.saturating_sub(dent);
                    self.outdent_to(target, true, at)?;
                }
                _ => return Err(self.err(format!("unmatched {}", c), Loc { len: 1, ..at })),
            }
        }
    }

    /// Walking back from an arrow, retag the parameter parens. The scan
    /// crosses nested pairs; an enclosing call opener keeps its role.
    fn tag_parameters(&mut self) {
        if self.prev_kind() != Some(R_PAREN) {
            return;
        }
        let last = self.tokens.len() - 1;
        self.tokens[last].kind = PARAM_END;
        let mut depth = 0u32;
        let mut i = last;
        while i > 0 {
            i -= 1;
            match self.tokens[i].kind {
                R_PAREN => depth += 1,
                L_PAREN => {
                    if depth > 0 {
                        depth -= 1;
                    } else {
                        self.tokens[i].kind = PARAM_START;
                        return;
                    }
                }
                CALL_START => {
                    if depth > 0 {
                        depth -= 1;
                    } else {
                        self.tokens[last].kind = CALL_END;
                        return;
                    }
                }
                _ => {}
            }
        }
        self.tokens[last].kind = R_PAREN;
    }
}

/// A line whose first significant text chains onto the previous one.
fn leading_continuer(rest: &str) -> bool {
    let trimmed = rest.trim_start_matches(|c: char| c == ' ' || c == '\t');
    if trimmed.starts_with(',') || trimmed.starts_with("?.") || trimmed.starts_with("::") {
        return true;
    }
    if let Some(after) = trimmed.strip_prefix('.') {
        let next = after.chars().next();
        return !matches!(next, Some('.')) && !next.map_or(false, |c| c.is_ascii_digit());
    }
    false
}
