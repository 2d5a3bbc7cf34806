//! String and heredoc scanning.
//!
//! A delimited body is collected into [`Piece`]s: literal spans and the
//! token runs of `#{…}` interpolations, which re-enter the scanner through
//! a child [`Lexer`] in balanced mode. The same machinery backs heregexes.

use latte_syntax::SyntaxKind::{
    INTERPOLATION_END, INTERPOLATION_START, STRING, STRING_END, STRING_START,
};
use latte_syntax::{Loc, SyntaxError, Token};

use crate::{LexOptions, Lexer};

/// One span of a delimited literal.
pub(crate) enum Piece {
    Literal { raw: String, loc: Loc },
    Interpolation(Vec<Token>),
}

impl<'s> Lexer<'s> {
    pub(crate) fn string_token(&mut self) -> Result<bool, SyntaxError> {
        let r = self.rest();
        let quote: &'static str = if r.starts_with("\"\"\"") {
            "\"\"\""
        } else if r.starts_with("'''") {
            "'''"
        } else if r.starts_with('"') {
            "\""
        } else if r.starts_with('\'') {
            "'"
        } else {
            return Ok(false);
        };
        let heredoc = quote.len() == 3;
        let interpolate = quote.as_bytes()[0] == b'"';
        let opened = self.mark();
        self.advance(quote.len());

        let (mut pieces, close) =
            self.scan_delimited(quote, interpolate, "unclosed string", opened)?;
        if heredoc {
            normalize_heredoc(&mut pieces);
        }
        self.emit_string(pieces, quote, opened, close);
        Ok(true)
    }

    /// Collect pieces until `delim` recurs unescaped. Single-quoted flavors
    /// pass `interpolate: false`, which also narrows escaping to the closer
    /// and the backslash itself; everything else is verbatim.
    pub(crate) fn scan_delimited(
        &mut self,
        delim: &'static str,
        interpolate: bool,
        what: &str,
        opened: Loc,
    ) -> Result<(Vec<Piece>, Loc), SyntaxError> {
        let mut pieces = Vec::new();
        let mut raw = String::new();
        let mut seg_start = self.mark();
        loop {
            if self.pos >= self.end {
                return Err(self.err(
                    format!("missing {} ({})", delim, what),
                    Loc { len: delim.len() as u32, ..opened },
                ));
            }
            let r = self.rest();
            if r.starts_with(delim) {
                pieces.push(Piece::Literal { raw, loc: self.loc_from(seg_start) });
                let close_start = self.mark();
                self.advance(delim.len());
                return Ok((pieces, self.loc_from(close_start)));
            }
            if interpolate && r.starts_with("#{") {
                pieces.push(Piece::Literal {
                    raw: std::mem::take(&mut raw),
                    loc: self.loc_from(seg_start),
                });
                let tokens = self.interpolation()?;
                pieces.push(Piece::Interpolation(tokens));
                seg_start = self.mark();
                continue;
            }
            let c = match r.chars().next() {
                Some(c) => c,
                None => continue,
            };
            if c == '\\' {
                let take = match r[1..].chars().next() {
                    Some(n) if interpolate || n == '\\' || delim.starts_with(n) => 1 + n.len_utf8(),
                    _ => 1,
                };
                raw.push_str(&r[..take]);
                self.advance(take);
                continue;
            }
            raw.push(c);
            self.advance(c.len_utf8());
        }
    }

    /// Scans `#{…}` through a child lexer seated at the `{`, so every Loc
    /// in the child's output is file-absolute. The outer braces come back
    /// retagged as the interpolation boundaries.
    fn interpolation(&mut self) -> Result<Vec<Token>, SyntaxError> {
        let hash = self.mark();
        self.advance(1);
        let opts = LexOptions {
            line: self.line,
            col: self.col,
            offset: self.offset_base + self.pos as u32,
            until_balanced: true,
            rewrite: false,
        };
        let balanced = Lexer::new(&self.src[self.pos..], opts).run()?;
        let mut tokens = balanced.tokens;
        debug_assert!(tokens.len() >= 2, "a balanced scan keeps both braces");
        if let Some(first) = tokens.first_mut() {
            first.kind = INTERPOLATION_START;
            first.value = "#{".into();
            first.loc = Loc { len: 2, ..hash };
        }
        if let Some(last) = tokens.last_mut() {
            last.kind = INTERPOLATION_END;
        }
        self.advance(balanced.consumed);
        Ok(tokens)
    }

    /// One STRING when nothing was interpolated, otherwise the
    /// STRING_START … STRING_END run with empty segments dropped.
    fn emit_string(&mut self, pieces: Vec<Piece>, quote: &'static str, opened: Loc, close: Loc) {
        let interpolated = pieces.iter().any(|p| matches!(p, Piece::Interpolation(_)));
        let full = Loc { len: close.offset + close.len - opened.offset, ..opened };

        if !interpolated {
            let mut value = String::new();
            for piece in &pieces {
                if let Piece::Literal { raw, .. } = piece {
                    value.push_str(raw);
                }
            }
            let mut tok = Token::new(STRING, value, full);
            tok.data_mut().quote = Some(quote.to_string());
            self.push_token(tok);
            return;
        }

        let mut start = Token::new(STRING_START, quote, Loc { len: quote.len() as u32, ..opened });
        start.data_mut().quote = Some(quote.to_string());
        self.push_token(start);
        let mut emitted = false;
        for piece in pieces {
            match piece {
                Piece::Literal { raw, loc } => {
                    if raw.is_empty() {
                        continue;
                    }
                    let mut tok = Token::new(STRING, raw, loc);
                    tok.data_mut().quote = Some(quote.to_string());
                    self.tokens.push(tok);
                    emitted = true;
                }
                Piece::Interpolation(tokens) => {
                    // `#{}` scans to its bare braces; nothing to splice.
                    if tokens.len() <= 2 {
                        continue;
                    }
                    self.splice(tokens);
                    emitted = true;
                }
            }
        }
        if !emitted {
            self.tokens.push(Token::new(STRING, "", Loc { len: 0, ..close }));
        }
        self.tokens.push(Token::new(STRING_END, quote, close));
    }
}

/// Strip the common indentation, one leading blank line, and the trailing
/// blank line that carries the closer's indentation.
pub(crate) fn normalize_heredoc(pieces: &mut [Piece]) {
    let indent = common_indent(pieces);
    let count = pieces.len();
    for (i, piece) in pieces.iter_mut().enumerate() {
        if let Piece::Literal { raw, .. } = piece {
            let mut text = strip_indent(raw, indent);
            if i == 0 {
                text = trim_leading_blank_line(&text);
            }
            if i == count - 1 {
                text = trim_trailing_blank_line(&text);
            }
            *raw = text;
        }
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Smallest leading blank run over the non-blank lines the literal pieces
/// start after a newline. Interpolations are invisible here, as is the
/// text before the first break.
fn common_indent(pieces: &[Piece]) -> usize {
    let mut doc = String::new();
    for piece in pieces {
        if let Piece::Literal { raw, .. } = piece {
            doc.push_str(raw);
        }
    }
    let mut min: Option<usize> = None;
    for line in doc.split('\n').skip(1) {
        let blanks = line.len() - line.trim_start_matches(is_blank).len();
        if blanks == line.len() {
            continue;
        }
        if min.map_or(true, |m| blanks < m) {
            min = Some(blanks);
        }
    }
    min.unwrap_or(0)
}

/// Remove up to `indent` leading blanks from every line starting inside
/// this piece.
fn strip_indent(raw: &str, indent: usize) -> String {
    if indent == 0 || !raw.contains('\n') {
        return raw.to_string();
    }
    let mut out = String::with_capacity(raw.len());
    for (i, line) in raw.split('\n').enumerate() {
        if i > 0 {
            out.push('\n');
            let blanks = line.len() - line.trim_start_matches(is_blank).len();
            out.push_str(&line[blanks.min(indent)..]);
        } else {
            out.push_str(line);
        }
    }
    out
}

fn trim_leading_blank_line(text: &str) -> String {
    let blanks = text.len() - text.trim_start_matches(|c| is_blank(c) || c == '\r').len();
    match text[blanks..].strip_prefix('\n') {
        Some(rest) => rest.to_string(),
        None => text.to_string(),
    }
}

fn trim_trailing_blank_line(text: &str) -> String {
    let trimmed = text.trim_end_matches(|c| is_blank(c) || c == '\r');
    match trimmed.strip_suffix('\n') {
        Some(rest) => rest.to_string(),
        None => text.to_string(),
    }
}
