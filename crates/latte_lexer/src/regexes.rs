//! Regex and heregex scanning, including the slash-versus-division
//! heuristic that keys off the previous token.

use latte_syntax::SyntaxKind::{REGEX, REGEX_END, REGEX_START, STRING};
use latte_syntax::{Loc, SyntaxError, Token};

use crate::strings::Piece;
use crate::{Lexer, CALLABLE, NOT_REGEX};

impl<'s> Lexer<'s> {
    pub(crate) fn regex_token(&mut self) -> Result<bool, SyntaxError> {
        let r = self.rest();
        if !r.starts_with('/') {
            return Ok(false);
        }
        if let Some(i) = leading_star(r) {
            let at = self.mark();
            return Err(self.err(
                "regular expressions cannot begin with '*'",
                Loc { col: at.col + i as u32, offset: at.offset + i as u32, len: 1, ..at },
            ));
        }
        if r.starts_with("///") {
            return self.heregex_token();
        }
        // `//` is floor division, `//=` its compound assignment.
        if r.starts_with("//") {
            return Ok(false);
        }

        let (body_end, closed) = scan_regex_body(r.as_bytes());
        if let Some(prev) = self.prev() {
            if self.pending_space() && CALLABLE.contains(prev.kind) {
                if !closed || possibly_division(r) {
                    return Ok(false);
                }
            } else if NOT_REGEX.contains(prev.kind) {
                return Ok(false);
            }
        }
        let start = self.mark();
        if !closed {
            return Err(self.err("missing / (unclosed regex)", Loc { len: 1, ..start }));
        }
        let body = r[..body_end + 1].to_string();
        self.advance(body_end + 1);
        let flags = self.regex_flags()?;
        self.emit_at(REGEX, format!("{}{}", body, flags), self.loc_from(start));
        Ok(true)
    }

    /// `/// … ///`: whitespace and `#` comments are stripped, escapes and
    /// interpolations survive. Without interpolation the whole literal
    /// collapses back into one REGEX.
    fn heregex_token(&mut self) -> Result<bool, SyntaxError> {
        let opened = self.mark();
        self.advance(3);
        let (pieces, close) = self.scan_delimited("///", true, "unclosed heregex", opened)?;
        let flags = self.regex_flags()?;
        let interpolated = pieces.iter().any(|p| matches!(p, Piece::Interpolation(_)));

        if !interpolated {
            let mut raw = String::new();
            for piece in &pieces {
                if let Piece::Literal { raw: text, .. } = piece {
                    raw.push_str(text);
                }
            }
            let mut body = clean_heregex(&raw);
            if body.is_empty() {
                body = "(?:)".to_string();
            }
            let mut tok = Token::new(REGEX, format!("/{}/{}", body, flags), self.loc_from(opened));
            tok.data_mut().heregex = true;
            self.push_token(tok);
            return Ok(true);
        }

        let mut start = Token::new(REGEX_START, "///", Loc { len: 3, ..opened });
        start.data_mut().heregex = true;
        self.push_token(start);
        for piece in pieces {
            match piece {
                Piece::Literal { raw, loc } => {
                    let cleaned = clean_heregex(&raw);
                    if cleaned.is_empty() {
                        continue;
                    }
                    self.tokens.push(Token::new(STRING, cleaned, loc));
                }
                Piece::Interpolation(tokens) => {
                    if tokens.len() <= 2 {
                        continue;
                    }
                    self.splice(tokens);
                }
            }
        }
        let close_loc = Loc { len: close.len + flags.len() as u32, ..close };
        self.tokens.push(Token::new(REGEX_END, flags, close_loc));
        Ok(true)
    }

    /// Maximal lowercase run after the closer, validated against `gimsuy`
    /// with no repeats.
    fn regex_flags(&mut self) -> Result<String, SyntaxError> {
        let r = self.rest();
        let len = r.chars().take_while(|c| c.is_ascii_lowercase()).count();
        if len == 0 {
            return Ok(String::new());
        }
        let flags = r[..len].to_string();
        let start = self.mark();
        self.advance(len);
        let mut seen = 0u8;
        for c in flags.chars() {
            let bit = match c {
                'g' => 0,
                'i' => 1,
                'm' => 2,
                's' => 3,
                'u' => 4,
                'y' => 5,
                _ => 6,
            };
            if bit == 6 || seen & (1 << bit) != 0 {
                return Err(self.err(
                    format!("invalid regular expression flags {}", flags),
                    self.loc_from(start),
                ));
            }
            seen |= 1 << bit;
        }
        Ok(flags)
    }
}

/// `/*` (or `/// *` with blank space between) can never start a pattern.
/// Reports the star's byte offset.
fn leading_star(rest: &str) -> Option<usize> {
    if let Some(body) = rest.strip_prefix("///") {
        let skip = body.len() - body.trim_start().len();
        if body[skip..].starts_with('*') {
            return Some(3 + skip);
        }
    } else if rest[1..].starts_with('*') {
        return Some(1);
    }
    None
}

/// `/ …` or `/= …`: spaced like division, so the heuristic lets the
/// operator table have it.
fn possibly_division(rest: &str) -> bool {
    let after = match rest.strip_prefix('/') {
        Some(a) => a,
        None => return false,
    };
    let after = after.strip_prefix('=').unwrap_or(after);
    after.chars().next().map_or(false, |c| c.is_whitespace())
}

/// Walk a `/…/` body. Classes make `/` literal, escapes cover the next
/// byte, and a line break means this was never a regex.
fn scan_regex_body(bytes: &[u8]) -> (usize, bool) {
    let mut i = 1;
    let mut in_class = false;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                if matches!(bytes.get(i + 1), Some(b'\n') | Some(b'\r') | None) {
                    return (i, false);
                }
                i += 2;
            }
            b'\n' | b'\r' => return (i, false),
            b'[' => {
                in_class = true;
                i += 1;
            }
            b']' => {
                in_class = false;
                i += 1;
            }
            b'/' if !in_class => return (i, true),
            _ => i += 1,
        }
    }
    (i, false)
}

/// Collapse a heregex body to its compact form: blank runs and `#`
/// comments vanish, escaped blanks keep the blank, and bare slashes are
/// escaped so the collapsed `/…/` stays unambiguous.
pub(crate) fn clean_heregex(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(n) if n.is_whitespace() => out.push(n),
                Some(n) => {
                    out.push('\\');
                    out.push(n);
                }
                None => out.push('\\'),
            },
            '/' => out.push_str("\\/"),
            c if c.is_whitespace() => {
                while chars.peek().map_or(false, |c| c.is_whitespace()) {
                    chars.next();
                }
                if chars.peek() == Some(&'#') {
                    while chars.peek().map_or(false, |&c| c != '\n') {
                        chars.next();
                    }
                }
            }
            c => out.push(c),
        }
    }
    out
}
