//! Numeric literal scanning: radix forms, decimals with fractions and
//! exponents, and big-integer suffixes. Malformed shapes are rejected with
//! the offending span, not just the literal.

use latte_syntax::Loc;
use latte_syntax::SyntaxError;
use latte_syntax::SyntaxKind::NUMBER;

use crate::Lexer;

impl<'s> Lexer<'s> {
    pub(crate) fn number_token(&mut self) -> Result<bool, SyntaxError> {
        let rest = self.rest();
        let bytes = rest.as_bytes();
        let starts = match bytes.first() {
            Some(b) if b.is_ascii_digit() => true,
            Some(b'.') => bytes.get(1).map_or(false, |b| b.is_ascii_digit()),
            _ => false,
        };
        if !starts {
            return Ok(false);
        }

        let len = scan_number(bytes);
        let lexeme = rest[..len].to_string();
        let start = self.mark();

        if len >= 2 && bytes[0] == b'0' && matches!(bytes[1], b'B' | b'O' | b'X') {
            return Err(self.err(
                format!("radix prefix in '{}' must be lowercase", lexeme),
                Loc { col: start.col + 1, offset: start.offset + 1, len: 1, ..start },
            ));
        }
        if !lexeme.starts_with("0x") && !lexeme.starts_with("0X") {
            if let Some(i) = lexeme.find('E') {
                return Err(self.err(
                    format!(
                        "exponential notation in '{}' must be indicated with a lowercase 'e'",
                        lexeme
                    ),
                    Loc {
                        col: start.col + i as u32,
                        offset: start.offset + i as u32,
                        len: 1,
                        ..start
                    },
                ));
            }
        }
        let whole = Loc { len: len as u32, ..start };
        if leading_zero_decimal(lexeme.as_bytes()) {
            return Err(self.err(
                format!("decimal literal '{}' must not be prefixed with '0'", lexeme),
                whole,
            ));
        }
        if leading_zero_octal(lexeme.as_bytes()) {
            return Err(self.err(
                format!("octal literal '{}' must be prefixed with '0o'", lexeme),
                whole,
            ));
        }

        self.advance(len);
        let loc = self.loc_from(start);
        self.emit_at(NUMBER, &lexeme, loc);
        Ok(true)
    }
}

/// Length of the maximal numeric literal starting at `bytes[0]`.
fn scan_number(bytes: &[u8]) -> usize {
    if bytes[0] == b'0' {
        let radix = match bytes.get(1) {
            Some(b'b') | Some(b'B') => Some(2),
            Some(b'o') | Some(b'O') => Some(8),
            Some(b'x') | Some(b'X') => Some(16),
            _ => None,
        };
        if let Some(radix) = radix {
            let mut i = 2;
            while bytes.get(i).map_or(false, |&b| is_radix_digit(b, radix)) {
                i += 1;
            }
            if i > 2 {
                if bytes.get(i) == Some(&b'n') {
                    i += 1;
                }
                return i;
            }
            // A bare `0b` is the number zero followed by a word.
            return 1;
        }
    }

    let mut i = 0;
    while bytes.get(i).map_or(false, |b| b.is_ascii_digit()) {
        i += 1;
    }
    let int_len = i;
    if bytes.get(i) == Some(&b'.') && bytes.get(i + 1).map_or(false, |b| b.is_ascii_digit()) {
        i += 1;
        while bytes.get(i).map_or(false, |b| b.is_ascii_digit()) {
            i += 1;
        }
    }
    let has_fraction = i > int_len;

    match bytes.get(i) {
        Some(b'e') | Some(b'E') => {
            let mut j = i + 1;
            if matches!(bytes.get(j), Some(b'+') | Some(b'-')) {
                j += 1;
            }
            if bytes.get(j).map_or(false, |b| b.is_ascii_digit()) {
                while bytes.get(j).map_or(false, |b| b.is_ascii_digit()) {
                    j += 1;
                }
                j
            } else {
                i
            }
        }
        Some(b'n') if !has_fraction && int_len > 0 => i + 1,
        _ => i,
    }
}

fn is_radix_digit(b: u8, radix: u32) -> bool {
    match radix {
        2 => matches!(b, b'0' | b'1'),
        8 => (b'0'..=b'7').contains(&b),
        _ => b.is_ascii_hexdigit(),
    }
}

/// `0` followed by digits reaching an `8` or `9`.
fn leading_zero_decimal(bytes: &[u8]) -> bool {
    if bytes[0] != b'0' {
        return false;
    }
    for &b in &bytes[1..] {
        if !b.is_ascii_digit() {
            return false;
        }
        if b == b'8' || b == b'9' {
            return true;
        }
    }
    false
}

/// `0` followed by at least one more digit, which reads as legacy octal.
fn leading_zero_octal(bytes: &[u8]) -> bool {
    bytes[0] == b'0' && bytes.get(1).map_or(false, |b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use crate::{tokenize, LexOptions};
    use latte_syntax::SyntaxKind::*;

    fn raw() -> LexOptions {
        LexOptions { rewrite: false, ..Default::default() }
    }

    macro_rules! num_literal {
        ($src:expr) => {{
            let tokens = tokenize($src, raw()).unwrap();
            assert_eq!(tokens[0].kind, NUMBER, "tokens for {:?}: {:?}", $src, tokens);
            assert_eq!(tokens[0].value, $src);
            assert_eq!(tokens[0].loc.len as usize, $src.len());
        }};
    }

    macro_rules! invalid_num_literal {
        ($src:expr, $msg:expr) => {{
            let err = tokenize($src, raw()).unwrap_err();
            assert_eq!(err.message, $msg);
        }};
    }

    #[test]
    fn integers() {
        num_literal!("0");
        num_literal!("7");
        num_literal!("271894");
    }

    #[test]
    fn fractions() {
        num_literal!("1.5");
        num_literal!("0.25");
        num_literal!(".5");
    }

    #[test]
    fn exponents() {
        num_literal!("6e55");
        num_literal!("6e+7");
        num_literal!("1.5e-3");
    }

    #[test]
    fn radix_literals() {
        num_literal!("0b101");
        num_literal!("0o17");
        num_literal!("0xff");
        num_literal!("0xdeadBEEF");
    }

    #[test]
    fn bigints() {
        num_literal!("42n");
        num_literal!("0xffn");
        num_literal!("0b11n");
    }

    #[test]
    fn bigint_needs_an_integer() {
        let tokens = tokenize("1.5n", raw()).unwrap();
        assert_eq!(tokens[0].kind, NUMBER);
        assert_eq!(tokens[0].value, "1.5");
        assert_eq!(tokens[1].kind, IDENTIFIER);
        assert_eq!(tokens[1].value, "n");
    }

    #[test]
    fn uppercase_radix_prefix() {
        invalid_num_literal!("0XFF", "radix prefix in '0XFF' must be lowercase");
        let err = tokenize("0B11", raw()).unwrap_err();
        assert_eq!(err.loc.col, 1);
        assert_eq!(err.loc.len, 1);
    }

    #[test]
    fn uppercase_exponent() {
        invalid_num_literal!(
            "6E5",
            "exponential notation in '6E5' must be indicated with a lowercase 'e'"
        );
        let err = tokenize("17E2", raw()).unwrap_err();
        assert_eq!(err.loc.col, 2);
    }

    #[test]
    fn hex_digits_may_be_uppercase() {
        num_literal!("0xE1");
        num_literal!("0xAE");
    }

    #[test]
    fn leading_zero_decimal() {
        invalid_num_literal!("018", "decimal literal '018' must not be prefixed with '0'");
        invalid_num_literal!("09", "decimal literal '09' must not be prefixed with '0'");
    }

    #[test]
    fn leading_zero_octal() {
        invalid_num_literal!("017", "octal literal '017' must be prefixed with '0o'");
    }

    #[test]
    fn range_dots_stay_out() {
        let tokens = tokenize("1..5", raw()).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![NUMBER, DOT2, NUMBER, TERMINATOR]);
    }

    #[test]
    fn trailing_dot_is_access() {
        let tokens = tokenize("5.toFixed", raw()).unwrap();
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![NUMBER, DOT, PROPERTY, TERMINATOR]);
    }
}
