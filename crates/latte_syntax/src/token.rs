use crate::SyntaxKind;

/// Source position of a token: 0-based line/column of its first character
/// plus the byte range it covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Loc {
    pub line: u32,
    pub col: u32,
    pub offset: u32,
    pub len: u32,
}

impl Loc {
    pub fn new(line: u32, col: u32, offset: u32, len: u32) -> Loc {
        Loc { line, col, offset, len }
    }

    /// Byte range into the source.
    pub fn span(&self) -> std::ops::Range<usize> {
        self.offset as usize..(self.offset + self.len) as usize
    }

    /// Column just past the last character, assuming a single-line token.
    pub fn end_col(&self) -> u32 {
        self.col + self.len
    }

    /// A zero-length position immediately after this one.
    pub fn after(&self) -> Loc {
        Loc {
            line: self.line,
            col: self.end_col(),
            offset: self.offset + self.len,
            len: 0,
        }
    }
}

/// Open payload bag attached to tokens that need more than a value.
///
/// The rewriter and the parse engine treat this as opaque; individual
/// grammar actions and downstream passes pick out what they care about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TokenData {
    /// Quote style of a string token (`"`, `'`, `"""`, `'''`).
    pub quote: Option<String>,
    /// The word as written when an alias was canonicalized (`and` → `&&`).
    pub original: Option<String>,
    /// `unless`/`until` negation.
    pub invert: bool,
    /// Type annotation text captured after a `\` marker.
    pub annotation: Option<String>,
    /// Identifier suffix markers, stripped from the name.
    pub exclaim: bool,
    pub question: bool,
    /// Regex token produced from the block (`///`) form.
    pub heregex: bool,
    /// Generated INDENT planted for a `then` single-line body.
    pub from_then: bool,
}

/// One token of the mutable stream shared by all pipeline stages.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Token {
    /// The tag; the only field rewritten in place after scanning.
    pub kind: SyntaxKind,
    pub value: String,
    pub loc: Loc,
    /// Whitespace immediately preceded this token on the same line.
    pub spaced: bool,
    /// A line break immediately followed this token.
    pub newline: bool,
    /// Synthesized by the scanner or the rewriter rather than read.
    pub generated: bool,
    /// For generated tokens, where the real token that caused them sits.
    pub origin: Option<Loc>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub data: Option<Box<TokenData>>,
}

impl Token {
    pub fn new(kind: SyntaxKind, value: impl Into<String>, loc: Loc) -> Token {
        Token {
            kind,
            value: value.into(),
            loc,
            spaced: false,
            newline: false,
            generated: false,
            origin: None,
            data: None,
        }
    }

    /// A synthesized token seated at `at` with zero length.
    pub fn generated(kind: SyntaxKind, value: impl Into<String>, at: Loc) -> Token {
        let mut tok = Token::new(kind, value, Loc { len: 0, ..at });
        tok.generated = true;
        tok.origin = Some(at);
        tok
    }

    pub fn is(&self, kind: SyntaxKind) -> bool {
        self.kind == kind
    }

    pub fn data(&self) -> Option<&TokenData> {
        self.data.as_deref()
    }

    /// The payload bag, created on first touch.
    pub fn data_mut(&mut self) -> &mut TokenData {
        self.data.get_or_insert_with(Default::default)
    }
}

/// The stream every stage splices in place.
pub type TokenStream = Vec<Token>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyntaxKind::*;

    #[test]
    fn loc_span_and_after() {
        let loc = Loc::new(2, 4, 20, 3);
        assert_eq!(loc.span(), 20..23);
        assert_eq!(loc.end_col(), 7);
        let after = loc.after();
        assert_eq!((after.line, after.col, after.offset, after.len), (2, 7, 23, 0));
    }

    #[test]
    fn generated_tokens_remember_their_origin() {
        let real = Loc::new(0, 5, 5, 1);
        let tok = Token::generated(CALL_START, "(", real);
        assert!(tok.generated);
        assert_eq!(tok.loc.len, 0);
        assert_eq!(tok.origin, Some(real));
    }

    #[test]
    fn data_bag_is_lazy() {
        let mut tok = Token::new(IDENTIFIER, "x", Loc::default());
        assert!(tok.data().is_none());
        tok.data_mut().question = true;
        assert!(tok.data().map_or(false, |d| d.question));
    }
}
