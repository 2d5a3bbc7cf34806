//! The tag vocabulary shared by the scanner, the rewriter, and the parser.
//!
//! A token's kind is the one field that gets rewritten in place as the
//! pipeline sharpens its guesses, e.g. `L_PAREN` → `CALL_START` or
//! `IF` → `POST_IF`. Everything that walks the stream matches on these.

/// Every token tag the front end can produce.
///
/// Word-like tags mirror the keyword that produced them; operator families
/// that share a precedence level share a tag (`MATH`, `COMPARE`, `LOGIC`,
/// `SHIFT`, `RELATION`, `UNARY`, `UNARY_MATH`) and keep the concrete
/// operator in the token's value.
#[allow(non_camel_case_types)]
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SyntaxKind {
    IDENTIFIER,
    PROPERTY,
    NUMBER,
    STRING,
    STRING_START,
    STRING_END,
    REGEX,
    REGEX_START,
    REGEX_END,
    INTERPOLATION_START,
    INTERPOLATION_END,
    JS,
    BOOL,
    NULL,
    UNDEFINED,

    INDENT,
    OUTDENT,
    TERMINATOR,

    L_PAREN,
    R_PAREN,
    L_BRACK,
    R_BRACK,
    L_CURLY,
    R_CURLY,
    CALL_START,
    CALL_END,
    PARAM_START,
    PARAM_END,
    INDEX_START,
    INDEX_END,

    DOT,
    QDOT,
    DOT2,
    DOT3,
    COMMA,
    COLON,
    EXISTS,
    EQ,
    COMPOUND_ASSIGN,
    PLUS,
    MINUS,
    MATH,
    POW,
    SHIFT,
    COMPARE,
    LOGIC,
    RELATION,
    UNARY,
    UNARY_MATH,
    INCREMENT,
    DECREMENT,
    ARROW,
    FAT_ARROW,
    AT,

    IF,
    POST_IF,
    ELSE,
    THEN,
    FOR,
    OWN,
    FOR_IN,
    FOR_OF,
    BY,
    WHILE,
    LOOP,
    SWITCH,
    WHEN,
    LEADING_WHEN,
    RETURN,
    STATEMENT,
    THROW,
    CLASS,
    EXTENDS,
    SUPER,
    THIS,
    TRY,
    CATCH,
    FINALLY,
    IMPORT,
    EXPORT,
    DEFAULT,
    AS,
    FROM,
    IMPORT_ALL,
    EXPORT_ALL,

    /// Reserved for the parse engine; the scanner never emits it.
    EOF,

    #[doc(hidden)]
    __LAST,
}

use SyntaxKind::*;

impl SyntaxKind {
    /// The canonical name, as used in grammar productions and error output.
    pub fn name(self) -> &'static str {
        match self {
            IDENTIFIER => "IDENTIFIER",
            PROPERTY => "PROPERTY",
            NUMBER => "NUMBER",
            STRING => "STRING",
            STRING_START => "STRING_START",
            STRING_END => "STRING_END",
            REGEX => "REGEX",
            REGEX_START => "REGEX_START",
            REGEX_END => "REGEX_END",
            INTERPOLATION_START => "INTERPOLATION_START",
            INTERPOLATION_END => "INTERPOLATION_END",
            JS => "JS",
            BOOL => "BOOL",
            NULL => "NULL",
            UNDEFINED => "UNDEFINED",
            INDENT => "INDENT",
            OUTDENT => "OUTDENT",
            TERMINATOR => "TERMINATOR",
            L_PAREN => "L_PAREN",
            R_PAREN => "R_PAREN",
            L_BRACK => "L_BRACK",
            R_BRACK => "R_BRACK",
            L_CURLY => "L_CURLY",
            R_CURLY => "R_CURLY",
            CALL_START => "CALL_START",
            CALL_END => "CALL_END",
            PARAM_START => "PARAM_START",
            PARAM_END => "PARAM_END",
            INDEX_START => "INDEX_START",
            INDEX_END => "INDEX_END",
            DOT => "DOT",
            QDOT => "QDOT",
            DOT2 => "DOT2",
            DOT3 => "DOT3",
            COMMA => "COMMA",
            COLON => "COLON",
            EXISTS => "EXISTS",
            EQ => "EQ",
            COMPOUND_ASSIGN => "COMPOUND_ASSIGN",
            PLUS => "PLUS",
            MINUS => "MINUS",
            MATH => "MATH",
            POW => "POW",
            SHIFT => "SHIFT",
            COMPARE => "COMPARE",
            LOGIC => "LOGIC",
            RELATION => "RELATION",
            UNARY => "UNARY",
            UNARY_MATH => "UNARY_MATH",
            INCREMENT => "INCREMENT",
            DECREMENT => "DECREMENT",
            ARROW => "ARROW",
            FAT_ARROW => "FAT_ARROW",
            AT => "AT",
            IF => "IF",
            POST_IF => "POST_IF",
            ELSE => "ELSE",
            THEN => "THEN",
            FOR => "FOR",
            OWN => "OWN",
            FOR_IN => "FOR_IN",
            FOR_OF => "FOR_OF",
            BY => "BY",
            WHILE => "WHILE",
            LOOP => "LOOP",
            SWITCH => "SWITCH",
            WHEN => "WHEN",
            LEADING_WHEN => "LEADING_WHEN",
            RETURN => "RETURN",
            STATEMENT => "STATEMENT",
            THROW => "THROW",
            CLASS => "CLASS",
            EXTENDS => "EXTENDS",
            SUPER => "SUPER",
            THIS => "THIS",
            TRY => "TRY",
            CATCH => "CATCH",
            FINALLY => "FINALLY",
            IMPORT => "IMPORT",
            EXPORT => "EXPORT",
            DEFAULT => "DEFAULT",
            AS => "AS",
            FROM => "FROM",
            IMPORT_ALL => "IMPORT_ALL",
            EXPORT_ALL => "EXPORT_ALL",
            EOF => "EOF",
            __LAST => "__LAST",
        }
    }

    /// Every real tag, in discriminant order.
    pub fn all() -> impl Iterator<Item = SyntaxKind> {
        // Safe: every discriminant below __LAST is a valid variant.
        (0..__LAST as u8).map(|i| unsafe { std::mem::transmute(i) })
    }

    /// Inverse of [`name`](Self::name), used when interning grammar symbols.
    pub fn from_name(name: &str) -> Option<SyntaxKind> {
        SyntaxKind::all().find(|kind| kind.name() == name)
    }

    /// The glyph the token usually prints as, if it has one.
    pub fn glyph(self) -> Option<&'static str> {
        Some(match self {
            L_PAREN | CALL_START | PARAM_START => "(",
            R_PAREN | CALL_END | PARAM_END => ")",
            L_BRACK | INDEX_START => "[",
            R_BRACK | INDEX_END => "]",
            L_CURLY => "{",
            R_CURLY => "}",
            DOT => ".",
            QDOT => "?.",
            DOT2 => "..",
            DOT3 => "...",
            COMMA => ",",
            COLON => ":",
            EXISTS => "?",
            EQ => "=",
            PLUS => "+",
            MINUS => "-",
            POW => "**",
            INCREMENT => "++",
            DECREMENT => "--",
            ARROW => "->",
            FAT_ARROW => "=>",
            AT => "@",
            _ => return None,
        })
    }

    /// Keyword-backed tags, i.e. tags a reserved-word scan can produce.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            IF | ELSE
                | THEN
                | FOR
                | OWN
                | FOR_IN
                | FOR_OF
                | BY
                | WHILE
                | LOOP
                | SWITCH
                | WHEN
                | LEADING_WHEN
                | RETURN
                | STATEMENT
                | THROW
                | CLASS
                | EXTENDS
                | SUPER
                | THIS
                | TRY
                | CATCH
                | FINALLY
                | IMPORT
                | EXPORT
                | DEFAULT
                | AS
                | FROM
                | BOOL
                | NULL
                | UNDEFINED
                | UNARY
                | RELATION
        )
    }

    /// What closes this opener, for every pair the stream can contain.
    pub fn closing(self) -> Option<SyntaxKind> {
        Some(match self {
            L_PAREN => R_PAREN,
            L_BRACK => R_BRACK,
            L_CURLY => R_CURLY,
            CALL_START => CALL_END,
            PARAM_START => PARAM_END,
            INDEX_START => INDEX_END,
            STRING_START => STRING_END,
            REGEX_START => REGEX_END,
            INTERPOLATION_START => INTERPOLATION_END,
            INDENT => OUTDENT,
            _ => return None,
        })
    }

    pub fn is_opener(self) -> bool {
        self.closing().is_some()
    }

    pub fn is_closer(self) -> bool {
        matches!(
            self,
            R_PAREN
                | R_BRACK
                | R_CURLY
                | CALL_END
                | PARAM_END
                | INDEX_END
                | STRING_END
                | REGEX_END
                | INTERPOLATION_END
                | OUTDENT
        )
    }

    /// Tags that separate logical lines.
    pub fn is_line_break(self) -> bool {
        matches!(self, TERMINATOR | INDENT | OUTDENT)
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.glyph() {
            Some(g) => f.write_str(g),
            None => f.write_str(self.name()),
        }
    }
}
