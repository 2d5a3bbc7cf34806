//! Shared vocabulary of the latte front end: the [`SyntaxKind`] tag set,
//! the [`Token`] record every stage mutates in place, source [`Loc`]ations,
//! and the [`SyntaxError`] the whole pipeline fails fast with.
//!
//! Nothing here scans or parses; this crate only pins the contract the
//! scanner, the rewriter, and the parse engine agree on.

mod error;
mod kind;
mod token;
mod token_set;

pub use error::SyntaxError;
pub use kind::SyntaxKind;
pub use token::{Loc, Token, TokenData, TokenStream};
pub use token_set::TokenSet;

/// Shorthand for a [`SyntaxKind`]: `T![,]`, `T![->]`, `T![if]`, `T!['(']`.
#[macro_export]
macro_rules! T {
    [,] => { $crate::SyntaxKind::COMMA };
    [.] => { $crate::SyntaxKind::DOT };
    [?.] => { $crate::SyntaxKind::QDOT };
    [..] => { $crate::SyntaxKind::DOT2 };
    [...] => { $crate::SyntaxKind::DOT3 };
    [:] => { $crate::SyntaxKind::COLON };
    [?] => { $crate::SyntaxKind::EXISTS };
    [=] => { $crate::SyntaxKind::EQ };
    [+] => { $crate::SyntaxKind::PLUS };
    [-] => { $crate::SyntaxKind::MINUS };
    [**] => { $crate::SyntaxKind::POW };
    [++] => { $crate::SyntaxKind::INCREMENT };
    [--] => { $crate::SyntaxKind::DECREMENT };
    [->] => { $crate::SyntaxKind::ARROW };
    [=>] => { $crate::SyntaxKind::FAT_ARROW };
    [@] => { $crate::SyntaxKind::AT };
    ['('] => { $crate::SyntaxKind::L_PAREN };
    [')'] => { $crate::SyntaxKind::R_PAREN };
    ['['] => { $crate::SyntaxKind::L_BRACK };
    [']'] => { $crate::SyntaxKind::R_BRACK };
    ['{'] => { $crate::SyntaxKind::L_CURLY };
    ['}'] => { $crate::SyntaxKind::R_CURLY };
    [if] => { $crate::SyntaxKind::IF };
    [else] => { $crate::SyntaxKind::ELSE };
    [then] => { $crate::SyntaxKind::THEN };
    [for] => { $crate::SyntaxKind::FOR };
    [own] => { $crate::SyntaxKind::OWN };
    [by] => { $crate::SyntaxKind::BY };
    [while] => { $crate::SyntaxKind::WHILE };
    [loop] => { $crate::SyntaxKind::LOOP };
    [switch] => { $crate::SyntaxKind::SWITCH };
    [when] => { $crate::SyntaxKind::WHEN };
    [return] => { $crate::SyntaxKind::RETURN };
    [throw] => { $crate::SyntaxKind::THROW };
    [class] => { $crate::SyntaxKind::CLASS };
    [extends] => { $crate::SyntaxKind::EXTENDS };
    [super] => { $crate::SyntaxKind::SUPER };
    [this] => { $crate::SyntaxKind::THIS };
    [try] => { $crate::SyntaxKind::TRY };
    [catch] => { $crate::SyntaxKind::CATCH };
    [finally] => { $crate::SyntaxKind::FINALLY };
    [import] => { $crate::SyntaxKind::IMPORT };
    [export] => { $crate::SyntaxKind::EXPORT };
    [default] => { $crate::SyntaxKind::DEFAULT };
    [as] => { $crate::SyntaxKind::AS };
    [from] => { $crate::SyntaxKind::FROM };
}

#[cfg(test)]
mod tests {
    use crate::SyntaxKind;

    #[test]
    fn shorthand_matches_kinds() {
        assert_eq!(T![,], SyntaxKind::COMMA);
        assert_eq!(T![?.], SyntaxKind::QDOT);
        assert_eq!(T![=>], SyntaxKind::FAT_ARROW);
        assert_eq!(T!['('], SyntaxKind::L_PAREN);
        assert_eq!(T![if], SyntaxKind::IF);
    }
}
