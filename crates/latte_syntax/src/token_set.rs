use crate::SyntaxKind;

/// A bit set of `SyntaxKind`s, cheap to build in statics and to test against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSet(u128);

impl TokenSet {
    pub const EMPTY: TokenSet = TokenSet(0);

    pub const fn singleton(kind: SyntaxKind) -> TokenSet {
        TokenSet(mask(kind))
    }

    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet(self.0 | other.0)
    }

    pub const fn contains(&self, kind: SyntaxKind) -> bool {
        self.0 & mask(kind) != 0
    }
}

const fn mask(kind: SyntaxKind) -> u128 {
    1u128 << (kind as usize)
}

/// Builds a [`TokenSet`] in a const context:
/// `token_set![T![,], SyntaxKind::TERMINATOR]`.
#[macro_export]
macro_rules! token_set {
    ($($t:expr),* $(,)?) => {
        $crate::TokenSet::EMPTY$(.union($crate::TokenSet::singleton($t)))*
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyntaxKind::*;

    #[test]
    fn membership() {
        const SET: TokenSet = token_set![COMMA, TERMINATOR, OUTDENT];
        assert!(SET.contains(COMMA));
        assert!(SET.contains(OUTDENT));
        assert!(!SET.contains(INDENT));
        assert!(!TokenSet::EMPTY.contains(COMMA));
    }

    #[test]
    fn union() {
        const A: TokenSet = token_set![DOT];
        const B: TokenSet = token_set![QDOT];
        assert!(A.union(B).contains(QDOT));
        assert!(A.union(B).contains(DOT));
    }
}
