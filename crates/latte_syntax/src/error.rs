use crate::Loc;

/// The fail-fast error every pipeline stage returns: a message plus the
/// location of the offending text. The first one raised aborts the compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxError {
    pub message: String,
    pub loc: Loc,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, loc: Loc) -> SyntaxError {
        SyntaxError { message: message.into(), loc }
    }

    /// 1-based line of the first offending character.
    pub fn line(&self) -> u32 {
        self.loc.line + 1
    }

    /// 1-based column of the first offending character.
    pub fn first_column(&self) -> u32 {
        self.loc.col + 1
    }

    /// 1-based column of the last offending character.
    pub fn last_column(&self) -> u32 {
        self.loc.col + self.loc.len.max(1)
    }
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} on line {}, column {}",
            self.message,
            self.line(),
            self.first_column()
        )
    }
}

impl std::error::Error for SyntaxError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_one_based() {
        let err = SyntaxError::new("unexpected character '~'", Loc::new(1, 3, 10, 1));
        assert_eq!(err.line(), 2);
        assert_eq!(err.first_column(), 4);
        assert_eq!(err.last_column(), 4);
        assert_eq!(err.to_string(), "unexpected character '~' on line 2, column 4");
    }
}
