/// Character classes the sub-scanners agree on.
pub(crate) trait CharExt {
    fn is_id_start(self) -> bool;
    fn is_id_part(self) -> bool;
    /// Horizontal whitespace; line breaks are the line scanner's business.
    fn is_space(self) -> bool;
    fn is_line_break(self) -> bool;
}

impl CharExt for char {
    fn is_id_start(self) -> bool {
        self.is_ascii_alphabetic() || self == '_' || self == '$' || (!self.is_ascii() && self.is_alphabetic())
    }

    fn is_id_part(self) -> bool {
        self.is_id_start() || self.is_ascii_digit()
    }

    fn is_space(self) -> bool {
        self == ' ' || self == '\t'
    }

    fn is_line_break(self) -> bool {
        self == '\n' || self == '\r'
    }
}

#[cfg(test)]
mod tests {
    use super::CharExt;

    #[test]
    fn id_classes() {
        assert!('a'.is_id_start());
        assert!('$'.is_id_start());
        assert!('_'.is_id_start());
        assert!('é'.is_id_start());
        assert!(!'1'.is_id_start());
        assert!('1'.is_id_part());
        assert!(!'-'.is_id_part());
    }
}
