//! Identifier and keyword scanning.
//!
//! A word is read in one maximal run, then classified: property position
//! wins over every keyword meaning, then come reserved words, keywords,
//! aliases, and the contextual import/export vocabulary. A trailing `!` or
//! `?` belongs to the word (as an annotation flag) unless the next
//! character turns it into an operator.

use std::collections::{HashMap, HashSet};

use latte_syntax::SyntaxKind::{self, *};
use latte_syntax::Token;
use once_cell::sync::Lazy;

use crate::util::CharExt;
use crate::Lexer;
use latte_syntax::SyntaxError;

/// Host-language words that cannot name anything in latte source.
static RESERVED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    vec![
        "function",
        "var",
        "let",
        "const",
        "enum",
        "case",
        "with",
        "native",
        "implements",
        "interface",
        "package",
        "private",
        "protected",
        "public",
        "static",
    ]
    .into_iter()
    .collect()
});

/// Words that carry a tag of their own.
static KEYWORDS: Lazy<HashMap<&'static str, SyntaxKind>> = Lazy::new(|| {
    vec![
        ("if", IF),
        ("unless", IF),
        ("else", ELSE),
        ("then", THEN),
        ("for", FOR),
        ("by", BY),
        ("while", WHILE),
        ("until", WHILE),
        ("loop", LOOP),
        ("switch", SWITCH),
        ("when", WHEN),
        ("return", RETURN),
        ("break", STATEMENT),
        ("continue", STATEMENT),
        ("debugger", STATEMENT),
        ("throw", THROW),
        ("class", CLASS),
        ("extends", EXTENDS),
        ("super", SUPER),
        ("this", THIS),
        ("try", TRY),
        ("catch", CATCH),
        ("finally", FINALLY),
        ("import", IMPORT),
        ("export", EXPORT),
        ("new", UNARY),
        ("typeof", UNARY),
        ("delete", UNARY),
        ("do", UNARY),
        ("in", RELATION),
        ("of", RELATION),
        ("instanceof", RELATION),
        ("true", BOOL),
        ("false", BOOL),
        ("null", NULL),
        ("undefined", UNDEFINED),
    ]
    .into_iter()
    .collect()
});

/// Words rewritten to a canonical operator; the spelling as written stays
/// in the token data for diagnostics.
static ALIASES: Lazy<HashMap<&'static str, (SyntaxKind, &'static str)>> = Lazy::new(|| {
    vec![
        ("and", (LOGIC, "&&")),
        ("or", (LOGIC, "||")),
        ("is", (COMPARE, "==")),
        ("isnt", (COMPARE, "!=")),
        ("not", (UNARY_MATH, "!")),
        ("yes", (BOOL, "true")),
        ("on", (BOOL, "true")),
        ("no", (BOOL, "false")),
        ("off", (BOOL, "false")),
    ]
    .into_iter()
    .collect()
});

impl<'s> Lexer<'s> {
    pub(crate) fn identifier_token(&mut self) -> Result<bool, SyntaxError> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(c) if c.is_id_start() => {}
            _ => return Ok(false),
        }
        let len: usize = rest.chars().take_while(|c| c.is_id_part()).map(char::len_utf8).sum();
        let word = rest[..len].to_string();

        let property = matches!(self.prev_kind(), Some(DOT) | Some(QDOT))
            || (self.prev_kind() == Some(AT) && !self.pending_space());

        let keywordish = !property
            && (RESERVED.contains(word.as_str())
                || KEYWORDS.contains_key(word.as_str())
                || ALIASES.contains_key(word.as_str())
                || word == "default"
                || (word == "own" && self.state.seen_for)
                || ((word == "as" || word == "from")
                    && (self.state.seen_import || self.state.seen_export)));

        let bytes = rest.as_bytes();
        let suffix = if keywordish {
            None
        } else {
            match bytes.get(len) {
                Some(b'!') if bytes.get(len + 1) != Some(&b'=') => Some('!'),
                Some(b'?')
                    if !matches!(bytes.get(len + 1), Some(b'.') | Some(b':') | Some(b'=')) =>
                {
                    Some('?')
                }
                _ => None,
            }
        };

        let start = self.mark();
        self.advance(len + suffix.map_or(0, |_| 1));
        let loc = self.loc_from(start);

        let mut tok = Token::new(IDENTIFIER, word.as_str(), loc);
        match suffix {
            Some('!') => tok.data_mut().exclaim = true,
            Some('?') => tok.data_mut().question = true,
            _ => {}
        }

        if property {
            tok.kind = PROPERTY;
            self.push_token(tok);
            return Ok(true);
        }

        // Contextual vocabulary of an open import/export clause.
        if self.state.seen_import || self.state.seen_export {
            match word.as_str() {
                "as" => {
                    tok.kind = AS;
                    self.push_token(tok);
                    return Ok(true);
                }
                "from" => {
                    tok.kind = FROM;
                    self.push_token(tok);
                    return Ok(true);
                }
                _ => {}
            }
        }
        if word == "own" && self.state.seen_for {
            tok.kind = OWN;
            self.push_token(tok);
            return Ok(true);
        }
        if word == "default" {
            // Legal directly after `export` and after `as`; a plain name
            // inside a specifier list; reserved everywhere else.
            if matches!(self.prev_kind(), Some(EXPORT) | Some(AS)) {
                tok.kind = DEFAULT;
            } else if !self.state.in_specifier_list() {
                return Err(self.err("reserved word 'default'", loc));
            }
            self.push_token(tok);
            return Ok(true);
        }
        if self.state.in_specifier_list() {
            // Imported and exported names may shadow any keyword.
            self.push_token(tok);
            return Ok(true);
        }
        if RESERVED.contains(word.as_str()) {
            return Err(self.err(format!("reserved word '{}'", word), loc));
        }

        if let Some(&kind) = KEYWORDS.get(word.as_str()) {
            tok.kind = kind;
            match kind {
                IF if word == "unless" => tok.data_mut().invert = true,
                WHILE if word == "until" => tok.data_mut().invert = true,
                WHEN => {
                    if self.prev_kind().map_or(true, |k| k.is_line_break()) {
                        tok.kind = LEADING_WHEN;
                    }
                }
                FOR => {
                    log::trace!("for clause opened at {}:{}", loc.line, loc.col);
                    self.state.seen_for = true;
                }
                IMPORT => self.state.seen_import = true,
                EXPORT => self.state.seen_export = true,
                RELATION if word != "instanceof" && self.state.seen_for => {
                    tok.kind = if word == "in" { FOR_IN } else { FOR_OF };
                    self.state.seen_for = false;
                }
                _ => {}
            }
            self.push_token(tok);
            return Ok(true);
        }

        if let Some(&(kind, canonical)) = ALIASES.get(word.as_str()) {
            tok.kind = kind;
            tok.value = canonical.to_string();
            tok.data_mut().original = Some(word);
            self.push_token(tok);
            return Ok(true);
        }

        self.push_token(tok);
        Ok(true)
    }
}
