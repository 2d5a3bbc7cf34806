//! The normalization passes that run between the scanner and the parser.
//!
//! The scanner leaves a stream that still reads like the source: calls
//! without argument parentheses, object literals without braces, one-line
//! blocks without INDENT/OUTDENT. Each pass here splices or retags tokens
//! in place until the stream looks fully bracketed and fully blocked, so
//! the grammar never has to know those shorthands existed. Order matters:
//!
//! 1. leading terminators dropped
//! 2. `CALL_START`/`INDEX_START` get matching `CALL_END`/`INDEX_END`
//! 3. one-line blocks wrapped in a generated INDENT/OUTDENT pair
//! 4. trailing `if`/`unless` retagged `POST_IF`
//! 5. implicit calls and implicit braces made explicit
//! 6. a `,` planted between a literal argument and a callback arrow
//!
//! Every synthesized token carries `generated` and an `origin` pointing at
//! the real token that caused it; passes only splice and retag, they never
//! reorder, so bracket pairing survives each step.

use latte_syntax::SyntaxKind::{self, *};
use latte_syntax::{token_set, Loc, SyntaxError, Token, TokenSet};

mod implicit;

/// Openers that begin a nested region `detect_end` must skip over.
pub const EXPRESSION_START: TokenSet = token_set![
    L_PAREN,
    L_BRACK,
    L_CURLY,
    INDENT,
    CALL_START,
    PARAM_START,
    INDEX_START,
    STRING_START,
    INTERPOLATION_START,
    REGEX_START,
];

/// Closers for [`EXPRESSION_START`], index for index.
pub const EXPRESSION_END: TokenSet = token_set![
    R_PAREN,
    R_BRACK,
    R_CURLY,
    OUTDENT,
    CALL_END,
    PARAM_END,
    INDEX_END,
    STRING_END,
    INTERPOLATION_END,
    REGEX_END,
];

/// Tags that can close a single-line block.
const SINGLE_CLOSERS: TokenSet =
    token_set![TERMINATOR, CATCH, FINALLY, ELSE, OUTDENT, LEADING_WHEN];

/// Tags that may head a one-line block when no INDENT follows them.
const SINGLE_LINERS: TokenSet = token_set![ELSE, ARROW, FAT_ARROW, TRY, FINALLY, THEN];

/// Tokens a TERMINATOR is redundant in front of.
const EXPRESSION_CLOSE: TokenSet = token_set![CATCH, THEN, FINALLY, ELSE].union(EXPRESSION_END);

/// Method-chain punctuation that may continue a call onto the next line.
const CALL_CLOSERS: TokenSet = token_set![DOT, QDOT];

/// Literal arguments that a callback arrow can follow without a comma.
const PRIMITIVE_ARG: TokenSet =
    token_set![NUMBER, STRING, STRING_END, REGEX, REGEX_END, BOOL, NULL, UNDEFINED];

/// A dialect hook run after the built-in pipeline, under the same contract:
/// splice and retag only, keep openers and closers paired.
pub trait RewritePass {
    fn name(&self) -> &str;
    fn run(&self, tokens: &mut Vec<Token>) -> Result<(), SyntaxError>;
}

/// Runs the full normalization pipeline over `tokens` in place.
pub fn rewrite(tokens: &mut Vec<Token>) -> Result<(), SyntaxError> {
    rewrite_with(tokens, &[])
}

/// [`rewrite`], then each `extra` pass in order.
pub fn rewrite_with(tokens: &mut Vec<Token>, extra: &[&dyn RewritePass]) -> Result<(), SyntaxError> {
    let mut rewriter = Rewriter { tokens: &mut *tokens };
    rewriter.remove_leading_terminators();
    rewriter.close_open_calls();
    rewriter.close_open_indexes();
    rewriter.normalize_lines();
    rewriter.tag_postfix_conditionals();
    rewriter.add_implicit_braces_and_parens();
    rewriter.insert_callback_commas();
    debug_assert!(rewriter.balanced(), "rewrite broke bracket pairing");
    for pass in extra {
        log::debug!("extra pass {} over {} tokens", pass.name(), tokens.len());
        pass.run(tokens)?;
    }
    Ok(())
}

/// Where a [`Rewriter::detect_end`] scan stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanEnd {
    /// The condition held at depth zero at this index.
    Found(usize),
    /// A closer dropped below depth zero at this index.
    Unmatched(usize),
    /// The stream ran out; holds one past the last index.
    Eof(usize),
}

pub(crate) struct Rewriter<'t> {
    pub(crate) tokens: &'t mut Vec<Token>,
}

impl<'t> Rewriter<'t> {
    pub(crate) fn kind_at(&self, i: usize) -> Option<SyntaxKind> {
        self.tokens.get(i).map(|t| t.kind)
    }

    /// The location a token generated at `i` should be seated at.
    pub(crate) fn origin_at(&self, i: usize) -> Loc {
        self.tokens
            .get(i)
            .or_else(|| self.tokens.last())
            .map(|t| t.loc)
            .unwrap_or_default()
    }

    /// Walks forward from `i` over balanced bracket regions until
    /// `condition` holds at depth zero, a closer dips below depth zero,
    /// or the stream ends. The condition is consulted before the depth
    /// update, so a closer at depth zero can itself satisfy it.
    pub(crate) fn detect_end<C>(&self, mut i: usize, condition: C) -> ScanEnd
    where
        C: Fn(&Token, usize) -> bool,
    {
        let mut levels = 0u32;
        while i < self.tokens.len() {
            let token = &self.tokens[i];
            if levels == 0 && condition(token, i) {
                return ScanEnd::Found(i);
            }
            if EXPRESSION_START.contains(token.kind) {
                levels += 1;
            } else if EXPRESSION_END.contains(token.kind) {
                if levels == 0 {
                    return ScanEnd::Unmatched(i);
                }
                levels -= 1;
            }
            i += 1;
        }
        ScanEnd::Eof(self.tokens.len())
    }

    pub(crate) fn remove_leading_terminators(&mut self) {
        log::debug!("leading terminator pass over {} tokens", self.tokens.len());
        let lead = self.tokens.iter().take_while(|t| t.is(TERMINATOR)).count();
        if lead > 0 {
            self.tokens.drain(..lead);
        }
    }

    /// Retags the `)` matching every `CALL_START` to `CALL_END`, however
    /// deep the argument list nests.
    pub(crate) fn close_open_calls(&mut self) {
        log::debug!("call closing pass over {} tokens", self.tokens.len());
        let mut i = 0;
        while i < self.tokens.len() {
            if self.tokens[i].is(CALL_START) {
                match self.detect_end(i + 1, |t, _| matches!(t.kind, R_PAREN | CALL_END)) {
                    ScanEnd::Found(end) | ScanEnd::Unmatched(end) => {
                        self.tokens[end].kind = CALL_END;
                    }
                    ScanEnd::Eof(_) => {}
                }
            }
            i += 1;
        }
    }

    /// Same for `INDEX_START` and `INDEX_END`, except that a `]` directly
    /// followed by `:` was really a computed object key, so both ends of
    /// that pair revert to plain brackets.
    pub(crate) fn close_open_indexes(&mut self) {
        log::debug!("index closing pass over {} tokens", self.tokens.len());
        let mut i = 0;
        while i < self.tokens.len() {
            if self.tokens[i].is(INDEX_START) {
                match self.detect_end(i + 1, |t, _| matches!(t.kind, R_BRACK | INDEX_END)) {
                    ScanEnd::Found(end) | ScanEnd::Unmatched(end) => {
                        if self.kind_at(end + 1) == Some(COLON) {
                            self.tokens[i].kind = L_BRACK;
                            self.tokens[end].kind = R_BRACK;
                        } else {
                            self.tokens[end].kind = INDEX_END;
                        }
                    }
                    ScanEnd::Eof(_) => {}
                }
            }
            i += 1;
        }
    }

    /// A generated INDENT/OUTDENT pair seated at `origin`. The value
    /// matches what the scanner writes for a real two-space indent.
    fn indentation(&self, origin: Loc) -> (Token, Token) {
        (
            Token::generated(INDENT, "2", origin),
            Token::generated(OUTDENT, "2", origin),
        )
    }

    /// Gives every block a real INDENT/OUTDENT pair: bodies introduced by
    /// `then`, arrows and `else` on one line get wrapped, a `catch` with
    /// nothing after its parameter gets an empty pair, and terminators
    /// that would sit directly before a closer are dropped.
    pub(crate) fn normalize_lines(&mut self) {
        log::debug!("line normalization pass over {} tokens", self.tokens.len());
        let mut i = 0;
        while i < self.tokens.len() {
            let tag = self.tokens[i].kind;

            if tag == TERMINATOR {
                // `else` after a terminator but not after a block: the
                // previous line becomes a one-line then-branch.
                if self.kind_at(i + 1) == Some(ELSE)
                    && !(i > 0 && self.tokens[i - 1].is(OUTDENT))
                {
                    let origin = self.tokens[i].loc;
                    let (indent, outdent) = self.indentation(origin);
                    self.tokens.splice(i..i + 1, vec![indent, outdent]);
                    i += 1;
                    continue;
                }
                if self
                    .kind_at(i + 1)
                    .map_or(false, |k| EXPRESSION_CLOSE.contains(k))
                {
                    self.tokens.remove(i);
                    continue;
                }
            }

            if tag == CATCH {
                // `catch err` straight into OUTDENT/TERMINATOR/FINALLY
                // means the handler body is empty.
                let mut handled = false;
                for j in 1..=2 {
                    if matches!(
                        self.kind_at(i + j),
                        Some(OUTDENT) | Some(TERMINATOR) | Some(FINALLY)
                    ) {
                        let origin = self.tokens[i].loc;
                        let (indent, outdent) = self.indentation(origin);
                        self.tokens.splice(i + j..i + j, vec![indent, outdent]);
                        i += 2 + j;
                        handled = true;
                        break;
                    }
                }
                if handled {
                    continue;
                }
            }

            if SINGLE_LINERS.contains(tag)
                && self.kind_at(i + 1) != Some(INDENT)
                && !(tag == ELSE && self.kind_at(i + 1) == Some(IF))
            {
                let starter = tag;
                let origin = self.tokens[i].loc;
                let (mut indent, outdent) = self.indentation(origin);
                if starter == THEN {
                    indent.data_mut().from_then = true;
                }
                self.tokens.insert(i + 1, indent);

                let condition = |t: &Token, idx: usize| -> bool {
                    let closes = t.value != ";"
                        && SINGLE_CLOSERS.contains(t.kind)
                        && !(t.kind == TERMINATOR
                            && self
                                .kind_at(idx + 1)
                                .map_or(false, |k| EXPRESSION_CLOSE.contains(k)))
                        && !(t.kind == ELSE && starter != THEN)
                        && !(matches!(t.kind, CATCH | FINALLY)
                            && matches!(starter, ARROW | FAT_ARROW));
                    let chains = CALL_CLOSERS.contains(t.kind)
                        && idx > 0
                        && (self.tokens[idx - 1].newline || self.tokens[idx - 1].is(OUTDENT));
                    closes || chains
                };
                let at = match self.detect_end(i + 2, condition) {
                    ScanEnd::Found(j) | ScanEnd::Unmatched(j) => {
                        // a trailing comma belongs outside the block
                        if j > 0 && self.tokens[j - 1].is(COMMA) {
                            j - 1
                        } else {
                            j
                        }
                    }
                    ScanEnd::Eof(end) => end,
                };
                self.tokens.insert(at, outdent);
                if starter == THEN {
                    self.tokens.remove(i);
                }
                i += 1;
                continue;
            }

            i += 1;
        }
    }

    /// Retags an `if`/`unless` with no block of its own to `POST_IF`, so
    /// `action() if condition` parses as a trailing guard.
    pub(crate) fn tag_postfix_conditionals(&mut self) {
        log::debug!("postfix conditional pass over {} tokens", self.tokens.len());
        let mut i = 0;
        while i < self.tokens.len() {
            if !self.tokens[i].is(IF) {
                i += 1;
                continue;
            }
            let condition = |t: &Token, idx: usize| -> bool {
                t.kind == TERMINATOR
                    || (t.kind == INDENT
                        && !(idx > 0 && SINGLE_LINERS.contains(self.tokens[idx - 1].kind)))
            };
            let postfix = match self.detect_end(i + 1, condition) {
                ScanEnd::Found(j) | ScanEnd::Unmatched(j) => {
                    let end = &self.tokens[j];
                    // a real (or then-generated) INDENT means the `if`
                    // owns a block and stays a statement
                    end.kind != INDENT
                        || (end.generated && !end.data().map_or(false, |d| d.from_then))
                }
                ScanEnd::Eof(_) => false,
            };
            if postfix {
                self.tokens[i].kind = POST_IF;
            }
            i += 1;
        }
    }

    /// `f 100 -> tick()` passes the literal and the callback as two
    /// arguments; the comma the source left out goes in here.
    pub(crate) fn insert_callback_commas(&mut self) {
        log::debug!("callback comma pass over {} tokens", self.tokens.len());
        let mut depth = 0u32;
        let mut i = 0;
        while i < self.tokens.len() {
            match self.tokens[i].kind {
                CALL_START => depth += 1,
                CALL_END => depth = depth.saturating_sub(1),
                ARROW | FAT_ARROW if depth > 0 && i > 0 => {
                    if PRIMITIVE_ARG.contains(self.tokens[i - 1].kind) {
                        let origin = self.origin_at(i);
                        self.tokens.insert(i, Token::generated(COMMA, ",", origin));
                        i += 1;
                    }
                }
                _ => {}
            }
            i += 1;
        }
    }

    /// Every opener still has its closer, in order. Checked after the
    /// built-in pipeline in debug builds.
    fn balanced(&self) -> bool {
        let mut depth = 0i64;
        for token in self.tokens.iter() {
            if EXPRESSION_START.contains(token.kind) {
                depth += 1;
            } else if EXPRESSION_END.contains(token.kind) {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
        }
        depth == 0
    }
}
