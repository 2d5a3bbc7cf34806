//! The pass that makes implicit calls and implicit braces explicit.
//!
//! `f x, y` becomes `f(x, y)`, `a: 1` becomes `{a: 1}`, and a delimiter
//! stack tracks which structures were written by the user and which were
//! planted here, so explicit closers can flush every implicit structure
//! opened inside them.

use latte_syntax::SyntaxKind::{self, *};
use latte_syntax::{token_set, Token, TokenSet};

use crate::{Rewriter, ScanEnd, CALL_CLOSERS, EXPRESSION_END, EXPRESSION_START};

/// Tokens a call target can end with.
const IMPLICIT_FUNC: TokenSet = token_set![
    IDENTIFIER, PROPERTY, SUPER, R_PAREN, CALL_END, R_BRACK, INDEX_END, AT, THIS
];

/// Tokens that can begin an implicit call argument.
const IMPLICIT_CALL: TokenSet = token_set![
    IDENTIFIER,
    PROPERTY,
    NUMBER,
    STRING,
    STRING_START,
    REGEX,
    REGEX_START,
    JS,
    THIS,
    AT,
    UNARY,
    UNARY_MATH,
    INCREMENT,
    DECREMENT,
    CLASS,
    IF,
    TRY,
    SWITCH,
    THROW,
    ARROW,
    FAT_ARROW,
    L_BRACK,
    L_PAREN,
    L_CURLY,
    PARAM_START,
    BOOL,
    NULL,
    UNDEFINED,
    SUPER,
];

/// `+`/`-` head an argument only when glued to it: `f +x` calls, `f + x`
/// adds.
const IMPLICIT_UNSPACED_CALL: TokenSet = token_set![PLUS, MINUS];

/// Tokens that force implicit structures on the stack top to close.
const IMPLICIT_END: TokenSet = token_set![POST_IF, FOR, WHILE, WHEN, BY, LOOP, TERMINATOR];

/// Control keywords that may appear inside an implicit argument or value
/// without ending it.
const CONTROL_IN_IMPLICIT: TokenSet = token_set![IF, TRY, FINALLY, CATCH, CLASS, SWITCH];

/// Keywords that rule out treating an indented block as a call argument.
const OBJECT_CALL_BLOCKERS: TokenSet =
    token_set![CLASS, EXTENDS, IF, CATCH, SWITCH, LEADING_WHEN, FOR, WHILE];

/// One entry of the delimiter stack the pass runs on.
#[derive(Debug)]
enum Frame {
    /// An opener the user wrote, or an INDENT.
    Explicit { kind: SyntaxKind, index: usize },
    /// A planted `CALL_START` waiting for its `CALL_END`.
    Call,
    /// A planted `{` waiting for its `}`.
    Object {
        /// No line break seen inside yet.
        sameline: bool,
        /// The first key opened its line.
        starts_line: bool,
    },
    /// A control keyword keeping its structure open across block ends.
    Control,
}

fn is_implicit(frame: Option<&Frame>) -> bool {
    matches!(
        frame,
        Some(Frame::Call) | Some(Frame::Object { .. }) | Some(Frame::Control)
    )
}

fn is_call(frame: Option<&Frame>) -> bool {
    matches!(frame, Some(Frame::Call))
}

fn is_object(frame: Option<&Frame>) -> bool {
    matches!(frame, Some(Frame::Object { .. }))
}

fn is_control(frame: Option<&Frame>) -> bool {
    matches!(frame, Some(Frame::Control))
}

fn is_curly(frame: Option<&Frame>) -> bool {
    matches!(
        frame,
        Some(Frame::Object { .. }) | Some(Frame::Explicit { kind: L_CURLY, .. })
    )
}

impl<'t> Rewriter<'t> {
    pub(crate) fn add_implicit_braces_and_parens(&mut self) {
        log::debug!("implicit structure pass over {} tokens", self.tokens.len());
        let mut stack: Vec<Frame> = Vec::new();
        // the most recently closed explicit pair, for computed keys
        let mut last_explicit: Option<(SyntaxKind, usize)> = None;
        let mut i = 0;

        while i < self.tokens.len() {
            let tag = self.tokens[i].kind;
            let prev_tag = if i > 0 { Some(self.tokens[i - 1].kind) } else { None };
            let next_tag = self.kind_at(i + 1);

            // A control keyword inside an implicit argument or object
            // value parks on the stack so block ends inside it do not
            // close the structure it belongs to.
            if ((is_call(stack.last()) || is_object(stack.last()))
                && CONTROL_IN_IMPLICIT.contains(tag))
                || (is_object(stack.last()) && prev_tag == Some(COLON) && tag == FOR)
            {
                stack.push(Frame::Control);
                i += 1;
                continue;
            }

            if tag == INDENT && is_implicit(stack.last()) {
                // An indent ends implicit calls unless the previous token
                // says the block is itself the argument or value.
                let continues = matches!(
                    prev_tag,
                    Some(FAT_ARROW)
                        | Some(ARROW)
                        | Some(L_BRACK)
                        | Some(L_PAREN)
                        | Some(COMMA)
                        | Some(L_CURLY)
                        | Some(TRY)
                        | Some(ELSE)
                        | Some(EQ)
                );
                if !continues {
                    while is_call(stack.last())
                        || (is_object(stack.last()) && prev_tag != Some(COLON))
                    {
                        if is_call(stack.last()) {
                            self.end_implicit_call(&mut stack, i);
                        } else {
                            self.end_implicit_object(&mut stack, i);
                        }
                        i += 1;
                    }
                }
                if is_control(stack.last()) {
                    stack.pop();
                }
                stack.push(Frame::Explicit { kind: tag, index: i });
                i += 1;
                continue;
            }

            if EXPRESSION_START.contains(tag) {
                stack.push(Frame::Explicit { kind: tag, index: i });
                i += 1;
                continue;
            }

            if EXPRESSION_END.contains(tag) {
                // Explicit closers flush everything implicit above their
                // opener, then fall through: a `)` can still head an
                // implicit call of its own.
                while is_implicit(stack.last()) {
                    if is_call(stack.last()) {
                        self.end_implicit_call(&mut stack, i);
                        i += 1;
                    } else if is_object(stack.last()) {
                        self.end_implicit_object(&mut stack, i);
                        i += 1;
                    } else {
                        stack.pop();
                    }
                }
                if let Some(Frame::Explicit { kind, index }) = stack.pop() {
                    last_explicit = Some((kind, index));
                }
            }

            // f x  /  h[0] x  /  super x: a spaced argument after a
            // callable starts a call.
            if IMPLICIT_FUNC.contains(tag)
                && self.tokens.get(i + 1).map_or(false, |t| t.spaced)
            {
                let starts_arg = match next_tag {
                    Some(next) if IMPLICIT_CALL.contains(next) => true,
                    Some(next) if IMPLICIT_UNSPACED_CALL.contains(next) => {
                        !self.tokens[i + 1].newline
                            && self.tokens.get(i + 2).map_or(false, |t| !t.spaced)
                    }
                    _ => false,
                };
                if starts_arg {
                    self.start_implicit_call(&mut stack, i + 1);
                    i += 2;
                    continue;
                }
            }

            // f
            //   a: 1
            // calls f with an indented implicit object, unless a block
            // keyword owns the indent.
            if IMPLICIT_FUNC.contains(tag)
                && next_tag == Some(INDENT)
                && self.looks_objectish(i + 2)
                && !self.find_tags_backwards(i, OBJECT_CALL_BLOCKERS)
            {
                self.start_implicit_call(&mut stack, i + 1);
                stack.push(Frame::Explicit { kind: INDENT, index: i + 2 });
                i += 3;
                continue;
            }

            if tag == COLON {
                // Walk back to where the key starts.
                let s = if prev_tag.map_or(false, |k| EXPRESSION_END.contains(k)) {
                    match last_explicit {
                        Some((L_BRACK, index)) => {
                            // `@[k]:` keys on the whole member expression
                            if index > 0
                                && self.tokens[index - 1].is(AT)
                                && !self.tokens[index].spaced
                            {
                                index - 1
                            } else {
                                index
                            }
                        }
                        Some((_, index)) => index,
                        None => i.saturating_sub(1),
                    }
                } else if i >= 2 && self.tokens[i - 2].is(AT) {
                    i - 2
                } else {
                    i.saturating_sub(1)
                };
                let starts_line = s == 0
                    || self.tokens[s - 1].kind.is_line_break()
                    || self.tokens[s - 1].newline;

                // A key continuing an object that is already on the stack
                // (directly, or under the indent of its own block) does
                // not open a second one.
                let continuing = {
                    let below = stack
                        .len()
                        .checked_sub(2)
                        .map(|j| &stack[j]);
                    let on_object = is_curly(stack.last())
                        || (matches!(stack.last(), Some(Frame::Explicit { kind: INDENT, .. }))
                            && is_curly(below));
                    on_object
                        && (starts_line
                            || (s > 0 && matches!(self.tokens[s - 1].kind, COMMA | L_CURLY)))
                };
                if continuing {
                    i += 1;
                    continue;
                }
                self.start_implicit_object(&mut stack, s, starts_line);
                i += 2;
                continue;
            }

            if is_object(stack.last()) && tag.is_line_break() {
                if let Some(Frame::Object { sameline, .. }) = stack.last_mut() {
                    *sameline = false;
                }
            }

            let fresh_line = prev_tag == Some(OUTDENT) || (i > 0 && self.tokens[i - 1].newline);
            if IMPLICIT_END.contains(tag) || (CALL_CLOSERS.contains(tag) && fresh_line) {
                while is_implicit(stack.last()) {
                    let (sameline, starts_line) = match stack.last() {
                        Some(Frame::Object { sameline, starts_line, .. }) => {
                            (*sameline, *starts_line)
                        }
                        _ => (false, false),
                    };
                    if is_call(stack.last())
                        && (prev_tag != Some(COMMA)
                            || (tag == TERMINATOR && next_tag.is_none()))
                    {
                        // end of the argument list
                        self.end_implicit_call(&mut stack, i);
                        i += 1;
                    } else if is_object(stack.last())
                        && sameline
                        && tag != TERMINATOR
                        && prev_tag != Some(COLON)
                        && !(matches!(tag, POST_IF | FOR | WHILE)
                            && starts_line
                            && self.implicit_object_continues(i + 1))
                    {
                        // `k: v if c` guards the value, not the object
                        self.end_implicit_object(&mut stack, i);
                        i += 1;
                    } else if is_object(stack.last())
                        && tag == TERMINATOR
                        && prev_tag != Some(COMMA)
                        && !(starts_line && self.looks_objectish(i + 1))
                    {
                        self.end_implicit_object(&mut stack, i);
                        i += 1;
                    } else {
                        break;
                    }
                }
            }

            // A comma whose right side no longer looks like a key/value
            // pair ends the object; one sitting against an OUTDENT stays
            // inside it.
            if tag == COMMA
                && !self.looks_objectish(i + 1)
                && is_object(stack.last())
                && !matches!(self.kind_at(i + 2), Some(FOR_IN) | Some(FOR_OF))
                && !(next_tag == Some(TERMINATOR) && self.looks_objectish(i + 2))
            {
                let offset = if next_tag == Some(OUTDENT) { 1 } else { 0 };
                while is_object(stack.last()) {
                    self.end_implicit_object(&mut stack, i + offset);
                    i += 1;
                }
            }

            i += 1;
        }
    }

    fn start_implicit_call(&mut self, stack: &mut Vec<Frame>, at: usize) {
        let origin = self.origin_at(at);
        stack.push(Frame::Call);
        self.tokens
            .insert(at, Token::generated(CALL_START, "(", origin));
    }

    fn end_implicit_call(&mut self, stack: &mut Vec<Frame>, at: usize) {
        stack.pop();
        let origin = self.origin_at(at);
        self.tokens
            .insert(at, Token::generated(CALL_END, ")", origin));
    }

    fn start_implicit_object(&mut self, stack: &mut Vec<Frame>, at: usize, starts_line: bool) {
        let origin = self.origin_at(at);
        stack.push(Frame::Object { sameline: true, starts_line });
        self.tokens
            .insert(at, Token::generated(L_CURLY, "{", origin));
    }

    fn end_implicit_object(&mut self, stack: &mut Vec<Frame>, at: usize) {
        stack.pop();
        let origin = self.origin_at(at);
        self.tokens
            .insert(at, Token::generated(R_CURLY, "}", origin));
    }

    /// Does the stream at `j` read like an object key? Either `key:`,
    /// `@key:`, or a bracketed run whose closer is followed by `:`.
    pub(crate) fn looks_objectish(&self, j: usize) -> bool {
        if self.kind_at(j + 1) == Some(COLON) {
            return true;
        }
        if self.kind_at(j) == Some(AT) && self.kind_at(j + 2) == Some(COLON) {
            return true;
        }
        if self
            .kind_at(j)
            .map_or(false, |k| EXPRESSION_START.contains(k))
        {
            match self.detect_end(j + 1, |t, _| EXPRESSION_END.contains(t.kind)) {
                ScanEnd::Found(end) | ScanEnd::Unmatched(end) => {
                    return self.kind_at(end + 1) == Some(COLON);
                }
                ScanEnd::Eof(_) => {}
            }
        }
        false
    }

    /// Is the next key/value pair after the terminator following `j` part
    /// of the same object? Gives up at an unmatched closer.
    fn implicit_object_continues(&self, j: usize) -> bool {
        match self.detect_end(j, |t, _| t.is(TERMINATOR)) {
            ScanEnd::Found(end) => self.looks_objectish(end + 1),
            _ => false,
        }
    }

    /// Walks backwards from `i`, over balanced bracket runs, and reports
    /// whether one of `tags` shows up before a line break or a real
    /// opener does.
    pub(crate) fn find_tags_backwards(&self, start: usize, tags: TokenSet) -> bool {
        let mut back: Vec<SyntaxKind> = Vec::new();
        let mut i = start as isize;
        while i >= 0 {
            let token = &self.tokens[i as usize];
            let kind = token.kind;
            if back.is_empty()
                && (tags.contains(kind)
                    || (EXPRESSION_START.contains(kind) && !token.generated)
                    || kind.is_line_break())
            {
                break;
            }
            if EXPRESSION_END.contains(kind) {
                back.push(kind);
            }
            if EXPRESSION_START.contains(kind) && !back.is_empty() {
                back.pop();
            }
            i -= 1;
        }
        i >= 0 && tags.contains(self.tokens[i as usize].kind)
    }
}
