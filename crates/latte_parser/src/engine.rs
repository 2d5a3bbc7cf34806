//! The table-driven shift-reduce loop.
//!
//! The engine knows nothing about the latte grammar: it walks whatever
//! [`ParseTable`] it is handed and defers every semantic decision to a
//! [`RuleActions`] implementation. Actions are encoded as signed integers
//! per state row: positive is a shift (or goto) to that state, negative is
//! a reduce by rule `-n`, and zero accepts. A missing entry is a syntax
//! error.

use std::collections::HashMap;

use latte_syntax::{Loc, SyntaxError, Token};

/// One production: its left-hand symbol, how many symbols it pops, and the
/// display name of the left-hand side for diagnostics.
#[derive(Debug, Clone)]
pub struct Rule {
    pub lhs: u16,
    pub len: u8,
    pub name: &'static str,
}

/// A finished automaton. Rule 0 is the augmented start production and is
/// never reduced; terminal symbol ids are the token tag discriminants, and
/// ids at or above `first_nonterminal` are grammar-internal.
#[derive(Debug)]
pub struct ParseTable {
    /// Per-state sparse action row, keyed by symbol id. Nonterminal keys
    /// hold the goto half of the automaton.
    pub actions: Vec<HashMap<u16, i32>>,
    pub rules: Vec<Rule>,
    /// Symbol id to display name.
    pub names: Vec<String>,
    /// Display name to symbol id.
    pub ids: HashMap<String, u16>,
    pub first_nonterminal: u16,
    pub eof: u16,
    pub start: u16,
}

impl ParseTable {
    pub fn name(&self, sym: u16) -> &str {
        self.names.get(sym as usize).map(|s| s.as_str()).unwrap_or("?")
    }
}

/// The semantic half of a grammar: how token leaves become values and how
/// a reduced rule combines the values it pops.
pub trait RuleActions {
    type Value;

    /// Wraps a shifted token.
    fn leaf(&self, token: Token) -> Self::Value;

    /// Builds the value for rule `rule` (an index into
    /// [`ParseTable::rules`], never 0) from the `len` popped values, left
    /// to right. `span` covers the popped source range; empty rules get a
    /// zero-length span at the lookahead.
    fn reduce(&self, rule: usize, values: Vec<Self::Value>, span: Loc) -> Result<Self::Value, SyntaxError>;
}

/// Runs `tokens` through the automaton. Three stacks move in step: state
/// ids, semantic values, and the source span each value covers. The end of
/// input is presented to the table as the `eof` symbol.
pub fn parse<A: RuleActions>(
    table: &ParseTable,
    actions: &A,
    tokens: Vec<Token>,
) -> Result<A::Value, SyntaxError> {
    let mut states: Vec<u16> = Vec::with_capacity(32);
    states.push(0);
    let mut values: Vec<A::Value> = Vec::new();
    let mut spans: Vec<Loc> = Vec::new();
    let mut input = tokens.into_iter().peekable();
    let mut last_loc = Loc::default();

    loop {
        let state = states[states.len() - 1] as usize;
        let (sym, look_loc) = match input.peek() {
            Some(token) => (token.kind as u16, token.loc),
            None => (table.eof, last_loc.after()),
        };
        let action = match table.actions[state].get(&sym) {
            Some(&action) => action,
            None => return Err(unexpected(table, state, input.peek(), look_loc)),
        };

        if action == 0 {
            // Accept: the value stack holds exactly the root.
            return match values.pop() {
                Some(root) if values.is_empty() => Ok(root),
                _ => unreachable!("accept with {} values on the stack", values.len() + 1),
            };
        } else if action > 0 {
            let token = match input.next() {
                Some(token) => token,
                None => unreachable!("end of input never shifts"),
            };
            last_loc = token.loc;
            spans.push(token.loc);
            values.push(actions.leaf(token));
            states.push(action as u16);
        } else {
            let rule_id = (-action) as usize;
            let rule = &table.rules[rule_id];
            let len = rule.len as usize;
            let split = values.len() - len;
            let popped = values.split_off(split);
            let popped_spans = spans.split_off(split);
            states.truncate(states.len() - len);

            let span = merge_spans(&popped_spans, look_loc);
            let value = actions.reduce(rule_id, popped, span)?;

            let below = states[states.len() - 1] as usize;
            let goto = match table.actions[below].get(&rule.lhs) {
                Some(&goto) if goto > 0 => goto as u16,
                _ => unreachable!("no goto for {} out of state {}", rule.name, below),
            };
            states.push(goto);
            values.push(value);
            spans.push(span);
        }
    }
}

/// The span from the first popped symbol through the last; empty
/// reductions sit, zero-length, at the lookahead.
fn merge_spans(popped: &[Loc], look: Loc) -> Loc {
    match (popped.first(), popped.last()) {
        (Some(first), Some(last)) => Loc {
            line: first.line,
            col: first.col,
            offset: first.offset,
            len: (last.offset + last.len).saturating_sub(first.offset),
        },
        _ => Loc { len: 0, ..look },
    }
}

fn unexpected(table: &ParseTable, state: usize, found: Option<&Token>, at: Loc) -> SyntaxError {
    let mut expected: Vec<&str> = table.actions[state]
        .keys()
        .filter(|&&sym| sym < table.first_nonterminal)
        .map(|&sym| table.name(sym))
        .collect();
    expected.sort_unstable();

    let what = match found {
        Some(token) => format!("unexpected {}", token.kind.name()),
        None => "unexpected end of input".to_string(),
    };
    let message = if expected.is_empty() {
        what
    } else {
        format!("{} (expected one of: {})", what, expected.join(", "))
    };
    SyntaxError::new(message, at)
}
