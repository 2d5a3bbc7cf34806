//! Parser for the latte language.
//!
//! This crate turns the rewritten token stream of [`latte_lexer`] into a
//! syntax tree. Parsing is table driven: the grammar module declares the
//! productions with their tree-building actions, the table module compiles
//! them into an LALR(1) automaton on first use, and [`engine`] runs that
//! automaton over the tokens. The tree itself lives in [`ast`].
//!
//! ```
//! let tree = latte_parser::parse_source("square = (x) -> x * x").unwrap();
//! assert_eq!(
//!     tree.sexpr(),
//!     "(block (= square (-> (param x) (block (* x x)))))",
//! );
//! ```

pub mod ast;
pub mod engine;
mod grammar;
mod table;

#[cfg(test)]
mod tests;

use std::mem;

use latte_syntax::{SyntaxError, Token};

pub use ast::{Node, NodeKind};

/// Parses an already-scanned, already-rewritten token stream.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<Node, SyntaxError> {
    let grammar = grammar::latte();
    match engine::parse(&grammar.table, grammar, tokens)? {
        Value::Node(root) => Ok(root),
        _ => unreachable!("the start rule always yields a node"),
    }
}

/// Scans, rewrites, and parses `source` in one step.
pub fn parse_source(source: &str) -> Result<Node, SyntaxError> {
    let tokens = latte_lexer::tokenize(source, latte_lexer::LexOptions::default())?;
    parse_tokens(tokens)
}

/// One slot of the parse engine's value stack.
#[derive(Debug)]
pub(crate) enum Value {
    Token(Token),
    Node(Node),
    List(Vec<Node>),
    /// Moved out by a [`Take`] call during the same reduction.
    Taken,
}

/// Positional extraction from a reduction's values, yacc's `$n`.
/// Each call moves the slot's contents out.
pub(crate) trait Take {
    fn node(&mut self, at: usize) -> Node;
    fn list(&mut self, at: usize) -> Vec<Node>;
    fn token(&mut self, at: usize) -> Token;
}

impl Take for Vec<Value> {
    fn node(&mut self, at: usize) -> Node {
        match mem::replace(&mut self[at], Value::Taken) {
            Value::Node(node) => node,
            other => unreachable!("expected a node, found {:?}", other),
        }
    }

    fn list(&mut self, at: usize) -> Vec<Node> {
        match mem::replace(&mut self[at], Value::Taken) {
            Value::List(items) => items,
            other => unreachable!("expected a list, found {:?}", other),
        }
    }

    fn token(&mut self, at: usize) -> Token {
        match mem::replace(&mut self[at], Value::Taken) {
            Value::Token(token) => token,
            other => unreachable!("expected a token, found {:?}", other),
        }
    }
}
