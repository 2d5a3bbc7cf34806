use std::collections::HashMap;

use expect_test::{expect, Expect};

use latte_syntax::{Loc, SyntaxError, SyntaxKind, Token};

use crate::engine::{self, ParseTable, Rule, RuleActions};
use crate::table::Grammar;

fn tok(kind: SyntaxKind, value: &str, col: u32) -> Token {
    Token::new(kind, value, Loc::new(0, col, col, value.len() as u32))
}

fn check(source: &str, expected: Expect) {
    let tree = crate::parse_source(source).unwrap();
    expected.assert_eq(&tree.sexpr());
}

// ---- the engine, on a table small enough to write by hand -------------

struct Calc;

impl RuleActions for Calc {
    type Value = i64;

    fn leaf(&self, token: Token) -> i64 {
        token.value.parse().unwrap_or(0)
    }

    fn reduce(&self, rule: usize, values: Vec<i64>, _span: Loc) -> Result<i64, SyntaxError> {
        Ok(if rule == 1 { values[0] } else { values[0] + values[2] })
    }
}

/// `S -> NUMBER | S PLUS NUMBER`, tabled by hand.
fn sum_table() -> ParseTable {
    let mut names: Vec<String> = SyntaxKind::all().map(|k| k.name().to_string()).collect();
    let accept = names.len() as u16;
    names.push("$accept".to_string());
    let s = accept + 1;
    names.push("S".to_string());
    let ids: HashMap<String, u16> = names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i as u16))
        .collect();

    let number = SyntaxKind::NUMBER as u16;
    let plus = SyntaxKind::PLUS as u16;
    let eof = SyntaxKind::EOF as u16;
    let row = |entries: &[(u16, i32)]| -> HashMap<u16, i32> { entries.iter().copied().collect() };

    ParseTable {
        actions: vec![
            row(&[(number, 1), (s, 2)]),
            row(&[(plus, -1), (eof, -1)]),
            row(&[(plus, 3), (eof, 0)]),
            row(&[(number, 4)]),
            row(&[(plus, -2), (eof, -2)]),
        ],
        rules: vec![
            Rule { lhs: accept, len: 1, name: "$accept" },
            Rule { lhs: s, len: 1, name: "S" },
            Rule { lhs: s, len: 3, name: "S" },
        ],
        names,
        ids,
        first_nonterminal: SyntaxKind::__LAST as u16,
        eof,
        start: s,
    }
}

#[test]
fn hand_built_table_drives_the_engine() {
    let table = sum_table();
    let tokens = vec![
        tok(SyntaxKind::NUMBER, "1", 0),
        tok(SyntaxKind::PLUS, "+", 2),
        tok(SyntaxKind::NUMBER, "2", 4),
        tok(SyntaxKind::PLUS, "+", 6),
        tok(SyntaxKind::NUMBER, "3", 8),
    ];
    assert_eq!(engine::parse(&table, &Calc, tokens).unwrap(), 6);

    let lone = vec![tok(SyntaxKind::NUMBER, "41", 0)];
    assert_eq!(engine::parse(&table, &Calc, lone).unwrap(), 41);
}

#[test]
fn engine_reports_expected_terminals() {
    let table = sum_table();

    let err = engine::parse(&table, &Calc, vec![tok(SyntaxKind::PLUS, "+", 0)]).unwrap_err();
    assert_eq!(err.message, "unexpected PLUS (expected one of: NUMBER)");
    assert_eq!((err.loc.line, err.loc.col), (0, 0));

    let cut_short = vec![tok(SyntaxKind::NUMBER, "1", 0), tok(SyntaxKind::PLUS, "+", 2)];
    let err = engine::parse(&table, &Calc, cut_short).unwrap_err();
    assert_eq!(err.message, "unexpected end of input (expected one of: NUMBER)");
    assert_eq!(err.loc.col, 3);

    let err = engine::parse(&table, &Calc, Vec::new()).unwrap_err();
    assert_eq!(err.message, "unexpected end of input (expected one of: NUMBER)");
}

// ---- the table builder ------------------------------------------------

struct Eval(Vec<char>);

impl RuleActions for Eval {
    type Value = i64;

    fn leaf(&self, token: Token) -> i64 {
        token.value.parse().unwrap_or(0)
    }

    fn reduce(&self, rule: usize, values: Vec<i64>, _span: Loc) -> Result<i64, SyntaxError> {
        Ok(match self.0[rule - 1] {
            '+' => values[0] + values[2],
            '-' => values[0] - values[2],
            '*' => values[0] * values[2],
            _ => values[0],
        })
    }
}

#[test]
fn precedence_declarations_shape_generated_tables() {
    let mut g: Grammar<char> = Grammar::new("E");
    g.left("PLUS MINUS");
    g.left("MATH");
    g.rule("E", "E PLUS E", '+');
    g.rule("E", "E MINUS E", '-');
    g.rule("E", "E MATH E", '*');
    g.rule("E", "NUMBER", 'n');
    let (table, ops) = g.build();
    let eval = Eval(ops);

    // Multiplication binds tighter than addition.
    let tighter = vec![
        tok(SyntaxKind::NUMBER, "1", 0),
        tok(SyntaxKind::PLUS, "+", 2),
        tok(SyntaxKind::NUMBER, "2", 4),
        tok(SyntaxKind::MATH, "*", 6),
        tok(SyntaxKind::NUMBER, "3", 8),
    ];
    assert_eq!(engine::parse(&table, &eval, tighter).unwrap(), 7);

    // Same-level operators associate left.
    let leftward = vec![
        tok(SyntaxKind::NUMBER, "7", 0),
        tok(SyntaxKind::MINUS, "-", 2),
        tok(SyntaxKind::NUMBER, "3", 4),
        tok(SyntaxKind::MINUS, "-", 6),
        tok(SyntaxKind::NUMBER, "2", 8),
    ];
    assert_eq!(engine::parse(&table, &eval, leftward).unwrap(), 2);
}

// ---- full pipeline snapshots ------------------------------------------

#[test]
fn literals() {
    check("x = yes", expect![["(block (= x true))"]]);
    check("x = null", expect![["(block (= x null))"]]);
    check("x = undefined", expect![["(block (= x undefined))"]]);
    check("x = /ab/", expect![["(block (= x /ab/))"]]);
    check("`raw js`", expect![[r#"(block (js "raw js"))"#]]);
}

#[test]
fn strings_interpolate() {
    check(r#"greet = "hi""#, expect![[r#"(block (= greet "hi"))"#]]);
    check(r##""a#{1 + 1}b""##, expect![[r#"(block (str "a" (+ 1 1) "b"))"#]]);
    check(r##"///a#{b}///"##, expect![[r#"(block (regex "a" b))"#]]);
}

#[test]
fn assignment_forms() {
    check("x = 1", expect![["(block (= x 1))"]]);
    check("x = y = 1", expect![["(block (= x (= y 1)))"]]);
    check("x += 1", expect![["(block (+= x 1))"]]);
    check("a ?= 1", expect![["(block (?= a 1))"]]);
}

#[test]
fn objects() {
    check("o = {}", expect![["(block (= o (object)))"]]);
    check("o = {a: 1}", expect![["(block (= o (object (prop a 1))))"]]);
    check(
        "o =\n  a: 1\n  b: 2",
        expect![["(block (= o (object (prop a 1) (prop b 2))))"]],
    );
    check(
        "draw x: 1, y: 2",
        expect![["(block (call draw (object (prop x 1) (prop y 2))))"]],
    );
}

#[test]
fn arrays_ranges_and_splats() {
    check("[]", expect![["(block (array))"]]);
    check("[1, 2, 3]", expect![["(block (array 1 2 3))"]]);
    check("[1, 2,]", expect![["(block (array 1 2))"]]);
    check("r = [1..5]", expect![["(block (= r (.. 1 5)))"]]);
    check("[0...n]", expect![["(block (... 0 n))"]]);
    check("f xs...", expect![["(block (call f (splat xs)))"]]);
}

#[test]
fn property_access() {
    check("a.b.c", expect![["(block (. (. a b) c))"]]);
    check("a?.b", expect![["(block (?. a b))"]]);
    check("a::b", expect![["(block (. (. a prototype) b))"]]);
    check("a[0]", expect![["(block (index a 0))"]]);
    check("@name", expect![["(block (. this name))"]]);
}

#[test]
fn function_literals() {
    check("(a, b) -> c", expect![["(block (-> (param a) (param b) (block c)))"]]);
    check("f = => @x", expect![["(block (= f (=> (block (. this x)))))"]]);
    check(
        "f = (args...) -> args",
        expect![["(block (= f (-> (param (splat args)) (block args))))"]],
    );
    check("f = (x = 1) -> x", expect![["(block (= f (-> (param x 1) (block x))))"]]);
}

#[test]
fn calls() {
    check("f(x)", expect![["(block (call f x))"]]);
    check("foo 1, 2", expect![["(block (call foo 1 2))"]]);
    check("f(x).g(y)", expect![["(block (call (. (call f x) g) y))"]]);
    check("super(a)", expect![["(block (call super a))"]]);
    check("f(x,\n  y\n)", expect![["(block (call f x y))"]]);
    check("draw\n  radius: 3", expect![["(block (call draw (object (prop radius 3))))"]]);
    check("f if x then y", expect![["(block (call f (if x (block y))))"]]);
}

#[test]
fn conditionals() {
    check("if x then y", expect![["(block (if x (block y)))"]]);
    check("if x\n  y\nelse\n  z", expect![["(block (if x (block y) (block z)))"]]);
    check(
        "if a\n  1\nelse if b\n  2\nelse\n  3",
        expect![["(block (if a (block 1) (if b (block 2) (block 3))))"]],
    );
    check("y if x", expect![["(block (if x (block y)))"]]);
    check("y unless x", expect![["(block (unless x (block y)))"]]);
    check("break if done", expect![["(block (if done (block break)))"]]);
}

#[test]
fn while_loops() {
    check("x -= 1 while x > 0", expect![["(block (while (> x 0) (block (-= x 1))))"]]);
    check("x until done", expect![["(block (until done (block x)))"]]);
    check("x while y when z", expect![["(block (while y (when z) (block x)))"]]);
    check("loop\n  poll()", expect![["(block (loop (block (call poll))))"]]);
}

#[test]
fn for_loops() {
    check("for x in xs\n  y", expect![["(block (for x (in xs) (block y)))"]]);
    check("y for x in xs", expect![["(block (for x (in xs) (block y)))"]]);
    check("for own k of o\n  k", expect![["(block (for k (own-of o) (block k)))"]]);
    check("for v, i in xs\n  v", expect![["(block (for v i (in xs) (block v)))"]]);
    check("for x in xs by 2\n  x", expect![["(block (for x (in xs) (by 2) (block x)))"]]);
    check(
        "x for x in xs when x > 0",
        expect![["(block (for x (in xs) (when (> x 0)) (block x)))"]],
    );
}

#[test]
fn switch_arms() {
    check(
        "switch x\n  when 1\n    y",
        expect![["(block (switch x (when 1 (block y))))"]],
    );
    check(
        "switch x\n  when 1, 2\n    y",
        expect![["(block (switch x (when 1 2 (block y))))"]],
    );
    check(
        "switch x\n  when 1\n    a\n  when 2\n    b",
        expect![["(block (switch x (when 1 (block a)) (when 2 (block b))))"]],
    );
    check(
        "switch x\n  when 1\n    y\n  else\n    z",
        expect![["(block (switch x (when 1 (block y)) (block z)))"]],
    );
}

#[test]
fn try_catch_finally() {
    check(
        "try\n  risky()\ncatch e\n  log e",
        expect![["(block (try (block (call risky)) (catch e (block (call log e)))))"]],
    );
    check(
        "try\n  f()\nfinally\n  g()",
        expect![["(block (try (block (call f)) (finally (block (call g)))))"]],
    );
    check("throw err", expect![["(block (throw err))"]]);
    check(
        r#"throw new Error "boom""#,
        expect![[r#"(block (throw (new (call Error "boom"))))"#]],
    );
}

#[test]
fn classes() {
    check("class A", expect![["(block (class A))"]]);
    check(
        "class Animal extends Base\n  speak: -> \"woof\"",
        expect![[
            r#"(block (class Animal (extends Base) (block (object (prop speak (-> (block "woof")))))))"#
        ]],
    );
}

#[test]
fn returns_and_statements() {
    check("return 1", expect![["(block (return 1))"]]);
    check("return", expect![["(block (return))"]]);
}

#[test]
fn imports() {
    check("import 'm'", expect![[r#"(block (import "m"))"#]]);
    check("import d from 'm'", expect![[r#"(block (import (default d) (from "m")))"#]]);
    check(
        "import { a as b } from 'm'",
        expect![[r#"(block (import (names (as a b)) (from "m")))"#]],
    );
    check(
        "import * as ns from 'm'",
        expect![[r#"(block (import (all (as * ns)) (from "m")))"#]],
    );
}

#[test]
fn exports() {
    check("export { a, b }", expect![["(block (export (names a b)))"]]);
    check("export default x", expect![["(block (export (default x)))"]]);
    check("export * from 'm'", expect![[r#"(block (export (all) (from "m")))"#]]);
    check("export x = 1", expect![["(block (export (= x 1)))"]]);
}

#[test]
fn operator_precedence_in_trees() {
    check("1 + 2 * 3", expect![["(block (+ 1 (* 2 3)))"]]);
    check("a ** b ** c", expect![["(block (** a (** b c)))"]]);
    check("a and b or c", expect![["(block (|| (&& a b) c))"]]);
    check("a is b", expect![["(block (== a b))"]]);
    check("x in xs", expect![["(block (in x xs))"]]);
    check("x not in xs", expect![["(block (! (in x xs)))"]]);
    check("typeof x", expect![["(block (typeof x))"]]);
    check("-x", expect![["(block (- x))"]]);
    check("not a", expect![["(block (! a))"]]);
    check("x++", expect![["(block (post++ x))"]]);
    check("++x", expect![["(block (++ x))"]]);
    check("(a + b) * c", expect![["(block (* (parens (+ a b)) c))"]]);
}

#[test]
fn existence_operators() {
    check("ready?", expect![["(block (? ready))"]]);
    check("a ? b", expect![["(block (? a b))"]]);
    check("a ? b + c", expect![["(block (? a (+ b c)))"]]);
}

#[test]
fn multiline_programs() {
    check("a = 1\nb = 2", expect![["(block (= a 1) (= b 2))"]]);
    check("", expect![["(block)"]]);
}

#[test]
fn spans_cover_the_whole_expression() {
    let root = crate::parse_source("a + bb").unwrap();
    assert_eq!((root.loc.offset, root.loc.len), (0, 6));
}

#[test]
fn parse_errors_name_the_unexpected_token() {
    let err = crate::parse_source("a +").unwrap_err();
    assert!(err.message.starts_with("unexpected TERMINATOR"), "{}", err.message);
    assert_eq!(err.line(), 1);

    let err = crate::parse_source("x = break").unwrap_err();
    assert!(err.message.starts_with("unexpected STATEMENT"), "{}", err.message);
}
