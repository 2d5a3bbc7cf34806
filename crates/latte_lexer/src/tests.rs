use crate::{tokenize, tokenize_balanced, LexOptions};
use latte_syntax::SyntaxKind::{self, *};
use latte_syntax::Token;
use quickcheck_macros::quickcheck;

fn raw() -> LexOptions {
    LexOptions { rewrite: false, ..Default::default() }
}

fn kinds(tokens: &[Token]) -> Vec<SyntaxKind> {
    tokens.iter().map(|t| t.kind).collect()
}

/// Every opener in `tokens` closes with its partner at the right depth.
fn assert_balanced(tokens: &[Token]) {
    let mut stack = Vec::new();
    for tok in tokens {
        if tok.kind.is_opener() {
            stack.push(tok.kind);
        } else if tok.kind.is_closer() {
            match stack.pop() {
                Some(open) => assert_eq!(
                    open.closing(),
                    Some(tok.kind),
                    "{:?} closed by {:?}",
                    open,
                    tok.kind
                ),
                None => panic!("unmatched closer {:?}", tok.kind),
            }
        }
    }
    assert!(stack.is_empty(), "left open: {:?}", stack);
}

macro_rules! assert_lex {
    (raw $src:expr, [$($kind:ident),* $(,)?]) => {{
        let tokens = tokenize($src, raw()).unwrap();
        assert_eq!(kinds(&tokens), vec![$($kind),*], "raw lex of {:?}", $src);
        tokens
    }};
    ($src:expr, [$($kind:ident),* $(,)?]) => {{
        let tokens = tokenize($src, LexOptions::default()).unwrap();
        assert_eq!(kinds(&tokens), vec![$($kind),*], "lex of {:?}", $src);
        tokens
    }};
}

// ---- words ----------------------------------------------------------

#[test]
fn keywords_and_aliases() {
    let tokens =
        assert_lex!(raw "x and y or not z", [IDENTIFIER, LOGIC, IDENTIFIER, LOGIC, UNARY_MATH, IDENTIFIER, TERMINATOR]);
    assert_eq!(tokens[1].value, "&&");
    assert_eq!(tokens[1].data().and_then(|d| d.original.as_deref()), Some("and"));
    assert_eq!(tokens[3].value, "||");
    assert_eq!(tokens[4].value, "!");

    let tokens = assert_lex!(raw "yes isnt off", [BOOL, COMPARE, BOOL, TERMINATOR]);
    assert_eq!(tokens[0].value, "true");
    assert_eq!(tokens[1].value, "!=");
    assert_eq!(tokens[2].value, "false");
}

#[test]
fn inverting_keywords_carry_the_flag() {
    let tokens = assert_lex!(raw "unless x\nuntil y", [IF, IDENTIFIER, TERMINATOR, WHILE, IDENTIFIER, TERMINATOR]);
    assert!(tokens[0].data().map_or(false, |d| d.invert));
    assert!(tokens[3].data().map_or(false, |d| d.invert));
}

#[test]
fn reserved_words_are_rejected() {
    let err = tokenize("var x", raw()).unwrap_err();
    assert_eq!(err.message, "reserved word 'var'");
    assert_eq!((err.loc.line, err.loc.col, err.loc.len), (0, 0, 3));
}

#[test]
fn keywords_in_property_position() {
    assert_lex!(raw "a.if", [IDENTIFIER, DOT, PROPERTY, TERMINATOR]);
    assert_lex!(raw "@for", [AT, PROPERTY, TERMINATOR]);
    let tokens = assert_lex!(raw "a?.class", [IDENTIFIER, QDOT, PROPERTY, TERMINATOR]);
    assert_eq!(tokens[2].value, "class");
}

#[test]
fn identifier_suffix_markers() {
    let tokens = assert_lex!(raw "ready?", [IDENTIFIER, TERMINATOR]);
    assert!(tokens[0].data().map_or(false, |d| d.question));
    assert_eq!(tokens[0].value, "ready");
    assert_eq!(tokens[0].loc.len, 6);

    let tokens = assert_lex!(raw "save!", [IDENTIFIER, TERMINATOR]);
    assert!(tokens[0].data().map_or(false, |d| d.exclaim));

    // before `.`, `:` or `=` the mark reads as an operator instead
    assert_lex!(raw "a?.b", [IDENTIFIER, QDOT, PROPERTY, TERMINATOR]);
    assert_lex!(raw "a ? b", [IDENTIFIER, EXISTS, IDENTIFIER, TERMINATOR]);
    assert_lex!(raw "a ?= b", [IDENTIFIER, COMPOUND_ASSIGN, IDENTIFIER, TERMINATOR]);
    assert_lex!(raw "done != 1", [IDENTIFIER, COMPARE, NUMBER, TERMINATOR]);
}

#[test]
fn for_clause_relations() {
    assert_lex!(raw "for x in xs", [FOR, IDENTIFIER, FOR_IN, IDENTIFIER, TERMINATOR]);
    assert_lex!(raw "for own k of o", [FOR, OWN, IDENTIFIER, FOR_OF, IDENTIFIER, TERMINATOR]);
    // the clause flag dies with its line
    assert_lex!(raw "for x in xs\na in b", [FOR, IDENTIFIER, FOR_IN, IDENTIFIER, TERMINATOR, IDENTIFIER, RELATION, IDENTIFIER, TERMINATOR]);
    assert_lex!(raw "a instanceof b", [IDENTIFIER, RELATION, IDENTIFIER, TERMINATOR]);
}

#[test]
fn when_at_line_start_leads() {
    assert_lex!(raw "a when b", [IDENTIFIER, WHEN, IDENTIFIER, TERMINATOR]);
    let tokens = tokenize("switch x\n  when 1\n    y", raw()).unwrap();
    assert_eq!(
        kinds(&tokens),
        vec![SWITCH, IDENTIFIER, INDENT, LEADING_WHEN, NUMBER, INDENT, IDENTIFIER, OUTDENT, OUTDENT, TERMINATOR]
    );
}

#[test]
fn import_export_vocabulary() {
    assert_lex!(raw "import { a as b } from 'm'", [IMPORT, L_CURLY, IDENTIFIER, AS, IDENTIFIER, R_CURLY, FROM, STRING, TERMINATOR]);
    assert_lex!(raw "import * as ns from 'm'", [IMPORT, IMPORT_ALL, AS, IDENTIFIER, FROM, STRING, TERMINATOR]);
    assert_lex!(raw "export default x", [EXPORT, DEFAULT, IDENTIFIER, TERMINATOR]);
    // specifier lists may name any keyword
    assert_lex!(raw "import { static } from 'm'", [IMPORT, L_CURLY, IDENTIFIER, R_CURLY, FROM, STRING, TERMINATOR]);
    // outside a clause the contextual words are plain names
    assert_lex!(raw "from = as", [IDENTIFIER, EQ, IDENTIFIER, TERMINATOR]);

    let err = tokenize("default", raw()).unwrap_err();
    assert_eq!(err.message, "reserved word 'default'");
}

// ---- layout ---------------------------------------------------------

#[test]
fn indentation_layout() {
    let tokens = assert_lex!(raw "a\n  b\nc", [IDENTIFIER, INDENT, IDENTIFIER, OUTDENT, TERMINATOR, IDENTIFIER, TERMINATOR]);
    assert_eq!(tokens[1].value, "2");
    assert_eq!(tokens[3].value, "2");
}

#[test]
fn dedent_between_levels_adopts_the_new_width() {
    assert_lex!(raw "a\n    b\n  c\n  d", [
        IDENTIFIER, INDENT, IDENTIFIER, OUTDENT, TERMINATOR, IDENTIFIER, TERMINATOR, IDENTIFIER, TERMINATOR,
    ]);
}

#[test]
fn below_base_indentation() {
    let err = tokenize("\n  a\nb", raw()).unwrap_err();
    assert_eq!(err.message, "missing indentation");
}

#[test]
fn dedent_inside_brackets_closes_levels_first() {
    assert_lex!(raw "(\n  x\n)", [L_PAREN, INDENT, IDENTIFIER, OUTDENT, TERMINATOR, R_PAREN, TERMINATOR]);
}

#[test]
fn dedent_across_a_bracket_is_unmatched() {
    let err = tokenize("a\n  b [\nc", raw()).unwrap_err();
    assert_eq!(err.message, "unmatched OUTDENT");
}

#[test]
fn bracket_errors() {
    let err = tokenize("a)", raw()).unwrap_err();
    assert_eq!(err.message, "unmatched )");
    let err = tokenize("f(x", raw()).unwrap_err();
    assert_eq!(err.message, "missing )");
    assert_eq!((err.loc.line, err.loc.col), (0, 1));
}

#[test]
fn unfinished_lines_suppress_the_break() {
    assert_lex!(raw "a +\nb", [IDENTIFIER, PLUS, IDENTIFIER, TERMINATOR]);
    assert_lex!(raw "a\n.b", [IDENTIFIER, DOT, PROPERTY, TERMINATOR]);
    assert_lex!(raw "a\n, b", [IDENTIFIER, COMMA, IDENTIFIER, TERMINATOR]);
    assert_lex!(raw "a,\nb", [IDENTIFIER, COMMA, TERMINATOR, IDENTIFIER, TERMINATOR]);
}

#[test]
fn semicolons_collapse_into_the_break() {
    let tokens = assert_lex!(raw "a;\nb", [IDENTIFIER, TERMINATOR, IDENTIFIER, TERMINATOR]);
    assert_eq!(tokens[1].value, "\n");
    let tokens = assert_lex!(raw "a; b", [IDENTIFIER, TERMINATOR, IDENTIFIER, TERMINATOR]);
    assert_eq!(tokens[1].value, ";");
    assert_lex!(raw "a;", [IDENTIFIER, TERMINATOR]);
}

#[test]
fn backslash_joins_lines() {
    assert_lex!(raw "a \\\n   b", [IDENTIFIER, IDENTIFIER, TERMINATOR]);
}

#[test]
fn type_annotations_attach_to_the_previous_token() {
    let tokens = tokenize("x\\Int = 1", raw()).unwrap();
    assert_eq!(kinds(&tokens), vec![IDENTIFIER, EQ, NUMBER, TERMINATOR]);
    assert_eq!(tokens[0].data().and_then(|d| d.annotation.as_deref()), Some("Int"));

    let tokens = tokenize("xs\\[Int] = 1", raw()).unwrap();
    assert_eq!(tokens[0].data().and_then(|d| d.annotation.as_deref()), Some("[Int]"));
}

#[test]
fn locations_track_lines_and_columns() {
    let tokens = tokenize("ab\n  cd", raw()).unwrap();
    let cd = &tokens[2];
    assert_eq!((cd.loc.line, cd.loc.col, cd.loc.offset, cd.loc.len), (1, 2, 5, 2));
}

#[test]
fn spacing_flags() {
    let tokens = tokenize("a b\nc", raw()).unwrap();
    assert!(!tokens[0].spaced);
    assert!(tokens[1].spaced);
    assert!(tokens[1].newline);
}

#[test]
fn comments_vanish() {
    assert_lex!(raw "a # note", [IDENTIFIER, TERMINATOR]);
    assert_lex!(raw "### doc ###\nb", [IDENTIFIER, TERMINATOR]);
    let err = tokenize("### oops", raw()).unwrap_err();
    assert_eq!(err.message, "missing ### (unclosed block comment)");
}

// ---- strings --------------------------------------------------------

#[test]
fn plain_strings() {
    let tokens = assert_lex!(raw "'hi'", [STRING, TERMINATOR]);
    assert_eq!(tokens[0].value, "hi");
    assert_eq!(tokens[0].data().and_then(|d| d.quote.as_deref()), Some("'"));
    assert_eq!(tokens[0].loc.len, 4);

    // single-quoted bodies are verbatim and `\'` does not close
    let tokens = assert_lex!(raw r"'don\'t #{x}'", [STRING, TERMINATOR]);
    assert_eq!(tokens[0].value, r"don\'t #{x}");
}

#[test]
fn interpolated_string_shape() {
    let tokens = assert_lex!(raw r#""a#{1+1}b""#, [
        STRING_START, STRING, INTERPOLATION_START, NUMBER, PLUS, NUMBER,
        INTERPOLATION_END, STRING, STRING_END, TERMINATOR,
    ]);
    assert_eq!(tokens[1].value, "a");
    assert_eq!(tokens[2].value, "#{");
    assert_eq!(tokens[7].value, "b");
    // locations stay file-absolute through the sub-scan
    assert_eq!(tokens[2].loc.offset, 2);
    assert_eq!(tokens[3].loc.offset, 4);
    assert_eq!(tokens[6].loc.offset, 7);
    assert_eq!(tokens[8].loc.offset + tokens[8].loc.len, 10);
}

#[test]
fn empty_interpolation_is_dropped() {
    assert_lex!(raw r#""x#{}""#, [STRING_START, STRING, STRING_END, TERMINATOR]);
}

#[test]
fn heredoc_normalization() {
    let tokens = tokenize("\"\"\"\n  first\n    indented\n  \"\"\"", raw()).unwrap();
    assert_eq!(tokens[0].kind, STRING);
    assert_eq!(tokens[0].value, "first\n  indented");
    assert_eq!(tokens[0].data().and_then(|d| d.quote.as_deref()), Some("\"\"\""));
}

#[test]
fn unterminated_string_points_at_the_opener() {
    let err = tokenize("x = \"abc", raw()).unwrap_err();
    assert_eq!(err.message, "missing \" (unclosed string)");
    assert_eq!((err.loc.line, err.loc.col, err.loc.len), (0, 4, 1));

    let err = tokenize("'''abc", raw()).unwrap_err();
    assert_eq!(err.message, "missing ''' (unclosed string)");
}

// ---- regexes --------------------------------------------------------

#[test]
fn regex_or_division() {
    let tokens = assert_lex!(raw "x = /foo/", [IDENTIFIER, EQ, REGEX, TERMINATOR]);
    assert_eq!(tokens[2].value, "/foo/");
    assert_lex!(raw "a / b", [IDENTIFIER, MATH, IDENTIFIER, TERMINATOR]);
    assert_lex!(raw "a/b", [IDENTIFIER, MATH, IDENTIFIER, TERMINATOR]);
    assert_lex!(raw "x /2/ y", [IDENTIFIER, REGEX, IDENTIFIER, TERMINATOR]);
    assert_lex!(raw "x /= 2", [IDENTIFIER, COMPOUND_ASSIGN, NUMBER, TERMINATOR]);
    assert_lex!(raw "10 // 3", [NUMBER, MATH, NUMBER, TERMINATOR]);
}

#[test]
fn regex_flag_validation() {
    let tokens = assert_lex!(raw "x = /ab/gim", [IDENTIFIER, EQ, REGEX, TERMINATOR]);
    assert_eq!(tokens[2].value, "/ab/gim");
    assert_eq!(tokens[2].loc.len, 7);

    let err = tokenize("x = /a/gg", raw()).unwrap_err();
    assert_eq!(err.message, "invalid regular expression flags gg");
    let err = tokenize("x = /a/q", raw()).unwrap_err();
    assert_eq!(err.message, "invalid regular expression flags q");
}

#[test]
fn regex_error_cases() {
    let err = tokenize("/*foo*/", raw()).unwrap_err();
    assert_eq!(err.message, "regular expressions cannot begin with '*'");
    assert_eq!(err.loc.col, 1);
    let err = tokenize("x = /foo", raw()).unwrap_err();
    assert_eq!(err.message, "missing / (unclosed regex)");
}

#[test]
fn heregex_collapses_without_interpolation() {
    let tokens = assert_lex!(raw "x = ///a b # note\n c///g", [IDENTIFIER, EQ, REGEX, TERMINATOR]);
    assert_eq!(tokens[2].value, "/abc/g");
    assert!(tokens[2].data().map_or(false, |d| d.heregex));
}

#[test]
fn heregex_with_interpolation() {
    let tokens = assert_lex!(raw "///a#{b}///", [
        REGEX_START, STRING, INTERPOLATION_START, IDENTIFIER, INTERPOLATION_END, REGEX_END, TERMINATOR,
    ]);
    assert_eq!(tokens[1].value, "a");
    assert!(tokens[0].data().map_or(false, |d| d.heregex));

    let err = tokenize("///abc", raw()).unwrap_err();
    assert_eq!(err.message, "missing /// (unclosed heregex)");
}

// ---- embedded JS ----------------------------------------------------

#[test]
fn embedded_js() {
    let tokens = assert_lex!(raw "`var x`", [JS, TERMINATOR]);
    assert_eq!(tokens[0].value, "var x");
    let tokens = assert_lex!(raw "```a`b```", [JS, TERMINATOR]);
    assert_eq!(tokens[0].value, "a`b");
    let err = tokenize("`oops", raw()).unwrap_err();
    assert_eq!(err.message, "missing ` (unclosed JS literal)");
}

// ---- operators ------------------------------------------------------

#[test]
fn prototype_shorthand_expands() {
    let tokens = assert_lex!(raw "a::b", [IDENTIFIER, DOT, PROPERTY, DOT, PROPERTY, TERMINATOR]);
    assert_eq!(tokens[2].value, "prototype");
    assert!(tokens[2].generated);
    assert_lex!(raw "a::", [IDENTIFIER, DOT, PROPERTY, TERMINATOR]);
    assert_lex!(raw "a?::b", [IDENTIFIER, QDOT, PROPERTY, DOT, PROPERTY, TERMINATOR]);
}

#[test]
fn arrow_parameters_are_retagged() {
    assert_lex!(raw "(a, b) -> c", [PARAM_START, IDENTIFIER, COMMA, IDENTIFIER, PARAM_END, ARROW, IDENTIFIER, TERMINATOR]);
    // a call's own parens keep their role
    assert_lex!(raw "f(a) => b", [IDENTIFIER, CALL_START, IDENTIFIER, CALL_END, FAT_ARROW, IDENTIFIER, TERMINATOR]);
}

#[test]
fn import_star_is_contextual() {
    assert_lex!(raw "a * b", [IDENTIFIER, MATH, IDENTIFIER, TERMINATOR]);
    assert_lex!(raw "export * from 'm'", [EXPORT, EXPORT_ALL, FROM, STRING, TERMINATOR]);
}

// ---- rewritten streams ----------------------------------------------

#[test]
fn implicit_call_wraps_bare_arguments() {
    let tokens = assert_lex!("foo 1, 2", [IDENTIFIER, CALL_START, NUMBER, COMMA, NUMBER, CALL_END, TERMINATOR]);
    assert!(tokens[1].generated && tokens[5].generated);
}

#[test]
fn postfix_if_is_retagged() {
    assert_lex!("y if x", [IDENTIFIER, POST_IF, IDENTIFIER, TERMINATOR]);
}

#[test]
fn block_if_keeps_its_tag() {
    assert_lex!("if x\n  y\nelse\n  z", [IF, IDENTIFIER, INDENT, IDENTIFIER, OUTDENT, ELSE, INDENT, IDENTIFIER, OUTDENT, TERMINATOR]);
}

#[test]
fn then_becomes_an_inline_block() {
    let tokens = assert_lex!("if x then y", [IF, IDENTIFIER, INDENT, IDENTIFIER, OUTDENT, TERMINATOR]);
    assert!(tokens[2].generated);
    assert!(tokens[2].data().map_or(false, |d| d.from_then));
}

#[test]
fn implicit_object_braces() {
    let tokens = assert_lex!("o =\n  a: 1\n  b: 2", [
        IDENTIFIER, EQ, INDENT, L_CURLY, IDENTIFIER, COLON, NUMBER, TERMINATOR,
        IDENTIFIER, COLON, NUMBER, R_CURLY, OUTDENT, TERMINATOR,
    ]);
    assert!(tokens[3].generated && tokens[11].generated);
}

#[test]
fn dangling_call_parens_close_as_calls() {
    assert_lex!("f(x,\n  y\n)", [IDENTIFIER, CALL_START, IDENTIFIER, COMMA, INDENT, IDENTIFIER, OUTDENT, CALL_END, TERMINATOR]);
}

#[test]
fn leading_terminators_are_dropped() {
    assert_lex!(";x", [IDENTIFIER, TERMINATOR]);
}

#[test]
fn rewriting_is_idempotent_on_explicit_streams() {
    let cooked = tokenize("foo(1, 2)\nif x\n  y", LexOptions::default()).unwrap();
    let mut again = cooked.clone();
    latte_rewriter::rewrite(&mut again).unwrap();
    assert_eq!(kinds(&again), kinds(&cooked));
}

#[test]
fn cooked_streams_stay_balanced() {
    let sources = [
        "foo 1, 2",
        "o =\n  a: 1\n  b: 2",
        "if x\n  y\nelse\n  z",
        "f(x,\n  y\n)",
        "add = (a, b) -> a + b",
        "say \"a#{1+1}b\" if loud",
    ];
    for src in &sources {
        let tokens = tokenize(src, LexOptions::default()).unwrap();
        assert_balanced(&tokens);
    }
}

// ---- balanced mode --------------------------------------------------

#[test]
fn balanced_scan_reports_consumed_length() {
    let b = tokenize_balanced("{1+1} trailing", LexOptions::default()).unwrap();
    assert_eq!(b.consumed, 5);
    assert_eq!(kinds(&b.tokens), vec![L_CURLY, NUMBER, PLUS, NUMBER, R_CURLY]);
}

// ---- properties -----------------------------------------------------

#[quickcheck]
fn lowercase_words_lex_cleanly(seeds: Vec<(u8, u8)>) -> bool {
    // Runs of consecutive letters never collide with the keyword tables
    // except for the alias `no`.
    let words: Vec<String> = seeds
        .iter()
        .map(|&(a, b)| {
            let len = b % 7 + 1;
            (0..len).map(|i| (b'a' + a.wrapping_add(i) % 26) as char).collect()
        })
        .collect();
    if words.is_empty() {
        return true;
    }
    let src = words.join(" ");
    let tokens = match tokenize(&src, LexOptions { rewrite: false, ..Default::default() }) {
        Ok(t) => t,
        Err(_) => return false,
    };
    if tokens.len() != words.len() + 1 || tokens[tokens.len() - 1].kind != TERMINATOR {
        return false;
    }
    words.iter().zip(&tokens).all(|(word, tok)| {
        tok.value == *word || tok.data().map_or(false, |d| d.original.as_deref() == Some(word.as_str()))
    })
}
