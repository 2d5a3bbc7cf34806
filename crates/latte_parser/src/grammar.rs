//! The latte grammar: precedence declarations, productions, and the
//! actions that build the tree.
//!
//! Productions follow the written language top-down, starting at `Root`.
//! Each action receives the semantic values of its right-hand side and
//! addresses them positionally through [`Take`], the way yacc actions use
//! `$1`/`$2`. The table is generated once, on first use, and shared.

use once_cell::sync::Lazy;

use latte_syntax::{Loc, SyntaxError, SyntaxKind, Token};

use crate::ast::{Node, NodeKind};
use crate::engine::{ParseTable, RuleActions};
use crate::table::Grammar;
use crate::{Take, Value};

/// A production's tree-building half.
pub(crate) type Action = Box<dyn Fn(Vec<Value>, Loc) -> Result<Value, SyntaxError> + Send + Sync>;

pub(crate) struct LatteGrammar {
    pub table: ParseTable,
    pub actions: Vec<Action>,
}

static GRAMMAR: Lazy<LatteGrammar> = Lazy::new(|| {
    let (table, actions) = rules().build();
    LatteGrammar { table, actions }
});

/// The shared grammar, built on first use.
pub(crate) fn latte() -> &'static LatteGrammar {
    &GRAMMAR
}

impl RuleActions for LatteGrammar {
    type Value = Value;

    fn leaf(&self, token: Token) -> Value {
        Value::Token(token)
    }

    fn reduce(&self, rule: usize, values: Vec<Value>, span: Loc) -> Result<Value, SyntaxError> {
        (self.actions[rule - 1])(values, span)
    }
}

macro_rules! rule {
    ($g:ident, $lhs:literal, $rhs:literal, $action:expr) => {
        $g.rule($lhs, $rhs, Box::new($action))
    };
}

macro_rules! prec_rule {
    ($g:ident, $lhs:literal, $rhs:literal, $prec:literal, $action:expr) => {
        $g.rule_prec($lhs, $rhs, $prec, Box::new($action))
    };
}

/// Declares every production of the language, in grammar order.
fn rules() -> Grammar<Action> {
    let mut g: Grammar<Action> = Grammar::new("Root");

    // Lowest binds loosest; later declarations bind tighter.
    g.left("POST_IF");
    g.right("IF ELSE FOR WHILE LOOP SUPER CLASS IMPORT EXPORT");
    g.right("FOR_IN FOR_OF BY WHEN");
    g.right("EQ COLON COMPOUND_ASSIGN RETURN THROW EXTENDS");
    g.nonassoc("INDENT OUTDENT");
    // Pseudo-token: the EXISTS tag is shared by postfix `a?` and binary
    // `a ? b`, but the binary form binds below the logic operators.
    g.left("BIN_EXISTS");
    g.left("LOGIC");
    g.left("COMPARE");
    g.left("RELATION");
    g.left("SHIFT");
    g.left("PLUS MINUS");
    g.left("MATH");
    g.right("UNARY_MATH");
    g.right("POW");
    g.right("UNARY");
    g.left("EXISTS");
    g.nonassoc("INCREMENT DECREMENT");
    g.left("CALL_START CALL_END");
    g.left("DOT QDOT");

    rule!(g, "Root", "", |_v, loc| Ok(node(NodeKind::Block(Vec::new()), loc)));
    rule!(g, "Root", "Body", pass);

    rule!(g, "Body", "Line", |mut v, loc| {
        Ok(node(NodeKind::Block(vec![v.node(0)]), loc))
    });
    rule!(g, "Body", "Body TERMINATOR Line", |mut v, loc| {
        let mut body = v.node(0);
        let line = v.node(2);
        match &mut body.kind {
            NodeKind::Block(items) => items.push(line),
            _ => unreachable!("a body is always a block"),
        }
        body.loc = loc;
        Ok(Value::Node(body))
    });
    rule!(g, "Body", "Body TERMINATOR", pass);

    rule!(g, "Line", "Expression", pass);
    rule!(g, "Line", "Statement", pass);

    rule!(g, "Statement", "Return", pass);
    rule!(g, "Statement", "STATEMENT", |mut v, loc| {
        Ok(node(NodeKind::Statement(v.token(0).value), loc))
    });
    rule!(g, "Statement", "Import", pass);
    rule!(g, "Statement", "Export", pass);

    rule!(g, "Expression", "Value", pass);
    rule!(g, "Expression", "Code", pass);
    rule!(g, "Expression", "Operation", pass);
    rule!(g, "Expression", "Assign", pass);
    rule!(g, "Expression", "If", pass);
    rule!(g, "Expression", "Try", pass);
    rule!(g, "Expression", "While", pass);
    rule!(g, "Expression", "For", pass);
    rule!(g, "Expression", "Switch", pass);
    rule!(g, "Expression", "Class", pass);
    rule!(g, "Expression", "Throw", pass);

    rule!(g, "Block", "INDENT OUTDENT", |_v, loc| {
        Ok(node(NodeKind::Block(Vec::new()), loc))
    });
    rule!(g, "Block", "INDENT Body OUTDENT", |mut v, loc| {
        let mut body = v.node(1);
        body.loc = loc;
        Ok(Value::Node(body))
    });

    // Identifier suffix markers were stripped by the scanner; `ready?`
    // becomes an existence check and `go!` a bare call.
    rule!(g, "Identifier", "IDENTIFIER", |mut v, _loc| {
        Ok(Value::Node(identifier(v.token(0))))
    });
    rule!(g, "Property", "PROPERTY", |mut v, loc| {
        Ok(node(NodeKind::Identifier(v.token(0).value), loc))
    });

    // Literals.
    rule!(g, "AlphaNumeric", "NUMBER", |mut v, loc| {
        Ok(node(NodeKind::Number(v.token(0).value), loc))
    });
    rule!(g, "AlphaNumeric", "String", pass);

    rule!(g, "String", "STRING", |mut v, loc| {
        Ok(node(NodeKind::Str(v.token(0).value), loc))
    });
    rule!(g, "String", "STRING_START Interpolations STRING_END", |mut v, loc| {
        Ok(node(NodeKind::StringInterp(v.list(1)), loc))
    });

    rule!(g, "Interpolations", "InterpolationChunk", single);
    rule!(g, "Interpolations", "Interpolations InterpolationChunk", |v, _loc| append(v, 1));

    rule!(g, "InterpolationChunk", "INTERPOLATION_START Body INTERPOLATION_END", |mut v, _loc| {
        Ok(Value::Node(unwrap_solo(v.node(1))))
    });
    rule!(g, "InterpolationChunk", "String", pass);

    rule!(g, "Regex", "REGEX", |mut v, loc| {
        Ok(node(NodeKind::Regex(v.token(0).value), loc))
    });
    rule!(g, "Regex", "REGEX_START Interpolations REGEX_END", |mut v, loc| {
        Ok(node(NodeKind::RegexInterp(v.list(1)), loc))
    });

    rule!(g, "Literal", "AlphaNumeric", pass);
    rule!(g, "Literal", "JS", |mut v, loc| {
        Ok(node(NodeKind::Js(v.token(0).value), loc))
    });
    rule!(g, "Literal", "Regex", pass);
    rule!(g, "Literal", "BOOL", |mut v, loc| {
        let truthy = v.token(0).value == "true";
        Ok(node(NodeKind::Bool(truthy), loc))
    });
    rule!(g, "Literal", "NULL", |_v, loc| Ok(node(NodeKind::Null, loc)));
    rule!(g, "Literal", "UNDEFINED", |_v, loc| Ok(node(NodeKind::Undefined, loc)));

    // Assignment.
    rule!(g, "Assign", "Assignable EQ Expression", |v, loc| assign(v, 2, loc));
    rule!(g, "Assign", "Assignable EQ TERMINATOR Expression", |v, loc| assign(v, 3, loc));
    rule!(g, "Assign", "Assignable EQ INDENT Expression OUTDENT", |v, loc| assign(v, 3, loc));

    // Object members.
    rule!(g, "AssignObj", "ObjAssignable", |mut v, _loc| {
        Ok(Value::Node(to_prop(v.node(0))))
    });
    rule!(g, "AssignObj", "ObjAssignable COLON Expression", |v, loc| prop_value(v, 2, loc));
    rule!(g, "AssignObj", "ObjAssignable COLON INDENT Expression OUTDENT", |v, loc| {
        prop_value(v, 3, loc)
    });
    rule!(g, "AssignObj", "Splat", pass);

    rule!(g, "SimpleObjAssignable", "Identifier", pass);
    rule!(g, "SimpleObjAssignable", "Property", pass);
    rule!(g, "SimpleObjAssignable", "ThisProperty", pass);

    rule!(g, "ObjAssignable", "SimpleObjAssignable", pass);
    rule!(g, "ObjAssignable", "L_BRACK Expression R_BRACK", |mut v, loc| {
        Ok(node(
            NodeKind::Prop { key: Box::new(v.node(1)), value: None, computed: true },
            loc,
        ))
    });

    rule!(g, "Return", "RETURN Expression", |mut v, loc| {
        Ok(node(NodeKind::Return(Some(Box::new(v.node(1)))), loc))
    });
    rule!(g, "Return", "RETURN", |_v, loc| Ok(node(NodeKind::Return(None), loc)));

    // Functions.
    rule!(g, "Code", "PARAM_START ParamList PARAM_END FuncGlyph Block", |mut v, loc| {
        let bound = v.token(3).is(SyntaxKind::FAT_ARROW);
        Ok(node(
            NodeKind::Func { params: v.list(1), body: Box::new(v.node(4)), bound },
            loc,
        ))
    });
    rule!(g, "Code", "FuncGlyph Block", |mut v, loc| {
        let bound = v.token(0).is(SyntaxKind::FAT_ARROW);
        Ok(node(
            NodeKind::Func { params: Vec::new(), body: Box::new(v.node(1)), bound },
            loc,
        ))
    });

    rule!(g, "FuncGlyph", "ARROW", pass);
    rule!(g, "FuncGlyph", "FAT_ARROW", pass);

    rule!(g, "OptComma", "", nothing);
    rule!(g, "OptComma", "COMMA", nothing);

    rule!(g, "ParamList", "", empty_list);
    rule!(g, "ParamList", "Param", single);
    rule!(g, "ParamList", "ParamList COMMA Param", |v, _loc| append(v, 2));
    rule!(g, "ParamList", "ParamList OptComma TERMINATOR Param", |v, _loc| append(v, 3));
    rule!(g, "ParamList", "ParamList OptComma INDENT ParamList OptComma OUTDENT", |v, _loc| {
        concat(v, 3)
    });

    rule!(g, "Param", "ParamVar", |mut v, loc| {
        Ok(node(
            NodeKind::Param { name: Box::new(v.node(0)), default: None, splat: false },
            loc,
        ))
    });
    rule!(g, "Param", "ParamVar DOT3", |mut v, loc| {
        Ok(node(
            NodeKind::Param { name: Box::new(v.node(0)), default: None, splat: true },
            loc,
        ))
    });
    rule!(g, "Param", "ParamVar EQ Expression", |mut v, loc| {
        Ok(node(
            NodeKind::Param {
                name: Box::new(v.node(0)),
                default: Some(Box::new(v.node(2))),
                splat: false,
            },
            loc,
        ))
    });

    rule!(g, "ParamVar", "Identifier", pass);
    rule!(g, "ParamVar", "ThisProperty", pass);
    rule!(g, "ParamVar", "Array", pass);
    rule!(g, "ParamVar", "Object", pass);

    rule!(g, "Splat", "DOT3 Expression", |mut v, loc| {
        Ok(node(NodeKind::Splat(Box::new(v.node(1))), loc))
    });
    rule!(g, "Splat", "Expression DOT3", |mut v, loc| {
        Ok(node(NodeKind::Splat(Box::new(v.node(0))), loc))
    });

    // Values and access chains.
    rule!(g, "SimpleAssignable", "Identifier", pass);
    rule!(g, "SimpleAssignable", "Value Accessor", |mut v, loc| {
        let base = v.node(0);
        let mut acc = v.node(1);
        match &mut acc.kind {
            NodeKind::Access { target, .. } | NodeKind::Index { target, .. } => {
                *target = Box::new(base);
            }
            _ => unreachable!("an accessor attaches to a value"),
        }
        acc.loc = loc;
        Ok(Value::Node(acc))
    });
    rule!(g, "SimpleAssignable", "ThisProperty", pass);

    rule!(g, "Assignable", "SimpleAssignable", pass);
    rule!(g, "Assignable", "Array", pass);
    rule!(g, "Assignable", "Object", pass);

    rule!(g, "Value", "Assignable", pass);
    rule!(g, "Value", "Literal", pass);
    rule!(g, "Value", "Parenthetical", pass);
    rule!(g, "Value", "Range", pass);
    rule!(g, "Value", "Invocation", pass);
    rule!(g, "Value", "This", pass);

    rule!(g, "Accessor", "DOT Property", |v, loc| accessor(v, false, loc));
    rule!(g, "Accessor", "QDOT Property", |v, loc| accessor(v, true, loc));
    rule!(g, "Accessor", "Index", pass);

    rule!(g, "Index", "INDEX_START Expression INDEX_END", |mut v, loc| {
        Ok(node(
            NodeKind::Index { target: empty_block(loc), index: Box::new(v.node(1)) },
            loc,
        ))
    });

    rule!(g, "Object", "L_CURLY AssignList OptComma R_CURLY", |mut v, loc| {
        Ok(node(NodeKind::Object(v.list(1)), loc))
    });

    rule!(g, "AssignList", "", empty_list);
    rule!(g, "AssignList", "AssignObj", single);
    rule!(g, "AssignList", "AssignList COMMA AssignObj", |v, _loc| append(v, 2));
    rule!(g, "AssignList", "AssignList OptComma TERMINATOR AssignObj", |v, _loc| append(v, 3));
    rule!(g, "AssignList", "AssignList OptComma INDENT AssignList OptComma OUTDENT", |v, _loc| {
        concat(v, 3)
    });

    rule!(g, "This", "THIS", |_v, loc| Ok(node(NodeKind::ThisRef, loc)));
    rule!(g, "This", "AT", |_v, loc| Ok(node(NodeKind::ThisRef, loc)));

    rule!(g, "ThisProperty", "AT Property", |mut v, loc| {
        let at = v.token(0);
        let name = match v.node(1).kind {
            NodeKind::Identifier(name) => name,
            _ => unreachable!("a property is always a name"),
        };
        Ok(node(
            NodeKind::Access {
                target: Box::new(Node::new(NodeKind::ThisRef, at.loc)),
                name,
                soak: false,
            },
            loc,
        ))
    });

    rule!(g, "Array", "L_BRACK R_BRACK", |_v, loc| {
        Ok(node(NodeKind::Array(Vec::new()), loc))
    });
    rule!(g, "Array", "L_BRACK ArgList OptComma R_BRACK", |mut v, loc| {
        Ok(node(NodeKind::Array(v.list(1)), loc))
    });

    rule!(g, "RangeDots", "DOT2", pass);
    rule!(g, "RangeDots", "DOT3", pass);

    rule!(g, "Range", "L_BRACK Expression RangeDots Expression R_BRACK", |mut v, loc| {
        let exclusive = v.token(2).is(SyntaxKind::DOT3);
        Ok(node(
            NodeKind::Range {
                from: Box::new(v.node(1)),
                to: Box::new(v.node(3)),
                exclusive,
            },
            loc,
        ))
    });

    rule!(g, "ArgList", "Arg", single);
    rule!(g, "ArgList", "ArgList COMMA Arg", |v, _loc| append(v, 2));
    rule!(g, "ArgList", "ArgList OptComma TERMINATOR Arg", |v, _loc| append(v, 3));
    rule!(g, "ArgList", "INDENT ArgList OptComma OUTDENT", |mut v, _loc| {
        Ok(Value::List(v.list(1)))
    });
    rule!(g, "ArgList", "ArgList OptComma INDENT ArgList OptComma OUTDENT", |v, _loc| {
        concat(v, 3)
    });

    rule!(g, "Arg", "Expression", pass);
    rule!(g, "Arg", "Splat", pass);

    // Calls.
    rule!(g, "Invocation", "Value Arguments", |mut v, loc| {
        Ok(node(
            NodeKind::Call { target: Box::new(v.node(0)), args: v.list(1) },
            loc,
        ))
    });
    rule!(g, "Invocation", "SUPER Arguments", |mut v, loc| {
        Ok(node(NodeKind::SuperCall { args: v.list(1) }, loc))
    });

    rule!(g, "Arguments", "CALL_START CALL_END", empty_list);
    rule!(g, "Arguments", "CALL_START ArgList OptComma CALL_END", |mut v, _loc| {
        Ok(Value::List(v.list(1)))
    });

    rule!(g, "SimpleArgs", "Expression", single);
    rule!(g, "SimpleArgs", "SimpleArgs COMMA Expression", |v, _loc| append(v, 2));

    // Exceptions.
    rule!(g, "Try", "TRY Block", |mut v, loc| {
        Ok(node(
            NodeKind::Try {
                body: Box::new(v.node(1)),
                catch_param: None,
                catch_body: None,
                finally: None,
            },
            loc,
        ))
    });
    rule!(g, "Try", "TRY Block Catch", |mut v, loc| {
        let body = v.node(1);
        match v.node(2).kind {
            NodeKind::Try { catch_param, catch_body, .. } => Ok(node(
                NodeKind::Try { body: Box::new(body), catch_param, catch_body, finally: None },
                loc,
            )),
            _ => unreachable!("a catch clause"),
        }
    });
    rule!(g, "Try", "TRY Block FINALLY Block", |mut v, loc| {
        Ok(node(
            NodeKind::Try {
                body: Box::new(v.node(1)),
                catch_param: None,
                catch_body: None,
                finally: Some(Box::new(v.node(3))),
            },
            loc,
        ))
    });
    rule!(g, "Try", "TRY Block Catch FINALLY Block", |mut v, loc| {
        let body = v.node(1);
        let catch = v.node(2);
        let finally = v.node(4);
        match catch.kind {
            NodeKind::Try { catch_param, catch_body, .. } => Ok(node(
                NodeKind::Try {
                    body: Box::new(body),
                    catch_param,
                    catch_body,
                    finally: Some(Box::new(finally)),
                },
                loc,
            )),
            _ => unreachable!("a catch clause"),
        }
    });

    // A catch clause rides in a try node with an empty body until the
    // enclosing try attaches it.
    rule!(g, "Catch", "CATCH Identifier Block", |mut v, loc| {
        Ok(node(
            NodeKind::Try {
                body: empty_block(loc),
                catch_param: Some(Box::new(v.node(1))),
                catch_body: Some(Box::new(v.node(2))),
                finally: None,
            },
            loc,
        ))
    });
    rule!(g, "Catch", "CATCH Block", |mut v, loc| {
        Ok(node(
            NodeKind::Try {
                body: empty_block(loc),
                catch_param: None,
                catch_body: Some(Box::new(v.node(1))),
                finally: None,
            },
            loc,
        ))
    });

    rule!(g, "Throw", "THROW Expression", |mut v, loc| {
        Ok(node(NodeKind::Throw(Box::new(v.node(1))), loc))
    });

    rule!(g, "Parenthetical", "L_PAREN Body R_PAREN", |mut v, loc| {
        Ok(node(NodeKind::Parens(Box::new(unwrap_solo(v.node(1)))), loc))
    });
    rule!(g, "Parenthetical", "L_PAREN INDENT Body OUTDENT R_PAREN", |mut v, loc| {
        Ok(node(NodeKind::Parens(Box::new(unwrap_solo(v.node(2)))), loc))
    });

    // Loops. `until` arrives as a WHILE token flagged inverted.
    rule!(g, "WhileSource", "WHILE Expression", while_source);
    rule!(g, "WhileSource", "WHILE Expression WHEN Expression", while_source);

    rule!(g, "While", "WhileSource Block", attach_body);
    rule!(g, "While", "Statement WhileSource", postfix_body);
    rule!(g, "While", "Expression WhileSource", postfix_body);
    rule!(g, "While", "Loop", pass);

    rule!(g, "Loop", "LOOP Block", |mut v, loc| {
        Ok(node(
            NodeKind::While {
                condition: None,
                guard: None,
                body: Box::new(v.node(1)),
                invert: false,
                postfix: false,
            },
            loc,
        ))
    });
    rule!(g, "Loop", "LOOP Expression", |mut v, loc| {
        let expr = v.node(1);
        let expr_loc = expr.loc;
        Ok(node(
            NodeKind::While {
                condition: None,
                guard: None,
                body: Box::new(Node::new(NodeKind::Block(vec![expr]), expr_loc)),
                invert: false,
                postfix: false,
            },
            loc,
        ))
    });

    rule!(g, "For", "Statement ForBody", postfix_body);
    rule!(g, "For", "Expression ForBody", postfix_body);
    rule!(g, "For", "ForBody Block", attach_body);

    // The two halves of a for loop carry their fields in placeholder
    // nodes; ForBody merges them.
    rule!(g, "ForBody", "ForStart ForSource", |mut v, loc| {
        let start = v.node(0);
        let src = v.node(1);
        match (start.kind, src.kind) {
            (
                NodeKind::For { name, index, own, .. },
                NodeKind::For { source, guard, step, object, body, postfix, .. },
            ) => Ok(node(
                NodeKind::For { name, index, source, guard, step, object, own, body, postfix },
                loc,
            )),
            _ => unreachable!("for loop halves"),
        }
    });

    rule!(g, "ForStart", "FOR ForVariables", |mut v, loc| for_start(v.list(1), false, loc));
    rule!(g, "ForStart", "FOR OWN ForVariables", |mut v, loc| for_start(v.list(2), true, loc));

    rule!(g, "ForValue", "Identifier", pass);
    rule!(g, "ForValue", "ThisProperty", pass);
    rule!(g, "ForValue", "Array", pass);
    rule!(g, "ForValue", "Object", pass);

    rule!(g, "ForVariables", "ForValue", single);
    rule!(g, "ForVariables", "ForValue COMMA ForValue", |mut v, _loc| {
        Ok(Value::List(vec![v.node(0), v.node(2)]))
    });

    rule!(g, "ForSource", "FOR_IN Expression", |v, loc| for_source(v, loc, false, None, None));
    rule!(g, "ForSource", "FOR_OF Expression", |v, loc| for_source(v, loc, true, None, None));
    rule!(g, "ForSource", "FOR_IN Expression WHEN Expression", |v, loc| {
        for_source(v, loc, false, Some(3), None)
    });
    rule!(g, "ForSource", "FOR_IN Expression BY Expression", |v, loc| {
        for_source(v, loc, false, None, Some(3))
    });
    rule!(g, "ForSource", "FOR_IN Expression WHEN Expression BY Expression", |v, loc| {
        for_source(v, loc, false, Some(3), Some(5))
    });
    rule!(g, "ForSource", "FOR_IN Expression BY Expression WHEN Expression", |v, loc| {
        for_source(v, loc, false, Some(5), Some(3))
    });
    rule!(g, "ForSource", "FOR_OF Expression WHEN Expression", |v, loc| {
        for_source(v, loc, true, Some(3), None)
    });

    rule!(g, "Switch", "SWITCH Expression INDENT Whens OUTDENT", |mut v, loc| {
        Ok(node(
            NodeKind::Switch {
                subject: Some(Box::new(v.node(1))),
                whens: v.list(3),
                otherwise: None,
            },
            loc,
        ))
    });
    rule!(g, "Switch", "SWITCH Expression INDENT Whens ELSE Block OUTDENT", |mut v, loc| {
        Ok(node(
            NodeKind::Switch {
                subject: Some(Box::new(v.node(1))),
                whens: v.list(3),
                otherwise: Some(Box::new(v.node(5))),
            },
            loc,
        ))
    });
    rule!(g, "Switch", "SWITCH INDENT Whens OUTDENT", |mut v, loc| {
        Ok(node(
            NodeKind::Switch { subject: None, whens: v.list(2), otherwise: None },
            loc,
        ))
    });
    rule!(g, "Switch", "SWITCH INDENT Whens ELSE Block OUTDENT", |mut v, loc| {
        Ok(node(
            NodeKind::Switch {
                subject: None,
                whens: v.list(2),
                otherwise: Some(Box::new(v.node(4))),
            },
            loc,
        ))
    });

    rule!(g, "Whens", "When", single);
    rule!(g, "Whens", "Whens When", |v, _loc| append(v, 1));

    rule!(g, "When", "LEADING_WHEN SimpleArgs Block", when_arm);
    rule!(g, "When", "LEADING_WHEN SimpleArgs Block TERMINATOR", when_arm);

    // Conditionals. `unless` arrives as an IF token flagged inverted.
    rule!(g, "IfBlock", "IF Expression Block", |mut v, loc| {
        let invert = v.token(0).data().map_or(false, |d| d.invert);
        Ok(node(
            NodeKind::If {
                condition: Box::new(v.node(1)),
                then: Box::new(v.node(2)),
                otherwise: None,
                invert,
                postfix: false,
            },
            loc,
        ))
    });
    rule!(g, "IfBlock", "IfBlock ELSE IF Expression Block", |mut v, loc| {
        let mut chain = v.node(0);
        let if_tok = v.token(2);
        let invert = if_tok.data().map_or(false, |d| d.invert);
        let cond = v.node(3);
        let body = v.node(4);
        let inner_loc = span_of(if_tok.loc, body.loc);
        add_else(
            &mut chain,
            Node::new(
                NodeKind::If {
                    condition: Box::new(cond),
                    then: Box::new(body),
                    otherwise: None,
                    invert,
                    postfix: false,
                },
                inner_loc,
            ),
        );
        chain.loc = loc;
        Ok(Value::Node(chain))
    });

    rule!(g, "If", "IfBlock", pass);
    rule!(g, "If", "IfBlock ELSE Block", |mut v, loc| {
        let mut chain = v.node(0);
        add_else(&mut chain, v.node(2));
        chain.loc = loc;
        Ok(Value::Node(chain))
    });
    rule!(g, "If", "Statement POST_IF Expression", postfix_if);
    rule!(g, "If", "Expression POST_IF Expression", postfix_if);

    rule!(g, "Class", "CLASS", |_v, loc| {
        Ok(node(NodeKind::Class { name: None, parent: None, body: None }, loc))
    });
    rule!(g, "Class", "CLASS Block", |mut v, loc| {
        Ok(node(
            NodeKind::Class { name: None, parent: None, body: Some(Box::new(v.node(1))) },
            loc,
        ))
    });
    rule!(g, "Class", "CLASS EXTENDS Expression", |mut v, loc| {
        Ok(node(
            NodeKind::Class { name: None, parent: Some(Box::new(v.node(2))), body: None },
            loc,
        ))
    });
    rule!(g, "Class", "CLASS EXTENDS Expression Block", |mut v, loc| {
        Ok(node(
            NodeKind::Class {
                name: None,
                parent: Some(Box::new(v.node(2))),
                body: Some(Box::new(v.node(3))),
            },
            loc,
        ))
    });
    rule!(g, "Class", "CLASS SimpleAssignable", |mut v, loc| {
        Ok(node(
            NodeKind::Class { name: Some(Box::new(v.node(1))), parent: None, body: None },
            loc,
        ))
    });
    rule!(g, "Class", "CLASS SimpleAssignable Block", |mut v, loc| {
        Ok(node(
            NodeKind::Class {
                name: Some(Box::new(v.node(1))),
                parent: None,
                body: Some(Box::new(v.node(2))),
            },
            loc,
        ))
    });
    rule!(g, "Class", "CLASS SimpleAssignable EXTENDS Expression", |mut v, loc| {
        Ok(node(
            NodeKind::Class {
                name: Some(Box::new(v.node(1))),
                parent: Some(Box::new(v.node(3))),
                body: None,
            },
            loc,
        ))
    });
    rule!(g, "Class", "CLASS SimpleAssignable EXTENDS Expression Block", |mut v, loc| {
        Ok(node(
            NodeKind::Class {
                name: Some(Box::new(v.node(1))),
                parent: Some(Box::new(v.node(3))),
                body: Some(Box::new(v.node(4))),
            },
            loc,
        ))
    });

    // Modules.
    rule!(g, "Import", "IMPORT String", |mut v, loc| {
        Ok(node(
            NodeKind::Import {
                default: None,
                namespace: None,
                names: None,
                source: Box::new(v.node(1)),
            },
            loc,
        ))
    });
    rule!(g, "Import", "IMPORT ImportDefaultSpecifier FROM String", |mut v, loc| {
        Ok(node(
            NodeKind::Import {
                default: Some(Box::new(v.node(1))),
                namespace: None,
                names: None,
                source: Box::new(v.node(3)),
            },
            loc,
        ))
    });
    rule!(g, "Import", "IMPORT ImportNamespaceSpecifier FROM String", |mut v, loc| {
        Ok(node(
            NodeKind::Import {
                default: None,
                namespace: Some(Box::new(v.node(1))),
                names: None,
                source: Box::new(v.node(3)),
            },
            loc,
        ))
    });
    rule!(g, "Import", "IMPORT L_CURLY R_CURLY FROM String", |mut v, loc| {
        Ok(node(
            NodeKind::Import {
                default: None,
                namespace: None,
                names: Some(Vec::new()),
                source: Box::new(v.node(4)),
            },
            loc,
        ))
    });
    rule!(
        g,
        "Import",
        "IMPORT L_CURLY ImportSpecifierList OptComma R_CURLY FROM String",
        |mut v, loc| {
            Ok(node(
                NodeKind::Import {
                    default: None,
                    namespace: None,
                    names: Some(v.list(2)),
                    source: Box::new(v.node(6)),
                },
                loc,
            ))
        }
    );
    rule!(
        g,
        "Import",
        "IMPORT ImportDefaultSpecifier COMMA ImportNamespaceSpecifier FROM String",
        |mut v, loc| {
            Ok(node(
                NodeKind::Import {
                    default: Some(Box::new(v.node(1))),
                    namespace: Some(Box::new(v.node(3))),
                    names: None,
                    source: Box::new(v.node(5)),
                },
                loc,
            ))
        }
    );
    rule!(
        g,
        "Import",
        "IMPORT ImportDefaultSpecifier COMMA L_CURLY ImportSpecifierList OptComma R_CURLY FROM String",
        |mut v, loc| {
            Ok(node(
                NodeKind::Import {
                    default: Some(Box::new(v.node(1))),
                    namespace: None,
                    names: Some(v.list(4)),
                    source: Box::new(v.node(8)),
                },
                loc,
            ))
        }
    );

    rule!(g, "ImportSpecifierList", "ImportSpecifier", single);
    rule!(g, "ImportSpecifierList", "ImportSpecifierList COMMA ImportSpecifier", |v, _loc| {
        append(v, 2)
    });
    rule!(
        g,
        "ImportSpecifierList",
        "ImportSpecifierList OptComma TERMINATOR ImportSpecifier",
        |v, _loc| append(v, 3)
    );
    rule!(g, "ImportSpecifierList", "INDENT ImportSpecifierList OptComma OUTDENT", |mut v, _loc| {
        Ok(Value::List(v.list(1)))
    });
    rule!(
        g,
        "ImportSpecifierList",
        "ImportSpecifierList OptComma INDENT ImportSpecifierList OptComma OUTDENT",
        |v, _loc| concat(v, 3)
    );

    rule!(g, "ImportSpecifier", "Identifier", |mut v, loc| {
        Ok(node(NodeKind::ImportSpec { name: Box::new(v.node(0)), alias: None }, loc))
    });
    rule!(g, "ImportSpecifier", "Identifier AS Identifier", |mut v, loc| {
        Ok(node(
            NodeKind::ImportSpec {
                name: Box::new(v.node(0)),
                alias: Some(Box::new(v.node(2))),
            },
            loc,
        ))
    });
    rule!(g, "ImportSpecifier", "DEFAULT", |mut v, loc| {
        let tok = v.token(0);
        Ok(node(
            NodeKind::ImportSpec {
                name: Box::new(Node::new(NodeKind::Identifier(tok.value), tok.loc)),
                alias: None,
            },
            loc,
        ))
    });
    rule!(g, "ImportSpecifier", "DEFAULT AS Identifier", |mut v, loc| {
        let tok = v.token(0);
        Ok(node(
            NodeKind::ImportSpec {
                name: Box::new(Node::new(NodeKind::Identifier(tok.value), tok.loc)),
                alias: Some(Box::new(v.node(2))),
            },
            loc,
        ))
    });

    rule!(g, "ImportDefaultSpecifier", "Identifier", pass);

    rule!(g, "ImportNamespaceSpecifier", "IMPORT_ALL AS Identifier", |mut v, loc| {
        let star = v.token(0);
        Ok(node(
            NodeKind::ImportSpec {
                name: Box::new(Node::new(NodeKind::Identifier(star.value), star.loc)),
                alias: Some(Box::new(v.node(2))),
            },
            loc,
        ))
    });

    rule!(g, "Export", "EXPORT L_CURLY R_CURLY", |_v, loc| {
        Ok(node(NodeKind::ExportNamed { specs: Vec::new(), source: None }, loc))
    });
    rule!(g, "Export", "EXPORT L_CURLY ExportSpecifierList OptComma R_CURLY", |mut v, loc| {
        Ok(node(NodeKind::ExportNamed { specs: v.list(2), source: None }, loc))
    });
    rule!(g, "Export", "EXPORT Class", |mut v, loc| {
        Ok(node(NodeKind::ExportDecl(Box::new(v.node(1))), loc))
    });
    rule!(g, "Export", "EXPORT Identifier EQ Expression", |v, loc| export_assign(v, 3, loc));
    rule!(g, "Export", "EXPORT Identifier EQ INDENT Expression OUTDENT", |v, loc| {
        export_assign(v, 4, loc)
    });
    rule!(g, "Export", "EXPORT DEFAULT Expression", |mut v, loc| {
        Ok(node(NodeKind::ExportDefault(Box::new(v.node(2))), loc))
    });
    rule!(g, "Export", "EXPORT EXPORT_ALL FROM String", |mut v, loc| {
        Ok(node(NodeKind::ExportAll { source: Box::new(v.node(3)) }, loc))
    });
    rule!(
        g,
        "Export",
        "EXPORT L_CURLY ExportSpecifierList OptComma R_CURLY FROM String",
        |mut v, loc| {
            Ok(node(
                NodeKind::ExportNamed { specs: v.list(2), source: Some(Box::new(v.node(6))) },
                loc,
            ))
        }
    );

    rule!(g, "ExportSpecifierList", "ExportSpecifier", single);
    rule!(g, "ExportSpecifierList", "ExportSpecifierList COMMA ExportSpecifier", |v, _loc| {
        append(v, 2)
    });
    rule!(
        g,
        "ExportSpecifierList",
        "ExportSpecifierList OptComma TERMINATOR ExportSpecifier",
        |v, _loc| append(v, 3)
    );
    rule!(g, "ExportSpecifierList", "INDENT ExportSpecifierList OptComma OUTDENT", |mut v, _loc| {
        Ok(Value::List(v.list(1)))
    });
    rule!(
        g,
        "ExportSpecifierList",
        "ExportSpecifierList OptComma INDENT ExportSpecifierList OptComma OUTDENT",
        |v, _loc| concat(v, 3)
    );

    rule!(g, "ExportSpecifier", "Identifier", |mut v, loc| {
        Ok(node(NodeKind::ImportSpec { name: Box::new(v.node(0)), alias: None }, loc))
    });
    rule!(g, "ExportSpecifier", "Identifier AS Identifier", |mut v, loc| {
        Ok(node(
            NodeKind::ImportSpec {
                name: Box::new(v.node(0)),
                alias: Some(Box::new(v.node(2))),
            },
            loc,
        ))
    });

    // Operators.
    rule!(g, "Operation", "UNARY Expression", unary);
    rule!(g, "Operation", "UNARY_MATH Expression", unary);
    prec_rule!(g, "Operation", "MINUS Expression", "UNARY_MATH", unary);
    prec_rule!(g, "Operation", "PLUS Expression", "UNARY_MATH", unary);

    rule!(g, "Operation", "INCREMENT SimpleAssignable", prefix_crement);
    rule!(g, "Operation", "DECREMENT SimpleAssignable", prefix_crement);
    rule!(g, "Operation", "SimpleAssignable INCREMENT", postfix_crement);
    rule!(g, "Operation", "SimpleAssignable DECREMENT", postfix_crement);

    rule!(g, "Operation", "Expression EXISTS", |mut v, loc| {
        Ok(node(NodeKind::Existence(Box::new(v.node(0))), loc))
    });

    rule!(g, "Operation", "Expression PLUS Expression", binary);
    rule!(g, "Operation", "Expression MINUS Expression", binary);
    rule!(g, "Operation", "Expression MATH Expression", binary);
    rule!(g, "Operation", "Expression POW Expression", binary);
    rule!(g, "Operation", "Expression SHIFT Expression", binary);
    rule!(g, "Operation", "Expression COMPARE Expression", binary);
    rule!(g, "Operation", "Expression LOGIC Expression", binary);
    rule!(g, "Operation", "Expression RELATION Expression", relation);
    prec_rule!(g, "Operation", "Expression EXISTS Expression", "BIN_EXISTS", binary);

    rule!(g, "Operation", "SimpleAssignable COMPOUND_ASSIGN Expression", |v, loc| {
        assign(v, 2, loc)
    });
    rule!(g, "Operation", "SimpleAssignable COMPOUND_ASSIGN INDENT Expression OUTDENT", |v, loc| {
        assign(v, 3, loc)
    });

    g
}

fn node(kind: NodeKind, loc: Loc) -> Value {
    Value::Node(Node::new(kind, loc))
}

fn empty_block(loc: Loc) -> Box<Node> {
    Box::new(Node::new(NodeKind::Block(Vec::new()), loc))
}

/// A span running from the start of `first` to the end of `last`.
fn span_of(first: Loc, last: Loc) -> Loc {
    Loc { len: (last.offset + last.len).saturating_sub(first.offset), ..first }
}

/// `$1` unchanged.
fn pass(mut v: Vec<Value>, _loc: Loc) -> Result<Value, SyntaxError> {
    Ok(v.remove(0))
}

/// For productions whose value nothing ever reads.
fn nothing(_v: Vec<Value>, _loc: Loc) -> Result<Value, SyntaxError> {
    Ok(Value::Taken)
}

fn empty_list(_v: Vec<Value>, _loc: Loc) -> Result<Value, SyntaxError> {
    Ok(Value::List(Vec::new()))
}

/// A one-element list from `$1`.
fn single(mut v: Vec<Value>, _loc: Loc) -> Result<Value, SyntaxError> {
    Ok(Value::List(vec![v.node(0)]))
}

/// Pushes the node at `at` onto the list in `$1`.
fn append(mut v: Vec<Value>, at: usize) -> Result<Value, SyntaxError> {
    let mut items = v.list(0);
    items.push(v.node(at));
    Ok(Value::List(items))
}

/// Joins the list at `at` onto the list in `$1`.
fn concat(mut v: Vec<Value>, at: usize) -> Result<Value, SyntaxError> {
    let mut items = v.list(0);
    items.extend(v.list(at));
    Ok(Value::List(items))
}

/// An identifier with its scanner-stripped suffix markers applied:
/// `go!` calls, `ready?` tests existence, `go!?` does both.
fn identifier(token: Token) -> Node {
    let loc = token.loc;
    let question = token.data().map_or(false, |d| d.question);
    let exclaim = token.data().map_or(false, |d| d.exclaim);
    let mut out = Node::new(NodeKind::Identifier(token.value), loc);
    if exclaim {
        out = Node::new(NodeKind::Call { target: Box::new(out), args: Vec::new() }, loc);
    }
    if question {
        out = Node::new(NodeKind::Existence(Box::new(out)), loc);
    }
    out
}

/// Reframes an assignment key as an object member; computed keys already
/// arrive as one.
fn to_prop(n: Node) -> Node {
    match &n.kind {
        NodeKind::Prop { .. } => n,
        _ => {
            let loc = n.loc;
            Node::new(NodeKind::Prop { key: Box::new(n), value: None, computed: false }, loc)
        }
    }
}

fn prop_value(mut v: Vec<Value>, at: usize, loc: Loc) -> Result<Value, SyntaxError> {
    let mut prop = to_prop(v.node(0));
    let value = v.node(at);
    match &mut prop.kind {
        NodeKind::Prop { value: slot, .. } => *slot = Some(Box::new(value)),
        _ => unreachable!("an object member is always a prop"),
    }
    prop.loc = loc;
    Ok(Value::Node(prop))
}

fn assign(mut v: Vec<Value>, at: usize, loc: Loc) -> Result<Value, SyntaxError> {
    let target = v.node(0);
    let op = v.token(1);
    Ok(node(
        NodeKind::Assign {
            target: Box::new(target),
            op: op.value,
            value: Box::new(v.node(at)),
        },
        loc,
    ))
}

fn export_assign(mut v: Vec<Value>, at: usize, loc: Loc) -> Result<Value, SyntaxError> {
    let target = v.node(1);
    let op = v.token(2);
    let value = v.node(at);
    let assign_loc = span_of(target.loc, value.loc);
    Ok(node(
        NodeKind::ExportDecl(Box::new(Node::new(
            NodeKind::Assign {
                target: Box::new(target),
                op: op.value,
                value: Box::new(value),
            },
            assign_loc,
        ))),
        loc,
    ))
}

fn accessor(mut v: Vec<Value>, soak: bool, loc: Loc) -> Result<Value, SyntaxError> {
    let name = match v.node(1).kind {
        NodeKind::Identifier(name) => name,
        _ => unreachable!("a property is always a name"),
    };
    Ok(node(NodeKind::Access { target: empty_block(loc), name, soak }, loc))
}

/// A block containing `body`, unless it already holds exactly one line,
/// in which case that line stands alone.
fn unwrap_solo(mut body: Node) -> Node {
    let solo = match &mut body.kind {
        NodeKind::Block(items) if items.len() == 1 => items.pop(),
        _ => None,
    };
    solo.unwrap_or(body)
}

fn when_arm(mut v: Vec<Value>, loc: Loc) -> Result<Value, SyntaxError> {
    Ok(node(NodeKind::When { conditions: v.list(1), body: Box::new(v.node(2)) }, loc))
}

fn while_source(mut v: Vec<Value>, loc: Loc) -> Result<Value, SyntaxError> {
    let invert = v.token(0).data().map_or(false, |d| d.invert);
    let guard = if v.len() > 2 { Some(Box::new(v.node(3))) } else { None };
    Ok(node(
        NodeKind::While {
            condition: Some(Box::new(v.node(1))),
            guard,
            body: empty_block(loc),
            invert,
            postfix: false,
        },
        loc,
    ))
}

/// Fills the body slot of a loop head with a block.
fn attach_body(mut v: Vec<Value>, loc: Loc) -> Result<Value, SyntaxError> {
    let mut head = v.node(0);
    let body = v.node(1);
    match &mut head.kind {
        NodeKind::While { body: slot, .. } | NodeKind::For { body: slot, .. } => {
            *slot = Box::new(body);
        }
        _ => unreachable!("a block attaches to a loop"),
    }
    head.loc = loc;
    Ok(Value::Node(head))
}

/// `stmt while cond` and friends: the leading statement becomes the body.
fn postfix_body(mut v: Vec<Value>, loc: Loc) -> Result<Value, SyntaxError> {
    let stmt = v.node(0);
    let stmt_loc = stmt.loc;
    let mut head = v.node(1);
    match &mut head.kind {
        NodeKind::While { body, postfix, .. } | NodeKind::For { body, postfix, .. } => {
            *body = Box::new(Node::new(NodeKind::Block(vec![stmt]), stmt_loc));
            *postfix = true;
        }
        _ => unreachable!("a postfix body attaches to a loop"),
    }
    head.loc = loc;
    Ok(Value::Node(head))
}

fn for_start(mut vars: Vec<Node>, own: bool, loc: Loc) -> Result<Value, SyntaxError> {
    let name = Box::new(vars.remove(0));
    let index = vars.pop().map(Box::new);
    Ok(node(
        NodeKind::For {
            name,
            index,
            source: empty_block(loc),
            guard: None,
            step: None,
            object: false,
            own,
            body: empty_block(loc),
            postfix: false,
        },
        loc,
    ))
}

fn for_source(
    mut v: Vec<Value>,
    loc: Loc,
    object: bool,
    guard_at: Option<usize>,
    step_at: Option<usize>,
) -> Result<Value, SyntaxError> {
    let source = Box::new(v.node(1));
    let guard = guard_at.map(|i| Box::new(v.node(i)));
    let step = step_at.map(|i| Box::new(v.node(i)));
    Ok(node(
        NodeKind::For {
            name: empty_block(loc),
            index: None,
            source,
            guard,
            step,
            object,
            own: false,
            body: empty_block(loc),
            postfix: false,
        },
        loc,
    ))
}

/// Hangs `alt` off the innermost else slot of an if chain.
fn add_else(target: &mut Node, alt: Node) {
    match &mut target.kind {
        NodeKind::If { otherwise, .. } => match otherwise {
            Some(inner) => add_else(inner, alt),
            None => *otherwise = Some(Box::new(alt)),
        },
        _ => unreachable!("an else attaches to an if"),
    }
}

fn postfix_if(mut v: Vec<Value>, loc: Loc) -> Result<Value, SyntaxError> {
    let body = v.node(0);
    let body_loc = body.loc;
    let invert = v.token(1).data().map_or(false, |d| d.invert);
    Ok(node(
        NodeKind::If {
            condition: Box::new(v.node(2)),
            then: Box::new(Node::new(NodeKind::Block(vec![body]), body_loc)),
            otherwise: None,
            invert,
            postfix: true,
        },
        loc,
    ))
}

fn unary(mut v: Vec<Value>, loc: Loc) -> Result<Value, SyntaxError> {
    let op = v.token(0);
    Ok(node(NodeKind::Unary { op: op.value, operand: Box::new(v.node(1)) }, loc))
}

fn binary(mut v: Vec<Value>, loc: Loc) -> Result<Value, SyntaxError> {
    let lhs = v.node(0);
    let op = v.token(1);
    Ok(node(
        NodeKind::Binary { op: op.value, lhs: Box::new(lhs), rhs: Box::new(v.node(2)) },
        loc,
    ))
}

/// `in`/`of`/`instanceof`, wrapped in a negation when written `not in`.
fn relation(mut v: Vec<Value>, loc: Loc) -> Result<Value, SyntaxError> {
    let lhs = v.node(0);
    let op = v.token(1);
    let invert = op.data().map_or(false, |d| d.invert);
    let mut out = Node::new(
        NodeKind::Binary { op: op.value, lhs: Box::new(lhs), rhs: Box::new(v.node(2)) },
        loc,
    );
    if invert {
        out = Node::new(NodeKind::Unary { op: "!".to_string(), operand: Box::new(out) }, loc);
    }
    Ok(Value::Node(out))
}

fn prefix_crement(mut v: Vec<Value>, loc: Loc) -> Result<Value, SyntaxError> {
    let op = v.token(0);
    Ok(node(
        NodeKind::Increment { op: op.value, target: Box::new(v.node(1)), postfix: false },
        loc,
    ))
}

fn postfix_crement(mut v: Vec<Value>, loc: Loc) -> Result<Value, SyntaxError> {
    let target = v.node(0);
    let op = v.token(1);
    Ok(node(
        NodeKind::Increment { op: op.value, target: Box::new(target), postfix: true },
        loc,
    ))
}
