//! The syntax tree the grammar actions build.
//!
//! Every node couples a [`NodeKind`] payload with the [`Loc`] of the source
//! it spans. There is no generic fallback variant: the grammar only ever
//! constructs the typed shapes below, so consumers can match exhaustively.
//!
//! [`Node::sexpr`] renders the tree as an s-expression, which is what the
//! snapshot tests and the CLI's default `ast` output show.

use std::fmt;

use latte_syntax::Loc;

/// One node of the tree: what it is, and where it came from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub struct Node {
    pub kind: NodeKind,
    pub loc: Loc,
}

impl Node {
    pub fn new(kind: NodeKind, loc: Loc) -> Node {
        Node { kind, loc }
    }

    /// The tree as an s-expression, one line, no trailing newline.
    pub fn sexpr(&self) -> String {
        Sexpr(self).to_string()
    }
}

/// Every construct the grammar can produce.
///
/// Flags that downstream passes need but the s-expression form elides
/// (`postfix`, `computed`, `own`) still ride along here so the serialized
/// tree keeps them.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize))]
pub enum NodeKind {
    /// A sequence of lines; function bodies, branch arms, and the root.
    Block(Vec<Node>),

    Number(String),
    Str(String),
    /// Interpolated string: `Str` segments and embedded expressions, in
    /// source order.
    StringInterp(Vec<Node>),
    Regex(String),
    /// Heregex with interpolations, same segment layout as strings.
    RegexInterp(Vec<Node>),
    Js(String),
    Bool(bool),
    Null,
    Undefined,

    Identifier(String),
    ThisRef,
    /// `target.name` / `target?.name`.
    Access {
        target: Box<Node>,
        name: String,
        soak: bool,
    },
    /// `target[index]`.
    Index {
        target: Box<Node>,
        index: Box<Node>,
    },
    Call {
        target: Box<Node>,
        args: Vec<Node>,
    },
    SuperCall {
        args: Vec<Node>,
    },
    /// `[from..to]` (inclusive) or `[from...to]` (exclusive).
    Range {
        from: Box<Node>,
        to: Box<Node>,
        exclusive: bool,
    },
    Array(Vec<Node>),
    Object(Vec<Node>),
    /// One object member. `value` is `None` for the shorthand form.
    Prop {
        key: Box<Node>,
        value: Option<Box<Node>>,
        computed: bool,
    },
    Splat(Box<Node>),

    Unary {
        op: String,
        operand: Box<Node>,
    },
    Binary {
        op: String,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    /// Postfix `a?`.
    Existence(Box<Node>),
    Increment {
        op: String,
        target: Box<Node>,
        postfix: bool,
    },
    /// `=` and the compound forms; `op` keeps the operator as written.
    Assign {
        target: Box<Node>,
        op: String,
        value: Box<Node>,
    },

    Func {
        params: Vec<Node>,
        body: Box<Node>,
        bound: bool,
    },
    Param {
        name: Box<Node>,
        default: Option<Box<Node>>,
        splat: bool,
    },

    If {
        condition: Box<Node>,
        then: Box<Node>,
        otherwise: Option<Box<Node>>,
        /// `unless` as written; the condition is not pre-negated.
        invert: bool,
        postfix: bool,
    },
    /// `condition` is `None` for `loop`.
    While {
        condition: Option<Box<Node>>,
        guard: Option<Box<Node>>,
        body: Box<Node>,
        invert: bool,
        postfix: bool,
    },
    For {
        name: Box<Node>,
        index: Option<Box<Node>>,
        source: Box<Node>,
        guard: Option<Box<Node>>,
        step: Option<Box<Node>>,
        /// `for … of` (key iteration) rather than `for … in`.
        object: bool,
        own: bool,
        body: Box<Node>,
        postfix: bool,
    },
    Switch {
        subject: Option<Box<Node>>,
        whens: Vec<Node>,
        otherwise: Option<Box<Node>>,
    },
    When {
        conditions: Vec<Node>,
        body: Box<Node>,
    },
    Try {
        body: Box<Node>,
        catch_param: Option<Box<Node>>,
        catch_body: Option<Box<Node>>,
        finally: Option<Box<Node>>,
    },
    Class {
        name: Option<Box<Node>>,
        parent: Option<Box<Node>>,
        body: Option<Box<Node>>,
    },
    Return(Option<Box<Node>>),
    Throw(Box<Node>),
    /// `break`, `continue`, `debugger`.
    Statement(String),

    Import {
        default: Option<Box<Node>>,
        namespace: Option<Box<Node>>,
        names: Option<Vec<Node>>,
        source: Box<Node>,
    },
    /// One name inside an import or export list; `(as name alias)` when
    /// aliased, otherwise just the name.
    ImportSpec {
        name: Box<Node>,
        alias: Option<Box<Node>>,
    },
    ExportNamed {
        specs: Vec<Node>,
        source: Option<Box<Node>>,
    },
    ExportDefault(Box<Node>),
    /// `export` in front of a class or an assignment.
    ExportDecl(Box<Node>),
    ExportAll {
        source: Box<Node>,
    },

    /// An explicitly parenthesized expression.
    Parens(Box<Node>),
}

struct Sexpr<'a>(&'a Node);

impl fmt::Display for Sexpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use NodeKind::*;
        match &self.0.kind {
            Block(items) => list(f, "block", items),
            Number(text) | Regex(text) => f.write_str(text),
            Str(text) => write!(f, "{:?}", text),
            StringInterp(parts) => list(f, "str", parts),
            RegexInterp(parts) => list(f, "regex", parts),
            Js(text) => write!(f, "(js {:?})", text),
            Bool(b) => write!(f, "{}", b),
            Null => f.write_str("null"),
            Undefined => f.write_str("undefined"),
            Identifier(name) => f.write_str(name),
            ThisRef => f.write_str("this"),
            Access { target, name, soak } => {
                let dot = if *soak { "?." } else { "." };
                write!(f, "({} {} {})", dot, Sexpr(target), name)
            }
            Index { target, index } => {
                write!(f, "(index {} {})", Sexpr(target), Sexpr(index))
            }
            Call { target, args } => {
                write!(f, "(call {}", Sexpr(target))?;
                tail(f, args)
            }
            SuperCall { args } => {
                f.write_str("(call super")?;
                tail(f, args)
            }
            Range { from, to, exclusive } => {
                let dots = if *exclusive { "..." } else { ".." };
                write!(f, "({} {} {})", dots, Sexpr(from), Sexpr(to))
            }
            Array(items) => list(f, "array", items),
            Object(props) => list(f, "object", props),
            Prop { key, value, .. } => {
                write!(f, "(prop {}", Sexpr(key))?;
                if let Some(value) = value {
                    write!(f, " {}", Sexpr(value))?;
                }
                f.write_str(")")
            }
            Splat(expr) => write!(f, "(splat {})", Sexpr(expr)),
            Unary { op, operand } => write!(f, "({} {})", op, Sexpr(operand)),
            Binary { op, lhs, rhs } => {
                write!(f, "({} {} {})", op, Sexpr(lhs), Sexpr(rhs))
            }
            Existence(expr) => write!(f, "(? {})", Sexpr(expr)),
            Increment { op, target, postfix } => {
                let shown = if *postfix { "post" } else { "" };
                write!(f, "({}{} {})", shown, op, Sexpr(target))
            }
            Assign { target, op, value } => {
                write!(f, "({} {} {})", op, Sexpr(target), Sexpr(value))
            }
            Func { params, body, bound } => {
                f.write_str(if *bound { "(=>" } else { "(->" })?;
                for param in params {
                    write!(f, " {}", Sexpr(param))?;
                }
                write!(f, " {})", Sexpr(body))
            }
            Param { name, default, splat } => {
                f.write_str("(param ")?;
                if *splat {
                    write!(f, "(splat {})", Sexpr(name))?;
                } else {
                    write!(f, "{}", Sexpr(name))?;
                }
                if let Some(default) = default {
                    write!(f, " {}", Sexpr(default))?;
                }
                f.write_str(")")
            }
            If { condition, then, otherwise, invert, .. } => {
                let head = if *invert { "unless" } else { "if" };
                write!(f, "({} {} {}", head, Sexpr(condition), Sexpr(then))?;
                if let Some(otherwise) = otherwise {
                    write!(f, " {}", Sexpr(otherwise))?;
                }
                f.write_str(")")
            }
            While { condition, guard, body, invert, .. } => {
                match condition {
                    None => write!(f, "(loop {})", Sexpr(body)),
                    Some(condition) => {
                        let head = if *invert { "until" } else { "while" };
                        write!(f, "({} {}", head, Sexpr(condition))?;
                        if let Some(guard) = guard {
                            write!(f, " (when {})", Sexpr(guard))?;
                        }
                        write!(f, " {})", Sexpr(body))
                    }
                }
            }
            For { name, index, source, guard, step, object, own, body, .. } => {
                write!(f, "(for {}", Sexpr(name))?;
                if let Some(index) = index {
                    write!(f, " {}", Sexpr(index))?;
                }
                let clause = match (*object, *own) {
                    (true, true) => "own-of",
                    (true, false) => "of",
                    (false, _) => "in",
                };
                write!(f, " ({} {})", clause, Sexpr(source))?;
                if let Some(step) = step {
                    write!(f, " (by {})", Sexpr(step))?;
                }
                if let Some(guard) = guard {
                    write!(f, " (when {})", Sexpr(guard))?;
                }
                write!(f, " {})", Sexpr(body))
            }
            Switch { subject, whens, otherwise } => {
                f.write_str("(switch")?;
                if let Some(subject) = subject {
                    write!(f, " {}", Sexpr(subject))?;
                }
                for when in whens {
                    write!(f, " {}", Sexpr(when))?;
                }
                if let Some(otherwise) = otherwise {
                    write!(f, " {}", Sexpr(otherwise))?;
                }
                f.write_str(")")
            }
            When { conditions, body } => {
                f.write_str("(when")?;
                for condition in conditions {
                    write!(f, " {}", Sexpr(condition))?;
                }
                write!(f, " {})", Sexpr(body))
            }
            Try { body, catch_param, catch_body, finally } => {
                write!(f, "(try {}", Sexpr(body))?;
                if let Some(catch_body) = catch_body {
                    f.write_str(" (catch ")?;
                    if let Some(catch_param) = catch_param {
                        write!(f, "{} ", Sexpr(catch_param))?;
                    }
                    write!(f, "{})", Sexpr(catch_body))?;
                }
                if let Some(finally) = finally {
                    write!(f, " (finally {})", Sexpr(finally))?;
                }
                f.write_str(")")
            }
            Class { name, parent, body } => {
                f.write_str("(class")?;
                if let Some(name) = name {
                    write!(f, " {}", Sexpr(name))?;
                }
                if let Some(parent) = parent {
                    write!(f, " (extends {})", Sexpr(parent))?;
                }
                if let Some(body) = body {
                    write!(f, " {}", Sexpr(body))?;
                }
                f.write_str(")")
            }
            Return(value) => match value {
                Some(value) => write!(f, "(return {})", Sexpr(value)),
                None => f.write_str("(return)"),
            },
            Throw(value) => write!(f, "(throw {})", Sexpr(value)),
            Statement(word) => f.write_str(word),
            Import { default, namespace, names, source } => {
                if default.is_none() && namespace.is_none() && names.is_none() {
                    return write!(f, "(import {})", Sexpr(source));
                }
                f.write_str("(import")?;
                if let Some(default) = default {
                    write!(f, " (default {})", Sexpr(default))?;
                }
                if let Some(namespace) = namespace {
                    write!(f, " (all {})", Sexpr(namespace))?;
                }
                if let Some(names) = names {
                    f.write_str(" (names")?;
                    tail(f, names)?;
                }
                write!(f, " (from {}))", Sexpr(source))
            }
            ImportSpec { name, alias } => match alias {
                Some(alias) => write!(f, "(as {} {})", Sexpr(name), Sexpr(alias)),
                None => write!(f, "{}", Sexpr(name)),
            },
            ExportNamed { specs, source } => {
                f.write_str("(export (names")?;
                tail(f, specs)?;
                if let Some(source) = source {
                    write!(f, " (from {})", Sexpr(source))?;
                }
                f.write_str(")")
            }
            ExportDefault(value) => write!(f, "(export (default {}))", Sexpr(value)),
            ExportDecl(decl) => write!(f, "(export {})", Sexpr(decl)),
            ExportAll { source } => write!(f, "(export (all) (from {}))", Sexpr(source)),
            Parens(expr) => write!(f, "(parens {})", Sexpr(expr)),
        }
    }
}

/// `(head child…)`.
fn list(f: &mut fmt::Formatter<'_>, head: &str, items: &[Node]) -> fmt::Result {
    write!(f, "({}", head)?;
    tail(f, items)
}

/// ` child…)` after an already-written opener.
fn tail(f: &mut fmt::Formatter<'_>, items: &[Node]) -> fmt::Result {
    for item in items {
        write!(f, " {}", Sexpr(item))?;
    }
    f.write_str(")")
}
