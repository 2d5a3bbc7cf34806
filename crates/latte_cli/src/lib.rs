//! The `latte` command line tool.
//!
//! Three subcommands cover the front end: `tokens` dumps the scanned (by
//! default rewritten) stream, `ast` prints the parsed tree, and `check`
//! parses whole files, rendering every syntax error with its source line.

use std::fs;
use std::path::{Path, PathBuf};

use ansi_term::{Colour, Style};
use structopt::StructOpt;

use latte_lexer::LexOptions;
use latte_syntax::SyntaxKind;

pub use latte_errors::{Diagnostic, FileDatabase, Severity, SimpleFile};

#[derive(Debug, StructOpt)]
#[structopt(name = "latte", about = "Tooling for the latte language front end")]
pub struct Options {
    #[structopt(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Print the token stream of a file
    Tokens {
        /// The file to scan
        file: PathBuf,
        /// Dump the raw scanner output, skipping the rewriter
        #[structopt(long)]
        raw: bool,
        /// Machine-readable JSON instead of a table
        #[structopt(long)]
        json: bool,
    },
    /// Print the syntax tree of a file
    Ast {
        /// The file to parse
        file: PathBuf,
        /// JSON instead of the s-expression rendering
        #[structopt(long)]
        json: bool,
    },
    /// Parse files and report every syntax error
    Check {
        /// The files to parse
        files: Vec<PathBuf>,
    },
}

/// Runs the selected subcommand and returns the process exit code:
/// 0 clean, 1 syntax errors, 2 usage or I/O trouble.
pub fn run(options: Options) -> i32 {
    match options.cmd {
        Command::Tokens { file, raw, json } => tokens(&file, raw, json),
        Command::Ast { file, json } => ast(&file, json),
        Command::Check { files } => check(&files),
    }
}

fn tokens(path: &Path, raw: bool, json: bool) -> i32 {
    let source = match read(path) {
        Some(source) => source,
        None => return 2,
    };
    let opts = LexOptions { rewrite: !raw, ..LexOptions::default() };
    let stream = match latte_lexer::tokenize(&source, opts) {
        Ok(stream) => stream,
        Err(err) => return report(path, source, &err),
    };

    if json {
        return print_json(&stream);
    }
    let colored = atty::is(atty::Stream::Stdout);
    for token in &stream {
        // Pad before painting so the colour codes don't eat the columns.
        let name = format!("{:<20}", token.kind.name());
        let name = if colored {
            style(token.kind).paint(name).to_string()
        } else {
            name
        };
        let mark = if token.generated { " (generated)" } else { "" };
        println!(
            "{:>4}:{:<4} {} {:?}{}",
            token.loc.line + 1,
            token.loc.col,
            name,
            token.value,
            mark,
        );
    }
    0
}

fn ast(path: &Path, json: bool) -> i32 {
    let source = match read(path) {
        Some(source) => source,
        None => return 2,
    };
    match latte_parser::parse_source(&source) {
        Ok(tree) if json => print_json(&tree),
        Ok(tree) => {
            println!("{}", tree.sexpr());
            0
        }
        Err(err) => report(path, source, &err),
    }
}

fn check(paths: &[PathBuf]) -> i32 {
    if paths.is_empty() {
        cli_err!("no files to check");
        return 2;
    }

    let mut files = FileDatabase::new();
    let mut failed = 0usize;
    for path in paths {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(err) => {
                cli_err!("cannot read `{}`: {}", path.display(), err);
                failed += 1;
                continue;
            }
        };
        let outcome = latte_parser::parse_source(&source);
        let id = files.add(path.display().to_string(), source);
        match outcome {
            Ok(_) => log::debug!("{}: parsed cleanly", path.display()),
            Err(err) => {
                let diagnostic = Diagnostic::from_syntax_error(id, &err);
                let _ = latte_errors::emit(&files, &diagnostic);
                failed += 1;
            }
        }
    }

    summary(paths.len().saturating_sub(failed), failed);
    if failed > 0 {
        1
    } else {
        0
    }
}

fn summary(passed: usize, failed: usize) {
    let colored = atty::is(atty::Stream::Stdout);
    let paint = |count: usize, colour: Colour| {
        if colored {
            colour.paint(count.to_string()).to_string()
        } else {
            count.to_string()
        }
    };
    println!(
        "Outcome: {} fail, {} pass",
        paint(failed, Colour::Red),
        paint(passed, Colour::Green),
    );
}

fn read(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(source) => Some(source),
        Err(err) => {
            cli_err!("cannot read `{}`: {}", path.display(), err);
            None
        }
    }
}

/// Renders a syntax error against the file it came from.
fn report(path: &Path, source: String, err: &latte_syntax::SyntaxError) -> i32 {
    let file = SimpleFile::new(path.display().to_string(), source);
    let diagnostic = Diagnostic::from_syntax_error(0, err);
    let _ = latte_errors::emit(&file, &diagnostic);
    1
}

fn print_json<T: serde::Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            0
        }
        Err(err) => {
            cli_err!("failed to serialize: {}", err);
            2
        }
    }
}

/// Terminal colour per token family.
fn style(kind: SyntaxKind) -> Style {
    use SyntaxKind::*;
    if kind.is_keyword() {
        return Colour::Purple.normal();
    }
    if kind.is_line_break() {
        return Style::new().dimmed();
    }
    match kind {
        NUMBER => Colour::Cyan.normal(),
        STRING | STRING_START | STRING_END | JS => Colour::Green.normal(),
        REGEX | REGEX_START | REGEX_END => Colour::Red.normal(),
        IDENTIFIER | PROPERTY => Style::new(),
        _ => Colour::Fixed(246).normal(),
    }
}

/// Builds a plain diagnostic with no source attached and renders it
/// straight to stderr.
#[macro_export]
macro_rules! cli_diagnostic {
    ($severity:ident, $($format_args:tt)*) => {
        let diag = $crate::Diagnostic::$severity(0, "cli", format!($($format_args)*));
        let file = $crate::SimpleFile::new("", "");
        let _ = ::latte_errors::emit(&file, &diag);
    };
}

/// A formatted CLI error, rendered immediately to stderr.
#[macro_export]
macro_rules! cli_err {
    ($($format_args:tt)*) => {{
        $crate::cli_diagnostic!(error, $($format_args)*);
    }};
}

/// A formatted CLI warning, rendered immediately to stderr.
#[macro_export]
macro_rules! cli_warn {
    ($($format_args:tt)*) => {{
        $crate::cli_diagnostic!(warning, $($format_args)*);
    }};
}
