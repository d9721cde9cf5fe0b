use crate::config::CONFIG_FILE;
use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// The DSL cheat sheet appended to syntax errors.
const SYNTAX_HELP: &str = "\
## Syntax

    name:key=value,key=value,...

Keys: `k` kind (code|doc), `s` symbol, `f` file glob, `t` literal text,
`l` line, `c` commit, `h` heading, `p` page, `a` anchor.
";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is
/// one, how to fix it. Readable by both humans and LLM agents.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::MissingCodeLocator { name } => render_missing_code_locator(name),
        Error::MissingDocFile { name } => render_missing_doc_file(name),
        Error::EmptyBody { .. }
        | Error::EmptyName { .. }
        | Error::InvalidSegment { .. }
        | Error::MissingSeparator { .. } => render_syntax_error(e),
        Error::InvalidInteger { field, value } => render_invalid_integer(field, value),
        Error::InvalidKind { value } => format!(
            "\
# Error: Invalid Kind

`{value}` is not a ref kind.

## Fix

Use `k=code` (the default) or `k=doc`.
"
        ),
        Error::InvalidTimeout { max, value } => format!(
            "\
# Error: Invalid Config

`timeout_secs = {value}` would make every search give up or never time out.

## Fix

Set `timeout_secs` in the `[search]` table of `{CONFIG_FILE}` to a value from 1 to {max}.
"
        ),
        Error::TomlDe(err) => format!(
            "\
# Error: Invalid Config

{err}

## Fix

Check `{CONFIG_FILE}` in the project root.
"
        ),
        Error::InvalidRefEntry { .. } | Error::Io(_) | Error::Json(_) | Error::RootNotFound { .. } => {
            render_generic(e)
        },
    };
}

fn render_generic(e: &Error) -> String {
    return format!(
        "\
# Error

{e}
"
    );
}

fn render_invalid_integer(field: &str, value: &str) -> String {
    let key = if field == "page" { "p" } else { "l" };
    return format!(
        "\
# Error: Invalid Number

`{field}` must be a positive integer, got `{value}`.

## Fix

    {key}=12
"
    );
}

fn render_missing_code_locator(name: &str) -> String {
    return format!(
        "\
# Error: Missing Locator

Code ref `{name}` requires at least one of: `s` (symbol), `f` (file), `t` (text).

## Fix

    {name}:s=Class.method,f=**/module.py
    {name}:t=def handler(
"
    );
}

fn render_missing_doc_file(name: &str) -> String {
    return format!(
        "\
# Error: Missing File

Doc ref `{name}` requires file pattern (`f`).

## Fix

    {name}:k=doc,f=docs/guide.md,h=## Section
"
    );
}

fn render_syntax_error(e: &Error) -> String {
    return format!(
        "\
# Error: Invalid Ref

{e}

{SYNTAX_HELP}"
    );
}
