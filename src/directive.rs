//! Line classification and directive parsing.
//!
//! A script line is either blank, a `--` comment, a backslash directive, or
//! SQL content. Directives have the shape
//!
//! ```text
//! \<command>[ <arg1>[ <arg2>]]
//! ```
//!
//! where the command is made of word characters and each argument of word
//! characters, `#` and `.`. A backslash line that does not fit that shape is
//! reported as `Line::Unrecognized` and ignored by the producer.

use strum::{Display, EnumString};

/// Commands the producer knows how to dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    /// Terminate the current batch and execute it
    Go,
    /// Declare a substitution value
    Val,
    /// Require an exact engine version
    Needver,
    /// Reconnect to another database
    Db,
    /// Guard the following SQL lines by host operating system
    Os,
}

/// A parsed directive line.
///
/// Missing arguments are empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Lower-cased command name
    pub name: String,
    pub arg1: String,
    pub arg2: String,
}

impl Directive {
    /// The known command this directive names, if any.
    pub fn command(&self) -> Option<Command> {
        self.name.parse().ok()
    }
}

/// Classification of one trimmed, substituted script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Blank,
    Comment,
    Directive(Directive),
    /// Backslash line that does not have the directive shape
    Unrecognized,
    Sql(&'a str),
}

/// Classify a trimmed line.
pub fn classify(line: &str) -> Line<'_> {
    if line.is_empty() {
        Line::Blank
    } else if line.starts_with("--") {
        Line::Comment
    } else if let Some(rest) = line.strip_prefix('\\') {
        parse_directive(rest).map_or(Line::Unrecognized, Line::Directive)
    } else {
        Line::Sql(line)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_arg_char(c: char) -> bool {
    is_word_char(c) || c == '#' || c == '.'
}

/// Tokenize the part of a directive line after the backslash.
fn parse_directive(rest: &str) -> Option<Directive> {
    let command_end = rest.find(|c: char| !is_word_char(c)).unwrap_or(rest.len());
    if command_end == 0 {
        return None;
    }
    let (command, tail) = rest.split_at(command_end);

    let mut args = tail.split_ascii_whitespace();
    let arg1 = args.next().unwrap_or_default();
    let arg2 = args.next().unwrap_or_default();
    if args.next().is_some() {
        return None;
    }
    if !arg1.chars().all(is_arg_char) || !arg2.chars().all(is_arg_char) {
        return None;
    }

    Some(Directive {
        name: command.to_ascii_lowercase(),
        arg1: arg1.to_string(),
        arg2: arg2.to_string(),
    })
}

/// Name of the running host OS as scripts spell it.
pub fn host_os() -> &'static str {
    std::env::consts::OS
}

/// Case-insensitive OS name comparison. `darwin` is accepted for `macos`.
pub fn os_matches(declared: &str, host: &str) -> bool {
    let declared = declared.to_ascii_lowercase();
    let host = host.to_ascii_lowercase();
    declared == host || (declared == "darwin" && host == "macos")
}
