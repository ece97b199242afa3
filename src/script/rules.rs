//! Hard rejection rules that separate runnable snippets from documentation.

use crate::config::ScriptLimits;
use crate::pattern::literal;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Commands that show or configure rather than install.
pub const INFORMATIONAL_COMMANDS: &[&str] = &[
    "echo", "cat", "cd", "export", "ls", "pwd", "source", "alias", "set", "which", "man",
    "printf", "env",
];

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| literal(r"!?\[[^\]\n]*\]\([^)\n]*\)"));
static TABLE_ROW: LazyLock<Regex> = LazyLock::new(|| literal(r"(?m)^[ \t]*\|.*\|[ \t]*$"));
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| literal(r"`[^`\n]+`"));
/// List items, `##` headings, and setext underlines. A single `#` is left
/// alone because it is also a shell comment.
static PROSE_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
    literal(r"(?m)^[ \t]*(?:[-*+][ \t]+\S|\d+[.)][ \t]+\S|#{2,6}[ \t]|(?:-{3,}|={3,})[ \t]*$)")
});

/// Why a code block is not treated as an install script.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptRejection {
    /// The block has no content.
    #[error("empty block")]
    Empty,
    /// Too many non-empty lines.
    #[error("{lines} lines exceed the limit of {max}")]
    TooManyLines {
        /// Non-empty lines in the block.
        lines: usize,
        /// The limit.
        max: usize,
    },
    /// A line is long enough to be prose.
    #[error("a {length}-character line exceeds the limit of {max}")]
    LineTooLong {
        /// Length of the longest line.
        length: usize,
        /// The limit.
        max: usize,
    },
    /// Too many flag-like tokens.
    #[error("{flags} flags exceed the limit of {max}")]
    TooManyFlags {
        /// Flag-like tokens counted.
        flags: usize,
        /// The limit.
        max: usize,
    },
    /// Markdown link syntax.
    #[error("contains a markdown link")]
    MarkdownLink,
    /// Markdown table row.
    #[error("contains a table row")]
    TablePipe,
    /// Back-tick-wrapped inline code.
    #[error("contains inline code")]
    InlineCode,
    /// List items or headings, as in release notes.
    #[error("contains list or heading markup")]
    ProseMarkup,
    /// Starts with a command that does not install anything.
    #[error("starts with informational command `{command}`")]
    Informational {
        /// The offending command.
        command: String,
    },
}

fn non_empty_lines(code: &str) -> impl Iterator<Item = &str> {
    code.lines().map(str::trim).filter(|line| !line.is_empty())
}

fn is_flag(token: &str) -> bool {
    let mut chars = token.chars();
    match (chars.next(), chars.next(), chars.next()) {
        (Some('-'), Some('-'), Some(c)) => c.is_ascii_alphabetic(),
        (Some('-'), Some(c), _) => c.is_ascii_alphabetic(),
        _ => false,
    }
}

/// First word of the first command line, ignoring comments, prompts, and
/// `sudo`.
#[must_use]
pub fn leading_command(code: &str) -> Option<&str> {
    let first = non_empty_lines(code).find(|line| !line.starts_with('#'))?;
    let unprompted = first.strip_prefix("$ ").unwrap_or(first).trim_start();
    let unprivileged = unprompted.strip_prefix("sudo ").unwrap_or(unprompted).trim_start();
    unprivileged.split_whitespace().next()
}

/// Applies every rejection rule to `code`.
///
/// # Errors
///
/// Returns the first rule the block breaks.
pub fn check(code: &str, limits: &ScriptLimits) -> Result<(), ScriptRejection> {
    let lines = non_empty_lines(code).count();
    if lines == 0 {
        return Err(ScriptRejection::Empty);
    }
    if lines > limits.max_lines {
        return Err(ScriptRejection::TooManyLines {
            lines,
            max: limits.max_lines,
        });
    }
    let longest = code.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    if longest > limits.max_line_length {
        return Err(ScriptRejection::LineTooLong {
            length: longest,
            max: limits.max_line_length,
        });
    }
    let flags = code.split_whitespace().filter(|t| is_flag(t)).count();
    if flags > limits.max_flags {
        return Err(ScriptRejection::TooManyFlags {
            flags,
            max: limits.max_flags,
        });
    }
    if MARKDOWN_LINK.is_match(code) {
        return Err(ScriptRejection::MarkdownLink);
    }
    if TABLE_ROW.is_match(code) {
        return Err(ScriptRejection::TablePipe);
    }
    if INLINE_CODE.is_match(code) {
        return Err(ScriptRejection::InlineCode);
    }
    if PROSE_MARKUP.is_match(code) {
        return Err(ScriptRejection::ProseMarkup);
    }
    if let Some(command) =
        leading_command(code).filter(|command| INFORMATIONAL_COMMANDS.contains(command))
    {
        return Err(ScriptRejection::Informational {
            command: command.to_owned(),
        });
    }
    Ok(())
}
