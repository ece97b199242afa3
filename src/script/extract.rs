//! Code-block extraction from markdown.
//!
//! One regex recognises both fenced blocks (backtick or tilde fences, with
//! an optional info string) and indented blocks that follow a blank line.

use crate::pattern::literal;
use regex::Regex;
use std::sync::LazyLock;

static CODE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    literal(concat!(
        r"(?m)",
        r"^[ \t]*(?:```|~~~)[ \t]*(?P<lang>[^\n`]*)\n(?P<fenced>(?s:.*?))^[ \t]*(?:```|~~~)[ \t]*$",
        r"|(?:^[ \t]*\n|\A)(?P<indented>(?:(?: {4}|\t)[^\n]*(?:\n|\z))+)",
    ))
});

/// Info strings that mark a fenced block as shell input.
const SHELL_LANGUAGES: &[&str] = &[
    "sh",
    "bash",
    "shell",
    "zsh",
    "fish",
    "console",
    "shell-session",
    "sh-session",
    "shellsession",
    "terminal",
    "powershell",
    "pwsh",
    "ps1",
    "cmd",
    "bat",
    "batch",
    "text",
    "txt",
    "plaintext",
];

fn is_shell_language(info: &str) -> bool {
    let lang = info
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_start_matches('{')
        .trim_start_matches('.')
        .to_ascii_lowercase();
    lang.is_empty() || SHELL_LANGUAGES.contains(&lang.as_str())
}

fn dedent(block: &str) -> String {
    block
        .lines()
        .map(|line| {
            line.strip_prefix("    ")
                .or_else(|| line.strip_prefix('\t'))
                .unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns the trimmed contents of every shell-like code block in `markdown`.
///
/// Fenced blocks labelled with a non-shell language (`json`, `rust`, ...) are
/// skipped. Empty blocks are dropped.
#[must_use]
pub fn extract_code_blocks(markdown: &str) -> Vec<String> {
    let normalized = markdown.replace("\r\n", "\n");
    CODE_BLOCK
        .captures_iter(&normalized)
        .filter_map(|caps| {
            if let Some(fenced) = caps.name("fenced") {
                let lang = caps.name("lang").map_or("", |m| m.as_str());
                return is_shell_language(lang).then(|| fenced.as_str().to_owned());
            }
            caps.name("indented").map(|m| dedent(m.as_str()))
        })
        .map(|block| block.trim().to_owned())
        .filter(|block| !block.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn pattern_compiles() {
        LazyLock::force(&CODE_BLOCK);
    }

    #[rstest]
    #[case::fenced("Install:\n\n```sh\nbrew install fzf\n```\n", &["brew install fzf"])]
    #[case::tilde("~~~\ncurl -fsSL https://x/i.sh | sh\n~~~\n", &["curl -fsSL https://x/i.sh | sh"])]
    #[case::indented("Install:\n\n    brew install fzf\n    fzf --version\n\nDone.", &["brew install fzf\nfzf --version"])]
    #[case::two_blocks("```\na\n```\n\n```bash\nb\n```", &["a", "b"])]
    #[case::non_shell("```json\n{\"install\": true}\n```", &[])]
    #[case::empty("```\n```\n", &[])]
    #[case::crlf("```sh\r\nbrew install fzf\r\n```\r\n", &["brew install fzf"])]
    fn extracts_blocks(#[case] markdown: &str, #[case] expected: &[&str]) {
        assert_eq!(extract_code_blocks(markdown), expected);
    }

    #[test]
    fn indented_lines_inside_fences_stay_in_their_fence() {
        let markdown = "```\nfor x in a; do\n    echo $x\ndone\n```\n";
        assert_eq!(
            extract_code_blocks(markdown),
            ["for x in a; do\n    echo $x\ndone"]
        );
    }
}
