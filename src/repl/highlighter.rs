use crate::engine::token::{TokenKind, lookup_ident};
use lazy_static::lazy_static;
use owo_colors::OwoColorize;
use regex::{Captures, Regex};
use rustyline::highlight::Highlighter;
use rustyline_derive::{Completer, Helper, Hinter, Validator};
use std::borrow::Cow::{self, Borrowed, Owned};

lazy_static! {
    // Alternation order decides precedence: a `//` inside a string stays part of the string.
    static ref TOKEN_RE: Regex = Regex::new(
        r#"(?P<string>"[^"]*"?)|(?P<comment>//.*)|(?P<number>\b\d+\b)|(?P<word>[A-Za-z_][A-Za-z0-9_]*)"#
    )
    .expect("highlighter pattern is valid");
}

fn style(caps: &Captures<'_>) -> Option<String> {
    if let Some(m) = caps.name("string") {
        return Some(m.as_str().green().to_string());
    }
    if let Some(m) = caps.name("comment") {
        return Some(m.as_str().bright_black().to_string());
    }
    if let Some(m) = caps.name("number") {
        return Some(m.as_str().magenta().to_string());
    }
    let word = caps.name("word")?.as_str();
    match lookup_ident(word) {
        TokenKind::Ident => None,
        TokenKind::True | TokenKind::False => Some(word.yellow().to_string()),
        _ => Some(word.cyan().bold().to_string()),
    }
}

/// Colours keywords, literals and comments as the user types.
#[derive(Default)]
pub struct KusmalaHighlighter;

impl Highlighter for KusmalaHighlighter {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let mut styled = String::with_capacity(line.len());
        let mut last_end = 0;
        let mut changed = false;
        for caps in TOKEN_RE.captures_iter(line) {
            let Some(whole) = caps.get(0) else { continue };
            let Some(painted) = style(&caps) else { continue };
            styled.push_str(&line[last_end..whole.start()]);
            styled.push_str(&painted);
            last_end = whole.end();
            changed = true;
        }
        if !changed {
            return Borrowed(line);
        }
        styled.push_str(&line[last_end..]);
        Owned(styled)
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        // Any keystroke can open or close a string or comment.
        true
    }
}

#[derive(Helper, Completer, Hinter, Validator, Default)]
pub struct ReplHelper {
    highlighter: KusmalaHighlighter,
}

impl ReplHelper {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, pos: usize) -> Cow<'l, str> {
        self.highlighter.highlight(line, pos)
    }

    fn highlight_char(&self, line: &str, pos: usize, forced: bool) -> bool {
        self.highlighter.highlight_char(line, pos, forced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::init_test_logging;

    fn strip_ansi(s: &str) -> String {
        Regex::new(r"\x1b\[[0-9;]*m").unwrap().replace_all(s, "").into_owned()
    }

    #[test]
    fn plain_identifiers_are_borrowed() {
        init_test_logging();
        let highlighted = KusmalaHighlighter.highlight("x + y", 0);
        assert!(matches!(highlighted, Borrowed("x + y")));
    }

    #[test]
    fn keywords_and_literals_are_coloured() {
        init_test_logging();
        let line = r#"buat x = cetak("a // b", 42, benar); // catatan"#;
        let highlighted = KusmalaHighlighter.highlight(line, 0);
        assert!(highlighted.contains("\x1b["));
        assert_eq!(strip_ansi(&highlighted), line);
        assert!(highlighted.contains(&"buat".cyan().bold().to_string()));
        assert!(highlighted.contains(&"\"a // b\"".green().to_string()));
        assert!(highlighted.contains(&"42".magenta().to_string()));
        assert!(highlighted.contains(&"benar".yellow().to_string()));
        assert!(highlighted.contains(&"// catatan".bright_black().to_string()));
    }

    #[test]
    fn digits_inside_identifiers_are_left_alone() {
        init_test_logging();
        let highlighted = KusmalaHighlighter.highlight("nilai2", 0);
        assert!(matches!(highlighted, Borrowed("nilai2")));
    }
}
