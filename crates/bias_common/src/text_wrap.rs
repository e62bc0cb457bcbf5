//! Word wrapping for report bodies
//!
//! - Breaks only at ASCII whitespace, never inside a word or at hyphens
//! - Words longer than the width stay whole on their own line
//! - Source newlines start a new paragraph; blank source lines are kept
//! - Control characters other than tabs are dropped

/// Default column width for report text
pub const DEFAULT_WRAP_WIDTH: usize = 100;

fn strip_control_chars(s: &str) -> String {
    s.chars()
        .map(|c| if c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control() || *c == '\n')
        .collect()
}

/// Wrap `text` into lines of at most `width` columns (except over-long words)
pub fn wrap_block(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let options = textwrap::Options::new(width)
        .break_words(false)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
        .word_splitter(textwrap::WordSplitter::NoHyphenation);

    let cleaned = strip_control_chars(text);
    let mut lines = Vec::new();
    for source in cleaned.lines() {
        let trimmed = source.trim_end();
        if trimmed.trim().is_empty() {
            lines.push(String::new());
            continue;
        }
        lines.extend(
            textwrap::wrap(trimmed, &options)
                .into_iter()
                .map(|line| line.into_owned()),
        );
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> Vec<&str> {
        s.split_whitespace().collect()
    }

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(wrap_block("Fair decision.", 100), vec!["Fair decision."]);
    }

    #[test]
    fn test_long_text_wraps_without_loss() {
        let text = "word ".repeat(60);
        let lines = wrap_block(&text, 100);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 100));
        assert_eq!(words(&lines.join(" ")), words(&text));
    }

    #[test]
    fn test_no_break_inside_words_or_hyphens() {
        let text = "a high-risk country-of-origin decision";
        let lines = wrap_block(text, 12);
        for line in &lines {
            assert!(!line.ends_with('-'), "broke at hyphen: {:?}", lines);
        }
        assert_eq!(words(&lines.join(" ")), words(text));
    }

    #[test]
    fn test_overlong_word_kept_whole() {
        let long = "x".repeat(30);
        let lines = wrap_block(&format!("short {} tail", long), 10);
        assert!(lines.contains(&long));
    }

    #[test]
    fn test_paragraphs_preserved() {
        let lines = wrap_block("No bias detected.\n\nRemediation: none.", 100);
        assert_eq!(lines, vec!["No bias detected.", "", "Remediation: none."]);
    }

    #[test]
    fn test_control_chars_stripped() {
        let lines = wrap_block("alert\u{7}\tvalue", 100);
        assert_eq!(lines, vec!["alert value"]);
    }
}
