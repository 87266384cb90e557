//! Text sanitizers for log payloads
//!
//! Older API versions push HTML-formatted log chunks meant for the web UI;
//! these helpers reduce them to plain text. Both functions leave already
//! clean text unchanged.

/// Panel divider emitted by the legacy HTML log formatter. It marks a
/// section break, so it becomes a newline rather than being dropped.
const PANEL_DIVIDER: &str = "<div class=\"panel panel-default\">";

/// Strip HTML/XML markup from a log chunk.
///
/// The panel divider is converted to a newline first; every other tag is
/// removed outright.
pub fn trim_markup_tags(text: &str) -> String {
    let text = text.replace(PANEL_DIVIDER, "\n");

    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Strip ANSI escape sequences (colors, cursor movement) from a log chunk.
pub fn trim_ansi_sequences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            // CSI sequence: ESC [ parameters... final-byte
            Some('[') => {
                chars.next();
                for t in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&t) {
                        break;
                    }
                }
            }
            // Two-character escape (e.g. ESC c, ESC M)
            Some(_) => {
                chars.next();
            }
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_markup_tags() {
        assert_eq!(trim_markup_tags("<h1>hi</h1>"), "hi");
        assert_eq!(trim_markup_tags("plain text"), "plain text");
    }

    #[test]
    fn test_trim_markup_panel_divider() {
        let input = "<h1>hi</h1><div class=\"panel panel-default\">bye";
        assert_eq!(trim_markup_tags(input), "hi\nbye");
    }

    #[test]
    fn test_trim_markup_idempotent() {
        let clean = "deploy finished\nall instances updated";
        assert_eq!(trim_markup_tags(clean), clean);
        assert_eq!(trim_markup_tags(&trim_markup_tags("<b>x</b>")), "x");
    }

    #[test]
    fn test_trim_ansi_sequences() {
        assert_eq!(
            trim_ansi_sequences("\x1b[32mSTATE: Started\x1b[0m"),
            "STATE: Started"
        );
        assert_eq!(trim_ansi_sequences("\x1b[1;31mbold red\x1b[0m ok"), "bold red ok");
    }

    #[test]
    fn test_trim_ansi_idempotent() {
        let clean = "STATE: Started";
        assert_eq!(trim_ansi_sequences(clean), clean);
    }

    #[test]
    fn test_trim_ansi_truncated_sequence() {
        // A dangling ESC at the end of a chunk must not panic
        assert_eq!(trim_ansi_sequences("tail\x1b"), "tail");
        assert_eq!(trim_ansi_sequences("tail\x1b["), "tail");
    }
}
