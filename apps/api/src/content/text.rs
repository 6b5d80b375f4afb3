use std::sync::OnceLock;

use regex::Regex;

/// Upper bound on source text handed to the generation service, in characters.
pub const MAX_SOURCE_CHARS: usize = 8000;
pub const TRUNCATION_MARKER: &str = "\n\n(remainder omitted)";

fn blank_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{3,}").expect("valid regex"))
}

/// Collapses runs of three or more newlines and caps the length.
pub fn normalize_source_text(text: &str) -> String {
    let collapsed = blank_run().replace_all(text, "\n\n");
    truncate_chars(&collapsed, MAX_SOURCE_CHARS)
}

/// Cuts `text` to `max` characters (not bytes), appending a marker if anything was dropped.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}{}", &text[..cut], TRUNCATION_MARKER),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_blank_runs() {
        assert_eq!(normalize_source_text("a\n\n\n\n\nb\n\nc"), "a\n\nb\n\nc");
    }

    #[test]
    fn test_truncate_counts_characters_not_bytes() {
        let text = "日焼け止め".repeat(2000);
        let cut = truncate_chars(&text, MAX_SOURCE_CHARS);
        assert!(cut.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            cut.chars().count(),
            MAX_SOURCE_CHARS + TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn test_short_text_is_untouched() {
        assert_eq!(truncate_chars("serum", 10), "serum");
    }
}
