use std::borrow::Cow;

/// Shorten `text` to at most `width` characters, marking the cut with `...`.
///
/// Cuts on character boundaries, never inside a multi-byte character.
#[must_use]
pub fn truncate_chars(text: &str, width: usize) -> String {
    match text.char_indices().nth(width) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text.to_string(),
    }
}

/// Make `text` safe as one TSV field: tabs and line breaks become spaces.
#[must_use]
pub fn tsv_field(text: &str) -> Cow<'_, str> {
    if text.contains(['\t', '\n', '\r']) {
        Cow::Owned(text.replace(['\t', '\n', '\r'], " "))
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_unchanged() {
        assert_eq!(truncate_chars("Pregnant", 80), "Pregnant");
        assert_eq!(truncate_chars("exact", 5), "exact");
    }

    #[test]
    fn test_long_text_is_cut_and_marked() {
        assert_eq!(truncate_chars("abcdefgh", 3), "abc...");
    }

    #[test]
    fn test_multibyte_boundary() {
        assert_eq!(truncate_chars("ééééé", 2), "éé...");
    }

    #[test]
    fn test_tsv_field_flattens_separators() {
        assert_eq!(tsv_field("plain text"), "plain text");
        assert_eq!(tsv_field("a\tb\nc\r\nd"), "a b c  d");
        assert!(matches!(tsv_field("clean"), Cow::Borrowed(_)));
    }
}
