//! Text normalization shared by the pipeline stages.
//!
//! Two distinct normalizations live here and must not be conflated:
//! entity decoding (applied to raw HTML before parsing) and comparison
//! normalization (applied identically to note context and verse text
//! before scoring).

use once_cell::sync::Lazy;

/// Bounded table of character references found in the source editions.
/// Anything not listed here passes through unchanged.
static ENTITY_TABLE: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("&ntilde;", "ñ"),
        ("&aacute;", "á"),
        ("&eacute;", "é"),
        ("&iacute;", "í"),
        ("&oacute;", "ó"),
        ("&uacute;", "ú"),
        ("&Ntilde;", "Ñ"),
        ("&Aacute;", "Á"),
        ("&Eacute;", "É"),
        ("&Iacute;", "Í"),
        ("&Oacute;", "Ó"),
        ("&Uacute;", "Ú"),
        ("&iquest;", "¿"),
        ("&iexcl;", "¡"),
        ("&ordm;", "º"),
        ("&ordf;", "ª"),
        ("&laquo;", "«"),
        ("&raquo;", "»"),
    ]
});

/// Punctuation stripped before comparison. Mirrors the editorial
/// convention of the source material (Spanish interrogation/exclamation
/// marks, guillemets, curly quotes, dashes).
const COMPARE_PUNCTUATION: &[char] = &[
    '¿', '?', '¡', '!', ',', ';', ':', '.', '—', '-', '(', ')', '[', ']', '«', '»', '“', '”',
];

/// Replace the bounded set of HTML character references with their literal
/// characters. Unmapped entities are left as-is.
pub fn decode_entities(text: &str) -> String {
    let mut result = text.to_string();
    for (entity, literal) in ENTITY_TABLE.iter() {
        if result.contains(entity) {
            result = result.replace(entity, literal);
        }
    }
    result
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalize a string for matching: lowercase, strip punctuation, collapse
/// whitespace. Idempotent.
pub fn normalize_compare(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .filter(|c| !COMPARE_PUNCTUATION.contains(c))
        .collect();
    collapse_whitespace(&stripped)
}

/// The last `n` whitespace-separated tokens of `text`, joined by single
/// spaces. Fewer if the text is shorter.
pub fn trailing_words(text: &str, n: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let start = words.len().saturating_sub(n);
    words[start..].join(" ")
}

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn decode_entities_maps_known_references() {
        assert_eq!(decode_entities("Espa&ntilde;a"), "España");
        assert_eq!(decode_entities("&iquest;Qu&eacute;?"), "¿Qué?");
        assert_eq!(decode_entities("&Aacute;frica"), "África");
    }

    #[test]
    fn decode_entities_passes_unknown_references_through() {
        assert_eq!(decode_entities("a &bogus; b"), "a &bogus; b");
        assert_eq!(decode_entities("x &amp; y"), "x &amp; y");
    }

    #[test]
    fn normalize_strips_punctuation_and_case() {
        assert_eq!(
            normalize_compare("¡Sale el gran Maestre, de Calatrava!"),
            "sale el gran maestre de calatrava"
        );
        assert_eq!(normalize_compare("«¿Rey?»  —dijo—"), "rey dijo");
    }

    #[test]
    fn normalize_collapses_whitespace() {
        assert_eq!(normalize_compare("  a \t b\n c  "), "a b c");
    }

    #[test]
    fn trailing_words_takes_at_most_n() {
        assert_eq!(trailing_words("el gran Maestre de Calatrava", 3), "Maestre de Calatrava");
        assert_eq!(trailing_words("dos palabras", 5), "dos palabras");
        assert_eq!(trailing_words("", 5), "");
    }

    #[test]
    fn truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("añejo", 2), "añ");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(s in ".{0,200}") {
            let once = normalize_compare(&s);
            let twice = normalize_compare(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn collapse_whitespace_is_idempotent(s in "[ \\ta-z]{0,80}") {
            let once = collapse_whitespace(&s);
            prop_assert_eq!(collapse_whitespace(&once), once);
        }
    }
}
