// Text normalizer
//
// Undoes the font-substitution artifacts the PDF extractor leaves behind:
// glyphs it could not map come out as "(cid:NNN)" and a handful of accented
// letters come out as the wrong Latin-1 character.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static CID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(cid:(\d+)\)").expect("cid pattern is valid"));

/// Mis-rendered letters and their intended replacement.
const SPECIAL_REPLACEMENTS: [(char, char); 5] = [
    ('Æ', 'á'),
    ('æ', 'ñ'),
    ('œ', 'ú'),
    ('\n', ' '),
    ('\r', ' '),
];

/// Decode glyph codes and remap mis-encoded characters.
///
/// Unrecognized input passes through unchanged. The result is a fixed point:
/// `normalize(&normalize(s)) == normalize(s)`.
pub fn normalize(text: &str) -> String {
    translate_special(&decode_glyphs(text))
}

/// Replace every `(cid:N)` marker with the character at code point N.
///
/// Decoding can itself produce a new marker (e.g. `(cid:40)` is `(`), so this
/// repeats until the text stops changing. Invalid code points are left as-is.
pub fn decode_glyphs(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = CID_PATTERN
            .replace_all(&current, |caps: &Captures| {
                caps[1]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

pub fn translate_special(text: &str) -> String {
    text.chars()
        .map(|c| {
            SPECIAL_REPLACEMENTS
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .collect()
}

/// Remove every whitespace character (used for amounts like "1 000 000").
pub fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Normalized, trimmed header text for matching.
pub fn header_text(text: &str) -> String {
    normalize(text).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_cid_markers() {
        assert_eq!(normalize("Calificaci(cid:243)n"), "Calificación");
        assert_eq!(normalize("A(cid:241)o"), "Año");
    }

    #[test]
    fn remaps_special_letters_and_line_breaks() {
        assert_eq!(normalize("GuaranÆes"), "Guaranáes");
        assert_eq!(normalize("CompaæÆa"), "Compañáa");
        assert_eq!(normalize("Pago de\nrescates"), "Pago de rescates");
        assert_eq!(normalize("SÆbado œltimo"), "Sábado último");
    }

    #[test]
    fn leaves_unrecognized_input_alone() {
        assert_eq!(normalize("plain text 1.000"), "plain text 1.000");
        assert_eq!(normalize("(cid:abc)"), "(cid:abc)");
        assert_eq!(normalize("(cid:99999999999)"), "(cid:99999999999)");
        assert_eq!(normalize("(cid:55296)"), "(cid:55296)");
    }

    #[test]
    fn normalize_is_a_fixed_point() {
        let samples = [
            "",
            "Calificaci(cid:243)n\nRendimiento",
            "(cid:40)cid:65)",
            "(cid:198)",
            "BONOS EN D(cid:211)LARES",
            "x\r\ny",
            "(cid:40)(cid:99)(cid:105)(cid:100)(cid:58)(cid:54)(cid:53)(cid:41)",
        ];
        for s in samples {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "not a fixed point for {s:?}");
        }
    }

    #[test]
    fn nested_markers_decode_completely() {
        // "(cid:40)" is "(" which rebuilds "(cid:65)" -> "A"
        assert_eq!(normalize("(cid:40)cid:65)"), "A");
        // code 198 is 'Æ', which the special table then maps to 'á'
        assert_eq!(normalize("(cid:198)"), "á");
    }

    #[test]
    fn strips_whitespace_from_amounts() {
        assert_eq!(strip_whitespace("1 000 000"), "1000000");
        assert_eq!(strip_whitespace(" 250.000\n"), "250.000");
    }
}
