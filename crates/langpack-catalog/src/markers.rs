use once_cell::sync::OnceCell;
use regex::bytes::Regex;

/// Textual record counts for one or more catalogs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerCounts {
    /// Lines carrying a non-empty `msgid "…"`.
    pub source: usize,
    /// Lines carrying a non-empty `msgstr "…"`.
    pub translated: usize,
}

impl MarkerCounts {
    pub fn add(&mut self, other: MarkerCounts) {
        self.source += other.source;
        self.translated += other.translated;
    }
}

fn source_re() -> &'static Regex {
    static SOURCE_MARKER: OnceCell<Regex> = OnceCell::new();
    SOURCE_MARKER.get_or_init(|| Regex::new(r#"(?-u)msgid ".+""#).unwrap())
}

fn translated_re() -> &'static Regex {
    static TRANSLATED_MARKER: OnceCell<Regex> = OnceCell::new();
    TRANSLATED_MARKER.get_or_init(|| Regex::new(r#"(?-u)msgstr ".+""#).unwrap())
}

/// Count source and translated markers in raw PO bytes. No decoding happens,
/// so catalogs in any ASCII-compatible charset are counted the same way.
///
/// This is a line-level heuristic, not a parse: multi-line strings whose first
/// line is `""` are not counted, and neither are `msgid_plural` / `msgstr[n]`.
pub fn count_markers(content: &[u8]) -> MarkerCounts {
    MarkerCounts {
        source: source_re().find_iter(content).count(),
        translated: translated_re().find_iter(content).count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_only_non_empty_single_line_markers() {
        let po = r#"
msgid ""
msgstr ""
"Language: es\n"

msgid "Hello"
msgstr "Hola"

msgid "Bye"
msgstr ""

msgid "One file"
msgid_plural "Many files"
msgstr[0] "Un archivo"
msgstr[1] "Muchos archivos"
"#;
        let c = count_markers(po.as_bytes());
        assert_eq!(c, MarkerCounts { source: 3, translated: 1 });
    }

    #[test]
    fn latin1_catalog_is_counted_without_decoding() {
        let po = b"msgid \"caf\xe9\"\nmsgstr \"caf\xe9 cr\xe8me\"\n\nmsgid \"th\xe9\"\nmsgstr \"\"\n";
        assert_eq!(count_markers(po), MarkerCounts { source: 2, translated: 1 });
    }

    #[test]
    fn empty_text_counts_nothing() {
        assert_eq!(count_markers(b""), MarkerCounts::default());
    }
}
