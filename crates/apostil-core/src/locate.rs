//! Stage 1: scan annotated HTML documents for footnote markers.
//!
//! A marker is a `<sup>` holding an `<a>` whose text is a numeral. For
//! each one we record the note number, the word it anchors to, and a
//! short window of preceding words, all taken from the nearest enclosing
//! block element.

use crate::config::LocatorSettings;
use crate::error::{ApostilError, Result};
use crate::text;
use crate::types::NoteRecord;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Everything stage 1 produced over one input directory.
#[derive(Debug, Clone)]
pub struct LocateReport {
    /// All records across all documents, sorted by note number.
    pub records: Vec<NoteRecord>,
    /// Per-document counts, in processing order.
    pub documents: Vec<(PathBuf, usize)>,
    /// Documents that could not be read. Fatal for those documents only.
    pub failed_documents: Vec<PathBuf>,
}

pub struct NoteLocator {
    settings: LocatorSettings,
    marker_selector: Selector,
    numeral_selector: Selector,
}

impl NoteLocator {
    pub fn new(settings: LocatorSettings) -> Self {
        Self {
            settings,
            marker_selector: Selector::parse("sup").expect("valid selector"),
            numeral_selector: Selector::parse("a").expect("valid selector"),
        }
    }

    /// Process every `*.html` under `dir`, in file-name order.
    pub fn extract_dir(&self, dir: &Path) -> Result<LocateReport> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("html"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();

        if paths.is_empty() {
            return Err(ApostilError::NoInputDocuments(dir.to_path_buf()));
        }

        let mut records = Vec::new();
        let mut documents = Vec::new();
        let mut failed_documents = Vec::new();

        for path in paths {
            match fs::read_to_string(&path) {
                Ok(source) => {
                    let found = self.extract_document(&source);
                    documents.push((path, found.len()));
                    records.extend(found);
                }
                Err(_) => failed_documents.push(path),
            }
        }

        records.sort_by_key(|r| r.number);
        Ok(LocateReport {
            records,
            documents,
            failed_documents,
        })
    }

    /// Extract all note records from one HTML document. Read-only; the
    /// result is a pure function of the input.
    pub fn extract_document(&self, source: &str) -> Vec<NoteRecord> {
        let decoded = text::decode_entities(source);
        let html = Html::parse_document(&decoded);
        let mut records = Vec::new();

        for marker in html.select(&self.marker_selector) {
            let Some(number) = self.marker_number(marker) else {
                continue;
            };
            let Some(ancestor) = self.block_ancestor(marker) else {
                // No qualifying ancestor: the marker is skipped, leaving
                // an implicit gap in the numbering inventory.
                continue;
            };

            let before = text::collapse_whitespace(&preceding_text(ancestor, marker));
            if before.is_empty() {
                continue;
            }

            let context = text::trailing_words(&before, self.settings.context_window);
            let word = text::trailing_words(&before, 1);
            let full = text::collapse_whitespace(&ancestor.text().collect::<String>());

            records.push(NoteRecord {
                number,
                word,
                context,
                full_text: text::truncate_chars(&full, self.settings.snippet_len),
            });
        }

        records
    }

    fn marker_number(&self, marker: ElementRef<'_>) -> Option<u32> {
        let link = marker.select(&self.numeral_selector).next()?;
        let label: String = link.text().collect();
        let label = label.trim();
        if label.is_empty() || !label.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        label.parse().ok()
    }

    fn block_ancestor<'a>(&self, marker: ElementRef<'a>) -> Option<ElementRef<'a>> {
        marker
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| self.settings.is_block_ancestor(el.value().name()))
    }
}

/// All text before `marker` inside `ancestor`, in document order. The
/// marker's own subtree and everything after it contribute nothing.
fn preceding_text(ancestor: ElementRef<'_>, marker: ElementRef<'_>) -> String {
    let mut out = String::new();
    for node in ancestor.descendants() {
        if node.id() == marker.id() {
            break;
        }
        if let Some(fragment) = node.value().as_text() {
            out.push_str(fragment);
        }
    }
    out
}

/// Coverage summary over the extracted note numbers: range, uniqueness
/// and the numbers missing from the range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteInventory {
    pub first: u32,
    pub last: u32,
    pub unique: usize,
    pub missing: Vec<u32>,
}

impl NoteInventory {
    pub fn of(records: &[NoteRecord]) -> Option<Self> {
        let first = records.iter().map(|r| r.number).min()?;
        let last = records.iter().map(|r| r.number).max()?;
        let missing = (first..=last)
            .filter(|n| !records.iter().any(|r| r.number == *n))
            .collect::<Vec<_>>();
        let mut numbers: Vec<u32> = records.iter().map(|r| r.number).collect();
        numbers.sort_unstable();
        numbers.dedup();
        Some(Self {
            first,
            last,
            unique: numbers.len(),
            missing,
        })
    }
}

/// Write the note-position export (stage 1 output, stage 2 input).
pub fn write_records(path: &Path, records: &[NoteRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read a note-position export back.
pub fn read_records(path: &Path) -> Result<Vec<NoteRecord>> {
    let source = fs::read_to_string(path)?;
    serde_json::from_str(&source).map_err(|e| ApostilError::InvalidExport {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn locator() -> NoteLocator {
        NoteLocator::new(LocatorSettings::default())
    }

    #[test]
    fn extracts_number_word_and_context() {
        let html = r##"<table><tr><td>
            Sale el gran Maestre<sup><a href="#n7">7</a></sup> de Calatrava
        </td></tr></table>"##;
        let records = locator().extract_document(html);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number, 7);
        assert_eq!(records[0].word, "Maestre");
        assert_eq!(records[0].context, "Sale el gran Maestre");
        assert!(records[0].full_text.contains("de Calatrava"));
    }

    #[test]
    fn context_is_capped_at_the_window() {
        let html = r#"<p>uno dos tres cuatro cinco seis siete<sup><a>3</a></sup></p>"#;
        let records = locator().extract_document(html);
        assert_eq!(records[0].context, "tres cuatro cinco seis siete");
        assert_eq!(records[0].word, "siete");
    }

    #[test]
    fn decodes_entities_before_extraction() {
        let html = r#"<p>la ni&ntilde;a cay&oacute;<sup><a>12</a></sup></p>"#;
        let records = locator().extract_document(html);
        assert_eq!(records[0].word, "cayó");
        assert_eq!(records[0].context, "la niña cayó");
    }

    #[test]
    fn skips_markers_without_numeric_link() {
        let html = r#"<p>texto<sup><a>nota</a></sup> y m&aacute;s<sup>*</sup></p>"#;
        assert!(locator().extract_document(html).is_empty());
    }

    #[test]
    fn skips_markers_without_block_ancestor() {
        // The marker hangs directly under a div, which is not in the
        // default ancestor set.
        let html = r#"<div>palabra<sup><a>4</a></sup></div>"#;
        assert!(locator().extract_document(html).is_empty());
    }

    #[test]
    fn preceding_text_skips_marker_subtree_and_later_content() {
        let html =
            r#"<table><tr><td>antes <b>en medio</b><sup><a>9</a></sup> después</td></tr></table>"#;
        let records = locator().extract_document(html);
        assert_eq!(records[0].word, "medio");
        assert_eq!(records[0].context, "antes en medio");
    }

    #[test]
    fn interleaved_inline_elements_contribute_in_order() {
        let html = r#"<p>el <i>gran</i> Maestre<sup><a>1</a></sup></p>"#;
        let records = locator().extract_document(html);
        assert_eq!(records[0].context, "el gran Maestre");
    }

    #[test]
    fn inventory_reports_missing_numbers() {
        let records: Vec<NoteRecord> = [1u32, 2, 5, 5]
            .iter()
            .map(|&n| NoteRecord {
                number: n,
                word: String::new(),
                context: String::new(),
                full_text: String::new(),
            })
            .collect();
        let inventory = NoteInventory::of(&records).unwrap();
        assert_eq!(inventory.first, 1);
        assert_eq!(inventory.last, 5);
        assert_eq!(inventory.unique, 3);
        assert_eq!(inventory.missing, vec![3, 4]);
    }

    #[test]
    fn inventory_of_empty_input_is_none() {
        assert!(NoteInventory::of(&[]).is_none());
    }

    #[test]
    fn duplicate_numbers_across_documents_are_kept() {
        let html_a = r#"<p>una palabra<sup><a>2</a></sup></p>"#;
        let html_b = r#"<p>otra palabra<sup><a>2</a></sup></p>"#;
        let l = locator();
        let mut all = l.extract_document(html_a);
        all.extend(l.extract_document(html_b));
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r.number == 2));
    }
}
