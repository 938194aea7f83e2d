//! Stage 3: insert note markers into the target document.
//!
//! Only uniquely resolved notes are applied. Each marker is the note
//! number in braces, placed directly after the anchoring word with no
//! space: `Maestre{7}`. This textual placeholder is converted into a
//! structured annotation element in a later editorial pass, so the format
//! must not change.

use crate::error::Result;
use crate::tei::{backup_path, TeiDocument};
use crate::types::{InsertionFailure, InsertionOutcome, NoteMapping, ResolvedNote};
use crate::text::truncate_chars;
use regex::Regex;
use std::fs;
use std::path::Path;

/// The marker placed after the anchoring word.
pub fn marker_for(number: u32) -> String {
    format!("{{{number}}}")
}

/// Outcomes for one apply batch, in mapping order.
#[derive(Debug, Clone, Default)]
pub struct ApplyReport {
    pub outcomes: Vec<InsertionOutcome>,
}

impl ApplyReport {
    pub fn inserted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, InsertionOutcome::Inserted { .. }))
            .count()
    }

    pub fn already_marked(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, InsertionOutcome::AlreadyMarked { .. }))
            .count()
    }

    pub fn failures(&self) -> Vec<&InsertionFailure> {
        self.outcomes
            .iter()
            .filter_map(|o| match o {
                InsertionOutcome::Failed(f) => Some(f),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct NoteApplier;

impl NoteApplier {
    pub fn new() -> Self {
        Self
    }

    /// Checkpoint the target to its sibling backup, then apply every
    /// resolved note and rewrite the document in place. Fatal I/O and
    /// parse errors abort before anything is committed; per-note failures
    /// accumulate in the report.
    pub fn apply_file(&self, target: &Path, mapping: &NoteMapping) -> Result<ApplyReport> {
        fs::copy(target, backup_path(target))?;
        let mut doc = TeiDocument::load(target)?;
        let report = self.apply(&mut doc, mapping);
        doc.save(target)?;
        Ok(report)
    }

    /// Apply every resolved note to an in-memory document.
    pub fn apply(&self, doc: &mut TeiDocument, mapping: &NoteMapping) -> ApplyReport {
        let mut report = ApplyReport::default();
        for note in &mapping.resolved {
            report.outcomes.push(self.apply_one(doc, note));
        }
        report
    }

    fn apply_one(&self, doc: &mut TeiDocument, note: &ResolvedNote) -> InsertionOutcome {
        let Some(line) = doc.line_by_number(&note.line_number) else {
            return InsertionOutcome::Failed(InsertionFailure {
                number: note.number,
                word: note.word.clone(),
                reason: format!("Verso {} no encontrado", note.line_number),
                line_text: None,
            });
        };

        let text = doc.line_text(line);
        let Some(end) = find_word_end(&text, &note.word) else {
            return InsertionOutcome::Failed(InsertionFailure {
                number: note.number,
                word: note.word.clone(),
                reason: format!("No se pudo insertar en verso {}", note.line_number),
                line_text: Some(truncate_chars(&text, 80)),
            });
        };

        if marker_follows(&text, end) {
            return InsertionOutcome::AlreadyMarked {
                number: note.number,
            };
        }

        if doc.insert_marker(line, end, &marker_for(note.number)) {
            InsertionOutcome::Inserted {
                number: note.number,
            }
        } else {
            InsertionOutcome::Failed(InsertionFailure {
                number: note.number,
                word: note.word.clone(),
                reason: format!(
                    "Ningún segmento cubre la posición {} en verso {}",
                    end, note.line_number
                ),
                line_text: Some(truncate_chars(&text, 80)),
            })
        }
    }
}

/// Char offset just past the anchoring word in the unnormalized line
/// text. Word-boundary match first; raw substring fallback, because the
/// matching stage normalizes more aggressively than this stage does.
fn find_word_end(text: &str, word: &str) -> Option<usize> {
    if word.is_empty() {
        return None;
    }

    let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
    if let Ok(re) = Regex::new(&pattern) {
        if let Some(m) = re.find(text) {
            return Some(text[..m.end()].chars().count());
        }
    }

    let lower = text.to_lowercase();
    let word_lower = word.to_lowercase();
    let start = lower.find(&word_lower)?;
    Some(lower[..start + word_lower.len()].chars().count())
}

/// True when a `{digits}` marker sits immediately at `char_offset`.
/// Rerunning the applier must not double-insert.
fn marker_follows(text: &str, char_offset: usize) -> bool {
    let mut rest = text.chars().skip(char_offset);
    if rest.next() != Some('{') {
        return false;
    }
    let mut digits = 0;
    for c in rest {
        match c {
            '0'..='9' => digits += 1,
            '}' => return digits > 0,
            _ => return false,
        }
    }
    false
}
