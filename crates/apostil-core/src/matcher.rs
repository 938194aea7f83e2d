//! Stage 2: match every extracted note against the target document.
//!
//! Every verse line is considered for every note; exhaustiveness is a
//! correctness requirement here, not an optimization concern. The corpus
//! is bounded (low thousands of lines, low hundreds of notes).

use crate::config::MatcherSettings;
use crate::error::{ApostilError, Result};
use crate::tei::TeiDocument;
use crate::text::normalize_compare;
use crate::types::{AmbiguousNote, CandidateLine, NoteMapping, NoteRecord, ResolvedNote};
use std::fs;
use std::path::Path;

pub struct NoteMatcher {
    settings: MatcherSettings,
}

impl NoteMatcher {
    pub fn new(settings: MatcherSettings) -> Self {
        Self { settings }
    }

    /// Partition `records` into resolved, ambiguous and unresolved against
    /// `doc`. Every record lands in exactly one set.
    pub fn match_notes(&self, records: &[NoteRecord], doc: &TeiDocument) -> NoteMapping {
        let lines = doc.lines();
        let mut mapping = NoteMapping::default();

        for record in records {
            let mut candidates = self.candidates_for(record, doc, &lines);

            // Stable sort: tied scores keep document order, so the
            // ambiguous set is reproducible across runs.
            candidates.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            if candidates.is_empty() {
                mapping.unresolved.push(record.clone());
            } else if candidates.len() == 1 || candidates[0].score > candidates[1].score {
                let top = &candidates[0];
                mapping.resolved.push(ResolvedNote {
                    number: record.number,
                    word: record.word.clone(),
                    line_number: top.line_number.clone(),
                    line_text: top.text.clone(),
                    score: top.score,
                    location: top.location.clone(),
                });
            } else {
                candidates.truncate(self.settings.max_candidates);
                mapping.ambiguous.push(AmbiguousNote {
                    number: record.number,
                    word: record.word.clone(),
                    context: record.context.clone(),
                    candidates,
                });
            }
        }

        mapping
    }

    fn candidates_for(
        &self,
        record: &NoteRecord,
        doc: &TeiDocument,
        lines: &[crate::tei::VerseLine],
    ) -> Vec<CandidateLine> {
        let word = normalize_compare(&record.word);
        let context = normalize_compare(&record.context);
        let context_tokens: Vec<&str> = context.split_whitespace().collect();

        let mut candidates = Vec::new();
        for line in lines {
            let line_norm = normalize_compare(&line.text);
            if word.is_empty() || !line_norm.contains(word.as_str()) {
                continue;
            }

            let mut score = overlap_score(&context_tokens, &line_norm);

            // Context spilling over line boundaries: score against the
            // surrounding window too, and keep the better value.
            let widened = normalize_compare(&doc.window_text(line.id, self.settings.widen_lines));
            let widened_score = overlap_score(&context_tokens, &widened);
            if widened_score > score {
                score = widened_score;
            }

            candidates.push(CandidateLine {
                line_number: line.number.clone(),
                text: line.text.trim().to_string(),
                score,
                location: doc.element_path(line.id),
            });
        }
        candidates
    }
}

/// Fraction of context tokens present, as substrings, in the normalized
/// text. Zero when the context is empty.
fn overlap_score(context_tokens: &[&str], normalized_text: &str) -> f64 {
    if context_tokens.is_empty() {
        return 0.0;
    }
    let found = context_tokens
        .iter()
        .filter(|token| normalized_text.contains(*token))
        .count();
    found as f64 / context_tokens.len() as f64
}

/// Write the mapping export (stage 2 output, stage 3 input).
pub fn write_mapping(path: &Path, mapping: &NoteMapping) -> Result<()> {
    let json = serde_json::to_string_pretty(mapping)?;
    fs::write(path, json)?;
    Ok(())
}

/// Read a mapping export back.
pub fn read_mapping(path: &Path) -> Result<NoteMapping> {
    let source = fs::read_to_string(path)?;
    serde_json::from_str(&source).map_err(|e| ApostilError::InvalidExport {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
