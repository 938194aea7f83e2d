//! Manual-review report for everything automation could not settle:
//! unresolved notes, ambiguous notes and failed insertions.

use crate::error::Result;
use crate::text::truncate_chars;
use crate::types::{InsertionFailure, NoteMapping};
use std::fs;
use std::path::Path;

const HEADER: &str = "Número Nota,Tipo Problema,Palabra,Contexto,Candidatos/Motivo";

/// Render the comma-separated review report.
pub fn review_report(mapping: &NoteMapping, failures: &[&InsertionFailure]) -> String {
    let mut lines = vec![HEADER.to_string()];

    for note in &mapping.unresolved {
        lines.push(row(&[
            &note.number.to_string(),
            "No encontrada",
            &note.word,
            &note.context,
            "Palabra no existe en XML",
        ]));
    }

    for note in &mapping.ambiguous {
        let candidates = note
            .candidates
            .iter()
            .take(3)
            .map(|c| format!("v{}: {}...", c.line_number, truncate_chars(&c.text, 40)))
            .collect::<Vec<_>>()
            .join(" | ");
        lines.push(row(&[
            &note.number.to_string(),
            "Múltiples candidatos",
            &note.word,
            &note.context,
            &candidates,
        ]));
    }

    for failure in failures {
        let snippet = failure
            .line_text
            .as_deref()
            .map(|t| truncate_chars(t, 50))
            .unwrap_or_else(|| "N/A".to_string());
        lines.push(row(&[
            &failure.number.to_string(),
            "Falló inserción",
            &failure.word,
            &failure.reason,
            &snippet,
        ]));
    }

    lines.join("\n")
}

pub fn write_review_report(
    path: &Path,
    mapping: &NoteMapping,
    failures: &[&InsertionFailure],
) -> Result<()> {
    fs::write(path, review_report(mapping, failures))?;
    Ok(())
}

fn row(fields: &[&str]) -> String {
    fields
        .iter()
        .copied()
        .map(escape)
        .collect::<Vec<_>>()
        .join(",")
}

fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
