use serde::{Deserialize, Serialize};

/// One footnote marker found in the annotated HTML edition.
///
/// Duplicated numbers across documents are carried as-is; the matcher
/// treats every record independently.
///
/// Wire format keeps the field names of the original editorial exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRecord {
    #[serde(rename = "numero")]
    pub number: u32,

    /// The anchoring word: the last word before the marker.
    #[serde(rename = "palabra")]
    pub word: String,

    /// Up to the last five words before the marker.
    #[serde(rename = "contexto")]
    pub context: String,

    /// Leading snippet of the surrounding block, for human reference.
    #[serde(rename = "texto_completo")]
    pub full_text: String,
}

/// A verse line that contains the anchoring word, scored against the
/// note's context. Ephemeral during matching; only the ranked head(s)
/// survive into the mapping export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateLine {
    /// The line's `n` attribute in the target document.
    #[serde(rename = "verso")]
    pub line_number: String,

    #[serde(rename = "texto")]
    pub text: String,

    /// Context overlap in [0, 1].
    pub score: f64,

    /// Index-style element path of the line, for auditing.
    #[serde(rename = "xpath")]
    pub location: String,
}

/// A note with exactly one top-scoring candidate line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedNote {
    #[serde(rename = "numero_nota")]
    pub number: u32,

    #[serde(rename = "palabra")]
    pub word: String,

    #[serde(rename = "verso")]
    pub line_number: String,

    #[serde(rename = "texto_verso")]
    pub line_text: String,

    pub score: f64,

    #[serde(rename = "xpath")]
    pub location: String,
}

/// A note whose top candidates are tied; kept for human triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbiguousNote {
    #[serde(rename = "numero_nota")]
    pub number: u32,

    #[serde(rename = "palabra")]
    pub word: String,

    #[serde(rename = "contexto")]
    pub context: String,

    #[serde(rename = "candidatos")]
    pub candidates: Vec<CandidateLine>,
}

/// The three-way partition of all notes against the target document.
///
/// Invariant: every input record lands in exactly one of the three sets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NoteMapping {
    #[serde(rename = "mapeo")]
    pub resolved: Vec<ResolvedNote>,

    #[serde(rename = "no_encontradas")]
    pub unresolved: Vec<NoteRecord>,

    #[serde(rename = "multiples")]
    pub ambiguous: Vec<AmbiguousNote>,
}

impl NoteMapping {
    pub fn total(&self) -> usize {
        self.resolved.len() + self.unresolved.len() + self.ambiguous.len()
    }
}

/// What happened when a resolved note was applied to the live document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertionOutcome {
    /// Marker inserted at the anchoring word.
    Inserted { number: u32 },

    /// A marker for this note was already present; nothing changed.
    AlreadyMarked { number: u32 },

    /// The marker could not be placed; carries the diagnostic.
    Failed(InsertionFailure),
}

impl InsertionOutcome {
    pub fn number(&self) -> u32 {
        match self {
            Self::Inserted { number } | Self::AlreadyMarked { number } => *number,
            Self::Failed(f) => f.number,
        }
    }

    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// A resolved note whose marker could not be placed in the live document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertionFailure {
    #[serde(rename = "numero_nota")]
    pub number: u32,

    #[serde(rename = "palabra")]
    pub word: String,

    #[serde(rename = "motivo")]
    pub reason: String,

    /// Snippet of the line's text, when the line itself was found.
    #[serde(rename = "texto_verso", skip_serializing_if = "Option::is_none")]
    pub line_text: Option<String>,
}
