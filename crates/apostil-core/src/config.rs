use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File locations for one pipeline run.
///
/// Every stage receives the paths it needs from here; nothing in the crate
/// reads process-wide state. Stages communicate only through these files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the annotated HTML documents (stage 1 input).
    pub input_dir: PathBuf,

    /// The structured-verse document being annotated (stages 2 and 3).
    pub target_document: PathBuf,

    /// Note-position export written by the locator, read by the matcher.
    pub positions_path: PathBuf,

    /// Mapping export written by the matcher, read by the applier.
    pub mapping_path: PathBuf,

    /// Manual-review report written by the applier.
    pub report_path: PathBuf,
}

impl PipelineConfig {
    /// Conventional layout: everything lives next to the target document,
    /// mirroring how the editorial working directory is organized.
    pub fn for_edition(input_dir: impl Into<PathBuf>, target_document: impl Into<PathBuf>) -> Self {
        let target_document = target_document.into();
        let base = target_document
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            input_dir: input_dir.into(),
            target_document,
            positions_path: base.join("posiciones_notas.json"),
            mapping_path: base.join("mapeo_notas.json"),
            report_path: base.join("notas_revision_manual.csv"),
        }
    }
}

/// Settings for the note locator (stage 1).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocatorSettings {
    /// Element names that qualify as the context boundary for a marker.
    /// The nearest ancestor with one of these names bounds the preceding
    /// text; markers with no qualifying ancestor are skipped.
    pub block_ancestors: Vec<String>,

    /// How many words before the marker make up the context window.
    pub context_window: usize,

    /// Maximum length, in characters, of the full-text reference snippet.
    pub snippet_len: usize,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            block_ancestors: vec!["td".to_string(), "p".to_string(), "strong".to_string()],
            context_window: 5,
            snippet_len: 200,
        }
    }
}

impl LocatorSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the context window size.
    pub fn with_context_window(mut self, words: usize) -> Self {
        self.context_window = words;
        self
    }

    /// Builder method to set the qualifying ancestor element names.
    pub fn with_block_ancestors<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.block_ancestors = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_block_ancestor(&self, name: &str) -> bool {
        self.block_ancestors.iter().any(|b| b == name)
    }
}

/// Settings for the note matcher (stage 2).
///
/// These thresholds encode editorial judgment calls and may need tuning per
/// corpus, so they are parameters rather than inline constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherSettings {
    /// How many verse lines on each side of a candidate are concatenated in
    /// when computing the widened context score.
    pub widen_lines: usize,

    /// How many tied top candidates an ambiguous result carries for triage.
    pub max_candidates: usize,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            widen_lines: 2,
            max_candidates: 5,
        }
    }
}

impl MatcherSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the widening window.
    pub fn with_widen_lines(mut self, lines: usize) -> Self {
        self.widen_lines = lines;
        self
    }

    /// Builder method to set the ambiguous candidate cap.
    pub fn with_max_candidates(mut self, n: usize) -> Self {
        self.max_candidates = n;
        self
    }
}
