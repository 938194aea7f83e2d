//! Footnote placement pipeline for TEI verse editions.
//!
//! Three stages, each feeding the next through a file:
//! 1. [`locate`] scans annotated HTML documents for footnote markers.
//! 2. [`matcher`] matches each note against the verse lines of a TEI
//!    document and partitions the notes into resolved, ambiguous and
//!    unresolved.
//! 3. [`apply`] inserts `{n}` markers for the resolved notes and writes a
//!    review report for everything else.

pub mod apply;
pub mod config;
pub mod error;
pub mod locate;
pub mod matcher;
pub mod report;
pub mod tei;
pub mod text;
pub mod types;
pub mod xml;

pub use error::{ApostilError, Result};

pub use apply::{ApplyReport, NoteApplier};
pub use config::{LocatorSettings, MatcherSettings, PipelineConfig};
pub use locate::{LocateReport, NoteInventory, NoteLocator};
pub use matcher::NoteMatcher;
pub use tei::TeiDocument;
pub use types::{
    AmbiguousNote, CandidateLine, InsertionFailure, InsertionOutcome, NoteMapping, NoteRecord,
    ResolvedNote,
};
