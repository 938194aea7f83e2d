//! Access to the structured-verse target document.
//!
//! The matcher reads verse lines through this wrapper; the applier is the
//! single writer, mutating line text in place before the document is
//! rewritten to disk.

use crate::error::{ApostilError, Result};
use crate::xml::{self, XmlTree};
use indextree::NodeId;
use std::fs;
use std::path::{Path, PathBuf};

/// A verse line of the target document.
#[derive(Debug, Clone)]
pub struct VerseLine {
    pub id: NodeId,
    /// The `n` attribute; empty when the numbering pass has not reached
    /// this line.
    pub number: String,
    /// Concatenated text content, nested inline markup flattened.
    pub text: String,
}

pub struct TeiDocument {
    tree: XmlTree,
    root: NodeId,
}

impl TeiDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_str(&source)
    }

    pub fn from_str(source: &str) -> Result<Self> {
        let tree = xml::parse(source)?;
        let root = tree.root().ok_or(ApostilError::EmptyDocument)?;
        Ok(Self { tree, root })
    }

    /// All `<l>` elements in document order.
    pub fn lines(&self) -> Vec<VerseLine> {
        self.tree
            .tei_elements(self.root, "l")
            .into_iter()
            .map(|id| VerseLine {
                id,
                number: self.tree.attribute(id, "n").unwrap_or("").to_string(),
                text: self.tree.text_of(id),
            })
            .collect()
    }

    /// The first line whose `n` attribute equals `number`.
    pub fn line_by_number(&self, number: &str) -> Option<NodeId> {
        self.tree
            .tei_elements(self.root, "l")
            .into_iter()
            .find(|&id| self.tree.attribute(id, "n") == Some(number))
    }

    pub fn line_text(&self, line: NodeId) -> String {
        self.tree.text_of(line)
    }

    pub fn element_path(&self, node: NodeId) -> String {
        self.tree.element_path(node)
    }

    /// Concatenated text of the line and up to `widen` verse lines on each
    /// side, clipped at the enclosing container (speech, stanza).
    pub fn window_text(&self, line: NodeId, widen: usize) -> String {
        let Some(parent) = self.tree.parent(line) else {
            return self.tree.text_of(line);
        };

        let siblings: Vec<NodeId> = self
            .tree
            .children(parent)
            .filter(|&id| self.tree.get(id).map(|d| d.is_element()).unwrap_or(false))
            .collect();
        let Some(index) = siblings.iter().position(|&id| id == line) else {
            return self.tree.text_of(line);
        };

        let start = index.saturating_sub(widen);
        let end = (index + widen + 1).min(siblings.len());
        let mut parts = Vec::new();
        for &sibling in &siblings[start..end] {
            let is_line = self
                .tree
                .element_name(sibling)
                .map(|n| n.is_tei("l"))
                .unwrap_or(false);
            if is_line {
                parts.push(self.tree.text_of(sibling));
            }
        }
        parts.join(" ")
    }

    /// Insert `marker` at `char_offset` into the line's text content,
    /// mapping the offset across the line's text segments in document
    /// order. Returns false when no segment covers the offset.
    pub fn insert_marker(&mut self, line: NodeId, char_offset: usize, marker: &str) -> bool {
        let mut consumed = 0usize;
        for segment in self.tree.text_segments(line) {
            let len = self
                .tree
                .get(segment)
                .and_then(|d| d.text_content())
                .map(|t| t.chars().count())
                .unwrap_or(0);
            // Inclusive upper bound: an offset at a segment boundary lands
            // at the end of the earlier segment.
            if char_offset >= consumed && char_offset <= consumed + len {
                return self.tree.splice_text(segment, char_offset - consumed, marker);
            }
            consumed += len;
        }
        false
    }

    pub fn tree(&self) -> &XmlTree {
        &self.tree
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let xml = xml::serialize(&self.tree)?;
        fs::write(path, xml)?;
        Ok(())
    }
}

/// Sibling checkpoint path for the target document:
/// `fuenteovejuna.xml` -> `fuenteovejuna_backup.xml`.
pub fn backup_path(target: &Path) -> PathBuf {
    let stem = target
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("target");
    target.with_file_name(format!("{stem}_backup.xml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PLAY: &str = concat!(
        r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><text><body><div><sp>"#,
        "<speaker>FLORES</speaker>",
        r#"<l n="1">Sale el gran Maestre de Calatrava</l>"#,
        r#"<l n="2">Fernando es el <seg>Rey</seg> de Castilla</l>"#,
        r#"<l n="3">y doña Isabel la reina</l>"#,
        "</sp></div></body></text></TEI>"
    );

    #[test]
    fn lines_carry_number_and_flattened_text() {
        let doc = TeiDocument::from_str(PLAY).unwrap();
        let lines = doc.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].number, "1");
        assert_eq!(lines[1].text, "Fernando es el Rey de Castilla");
    }

    #[test]
    fn line_by_number_finds_the_right_element() {
        let doc = TeiDocument::from_str(PLAY).unwrap();
        let line = doc.line_by_number("3").unwrap();
        assert_eq!(doc.line_text(line), "y doña Isabel la reina");
        assert!(doc.line_by_number("99").is_none());
    }

    #[test]
    fn window_text_clips_at_container() {
        let doc = TeiDocument::from_str(PLAY).unwrap();
        let first = doc.line_by_number("1").unwrap();
        // The speaker element sits inside the window range but is not a
        // verse line, so it contributes nothing.
        assert_eq!(
            doc.window_text(first, 2),
            "Sale el gran Maestre de Calatrava Fernando es el Rey de Castilla \
             y doña Isabel la reina"
        );
        assert_eq!(doc.window_text(first, 0), "Sale el gran Maestre de Calatrava");
    }

    #[test]
    fn insert_marker_into_single_run() {
        let mut doc = TeiDocument::from_str(PLAY).unwrap();
        let line = doc.line_by_number("1").unwrap();
        // After "Maestre" = offset 20.
        assert!(doc.insert_marker(line, 20, "{7}"));
        assert_eq!(doc.line_text(line), "Sale el gran Maestre{7} de Calatrava");
    }

    #[test]
    fn insert_marker_lands_inside_nested_segment() {
        let mut doc = TeiDocument::from_str(PLAY).unwrap();
        let line = doc.line_by_number("2").unwrap();
        // "Fernando es el Rey" = 18 chars; "Rey" ends inside the seg child.
        assert!(doc.insert_marker(line, 18, "{4}"));
        assert_eq!(doc.line_text(line), "Fernando es el Rey{4} de Castilla");
    }

    #[test]
    fn insert_marker_rejects_offset_past_text() {
        let mut doc = TeiDocument::from_str(PLAY).unwrap();
        let line = doc.line_by_number("1").unwrap();
        assert!(!doc.insert_marker(line, 500, "{1}"));
    }

    #[test]
    fn backup_path_is_a_sibling() {
        let path = backup_path(Path::new("/work/fuenteovejuna.xml"));
        assert_eq!(path, Path::new("/work/fuenteovejuna_backup.xml"));
    }
}
