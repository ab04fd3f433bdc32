use xi_rope::Rope;
use xi_rope::delta::DeltaElement;

use crate::editing::commands::{self, Cmd};
use crate::editing::patch::Patch;

/// The authoritative plain-text document.
///
/// Holds the single string of truth in an `xi_rope::Rope` buffer, the current
/// selection as byte offsets, and a version counter bumped on every applied
/// command. The visual tree is never stored here; it is a projection owned by
/// the reconciliation controller and regenerated from `text()` on demand.
pub struct Document {
    /// Rope buffer containing the entire document as UTF-8 text.
    pub(crate) buffer: Rope,
    /// Current selection/cursor position as byte offsets into the buffer.
    pub(crate) selection: std::ops::Range<usize>,
    /// Incremented on each edit; lets hosts detect changes cheaply.
    pub(crate) version: u64,
}

impl Document {
    /// Create a document from plain text, cursor at the end.
    pub fn new(text: &str) -> Self {
        let buffer = Rope::from(text);
        let len = buffer.len();
        Self {
            buffer,
            selection: len..len,
            version: 0,
        }
    }

    /// Create a document from raw bytes, validating UTF-8.
    pub fn from_bytes(bytes: &[u8]) -> anyhow::Result<Self> {
        let text = std::str::from_utf8(bytes)?;
        Ok(Self::new(text))
    }

    /// Current document text (exact round-trip of what was edited in).
    pub fn text(&self) -> String {
        self.buffer.to_string()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.len() == 0
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn selection(&self) -> std::ops::Range<usize> {
        self.selection.clone()
    }

    /// Set the selection, clamped to the buffer.
    pub fn set_selection(&mut self, selection: std::ops::Range<usize>) {
        let len = self.buffer.len();
        let start = selection.start.min(len);
        let end = selection.end.min(len).max(start);
        self.selection = start..end;
    }

    /// Apply a command to the document.
    ///
    /// The command compiles to an xi-rope delta, the new selection is computed
    /// analytically from the pre-edit state, then the delta is applied and the
    /// version bumped.
    pub fn apply(&mut self, cmd: Cmd) -> Patch {
        let delta = commands::compile_command(self, &cmd);
        let new_selection = commands::selection_after(self, &cmd);

        // Track inserted ranges (in post-edit coordinates) for the patch.
        let mut changed = Vec::new();
        let mut cursor = 0;
        for op in delta.els.iter() {
            match op {
                DeltaElement::Copy(from, to) => {
                    cursor += to - from;
                }
                DeltaElement::Insert(inserted) => {
                    changed.push(cursor..cursor + inserted.len());
                    cursor += inserted.len();
                }
            }
        }

        self.buffer = delta.apply(&self.buffer);
        self.set_selection(new_selection);
        self.version += 1;

        Patch {
            changed,
            new_selection: self.selection.clone(),
            version: self.version,
        }
    }
}

impl Clone for Document {
    fn clone(&self) -> Self {
        Self {
            buffer: self.buffer.clone(),
            selection: self.selection.clone(),
            version: self.version,
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        // Buffer contents compared as strings; rope structure is irrelevant.
        self.buffer.to_string() == other.buffer.to_string()
            && self.selection == other.selection
            && self.version == other.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn new_document_starts_with_cursor_at_end() {
        let doc = Document::new("# Hello");
        assert_eq!(doc.text(), "# Hello");
        assert_eq!(doc.version(), 0);
        assert_eq!(doc.selection(), 7..7);
    }

    #[test]
    fn from_bytes_rejects_invalid_utf8() {
        assert!(Document::from_bytes(&[0xFF, 0xFE, 0xFD]).is_err());
    }

    #[test]
    fn from_bytes_preserves_content_exactly() {
        let original = "# Doc\n\n- [ ] task\n\n```\nnot special here\n```";
        let doc = Document::from_bytes(original.as_bytes()).unwrap();
        assert_eq!(doc.text(), original);
    }

    #[test]
    fn unicode_text_round_trips() {
        let text = "Hello 世界! 🦀\n- [ ] ταskまだ";
        let doc = Document::new(text);
        assert_eq!(doc.text(), text);
    }

    #[test]
    fn apply_bumps_version_and_moves_selection() {
        let mut doc = Document::new("abc");
        let patch = doc.apply(Cmd::InsertText {
            at: 3,
            text: "def".to_string(),
        });
        assert_eq!(doc.text(), "abcdef");
        assert_eq!(patch.version, 1);
        assert_eq!(patch.new_selection, 6..6);
        assert_eq!(doc.selection(), 6..6);
    }

    #[test]
    fn set_selection_clamps_to_buffer() {
        let mut doc = Document::new("ab");
        doc.set_selection(10..20);
        assert_eq!(doc.selection(), 2..2);
        doc.set_selection(1..0);
        assert_eq!(doc.selection(), 1..1);
    }

    #[test]
    fn patch_reports_inserted_ranges() {
        let mut doc = Document::new("Hello World");
        let patch = doc.apply(Cmd::InsertText {
            at: 5,
            text: " there".to_string(),
        });
        assert_eq!(patch.changed, vec![5..11]);
    }
}
