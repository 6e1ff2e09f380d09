//! The virtual document synchronizer.
//!
//! An append-mostly, cell-structured surface is presented to the analysis
//! backend as one continuous line-addressed file. Cells are appended as
//! fragments; the active (most recently appended) fragment can additionally
//! be edited in place through editor change deltas. Every mutation produces
//! the canonical incremental change records the backend protocol expects.
//!
//! Offsets are byte offsets into the normalized content; positions carry
//! 0-based lines and UTF-16 columns. The line index is rebuilt in full after
//! every mutation, the simplest strategy that keeps the line invariant exact.

use log::debug;
use url::Url;

use super::line::Line;
use crate::protocol::{
    CellPosition, ChangeRecord, OpenDocumentParams, Position, Range, RangeEditOp,
    VersionedDocumentId,
};

/// One-shot fill state: the first mutation of any kind, append or edit,
/// takes the synthetic-separator path exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Empty,
    Populated,
}

/// The synthesized full-text view assembled from all fragments applied so far.
pub struct VirtualDocument {
    uri: Url,
    language_id: String,
    version: i32,
    content: String,
    lines: Vec<Line>,
    /// Running insertion point separating synchronized content from new
    /// content. Sits one past the (possibly synthetic) separator that
    /// precedes the next fragment; interior edits do not move it.
    base_offset: usize,
    /// Line on which the active fragment begins; anchors cell-local
    /// coordinate translation for edits and completion cursors.
    base_line: u32,
    fill: Fill,
}

impl VirtualDocument {
    /// Create an empty document bound to its logical address.
    pub fn new(uri: Url, language_id: impl Into<String>) -> Self {
        let mut doc = Self {
            uri,
            language_id: language_id.into(),
            version: 0,
            content: String::new(),
            lines: Vec::new(),
            base_offset: 0,
            base_line: 0,
            fill: Fill::Empty,
        };
        doc.rebuild_lines();
        doc
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    /// Monotonically increasing version, +1 per successful mutation.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// The full text, normalized so no carriage returns are present.
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn base_offset(&self) -> usize {
        self.base_offset
    }

    pub fn fill(&self) -> Fill {
        self.fill
    }

    /// Append one fragment so it starts on its own line.
    ///
    /// The very first mutation splices the fragment bare: the document is
    /// conceptually a suffix of a larger unseen prior document, and the
    /// separator that would precede the fragment is counted in `base_offset`
    /// without being materialized. Every later append splices a leading
    /// separator at `base_offset - 1`, re-opening the previous line for
    /// joining. Returns one insertion record at the pre-mutation split
    /// position.
    pub fn append_fragment(&mut self, text: &str) -> ChangeRecord {
        let normalized = normalize_endings(text);
        let (split, inserted, advance) = match self.fill {
            Fill::Empty => {
                // Synthetic separator counted, never spliced in.
                let advance = normalized.len() + 1;
                (self.base_offset.min(self.content.len()), normalized, advance)
            }
            Fill::Populated => {
                let inserted = format!("\n{normalized}");
                let advance = inserted.len();
                let split = self.base_offset.saturating_sub(1).min(self.content.len());
                (split, inserted, advance)
            }
        };
        let fragment_start = match self.fill {
            Fill::Empty => split,
            Fill::Populated => split + 1,
        };
        self.fill = Fill::Populated;
        let record = self.splice(split, split, inserted);
        self.base_offset += advance;
        self.base_line = self.position_at(fragment_start).line;
        record
    }

    /// Apply one range-replace operation from an editor change delta.
    ///
    /// Batches are applied one logical edit at a time by the caller; only the
    /// first operation of a batch is honored per call. The first mutation of
    /// an empty document behaves exactly like an append. Subsequent edits
    /// translate the operation's 1-based cell-local coordinates into absolute
    /// document coordinates against the active fragment's base line and
    /// splice in place; interior edits do not advance `base_offset`.
    pub fn apply_range_edit(&mut self, ops: &[RangeEditOp]) -> Vec<ChangeRecord> {
        let Some(op) = ops.first() else {
            return Vec::new();
        };
        if self.fill == Fill::Empty {
            return vec![self.append_fragment(&op.text)];
        }

        let normalized = normalize_endings(&op.text);
        let start = Position::new(
            self.base_line + op.range.start_line.saturating_sub(1),
            op.range.start_column.saturating_sub(1),
        );
        let end = Position::new(
            self.base_line + op.range.end_line.saturating_sub(1),
            op.range.end_column.saturating_sub(1),
        );
        let start_offset = self.offset_at(start);
        let end_offset = self.offset_at(end).max(start_offset);
        vec![self.splice(start_offset, end_offset, normalized)]
    }

    /// Convert a 1-based position local to the active fragment into an
    /// absolute document position.
    pub fn translate_local_position(&self, position: CellPosition) -> Position {
        Position::new(
            self.base_line + position.line.saturating_sub(1),
            position.column.saturating_sub(1),
        )
    }

    /// Projection used to open the document with the backend.
    pub fn open_payload(&self) -> OpenDocumentParams {
        OpenDocumentParams {
            uri: self.uri.clone(),
            language_id: self.language_id.clone(),
            version: self.version,
            text: self.content.clone(),
        }
    }

    /// Identity/version pair naming the current synced state.
    pub fn versioned_id(&self) -> VersionedDocumentId {
        VersionedDocumentId {
            uri: self.uri.clone(),
            version: self.version,
        }
    }

    /// Convert a byte offset to a position. Offsets beyond the content and
    /// offsets inside a multi-byte character clamp down to the nearest valid
    /// boundary.
    pub fn position_at(&self, offset: usize) -> Position {
        let offset = offset.min(self.content.len());
        let line_index = match self.lines.binary_search_by_key(&offset, Line::start) {
            Ok(index) => index,
            Err(index) => index - 1,
        };
        let line = &self.lines[line_index];
        let character = utf16_prefix_units(line.text(), offset - line.start());
        Position::new(line.index(), character as u32)
    }

    /// Convert a position to a byte offset. Lines past the end map to the
    /// content length; columns past the line end map to the line end.
    pub fn offset_at(&self, position: Position) -> usize {
        let Some(line) = self.lines.get(position.line as usize) else {
            return self.content.len();
        };
        line.start() + byte_prefix_of_utf16(line.text(), position.character as usize)
    }

    /// Replace `[start_offset, end_offset)` with `text`, rebuild the line
    /// index, and bump the version. The returned record describes the
    /// replaced span in pre-mutation coordinates.
    fn splice(&mut self, start_offset: usize, end_offset: usize, text: String) -> ChangeRecord {
        let range = Range {
            start: self.position_at(start_offset),
            end: self.position_at(end_offset),
        };
        self.content.replace_range(start_offset..end_offset, &text);
        self.rebuild_lines();
        self.version += 1;
        debug!(
            target: "cellbridge::document",
            "v{}: replaced {}..{} with {} bytes",
            self.version,
            start_offset,
            end_offset,
            text.len()
        );
        ChangeRecord {
            range,
            range_offset: start_offset,
            range_length: end_offset - start_offset,
            text,
        }
    }

    fn rebuild_lines(&mut self) {
        self.lines.clear();
        let mut start = 0;
        for (index, text) in self.content.split('\n').enumerate() {
            self.lines
                .push(Line::new(text.to_string(), index as u32, start));
            start += text.len() + 1;
        }
    }
}

fn normalize_endings(text: &str) -> String {
    text.replace('\r', "")
}

/// UTF-16 length of the longest prefix of `text` that fits in `byte_prefix`
/// bytes. A prefix ending inside a character clamps to the character start.
fn utf16_prefix_units(text: &str, byte_prefix: usize) -> usize {
    let mut bytes = 0;
    let mut units = 0;
    for ch in text.chars() {
        if bytes + ch.len_utf8() > byte_prefix {
            break;
        }
        bytes += ch.len_utf8();
        units += ch.len_utf16();
    }
    units
}

/// Byte length of the prefix of `text` spanning `units` UTF-16 code units.
/// Columns past the line end clamp to the line end; a column landing inside
/// a surrogate pair clamps to the character start.
fn byte_prefix_of_utf16(text: &str, units: usize) -> usize {
    let mut bytes = 0;
    let mut seen = 0;
    for ch in text.chars() {
        if seen + ch.len_utf16() > units {
            return bytes;
        }
        seen += ch.len_utf16();
        bytes += ch.len_utf8();
    }
    bytes
}
