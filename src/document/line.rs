//! Line records for the virtual document.

use std::ops::Range;

/// One line of the virtual document, excluding its trailing break.
///
/// Only the text, index, and start offset are stored; every range property
/// is derived from them so the views cannot drift apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    text: String,
    index: u32,
    start: usize,
}

impl Line {
    pub(crate) fn new(text: String, index: u32, start: usize) -> Self {
        Self { text, index, start }
    }

    /// The line's text, without the trailing break.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// 0-based line index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Byte offset of the line's first character within the document.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset one past the line's last character, excluding the break.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }

    /// `[start, end)` byte range of the text, excluding the line break.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Byte range including the trailing break slot.
    ///
    /// For the document's last line this extends one past the end of the
    /// content, covering the position a break would occupy.
    pub fn range_with_break(&self) -> Range<usize> {
        self.start..self.end() + 1
    }

    /// Whether the line holds only whitespace.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
