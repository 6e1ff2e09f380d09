//! Wire types for the cell surface and the backend session.
//!
//! Inbound messages arrive as a kind tag plus a JSON payload and are modeled
//! as one tagged sum type with a handler per variant. Change records are the
//! canonical incremental-change shape both mutation paths produce; completion
//! items are opaque JSON values round-tripped without inspection.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use url::Url;

/// A position in the virtual document: 0-based line, UTF-16 column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// A range in the virtual document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

/// Canonical incremental edit descriptor sent to the backend.
///
/// `range` and `range_offset` describe the replaced span in pre-mutation
/// coordinates; an insertion has a zero-length range. Offsets are byte
/// offsets into the normalized document content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub range: Range,
    pub range_offset: usize,
    pub range_length: usize,
    pub text: String,
}

/// A 1-based cursor position in the editor's cell-local coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellPosition {
    pub line: u32,
    pub column: u32,
}

/// A 1-based line/column range as supplied by an editor change delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRange {
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

/// One range-replace operation from an editor change delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeEditOp {
    pub range: CellRange,
    pub text: String,
    pub range_length: u32,
}

/// Inbound message envelope: a kind tag plus the payload for that kind.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum InboundMessage {
    /// Append one executed fragment to the virtual document.
    #[serde(rename_all = "camelCase")]
    AppendCode {
        code: String,
        #[serde(default)]
        source_location: Option<Url>,
    },
    /// Apply interior edits to the active cell.
    EditCell { changes: Vec<RangeEditOp> },
    /// Issue a completion request against the virtual document.
    RequestCompletions {
        id: String,
        position: CellPosition,
        #[serde(default)]
        context: Value,
    },
    /// Cancel a pending completion request.
    CancelCompletions { id: String },
}

/// Outbound message envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum OutboundMessage {
    CompletionResponse { id: String, list: CompletionList },
}

/// The fixed output shape every completion result is normalized to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionList {
    pub is_incomplete: bool,
    pub items: Vec<Value>,
}

impl CompletionList {
    /// An empty list marking a complete (successful but empty) result.
    pub fn empty_complete() -> Self {
        Self {
            is_incomplete: false,
            items: Vec::new(),
        }
    }

    /// An empty list marking an absorbed failure or cancellation.
    pub fn empty_incomplete() -> Self {
        Self {
            is_incomplete: true,
            items: Vec::new(),
        }
    }
}

/// Payload for the backend's "open document" call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDocumentParams {
    pub uri: Url,
    pub language_id: String,
    pub version: i32,
    pub text: String,
}

/// Identity/version pair naming a synced state of the virtual document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedDocumentId {
    pub uri: Url,
    pub version: i32,
}

/// Normalize a backend completion result to the fixed output shape.
///
/// The backend may return either a plain ordered list of items or a wrapper
/// object carrying `{items, isIncomplete}`; the presence of the
/// incompleteness field is the discriminator. A `null` result is a
/// successful empty answer. Returns `None` for any other shape so the caller
/// can fall back to the failure-shaped empty/incomplete list.
pub fn normalize_completion_result(result: Value) -> Option<CompletionList> {
    match result {
        Value::Null => Some(CompletionList::empty_complete()),
        Value::Array(items) => Some(CompletionList {
            is_incomplete: false,
            items,
        }),
        Value::Object(mut map) => {
            let is_incomplete = map.get("isIncomplete")?.as_bool()?;
            let items = match map.remove("items") {
                Some(Value::Array(items)) => items,
                Some(_) => return None,
                None => Vec::new(),
            };
            Some(CompletionList {
                is_incomplete,
                items,
            })
        }
        _ => None,
    }
}
