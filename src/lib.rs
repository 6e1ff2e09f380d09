//! Virtual document synchronization and completion dispatch for
//! cell-structured interactive surfaces.
//!
//! A sequence of executed code fragments is presented to a language-analysis
//! backend as one continuous line-addressed file, kept incrementally in sync
//! as cells are appended or edited, while completion requests against the
//! virtual file are issued, tracked, and cancellable by id.

pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod protocol;

pub use config::{AnalysisSettings, OptionsProvider, StaticOptions};
pub use dispatch::{AnalysisBackend, AnalysisSession, CompletionDispatcher};
pub use document::{Fill, Line, VirtualDocument};
pub use error::{BridgeError, BridgeResult};
pub use protocol::{
    CellPosition, CellRange, ChangeRecord, CompletionList, InboundMessage, OpenDocumentParams,
    OutboundMessage, Position, Range, RangeEditOp, VersionedDocumentId,
};
