//! Trait seam for the language-analysis backend.
//!
//! The backend is an external collaborator: process lifecycle, capability
//! negotiation, and transport all live behind these traits. The dispatcher
//! only needs to start a session once, keep its document synced, and issue
//! completion requests against it.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::config::AnalysisSettings;
use crate::error::BridgeResult;
use crate::protocol::{ChangeRecord, OpenDocumentParams, Position, VersionedDocumentId};

/// Factory for backend sessions.
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    /// Start a session for the resolved logical location. Called at most
    /// once per top-level initialization attempt.
    async fn start_session(
        &self,
        settings: &AnalysisSettings,
        uri: &Url,
    ) -> BridgeResult<Arc<dyn AnalysisSession>>;
}

/// One live connection to the analysis backend.
#[async_trait]
pub trait AnalysisSession: Send + Sync {
    /// Open the virtual document with its full current content.
    async fn open_document(&self, params: OpenDocumentParams) -> BridgeResult<()>;

    /// Deliver incremental change records for an already-open document.
    async fn change_document(
        &self,
        id: VersionedDocumentId,
        changes: Vec<ChangeRecord>,
    ) -> BridgeResult<()>;

    /// Request completions at an absolute document position.
    ///
    /// The token signals cancellation intent; whether the backend stops work
    /// early is its own contract. Implementations may return either a bare
    /// item array or a `{items, isIncomplete}` wrapper object.
    async fn completions(
        &self,
        id: VersionedDocumentId,
        position: Position,
        context: Value,
        cancel: CancellationToken,
    ) -> BridgeResult<Value>;
}
