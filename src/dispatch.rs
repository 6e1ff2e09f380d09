//! Request/cancellation dispatcher for the completion protocol.
//!
//! Routes the four inbound message kinds to their handlers, keeps the
//! virtual document synced with the backend session, and tracks pending
//! completion requests so they can be cancelled by id.

mod backend;
mod session;

use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, info, warn};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use url::Url;

pub use backend::{AnalysisBackend, AnalysisSession};
use session::{SessionCell, SessionHandle, SessionOutcome};

use crate::config::{AnalysisSettings, OptionsProvider};
use crate::document::VirtualDocument;
use crate::error::{BridgeError, BridgeResult};
use crate::protocol::{
    CellPosition, ChangeRecord, CompletionList, InboundMessage, OutboundMessage, RangeEditOp,
    normalize_completion_result,
};

/// Dispatcher owning zero-or-one backend sessions and their virtual document.
///
/// Inbound messages for a document must be delivered one at a time, in
/// arrival order; completion requests may be in flight concurrently for many
/// ids.
pub struct CompletionDispatcher {
    backend: Arc<dyn AnalysisBackend>,
    options: Arc<dyn OptionsProvider>,
    session: SessionCell,
    /// Pending completion requests by id; the token is the cancellation
    /// handle, released when the entry is removed.
    pending: DashMap<String, CancellationToken>,
}

impl CompletionDispatcher {
    pub fn new(backend: Arc<dyn AnalysisBackend>, options: Arc<dyn OptionsProvider>) -> Self {
        Self {
            backend,
            options,
            session: SessionCell::new(),
            pending: DashMap::new(),
        }
    }

    /// Route one inbound message to its handler. Emits zero or one outbound
    /// message: exactly one for `request-completions`, none otherwise.
    pub async fn dispatch(&self, message: InboundMessage) -> Option<OutboundMessage> {
        match message {
            InboundMessage::AppendCode {
                code,
                source_location,
            } => {
                self.on_append(&code, source_location.as_ref()).await;
                None
            }
            InboundMessage::EditCell { changes } => {
                self.on_edit(&changes).await;
                None
            }
            InboundMessage::RequestCompletions {
                id,
                position,
                context,
            } => Some(self.on_request_completions(id, position, context).await),
            InboundMessage::CancelCompletions { id } => {
                self.on_cancel_completions(&id);
                None
            }
        }
    }

    /// Append one executed fragment and sync the result to the backend.
    pub async fn on_append(&self, code: &str, source_location: Option<&Url>) {
        let handle = match self.ensure_session(source_location).await {
            Ok(handle) => handle,
            Err(error) => {
                warn!(target: "cellbridge::dispatch", "dropping append, no session: {error}");
                return;
            }
        };
        let mut document = handle.document.lock().await;
        let record = document.append_fragment(code);
        self.sync(&handle, &document, vec![record]).await;
    }

    /// Apply interior edits to the active cell and sync the result.
    pub async fn on_edit(&self, changes: &[RangeEditOp]) {
        // Edits never carry a source location of their own; they reuse the
        // session established by the most recent startup.
        let handle = match self.ensure_session(None).await {
            Ok(handle) => handle,
            Err(error) => {
                warn!(target: "cellbridge::dispatch", "dropping edit, no session: {error}");
                return;
            }
        };
        let mut document = handle.document.lock().await;
        let records = document.apply_range_edit(changes);
        if records.is_empty() {
            return;
        }
        self.sync(&handle, &document, records).await;
    }

    /// Issue a completion request. Always emits exactly one response for the
    /// id: the normalized backend result on success, the empty/incomplete
    /// list on any failure or cancellation.
    pub async fn on_request_completions(
        &self,
        id: String,
        position: CellPosition,
        context: Value,
    ) -> OutboundMessage {
        let token = CancellationToken::new();
        self.pending.insert(id.clone(), token.clone());

        let list = self.run_completion(&token, position, context).await;

        // The id's cancel/response cycle ends with the response; release the
        // handle rather than letting it outlive its entry.
        self.pending.remove(&id);
        OutboundMessage::CompletionResponse { id, list }
    }

    /// Cancel a pending request. Unknown or already-resolved ids are a
    /// silent no-op.
    pub fn on_cancel_completions(&self, id: &str) {
        if let Some((_, token)) = self.pending.remove(id) {
            debug!(target: "cellbridge::dispatch", "cancelling completion request {id}");
            token.cancel();
        }
    }

    /// Discard the current session (or failed attempt) so the next message
    /// triggers a fresh top-level initialization.
    pub async fn reset_session(&self) {
        self.session.reset().await;
    }

    async fn run_completion(
        &self,
        token: &CancellationToken,
        position: CellPosition,
        context: Value,
    ) -> CompletionList {
        let handle = match self.ensure_session(None).await {
            Ok(handle) => handle,
            Err(error) => {
                debug!(target: "cellbridge::dispatch", "completions unavailable: {error}");
                return CompletionList::empty_incomplete();
            }
        };

        // Translate at issue time; a later append/edit only affects future
        // requests.
        let (translated, versioned) = {
            let document = handle.document.lock().await;
            (
                document.translate_local_position(position),
                document.versioned_id(),
            )
        };

        let request = handle
            .session
            .completions(versioned, translated, context, token.clone());
        tokio::select! {
            // Cancellation wins when both arms are ready in the same poll.
            biased;
            _ = token.cancelled() => CompletionList::empty_incomplete(),
            result = request => match result {
                Ok(value) => normalize_completion_result(value).unwrap_or_else(|| {
                    warn!(
                        target: "cellbridge::dispatch",
                        "unrecognized completion result shape from backend"
                    );
                    CompletionList::empty_incomplete()
                }),
                Err(error) => {
                    debug!(target: "cellbridge::dispatch", "completion request failed: {error}");
                    CompletionList::empty_incomplete()
                }
            }
        }
    }

    /// Send the open notification on the first successful sync, change
    /// notifications with the produced records afterwards. Sync failures are
    /// logged and absorbed so a broken backend never blocks the surface.
    async fn sync(
        &self,
        handle: &SessionHandle,
        document: &VirtualDocument,
        changes: Vec<ChangeRecord>,
    ) {
        let result = if handle.opened() {
            handle
                .session
                .change_document(document.versioned_id(), changes)
                .await
        } else {
            match handle.session.open_document(document.open_payload()).await {
                Ok(()) => {
                    handle.set_opened();
                    Ok(())
                }
                Err(error) => Err(error),
            }
        };
        if let Err(error) = result {
            warn!(target: "cellbridge::dispatch", "document sync failed: {error}");
        }
    }

    async fn ensure_session(&self, source_location: Option<&Url>) -> SessionOutcome {
        let location = source_location.cloned();
        self.session
            .get_or_init(|| self.start_session(location))
            .await
    }

    async fn start_session(&self, location: Option<Url>) -> BridgeResult<SessionHandle> {
        let settings = self.options.analysis_settings();
        let uri = match location {
            Some(uri) => uri,
            None => scratch_uri(&settings)?,
        };
        info!(target: "cellbridge::session", "starting analysis session for {uri}");
        let session = self.backend.start_session(&settings, &uri).await?;
        let document = VirtualDocument::new(uri, settings.language_id.clone());
        Ok(SessionHandle::new(session, document))
    }
}

/// Synthesize a scratch location when the append carries none.
fn scratch_uri(settings: &AnalysisSettings) -> BridgeResult<Url> {
    let spelled = format!(
        "untitled:scratch-{}.{}",
        ulid::Ulid::new(),
        settings.file_extension
    );
    Url::parse(&spelled).map_err(|error| BridgeError::internal(format!("scratch uri: {error}")))
}
