//! Backend session acquisition.
//!
//! The dispatcher owns at most one backend session, obtained lazily on the
//! first call that needs it. Acquisition is modeled as an explicit state
//! machine rather than a memoized future: the first caller runs
//! initialization while concurrent callers await a shared watch channel, and
//! a failed attempt is replayed to all current and future callers until a
//! new top-level attempt is requested.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use tokio::sync::{Mutex, watch};

use super::backend::AnalysisSession;
use crate::document::VirtualDocument;
use crate::error::{BridgeError, BridgeResult};

/// Outcome of a top-level initialization attempt, shared between waiters.
pub(crate) type SessionOutcome = Result<Arc<SessionHandle>, Arc<BridgeError>>;

/// One initialized backend session plus the virtual document bound to it.
///
/// The document sits behind a single async mutex: inbound messages for a
/// document are processed in arrival order (single-writer discipline), and
/// the mutex keeps a late completion read from observing a half-applied
/// mutation.
pub(crate) struct SessionHandle {
    pub(crate) session: Arc<dyn AnalysisSession>,
    pub(crate) document: Mutex<VirtualDocument>,
    opened: AtomicBool,
}

impl SessionHandle {
    pub(crate) fn new(session: Arc<dyn AnalysisSession>, document: VirtualDocument) -> Self {
        Self {
            session,
            document: Mutex::new(document),
            opened: AtomicBool::new(false),
        }
    }

    /// Whether the open notification has been delivered to the backend.
    pub(crate) fn opened(&self) -> bool {
        self.opened.load(Ordering::SeqCst)
    }

    /// Record that the open notification has been delivered.
    pub(crate) fn set_opened(&self) {
        self.opened.store(true, Ordering::SeqCst);
    }
}

enum SessionSlot {
    Uninitialized,
    Initializing(watch::Receiver<Option<SessionOutcome>>),
    Ready(Arc<SessionHandle>),
    Failed(Arc<BridgeError>),
}

/// Holder for the dispatcher's zero-or-one backend session.
pub(crate) struct SessionCell {
    slot: Mutex<SessionSlot>,
}

impl SessionCell {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(SessionSlot::Uninitialized),
        }
    }

    /// Return the session, initializing it with `init` if this is the first
    /// caller. Concurrent callers share the in-flight attempt; later callers
    /// see the settled outcome, including a failure, replayed as-is.
    pub(crate) async fn get_or_init<F, Fut>(&self, init: F) -> SessionOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = BridgeResult<SessionHandle>>,
    {
        let mut rx = {
            let mut slot = self.slot.lock().await;
            match &*slot {
                SessionSlot::Ready(handle) => return Ok(Arc::clone(handle)),
                SessionSlot::Failed(error) => return Err(Arc::clone(error)),
                SessionSlot::Initializing(rx) => rx.clone(),
                SessionSlot::Uninitialized => {
                    let (tx, rx) = watch::channel(None);
                    *slot = SessionSlot::Initializing(rx);
                    drop(slot);

                    let outcome: SessionOutcome = match init().await {
                        Ok(handle) => Ok(Arc::new(handle)),
                        Err(error) => Err(Arc::new(error)),
                    };

                    let mut slot = self.slot.lock().await;
                    *slot = match &outcome {
                        Ok(handle) => SessionSlot::Ready(Arc::clone(handle)),
                        Err(error) => SessionSlot::Failed(Arc::clone(error)),
                    };
                    drop(slot);

                    // Waiters that grabbed the receiver before we settled.
                    let _ = tx.send(Some(outcome.clone()));
                    return outcome;
                }
            }
        };

        loop {
            let settled = rx.borrow_and_update().clone();
            if let Some(outcome) = settled {
                return outcome;
            }
            if rx.changed().await.is_err() {
                // Initializer future was dropped before settling.
                return Err(Arc::new(BridgeError::session_init(
                    "session initializer was dropped before completing",
                )));
            }
        }
    }

    /// Discard the current session or failure, allowing a new top-level
    /// initialization attempt.
    pub(crate) async fn reset(&self) {
        let mut slot = self.slot.lock().await;
        debug!(target: "cellbridge::session", "session slot reset");
        *slot = SessionSlot::Uninitialized;
    }
}
