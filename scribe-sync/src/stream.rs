//! Incremental ingestion of AI generation output.
//!
//! At most one session is active. Opening a new one signals the previous
//! reader to stop and immediately marks it inactive; its late chunks are
//! refused by [`DocumentState`] because they carry a stale session id.
//! Cancellation is cooperative: the reader stops consuming, the transport
//! request may still be in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use parking_lot::Mutex;
use scribe_types::StreamAction;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::decode::Utf8ChunkDecoder;
use crate::error::StreamError;
use crate::remote::StreamTransport;
use crate::state::{DocumentState, StreamEnd};

/// How a stream session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Failed(StreamError),
    Cancelled,
}

impl StreamOutcome {
    fn as_end(&self) -> StreamEnd {
        match self {
            StreamOutcome::Completed => StreamEnd::Completed,
            StreamOutcome::Cancelled => StreamEnd::Cancelled,
            StreamOutcome::Failed(err) => StreamEnd::Failed(err.to_string()),
        }
    }
}

struct ActiveStream {
    session: u64,
    cancel: oneshot::Sender<()>,
}

pub struct StreamIngestor {
    state: DocumentState,
    transport: Arc<dyn StreamTransport>,
    active: Arc<Mutex<Option<ActiveStream>>>,
    next_session: AtomicU64,
}

impl StreamIngestor {
    pub fn new(state: DocumentState, transport: Arc<dyn StreamTransport>) -> Self {
        Self {
            state,
            transport,
            active: Arc::new(Mutex::new(None)),
            next_session: AtomicU64::new(0),
        }
    }

    /// Start streaming `action` over `text` into the output buffer,
    /// superseding any active session first.
    pub fn open(&self, action: StreamAction, text: impl Into<String>) -> JoinHandle<StreamOutcome> {
        let text = text.into();
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let session = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;

        {
            let mut active = self.active.lock();
            if let Some(previous) = active.take() {
                debug!(session = previous.session, "superseding active stream");
                let _ = previous.cancel.send(());
                self.state.finish_stream(previous.session, StreamEnd::Cancelled);
            }
            self.state.begin_stream(session, action);
            *active = Some(ActiveStream {
                session,
                cancel: cancel_tx,
            });
        }
        info!(session, %action, chars = text.chars().count(), "opening ai stream");

        let state = self.state.clone();
        let transport = Arc::clone(&self.transport);
        let active = Arc::clone(&self.active);
        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel_rx => StreamOutcome::Cancelled,
                outcome = ingest(&state, transport.as_ref(), session, action, &text) => outcome,
            };

            match &outcome {
                StreamOutcome::Completed => debug!(session, "ai stream completed"),
                StreamOutcome::Cancelled => debug!(session, "ai stream cancelled"),
                StreamOutcome::Failed(err) => warn!(session, error = %err, "ai stream failed"),
            }
            state.finish_stream(session, outcome.as_end());

            let mut active = active.lock();
            if active.as_ref().is_some_and(|a| a.session == session) {
                *active = None;
            }
            outcome
        })
    }

    /// Stop consuming the active session, keeping what was buffered.
    pub fn cancel(&self) -> bool {
        let Some(previous) = self.active.lock().take() else {
            return false;
        };
        let _ = previous.cancel.send(());
        self.state.finish_stream(previous.session, StreamEnd::Cancelled);
        true
    }

    pub fn is_active(&self) -> bool {
        self.active.lock().is_some()
    }
}

async fn ingest(
    state: &DocumentState,
    transport: &dyn StreamTransport,
    session: u64,
    action: StreamAction,
    text: &str,
) -> StreamOutcome {
    let mut body = match transport.open(action, text).await {
        Ok(body) => body,
        Err(err) => return StreamOutcome::Failed(err),
    };

    let mut decoder = Utf8ChunkDecoder::new();
    while let Some(chunk) = body.next().await {
        let bytes = match chunk {
            Ok(bytes) => bytes,
            Err(err) => return StreamOutcome::Failed(err),
        };
        let text = decoder.decode(&bytes);
        if text.is_empty() {
            continue;
        }
        if !state.append_stream(session, &text) {
            return StreamOutcome::Cancelled;
        }
    }

    let tail = decoder.finish();
    if !tail.is_empty() && !state.append_stream(session, &tail) {
        return StreamOutcome::Cancelled;
    }
    StreamOutcome::Completed
}
