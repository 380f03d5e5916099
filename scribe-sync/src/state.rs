//! Shared editing state.
//!
//! One [`EditorSnapshot`] lives inside a `watch` channel. Every mutation is a
//! single `send_modify`/`send_if_modified` call, so readers always see a
//! consistent record (in particular `snapshot` and `plain_text` are never
//! observed half-updated). Each mutation is also published as a
//! [`StateEvent`] on a broadcast channel for observers that need the full,
//! ordered history rather than the latest value.

use std::sync::Arc;

use scribe_types::{Document, PostId, PostUpdate, SaveStatus, StreamAction};
use serde_json::Value;
use tokio::sync::{broadcast, watch};

const EVENT_CAPACITY: usize = 256;

/// Output of the current (or last) AI stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamView {
    /// Session that owns the buffer; 0 before the first stream.
    pub session: u64,
    pub action: Option<StreamAction>,
    pub buffer: String,
    pub active: bool,
    pub loading: bool,
    /// Failure that arrived after partial output was already buffered.
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorSnapshot {
    pub document: Document,
    pub save_status: SaveStatus,
    pub stream: StreamView,
    /// Bumped on every content or title edit.
    pub revision: u64,
    /// Edits exist that the server has not acknowledged.
    pub dirty: bool,
    /// Bumped whenever the session switches document (load/reset).
    pub epoch: u64,
}

/// How a stream session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    Completed,
    Cancelled,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    Loaded { id: Option<PostId> },
    BaselineSynced,
    ContentChanged { revision: u64 },
    TitleChanged { revision: u64 },
    IdentityAssigned { id: PostId },
    StatusChanged { from: SaveStatus, to: SaveStatus },
    Persisted { revision: u64 },
    StreamStarted { session: u64, action: StreamAction },
    StreamChunk { session: u64, bytes: usize },
    StreamFinished { session: u64, end: StreamEnd },
    StreamConsumed,
    Reset,
}

/// Everything a save needs, read in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct SavePayload {
    pub id: PostId,
    pub update: PostUpdate,
    pub revision: u64,
}

struct Shared {
    snapshot: watch::Sender<EditorSnapshot>,
    events: broadcast::Sender<StateEvent>,
}

/// Handle to the session's state. Cloning shares the same record.
#[derive(Clone)]
pub struct DocumentState {
    inner: Arc<Shared>,
}

impl Default for DocumentState {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentState {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(EditorSnapshot::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Shared { snapshot, events }),
        }
    }

    /// Latest-value subscription, suited to rendering.
    pub fn subscribe(&self) -> watch::Receiver<EditorSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// Ordered change notifications.
    pub fn events(&self) -> broadcast::Receiver<StateEvent> {
        self.inner.events.subscribe()
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn document(&self) -> Document {
        self.inner.snapshot.borrow().document.clone()
    }

    pub fn post_id(&self) -> Option<PostId> {
        self.inner.snapshot.borrow().document.id.clone()
    }

    pub fn title(&self) -> String {
        self.inner.snapshot.borrow().document.title.clone()
    }

    pub fn plain_text(&self) -> String {
        self.inner.snapshot.borrow().document.plain_text.clone()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.inner.snapshot.borrow().save_status
    }

    pub fn stream(&self) -> StreamView {
        self.inner.snapshot.borrow().stream.clone()
    }

    pub fn revision(&self) -> u64 {
        self.inner.snapshot.borrow().revision
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.snapshot.borrow().dirty
    }

    pub fn epoch(&self) -> u64 {
        self.inner.snapshot.borrow().epoch
    }

    /// Replace the serialized snapshot and its plain text together.
    pub(crate) fn update_content(&self, snapshot: Value, plain_text: impl Into<String>) -> u64 {
        let plain_text = plain_text.into();
        let mut revision = 0;
        self.inner.snapshot.send_modify(|s| {
            s.document.snapshot = Some(snapshot);
            s.document.plain_text = plain_text;
            s.revision += 1;
            s.dirty = true;
            revision = s.revision;
        });
        self.emit(StateEvent::ContentChanged { revision });
        revision
    }

    pub(crate) fn update_title(&self, title: impl Into<String>) -> u64 {
        let title = title.into();
        let mut revision = 0;
        self.inner.snapshot.send_modify(|s| {
            s.document.title = title;
            s.revision += 1;
            s.dirty = true;
            revision = s.revision;
        });
        self.emit(StateEvent::TitleChanged { revision });
        revision
    }

    /// The surface re-serialized the loaded post. Same text, so neither
    /// `revision` nor `dirty` move.
    pub(crate) fn sync_baseline(&self, snapshot: Value) {
        self.inner.snapshot.send_modify(|s| {
            s.document.snapshot = Some(snapshot);
        });
        self.emit(StateEvent::BaselineSynced);
    }

    /// Baseline population from an already persisted post. Not an edit.
    pub(crate) fn load(&self, document: Document) {
        let id = document.id.clone();
        self.inner.snapshot.send_modify(|s| {
            s.document = document;
            s.save_status = SaveStatus::Idle;
            s.revision = 0;
            s.dirty = false;
            s.epoch += 1;
        });
        self.emit(StateEvent::Loaded { id });
    }

    /// Back to an empty, unsaved document with no stream output.
    pub(crate) fn reset(&self) {
        self.inner.snapshot.send_modify(|s| {
            let epoch = s.epoch + 1;
            *s = EditorSnapshot {
                epoch,
                ..EditorSnapshot::default()
            };
        });
        self.emit(StateEvent::Reset);
    }

    /// Read the current identity and content for a save. `None` until the
    /// document has an id.
    pub fn save_payload(&self) -> Option<SavePayload> {
        let s = self.inner.snapshot.borrow();
        let id = s.document.id.clone()?;
        Some(SavePayload {
            id,
            update: PostUpdate::from_document(&s.document),
            revision: s.revision,
        })
    }

    /// Record that the server holds `revision`. Only clears `dirty` when no
    /// newer edit happened meanwhile.
    pub(crate) fn mark_persisted(&self, revision: u64) {
        self.inner.snapshot.send_if_modified(|s| {
            if s.revision == revision && s.dirty {
                s.dirty = false;
                true
            } else {
                false
            }
        });
        self.emit(StateEvent::Persisted { revision });
    }

    /// Apply a freshly created identity. Content fields are left exactly as
    /// they are now; only id and title come from the creation result.
    /// Rejected when the session moved to another document since `epoch`.
    pub(crate) fn assign_identity(&self, epoch: u64, id: PostId, title: String) -> bool {
        let assigned = self.inner.snapshot.send_if_modified(|s| {
            if s.epoch != epoch || s.document.id.is_some() {
                return false;
            }
            s.document.id = Some(id.clone());
            s.document.title = title;
            true
        });
        if assigned {
            self.emit(StateEvent::IdentityAssigned { id });
        }
        assigned
    }

    /// Compare-and-set on the save status. `allowed` sees the current value;
    /// returns the previous status on success and the current one on refusal.
    pub(crate) fn transition_status(
        &self,
        to: SaveStatus,
        allowed: impl FnOnce(SaveStatus) -> bool,
    ) -> Result<SaveStatus, SaveStatus> {
        let mut outcome = Err(SaveStatus::Idle);
        self.inner.snapshot.send_if_modified(|s| {
            let from = s.save_status;
            if !allowed(from) {
                outcome = Err(from);
                return false;
            }
            outcome = Ok(from);
            if from == to {
                return false;
            }
            s.save_status = to;
            true
        });
        if let Ok(from) = outcome {
            if from != to {
                self.emit(StateEvent::StatusChanged { from, to });
            }
        }
        outcome
    }

    pub(crate) fn begin_stream(&self, session: u64, action: StreamAction) {
        self.inner.snapshot.send_modify(|s| {
            s.stream = StreamView {
                session,
                action: Some(action),
                buffer: String::new(),
                active: true,
                loading: true,
                error: None,
            };
        });
        self.emit(StateEvent::StreamStarted { session, action });
    }

    /// Append decoded output. Refused once `session` is no longer the active
    /// one, which is how a superseded reader learns to stop.
    pub(crate) fn append_stream(&self, session: u64, text: &str) -> bool {
        let accepted = self.inner.snapshot.send_if_modified(|s| {
            if s.stream.session != session || !s.stream.active {
                return false;
            }
            s.stream.buffer.push_str(text);
            true
        });
        if accepted {
            self.emit(StateEvent::StreamChunk {
                session,
                bytes: text.len(),
            });
        }
        accepted
    }

    /// Clear the active/loading flags of `session`, keeping its buffer.
    /// A failure replaces an empty buffer with an error message and is
    /// reported separately when partial output exists.
    pub(crate) fn finish_stream(&self, session: u64, end: StreamEnd) -> bool {
        let finished = self.inner.snapshot.send_if_modified(|s| {
            if s.stream.session != session || !(s.stream.active || s.stream.loading) {
                return false;
            }
            s.stream.active = false;
            s.stream.loading = false;
            if let StreamEnd::Failed(message) = &end {
                if s.stream.buffer.is_empty() {
                    s.stream.buffer = format!("Error: {message}");
                } else {
                    s.stream.error = Some(message.clone());
                }
            }
            true
        });
        if finished {
            self.emit(StateEvent::StreamFinished { session, end });
        }
        finished
    }

    /// Hand the finished output to the caller and clear it.
    pub fn take_stream_output(&self) -> Option<String> {
        let mut taken = None;
        self.inner.snapshot.send_if_modified(|s| {
            if s.stream.loading || s.stream.buffer.is_empty() {
                return false;
            }
            taken = Some(std::mem::take(&mut s.stream.buffer));
            s.stream.error = None;
            s.stream.action = None;
            true
        });
        if taken.is_some() {
            self.emit(StateEvent::StreamConsumed);
        }
        taken
    }

    pub fn discard_stream_output(&self) -> bool {
        self.take_stream_output().is_some()
    }

    fn emit(&self, event: StateEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }
}
