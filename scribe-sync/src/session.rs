//! One editing session: a document, its auto-save and its AI output.
//!
//! Components are wired here by constructor injection and share a single
//! [`DocumentState`]. The editing surface itself stays outside the engine;
//! it reports edits through [`EditorSession::on_edit`] and is reached back
//! through the [`EditorSurface`] trait.

use std::sync::Arc;

use scribe_types::{Document, SaveStatus, StreamAction};
use serde_json::Value;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::autosave::SaveCoordinator;
use crate::config::SyncConfig;
use crate::remote::{PersistenceClient, StreamTransport};
use crate::state::{DocumentState, EditorSnapshot, StateEvent, StreamView};
use crate::stream::{StreamIngestor, StreamOutcome};

/// Serialized surface state after a change, with its plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceContent {
    pub snapshot: Value,
    pub plain_text: String,
}

/// The editing surface as seen from the engine.
pub trait EditorSurface {
    /// Currently selected text; empty when nothing is selected.
    fn selected_text(&self) -> String;

    /// Append `text` as a new trailing paragraph and return the new content.
    fn append_paragraph(&mut self, text: &str) -> SurfaceContent;
}

pub struct EditorSession {
    config: SyncConfig,
    state: DocumentState,
    saves: Arc<SaveCoordinator>,
    streams: StreamIngestor,
}

impl EditorSession {
    /// Session on a new, empty document. The first edit creates a draft.
    pub fn new(
        config: SyncConfig,
        persistence: Arc<dyn PersistenceClient>,
        transport: Arc<dyn StreamTransport>,
    ) -> Self {
        let state = DocumentState::new();
        let saves = Arc::new(SaveCoordinator::new(state.clone(), persistence, &config));
        let streams = StreamIngestor::new(state.clone(), transport);
        Self {
            config,
            state,
            saves,
            streams,
        }
    }

    /// Session on an existing post. The surface's first content notification
    /// is not saved when its text matches `document`; title changes are
    /// always edits.
    pub fn open(
        config: SyncConfig,
        persistence: Arc<dyn PersistenceClient>,
        transport: Arc<dyn StreamTransport>,
        document: Document,
    ) -> Self {
        let session = Self::new(config, persistence, transport);
        debug!(post = ?document.id, "opening existing document");
        session.state.load(document);
        session.saves.expect_baseline_echo();
        session
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Unsaved edits exist.
    pub fn is_dirty(&self) -> bool {
        self.state.is_dirty()
    }

    pub fn subscribe(&self) -> watch::Receiver<EditorSnapshot> {
        self.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<StateEvent> {
        self.state.events()
    }

    pub fn document(&self) -> Document {
        self.state.document()
    }

    pub fn save_status(&self) -> SaveStatus {
        self.state.save_status()
    }

    pub fn stream(&self) -> StreamView {
        self.state.stream()
    }

    /// The surface changed. Must be called from within a tokio runtime.
    pub fn on_edit(&self, snapshot: Value, plain_text: impl Into<String>) {
        let plain_text = plain_text.into();
        if self.saves.is_baseline_echo(&plain_text) {
            self.state.sync_baseline(snapshot);
            return;
        }
        self.state.update_content(snapshot, plain_text);
        self.saves.content_changed();
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.state.update_title(title);
        self.saves.content_changed();
    }

    pub async fn retry_save(&self) -> bool {
        self.saves.retry().await
    }

    pub async fn flush(&self) -> bool {
        self.saves.flush().await
    }

    /// Summarize the whole document. `None` when there is nothing to send.
    pub fn summarize(&self) -> Option<JoinHandle<StreamOutcome>> {
        self.start_stream(StreamAction::Summarize, self.state.plain_text())
    }

    /// Fix grammar in the selection, or in the whole document when nothing
    /// is selected.
    pub fn fix_grammar(&self, surface: &dyn EditorSurface) -> Option<JoinHandle<StreamOutcome>> {
        let selected = surface.selected_text();
        let text = if selected.trim().is_empty() {
            self.state.plain_text()
        } else {
            selected
        };
        self.start_stream(StreamAction::FixGrammar, text)
    }

    fn start_stream(&self, action: StreamAction, text: String) -> Option<JoinHandle<StreamOutcome>> {
        if text.trim().is_empty() {
            debug!(%action, "no text to send");
            return None;
        }
        Some(self.streams.open(action, text))
    }

    pub fn cancel_stream(&self) -> bool {
        self.streams.cancel()
    }

    /// Move the finished stream output into the document as a new last
    /// paragraph. The resulting change goes through the normal save path.
    pub fn insert_stream_output(&self, surface: &mut dyn EditorSurface) -> bool {
        let Some(output) = self.state.take_stream_output() else {
            return false;
        };
        let content = surface.append_paragraph(&output);
        self.on_edit(content.snapshot, content.plain_text);
        true
    }

    pub fn discard_stream_output(&self) -> bool {
        self.state.discard_stream_output()
    }

    /// Start over on an empty document.
    pub fn reset(&self) {
        self.streams.cancel();
        self.saves.reset();
        self.state.reset();
    }

    /// Resolves once no save is pending and no stream is loading.
    pub async fn wait_settled(&self) {
        self.saves.settled().await;
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|s| !s.stream.loading).await;
    }
}
