//! Debounced persistence of the open document.
//!
//! Each edit marks the document pending synchronously, resolves an id
//! (creating a draft on the first edit of a new document) and re-arms the
//! debounce timer. When the timer fires the payload is read from
//! [`DocumentState`] at that moment, so only the latest content is sent.
//!
//! Saves are strictly single-flight: the save gate is held across the
//! `update` call and a timer that fires meanwhile waits for it, then reads
//! the state again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use scribe_types::SaveStatus;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::debounce::Debouncer;
use crate::draft::DraftProvisioner;
use crate::remote::PersistenceClient;
use crate::state::DocumentState;
use crate::status::{SaveStatusMachine, SaveTrigger};

pub struct SaveCoordinator {
    state: DocumentState,
    status: Arc<SaveStatusMachine>,
    drafts: DraftProvisioner,
    client: Arc<dyn PersistenceClient>,
    debouncer: Debouncer,
    save_gate: Mutex<()>,
    /// Cleared while the editing surface's first population of a loaded
    /// post is still expected. Only a content notification matching the
    /// loaded text counts as that echo.
    baseline: AtomicBool,
}

impl SaveCoordinator {
    pub fn new(state: DocumentState, client: Arc<dyn PersistenceClient>, config: &SyncConfig) -> Self {
        let status = Arc::new(SaveStatusMachine::new(state.clone(), config.saved_display));
        let drafts = DraftProvisioner::new(state.clone(), Arc::clone(&status), Arc::clone(&client), config);
        Self {
            state,
            status,
            drafts,
            client,
            debouncer: Debouncer::new(config.save_debounce),
            save_gate: Mutex::new(()),
            baseline: AtomicBool::new(true),
        }
    }

    /// The next content notification may be the surface echoing a loaded
    /// post.
    pub fn expect_baseline_echo(&self) {
        self.baseline.store(false, Ordering::SeqCst);
    }

    /// Whether a content notification carrying `plain_text` is the expected
    /// echo of the loaded post. The expectation is consumed either way, so a
    /// first notification that differs from the loaded text is an edit.
    pub fn is_baseline_echo(&self, plain_text: &str) -> bool {
        if self.baseline.swap(true, Ordering::SeqCst) {
            return false;
        }
        let echo = self.state.plain_text() == plain_text;
        if echo {
            debug!("baseline population absorbed");
        } else {
            debug!("first content differs from the loaded post");
        }
        echo
    }

    pub fn status(&self) -> SaveStatus {
        self.status.status()
    }

    /// React to a content or title change that was already applied to the
    /// state.
    pub fn content_changed(self: &Arc<Self>) {
        self.status.mark_pending();

        if self.state.post_id().is_some() {
            self.schedule_save();
            return;
        }

        let this = Arc::clone(self);
        let epoch = self.state.epoch();
        tokio::spawn(async move {
            // no id means creation failed and status is already error
            if this.drafts.ensure().await.is_some() && this.state.epoch() == epoch {
                this.schedule_save();
            }
        });
    }

    // The armed timer owns a handle to the coordinator, so a pending save
    // still runs if the session is dropped before it fires.
    fn schedule_save(self: &Arc<Self>) {
        let this = Arc::clone(self);
        self.debouncer.schedule(move || async move {
            this.persist(SaveTrigger::Debounce).await;
        });
    }

    /// Send the current state. Returns whether the server acknowledged it.
    pub async fn persist(&self, trigger: SaveTrigger) -> bool {
        let _gate = self.save_gate.lock().await;

        let epoch = self.state.epoch();
        let Some(payload) = self.state.save_payload() else {
            debug!("no document id yet, nothing to save");
            return false;
        };
        if !self.status.begin_saving(trigger) {
            return false;
        }

        debug!(post = %payload.id, revision = payload.revision, ?trigger, "saving document");
        match self.client.update(&payload.id, &payload.update).await {
            Ok(()) => {
                if self.state.epoch() != epoch {
                    debug!(post = %payload.id, "saved a document that is no longer open");
                    return true;
                }
                self.state.mark_persisted(payload.revision);
                if self.status.mark_saved() {
                    info!(post = %payload.id, revision = payload.revision, "document saved");
                } else {
                    debug!(post = %payload.id, "save superseded by a newer edit");
                }
                true
            }
            Err(err) => {
                warn!(post = %payload.id, error = %err, "auto-save failed");
                if self.state.epoch() == epoch && !self.status.mark_failed() {
                    debug!(post = %payload.id, "failed save superseded by a newer edit");
                }
                false
            }
        }
    }

    /// Retry after an `error` status with the document's current state,
    /// creating the draft first if that is what failed.
    pub async fn retry(&self) -> bool {
        if self.status.status() != SaveStatus::Error {
            debug!(status = %self.status.status(), "nothing to retry");
            return false;
        }
        self.debouncer.cancel();

        if self.state.post_id().is_none() && self.drafts.ensure().await.is_none() {
            return false;
        }
        self.persist(SaveTrigger::Retry).await
    }

    /// Save now instead of waiting for the debounce, and wait for any save
    /// in flight. Returns false if the document could not be saved.
    pub async fn flush(&self) -> bool {
        loop {
            self.debouncer.cancel();
            match self.status.status() {
                SaveStatus::Idle | SaveStatus::Saved => return true,
                SaveStatus::Saving => {
                    drop(self.save_gate.lock().await);
                }
                SaveStatus::Error => return self.retry().await,
                SaveStatus::Pending => {
                    if self.drafts.ensure().await.is_none() {
                        return false;
                    }
                    // a spawned ensure may have re-armed the timer meanwhile
                    self.debouncer.cancel();
                    if !self.persist(SaveTrigger::Debounce).await
                        && self.status.status() == SaveStatus::Error
                    {
                        return false;
                    }
                }
            }
        }
    }

    /// Drop scheduled work when the session switches to an empty document.
    /// A save already on the wire finishes but its outcome is ignored.
    pub fn reset(&self) {
        self.debouncer.cancel();
        self.drafts.reset();
        self.status.reset();
        self.baseline.store(true, Ordering::SeqCst);
    }

    /// Resolves once no edit is waiting to be saved.
    pub async fn settled(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx
            .wait_for(|s| !matches!(s.save_status, SaveStatus::Pending | SaveStatus::Saving))
            .await;
    }
}
