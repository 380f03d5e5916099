//! Lazy draft creation.
//!
//! A document gets a server identity on its first qualifying edit, and only
//! once: concurrent callers share the single in-flight creation instead of
//! starting their own.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use scribe_types::PostId;
use tracing::{debug, info, warn};

use crate::config::SyncConfig;
use crate::remote::PersistenceClient;
use crate::state::DocumentState;
use crate::status::SaveStatusMachine;

type PendingDraft = Shared<BoxFuture<'static, Option<PostId>>>;

struct InFlight {
    generation: u64,
    pending: PendingDraft,
}

#[derive(Default)]
struct DraftSlot {
    generation: u64,
    in_flight: Option<InFlight>,
}

pub struct DraftProvisioner {
    state: DocumentState,
    status: Arc<SaveStatusMachine>,
    client: Arc<dyn PersistenceClient>,
    config: SyncConfig,
    slot: Arc<Mutex<DraftSlot>>,
}

impl DraftProvisioner {
    pub fn new(
        state: DocumentState,
        status: Arc<SaveStatusMachine>,
        client: Arc<dyn PersistenceClient>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            state,
            status,
            client,
            config: config.clone(),
            slot: Arc::new(Mutex::new(DraftSlot::default())),
        }
    }

    /// Resolve the document's id, creating a draft if there is none yet.
    ///
    /// The existing-id check, the in-flight check and the registration of a
    /// new creation happen under one lock, before anything is awaited.
    /// Returns `None` if creation failed (status is then `error`) or the
    /// session switched document while it ran.
    pub async fn ensure(&self) -> Option<PostId> {
        let pending = {
            let mut slot = self.slot.lock();
            if let Some(id) = self.state.post_id() {
                return Some(id);
            }
            match &slot.in_flight {
                Some(in_flight) => {
                    debug!("joining in-flight draft creation");
                    in_flight.pending.clone()
                }
                None => {
                    slot.generation += 1;
                    let pending = self.start(slot.generation);
                    slot.in_flight = Some(InFlight {
                        generation: slot.generation,
                        pending: pending.clone(),
                    });
                    pending
                }
            }
        };
        pending.await
    }

    pub fn is_creating(&self) -> bool {
        self.slot.lock().in_flight.is_some()
    }

    /// Detach any in-flight creation; its result will not be applied.
    pub fn reset(&self) {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        slot.in_flight = None;
    }

    fn start(&self, generation: u64) -> PendingDraft {
        let state = self.state.clone();
        let status = Arc::clone(&self.status);
        let client = Arc::clone(&self.client);
        let slot = Arc::clone(&self.slot);
        let epoch = state.epoch();
        let title = self.config.title_for_draft(&state.title());

        let task = tokio::spawn(async move {
            debug!(%title, "creating draft");
            let result = match client.create(&title).await {
                Ok(handle) => {
                    let id = handle.id.clone();
                    if state.assign_identity(epoch, handle.id, handle.title) {
                        info!(post = %id, "draft created");
                        Some(id)
                    } else {
                        debug!(post = %id, "draft created for a document that is no longer open");
                        None
                    }
                }
                Err(err) => {
                    warn!(error = %err, "draft creation failed");
                    if state.epoch() == epoch {
                        status.mark_provision_failed();
                    }
                    None
                }
            };

            let mut slot = slot.lock();
            if slot
                .in_flight
                .as_ref()
                .is_some_and(|f| f.generation == generation)
            {
                slot.in_flight = None;
            }
            result
        });

        async move {
            task.await.unwrap_or_else(|err| {
                warn!(error = %err, "draft creation task ended abnormally");
                None
            })
        }
        .boxed()
        .shared()
    }
}
