//! In-memory remotes shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use scribe_sync::{
    ByteStream, CreateError, EditorSession, PersistenceClient, RemoteFailure, StateEvent,
    StreamError, StreamTransport, SyncConfig, UpdateError,
};
use scribe_types::{DraftHandle, PostId, PostUpdate, SaveStatus, StreamAction};
use tokio::sync::broadcast;

/// One remote call, in the order the server received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create { title: String },
    Update { id: String, plain_text: String },
}

#[derive(Default)]
pub struct MemoryPosts {
    pub calls: Mutex<Vec<Call>>,
    pub fail_updates: AtomicBool,
    pub update_latency: Mutex<Duration>,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl MemoryPosts {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn set_update_latency(&self, latency: Duration) {
        *self.update_latency.lock() = latency;
    }
}

#[async_trait]
impl PersistenceClient for MemoryPosts {
    async fn create(&self, title: &str) -> Result<DraftHandle, CreateError> {
        let n = {
            let mut calls = self.calls.lock();
            calls.push(Call::Create {
                title: title.to_string(),
            });
            calls
                .iter()
                .filter(|c| matches!(c, Call::Create { .. }))
                .count()
        };
        Ok(DraftHandle {
            id: PostId::new(format!("post-{n}")),
            title: title.to_string(),
        })
    }

    async fn update(&self, id: &PostId, update: &PostUpdate) -> Result<(), UpdateError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().push(Call::Update {
            id: id.to_string(),
            plain_text: update.plain_text.clone().unwrap_or_default(),
        });
        let latency = *self.update_latency.lock();
        tokio::time::sleep(latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.fail_updates.load(Ordering::SeqCst) {
            Err(UpdateError(RemoteFailure::status(503, None)))
        } else {
            Ok(())
        }
    }
}

/// Replies to each generation request with the next queued body.
#[derive(Default)]
pub struct QueuedAi {
    bodies: Mutex<VecDeque<Body>>,
}

pub enum Body {
    Chunks { parts: Vec<&'static str>, hang: bool },
    Rejected(RemoteFailure),
}

impl QueuedAi {
    pub fn new(bodies: Vec<Body>) -> Self {
        Self {
            bodies: Mutex::new(bodies.into()),
        }
    }
}

#[async_trait]
impl StreamTransport for QueuedAi {
    async fn open(&self, _action: StreamAction, _text: &str) -> Result<ByteStream, StreamError> {
        let body = self.bodies.lock().pop_front();
        match body {
            None => Ok(stream::empty().boxed()),
            Some(Body::Rejected(failure)) => Err(StreamError::Open(failure)),
            Some(Body::Chunks { parts, hang }) => {
                let chunks = stream::iter(parts).then(|part| async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Ok::<_, StreamError>(Bytes::from_static(part.as_bytes()))
                });
                if hang {
                    Ok(chunks.chain(stream::pending()).boxed())
                } else {
                    Ok(chunks.boxed())
                }
            }
        }
    }
}

pub fn new_session(posts: &Arc<MemoryPosts>, ai: QueuedAi) -> EditorSession {
    EditorSession::new(
        SyncConfig::default(),
        Arc::clone(posts) as Arc<dyn PersistenceClient>,
        Arc::new(ai),
    )
}

/// Drain the status transitions received so far.
pub fn statuses(events: &mut broadcast::Receiver<StateEvent>) -> Vec<(SaveStatus, SaveStatus)> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let StateEvent::StatusChanged { from, to } = event {
            seen.push((from, to));
        }
    }
    seen
}
