//! Scripted remotes for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use parking_lot::Mutex;
use scribe_types::{DraftHandle, PostId, PostUpdate, StreamAction};

use crate::error::{CreateError, RemoteFailure, StreamError, UpdateError};
use crate::remote::{ByteStream, PersistenceClient, StreamTransport};

#[derive(Default)]
pub(crate) struct ScriptedStore {
    pub creates: Mutex<Vec<String>>,
    pub updates: Mutex<Vec<(PostId, PostUpdate)>>,
    pub create_delay: Duration,
    pub update_delay: Duration,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl ScriptedStore {
    pub fn with_delays(create_delay: Duration, update_delay: Duration) -> Self {
        Self {
            create_delay,
            update_delay,
            ..Default::default()
        }
    }

    pub fn create_count(&self) -> usize {
        self.creates.lock().len()
    }

    pub fn update_texts(&self) -> Vec<String> {
        self.updates
            .lock()
            .iter()
            .map(|(_, u)| u.plain_text.clone().unwrap_or_default())
            .collect()
    }
}

#[async_trait]
impl PersistenceClient for ScriptedStore {
    async fn create(&self, title: &str) -> Result<DraftHandle, CreateError> {
        let n = {
            let mut creates = self.creates.lock();
            creates.push(title.to_string());
            creates.len()
        };
        tokio::time::sleep(self.create_delay).await;
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(CreateError(RemoteFailure::status(500, None)));
        }
        Ok(DraftHandle {
            id: PostId::new(format!("post-{n}")),
            title: title.to_string(),
        })
    }

    async fn update(&self, id: &PostId, update: &PostUpdate) -> Result<(), UpdateError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.updates.lock().push((id.clone(), update.clone()));
        tokio::time::sleep(self.update_delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(UpdateError(RemoteFailure::Transport("connection reset".into())));
        }
        Ok(())
    }
}

/// One scripted response body.
pub(crate) struct Script {
    pub open: Result<(), StreamError>,
    pub chunks: Vec<(Duration, Result<Bytes, StreamError>)>,
    /// Keep the body open after the last chunk.
    pub hang: bool,
}

impl Script {
    pub fn chunks(parts: &[&'static str]) -> Self {
        Self {
            open: Ok(()),
            chunks: parts
                .iter()
                .map(|p| (Duration::from_millis(10), Ok(Bytes::from_static(p.as_bytes()))))
                .collect(),
            hang: false,
        }
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn then_fail(mut self, message: &str) -> Self {
        self.chunks.push((
            Duration::from_millis(10),
            Err(StreamError::Interrupted(message.to_string())),
        ));
        self
    }

    pub fn rejected(status: u16, detail: &str) -> Self {
        Self {
            open: Err(StreamError::Open(RemoteFailure::status(
                status,
                Some(detail.to_string()),
            ))),
            chunks: Vec::new(),
            hang: false,
        }
    }
}

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    scripts: Mutex<VecDeque<Script>>,
    pub opened: Mutex<Vec<(StreamAction, String)>>,
}

impl ScriptedTransport {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            opened: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    async fn open(&self, action: StreamAction, text: &str) -> Result<ByteStream, StreamError> {
        self.opened.lock().push((action, text.to_string()));
        let script = self
            .scripts
            .lock()
            .pop_front()
            .unwrap_or_else(|| Script::chunks(&[]));
        script.open?;

        let body = stream::iter(script.chunks).then(|(delay, item)| async move {
            tokio::time::sleep(delay).await;
            item
        });
        if script.hang {
            Ok(body.chain(stream::pending()).boxed())
        } else {
            Ok(body.boxed())
        }
    }
}
